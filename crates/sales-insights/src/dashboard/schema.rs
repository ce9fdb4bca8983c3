use super::domain::{SalesDataset, SalesRecord};
use crate::ingest::{Cell, RawTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;
use tracing::{debug, warn};

pub const DATE: &str = "Date";
pub const TIME_OF_DAY: &str = "Time of Day";
pub const SERVICE_TYPE: &str = "Service Type";
pub const AD_CHANNEL: &str = "Ad Channel";
pub const CUSTOMER_TYPE: &str = "Customer Type";
pub const AD_SPEND: &str = "Ad Spend ($)";
pub const CONVERSIONS: &str = "Conversions";
pub const DAILY_REVENUE: &str = "Daily Revenue ($)";

/// Column headers every upload must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    DATE,
    TIME_OF_DAY,
    SERVICE_TYPE,
    AD_CHANNEL,
    CUSTOMER_TYPE,
    AD_SPEND,
    CONVERSIONS,
    DAILY_REVENUE,
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Largest conversion count that survives the round trip through a
/// spreadsheet number unchanged (2^53 - 1).
const MAX_CONVERSIONS: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "uploaded file does not match the required dataset structure; missing columns: {}",
    .missing.join(", ")
)]
pub struct SchemaError {
    pub missing: Vec<String>,
}

impl SchemaError {
    pub fn expected(&self) -> &'static [&'static str] {
        &REQUIRED_COLUMNS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    InvalidDate,
    InvalidNumber,
    Negative,
    NotWholeNumber,
    OutOfRange,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParseFailure::InvalidDate => "not a calendar date",
            ParseFailure::InvalidNumber => "not a number",
            ParseFailure::Negative => "must not be negative",
            ParseFailure::NotWholeNumber => "must be a whole number",
            ParseFailure::OutOfRange => "too large",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row {row}: invalid {column} value '{value}' ({failure})")]
pub struct ParseError {
    pub row: usize,
    pub column: &'static str,
    pub value: String,
    pub failure: ParseFailure,
}

/// A dataset that passed validation, plus the columns that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDataset {
    pub dataset: SalesDataset,
    pub extra_columns: Vec<String>,
}

/// Column positions of the required headers inside a raw table.
struct ColumnMap {
    date: usize,
    time_of_day: usize,
    service_type: usize,
    ad_channel: usize,
    customer_type: usize,
    ad_spend: usize,
    conversions: usize,
    daily_revenue: usize,
}

/// Confirms the required columns are present, lists extra ones.
pub fn check_columns(table: &RawTable) -> Result<Vec<String>, SchemaError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| table.column_index(column).is_none())
        .map(|column| column.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(SchemaError { missing });
    }

    Ok(table
        .headers()
        .iter()
        .filter(|header| !header.is_empty() && !REQUIRED_COLUMNS.contains(&header.as_str()))
        .cloned()
        .collect())
}

/// Validates every row and builds the dataset. Dates are checked for the
/// whole sheet before any numeric column so a bad date is always the
/// reported failure when both are present.
pub fn validate(table: &RawTable) -> Result<ValidatedDataset, super::DashboardError> {
    let extra_columns = match check_columns(table) {
        Ok(extra) => extra,
        Err(err) => {
            warn!(missing = ?err.missing, "upload rejected: schema mismatch");
            return Err(err.into());
        }
    };
    if !extra_columns.is_empty() {
        warn!(columns = ?extra_columns, "ignoring extra columns in upload");
    }

    let columns = locate(table)?;
    let dates = parse_dates(table, columns.date).inspect_err(log_parse_failure)?;

    let mut records = Vec::with_capacity(table.row_count());
    for (index, date) in dates.into_iter().enumerate() {
        let record = build_record(table, &columns, index, date).inspect_err(log_parse_failure)?;
        records.push(record);
    }
    debug!(rows = records.len(), "upload validated");

    Ok(ValidatedDataset {
        dataset: SalesDataset::new(records),
        extra_columns,
    })
}

fn log_parse_failure(err: &ParseError) {
    warn!(row = err.row, column = err.column, "upload rejected: {}", err.failure);
}

fn locate(table: &RawTable) -> Result<ColumnMap, SchemaError> {
    let index = |name: &str| {
        table.column_index(name).ok_or_else(|| SchemaError {
            missing: vec![name.to_string()],
        })
    };

    Ok(ColumnMap {
        date: index(DATE)?,
        time_of_day: index(TIME_OF_DAY)?,
        service_type: index(SERVICE_TYPE)?,
        ad_channel: index(AD_CHANNEL)?,
        customer_type: index(CUSTOMER_TYPE)?,
        ad_spend: index(AD_SPEND)?,
        conversions: index(CONVERSIONS)?,
        daily_revenue: index(DAILY_REVENUE)?,
    })
}

fn parse_dates(table: &RawTable, column: usize) -> Result<Vec<NaiveDate>, ParseError> {
    (0..table.row_count())
        .map(|row| {
            let cell = table.cell(row, column);
            parse_date(cell).ok_or_else(|| ParseError {
                row: table.sheet_row(row),
                column: DATE,
                value: cell.display(),
                failure: ParseFailure::InvalidDate,
            })
        })
        .collect()
}

fn build_record(
    table: &RawTable,
    columns: &ColumnMap,
    row: usize,
    date: NaiveDate,
) -> Result<SalesRecord, ParseError> {
    let text = |column: usize| table.cell(row, column).display();
    let number = |column: usize, name: &'static str| {
        let cell = table.cell(row, column);
        parse_amount(cell).map_err(|failure| ParseError {
            row: table.sheet_row(row),
            column: name,
            value: cell.display(),
            failure,
        })
    };

    let ad_spend = number(columns.ad_spend, AD_SPEND)?;
    let conversions = number(columns.conversions, CONVERSIONS)?;
    let daily_revenue = number(columns.daily_revenue, DAILY_REVENUE)?;

    let conversion_failure = if conversions.fract() != 0.0 {
        Some(ParseFailure::NotWholeNumber)
    } else if conversions > MAX_CONVERSIONS {
        Some(ParseFailure::OutOfRange)
    } else {
        None
    };
    if let Some(failure) = conversion_failure {
        return Err(ParseError {
            row: table.sheet_row(row),
            column: CONVERSIONS,
            value: table.cell(row, columns.conversions).display(),
            failure,
        });
    }

    Ok(SalesRecord {
        date,
        time_of_day: text(columns.time_of_day),
        service_type: text(columns.service_type),
        ad_channel: text(columns.ad_channel),
        customer_type: text(columns.customer_type),
        ad_spend,
        conversions: conversions as u64,
        daily_revenue,
    })
}

fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(date) => Some(*date),
        Cell::Text(text) => parse_date_text(text),
        Cell::Empty | Cell::Number(_) | Cell::Bool(_) => None,
    }
}

fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
    {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|dt| dt.date())
}

fn parse_amount(cell: &Cell) -> Result<f64, ParseFailure> {
    let value = match cell {
        Cell::Number(value) => *value,
        Cell::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| ParseFailure::InvalidNumber)?,
        Cell::Empty | Cell::Bool(_) | Cell::Date(_) => return Err(ParseFailure::InvalidNumber),
    };

    if !value.is_finite() {
        return Err(ParseFailure::InvalidNumber);
    }
    if value < 0.0 {
        return Err(ParseFailure::Negative);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardError;

    fn headers() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn row(date: &str, spend: &str, conversions: &str, revenue: &str) -> Vec<Cell> {
        [
            date,
            "Morning",
            "Bundled",
            "Google",
            "New",
            spend,
            conversions,
            revenue,
        ]
        .iter()
        .map(|value| {
            if value.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(value.to_string())
            }
        })
        .collect()
    }

    fn expect_parse_error(result: Result<ValidatedDataset, DashboardError>) -> ParseError {
        match result {
            Err(DashboardError::Parse(err)) => err,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_column_is_named_in_schema_error() {
        for dropped in REQUIRED_COLUMNS {
            let headers: Vec<String> = headers()
                .into_iter()
                .filter(|header| header != dropped)
                .collect();
            let table = RawTable::new(headers, Vec::new());

            match validate(&table) {
                Err(DashboardError::Schema(err)) => {
                    assert_eq!(err.missing, vec![dropped.to_string()]);
                    assert!(err.to_string().contains(dropped));
                }
                other => panic!("expected schema error for {dropped}, got {other:?}"),
            }
        }
    }

    #[test]
    fn renamed_column_counts_as_missing() {
        let mut headers = headers();
        headers[5] = "Ad Spend".to_string();
        let error = check_columns(&RawTable::new(headers, Vec::new())).expect_err("renamed");
        assert_eq!(error.missing, vec![AD_SPEND.to_string()]);
        assert_eq!(error.expected().len(), 8);
    }

    #[test]
    fn extra_columns_are_reported_and_ignored() {
        let mut headers = headers();
        headers.push("Notes".to_string());
        let mut data = row("2024-01-01", "10", "2", "100");
        data.push(Cell::Text("call back".to_string()));

        let validated = validate(&RawTable::new(headers, vec![data])).expect("valid");
        assert_eq!(validated.extra_columns, vec!["Notes".to_string()]);
        assert_eq!(validated.dataset.len(), 1);
    }

    #[test]
    fn bad_date_names_first_offending_row() {
        let table = RawTable::new(
            headers(),
            vec![
                row("2024-01-01", "10", "2", "100"),
                row("not a date", "10", "2", "100"),
                row("also bad", "10", "2", "100"),
            ],
        );

        let error = expect_parse_error(validate(&table));
        assert_eq!(error.row, 3);
        assert_eq!(error.column, DATE);
        assert_eq!(error.value, "not a date");
        assert_eq!(error.failure, ParseFailure::InvalidDate);
    }

    #[test]
    fn date_errors_win_over_numeric_errors() {
        let table = RawTable::new(
            headers(),
            vec![
                row("2024-01-01", "oops", "2", "100"),
                row("bad", "10", "2", "100"),
            ],
        );

        let error = expect_parse_error(validate(&table));
        assert_eq!(error.column, DATE);
        assert_eq!(error.row, 3);
    }

    #[test]
    fn numeric_columns_reject_text_negatives_and_fractions() {
        let cases = [
            (row("2024-01-01", "ten", "2", "100"), AD_SPEND, ParseFailure::InvalidNumber),
            (row("2024-01-01", "10", "2", "-5"), DAILY_REVENUE, ParseFailure::Negative),
            (row("2024-01-01", "10", "2.5", "100"), CONVERSIONS, ParseFailure::NotWholeNumber),
            (row("2024-01-01", "10", "", "100"), CONVERSIONS, ParseFailure::InvalidNumber),
            (row("2024-01-01", "NaN", "1", "100"), AD_SPEND, ParseFailure::InvalidNumber),
        ];

        for (data, column, failure) in cases {
            let error = expect_parse_error(validate(&RawTable::new(headers(), vec![data])));
            assert_eq!(error.row, 2);
            assert_eq!(error.column, column);
            assert_eq!(error.failure, failure);
        }
    }

    #[test]
    fn blank_row_between_data_rows_is_reported_at_its_sheet_row() {
        let table = RawTable::new(
            headers(),
            vec![
                row("2024-01-01", "10", "2", "100"),
                vec![Cell::Empty; REQUIRED_COLUMNS.len()],
                row("oops", "10", "2", "100"),
            ],
        );

        let error = expect_parse_error(validate(&table));
        assert_eq!(error.row, 3);
        assert_eq!(error.column, DATE);
        assert_eq!(error.value, "");
    }

    #[test]
    fn rows_keep_their_sheet_numbers_after_blank_rows() {
        let table = RawTable::numbered(
            headers(),
            vec![
                (2, row("2024-01-01", "10", "2", "100")),
                (4, row("oops", "10", "2", "100")),
            ],
        );

        let error = expect_parse_error(validate(&table));
        assert_eq!(error.row, 4);
        assert_eq!(error.value, "oops");
    }

    #[test]
    fn conversions_beyond_exact_float_range_are_rejected() {
        let table = RawTable::new(
            headers(),
            vec![
                row("2024-01-01", "10", "9007199254740991", "100"),
                row("2024-01-02", "10", "10000000000000000000", "100"),
            ],
        );

        let error = expect_parse_error(validate(&table));
        assert_eq!(error.row, 3);
        assert_eq!(error.column, CONVERSIONS);
        assert_eq!(error.failure, ParseFailure::OutOfRange);
    }

    #[test]
    fn native_cells_are_accepted() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let data = vec![
            Cell::Date(date),
            Cell::Text("Evening".to_string()),
            Cell::Text("Premium".to_string()),
            Cell::Text("Facebook".to_string()),
            Cell::Text("Returning".to_string()),
            Cell::Number(12.5),
            Cell::Number(3.0),
            Cell::Number(240.0),
        ];

        let validated = validate(&RawTable::new(headers(), vec![data])).expect("valid");
        let record = &validated.dataset.records()[0];
        assert_eq!(record.date, date);
        assert_eq!(record.conversions, 3);
        assert_eq!(record.ad_spend, 12.5);
        assert_eq!(record.time_of_day, "Evening");
    }

    #[test]
    fn date_text_accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date_text("2024-01-15"), expected);
        assert_eq!(parse_date_text("01/15/2024"), expected);
        assert_eq!(parse_date_text("15.01.2024"), expected);
        assert_eq!(parse_date_text("2024-01-15 09:30:00"), expected);
        assert_eq!(parse_date_text("2024-01-15T09:30:00+02:00"), expected);
        assert_eq!(parse_date_text("   "), None);
        assert_eq!(parse_date_text("2024-13-40"), None);
    }
}
