//! Spreadsheet loading.
//!
//! Uploads are read into a [`RawTable`]: the header row as written in the file
//! plus typed cells for every data row. Nothing here knows about the sales
//! schema; that lives in `dashboard::schema`.

mod delimited;
mod normalizer;
mod workbook;

use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not read the uploaded workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("the uploaded workbook does not contain any worksheet")]
    NoWorksheet,
    #[error("the uploaded file is empty")]
    Empty,
    #[error("unsupported file type '{extension}'; upload an .xlsx or .csv file")]
    UnsupportedFormat { extension: String },
}

/// A single spreadsheet value as read from the upload.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Sheet row of the first data row when the header sits on row 1.
pub const FIRST_DATA_ROW: usize = 2;

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Renders the cell the way it would read in the sheet.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
                    format!("{value:.0}")
                } else {
                    value.to_string()
                }
            }
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
            Cell::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Header names and data rows of the first sheet of an upload.
///
/// Every data row remembers the 1-based sheet row it was read from. Blank
/// rows after the last data row are dropped; blank rows in between are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    sheet_rows: Vec<usize>,
}

impl RawTable {
    /// Builds a table whose header is sheet row 1 with data rows directly below.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let numbered = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| (index + FIRST_DATA_ROW, row))
            .collect();
        Self::numbered(headers, numbered)
    }

    /// Builds a table from rows tagged with their sheet row number.
    pub fn numbered(headers: Vec<String>, mut rows: Vec<(usize, Vec<Cell>)>) -> Self {
        let headers = headers
            .iter()
            .map(|header| normalizer::normalize_header(header))
            .collect();
        while rows
            .last()
            .is_some_and(|(_, cells)| cells.iter().all(Cell::is_empty))
        {
            rows.pop();
        }
        let (sheet_rows, rows): (Vec<usize>, Vec<Vec<Cell>>) = rows.into_iter().unzip();
        Self {
            headers,
            rows,
            sheet_rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 1-based sheet row of the data row at `row`.
    pub fn sheet_row(&self, row: usize) -> usize {
        self.sheet_rows
            .get(row)
            .copied()
            .unwrap_or(row + FIRST_DATA_ROW)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Returns the cell at `row`/`column`, treating short rows as blank.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Supported upload encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Workbook,
    Csv,
}

impl SpreadsheetFormat {
    pub fn from_extension(extension: &str) -> Result<Self, LoadError> {
        match extension.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            "csv" => Ok(Self::Csv),
            other => Err(LoadError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

pub struct SpreadsheetLoader;

impl SpreadsheetLoader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RawTable, LoadError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let format = SpreadsheetFormat::from_extension(extension)?;
        debug!(path = %path.display(), ?format, "loading spreadsheet");

        match format {
            SpreadsheetFormat::Workbook => Self::from_workbook_bytes(std::fs::read(path)?),
            SpreadsheetFormat::Csv => Self::from_csv_reader(std::fs::File::open(path)?),
        }
    }

    pub fn from_workbook_bytes(bytes: Vec<u8>) -> Result<RawTable, LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::Empty);
        }
        workbook::read_first_sheet(bytes)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<RawTable, LoadError> {
        delimited::read_table(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn cell_display_formats_whole_numbers_without_fraction() {
        assert_eq!(Cell::Number(42.0).display(), "42");
        assert_eq!(Cell::Number(12.5).display(), "12.5");
        assert_eq!(Cell::Bool(true).display(), "TRUE");
        assert_eq!(
            Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()).display(),
            "2024-01-02"
        );
    }

    #[test]
    fn raw_table_keeps_interior_blank_rows_with_their_sheet_rows() {
        let table = RawTable::new(
            vec!["Date".to_string()],
            vec![
                vec![Cell::Text("2024-01-01".to_string())],
                vec![Cell::Empty],
                vec![Cell::Text("2024-01-02".to_string())],
                vec![Cell::Empty],
            ],
        );

        assert_eq!(table.row_count(), 3);
        assert!(table.cell(1, 0).is_empty());
        assert_eq!(table.sheet_row(0), 2);
        assert_eq!(table.sheet_row(2), 4);
    }

    #[test]
    fn numbered_rows_keep_their_offsets() {
        let table = RawTable::numbered(
            vec!["Date".to_string()],
            vec![(5, vec![Cell::Text("2024-01-01".to_string())])],
        );
        assert_eq!(table.sheet_row(0), 5);
    }

    #[test]
    fn raw_table_drops_trailing_blank_rows_and_pads_short_rows() {
        let table = RawTable::new(
            vec!["Date".to_string(), "Conversions".to_string()],
            vec![
                vec![Cell::Text("2024-01-01".to_string())],
                vec![Cell::Empty, Cell::Text("  ".to_string())],
            ],
        );

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, 1), &Cell::Empty);
        assert_eq!(table.cell(5, 0), &Cell::Empty);
        assert_eq!(table.column_index("Conversions"), Some(1));
    }

    #[test]
    fn format_detection_is_case_insensitive() {
        assert_eq!(
            SpreadsheetFormat::from_extension("XLSX").expect("xlsx supported"),
            SpreadsheetFormat::Workbook
        );
        assert_eq!(
            SpreadsheetFormat::from_extension("csv").expect("csv supported"),
            SpreadsheetFormat::Csv
        );
        assert!(matches!(
            SpreadsheetFormat::from_extension("pdf"),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = SpreadsheetLoader::from_path("./does-not-exist.csv")
            .expect_err("expected io error");

        match error {
            LoadError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn empty_workbook_upload_is_rejected() {
        let error =
            SpreadsheetLoader::from_workbook_bytes(Vec::new()).expect_err("empty upload rejected");
        assert!(matches!(error, LoadError::Empty));
    }

    #[test]
    fn garbage_workbook_bytes_fail_to_open() {
        let error = SpreadsheetLoader::from_workbook_bytes(b"definitely not a zip".to_vec())
            .expect_err("garbage rejected");
        assert!(matches!(error, LoadError::Workbook(_)));
    }

    #[test]
    fn csv_reader_keeps_header_order() {
        let table = SpreadsheetLoader::from_csv_reader(Cursor::new(
            "\u{feff}Date , Conversions\n2024-01-01,3\n",
        ))
        .expect("csv parses");

        assert_eq!(table.headers(), ["Date", "Conversions"]);
        assert_eq!(table.cell(0, 1), &Cell::Text("3".to_string()));
    }
}
