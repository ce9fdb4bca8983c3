use super::{Cell, LoadError, RawTable};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use std::io::Cursor;
use tracing::debug;

/// Reads the first worksheet; the first used row is the header row.
pub(crate) fn read_first_sheet(bytes: Vec<u8>) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;
    // calamine trims leading empty rows; `start` is the 0-based header row.
    let header_row = range.start().map_or(1, |(row, _)| row as usize + 1);

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(first) => first.iter().map(header_text).collect::<Vec<_>>(),
        None => return Err(LoadError::Empty),
    };

    let rows = rows
        .enumerate()
        .map(|(index, row)| {
            let cells = row.iter().map(to_cell).collect::<Vec<_>>();
            (header_row + 1 + index, cells)
        })
        .collect::<Vec<_>>();
    debug!(
        columns = headers.len(),
        rows = rows.len(),
        header_row,
        "read worksheet"
    );

    Ok(RawTable::numbered(headers, rows))
}

fn header_text(value: &Data) -> String {
    to_cell(value).display()
}

fn to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(text) if text.trim().is_empty() => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        Data::Float(number) => Cell::Number(*number),
        Data::Int(number) => Cell::Number(*number as f64),
        Data::Bool(flag) => Cell::Bool(*flag),
        Data::DateTime(serial) => match excel_serial_to_date(serial.as_f64()) {
            Some(date) => Cell::Date(date),
            None => Cell::Number(serial.as_f64()),
        },
        Data::DateTimeIso(text) => match iso_to_date(text) {
            Some(date) => Cell::Date(date),
            None => Cell::Text(text.clone()),
        },
        Data::DurationIso(text) => Cell::Text(text.clone()),
        Data::Error(err) => Cell::Text(format!("#ERROR:{err:?}")),
    }
}

/// Converts a 1900-system serial. Day 0 is 1899-12-30, which absorbs the
/// phantom 1900-02-29 for every serial after February 1900.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

fn iso_to_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_map_to_calendar_dates() {
        assert_eq!(
            excel_serial_to_date(45292.0),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            excel_serial_to_date(45292.75),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn iso_cells_accept_dates_and_datetimes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(iso_to_date("2024-03-09"), expected);
        assert_eq!(iso_to_date("2024-03-09T08:30:00"), expected);
        assert_eq!(iso_to_date("2024-03-09T08:30:00Z"), expected);
        assert_eq!(iso_to_date("yesterday"), None);
    }

    #[test]
    fn blank_strings_are_empty_cells() {
        assert_eq!(to_cell(&Data::String("   ".to_string())), Cell::Empty);
        assert_eq!(to_cell(&Data::Int(7)), Cell::Number(7.0));
    }
}
