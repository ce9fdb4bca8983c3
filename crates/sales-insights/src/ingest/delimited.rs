use super::{Cell, LoadError, RawTable};
use std::io::Read;

pub(crate) fn read_table<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(LoadError::Empty);
    }

    // Rows are numbered by record; the reader skips lines with no content at all.
    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(text_cell).collect());
    }

    Ok(RawTable::new(headers, rows))
}

fn text_cell(value: &str) -> Cell {
    if value.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(value.to_string())
    }
}
