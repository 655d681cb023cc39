//! Spreadsheet decoding
//!
//! Reads the first worksheet of an uploaded workbook (xlsx, xls, xlsb or ods)
//! into raw rows of `(header label, cell)` pairs in column order. The first
//! row is the header; labels are trimmed with internal whitespace collapsed.
//! Rows whose cells are all blank are dropped.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use thiserror::Error;

use super::normalizer::RawRow;

/// Workbook decoding failure
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("Unreadable spreadsheet: {0}")]
    Unreadable(#[from] calamine::Error),

    #[error("Spreadsheet contains no worksheets")]
    NoWorksheet,
}

/// Decode workbook bytes into raw rows
pub fn read_rows(bytes: Vec<u8>) -> Result<Vec<RawRow>, SpreadsheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoWorksheet)??;

    Ok(rows_from_range(&range))
}

/// Convert a worksheet range into rows of `(header label, cell)` pairs
pub fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| {
                cell_text(cell)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect(),
        None => return Vec::new(),
    };

    rows.filter(|cells| cells.iter().any(|cell| !cell_text(cell).trim().is_empty()))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .filter(|(_, label)| !label.is_empty())
                .map(|(i, label)| {
                    let value = cells.get(i).map(cell_text).unwrap_or_default();
                    (label.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Render a cell as text
///
/// Whole-number floats render without a fractional part so numeric phone
/// numbers and identifiers survive the round trip through Excel.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
