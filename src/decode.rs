use crate::schema::{CellValue, RawTable};
use csv::ReaderBuilder;
use log::debug;
use std::io::Cursor;
use thiserror::Error;

/// How far down the sheet we look for the real header row. Template files
/// put a title, an instruction line and a spacer above it.
const MAX_HEADER_OFFSET: usize = 3;
/// A candidate header row is accepted once it has this many usable names.
const MIN_USABLE_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" => Some(SourceFormat::Xlsx),
            "xls" => Some(SourceFormat::Xls),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("could not read the file as CSV: {0}")]
    Read(#[from] csv::Error),

    #[error("{0:?} decoding is not supported by this decoder; convert the sheet to CSV")]
    UnsupportedFormat(SourceFormat),

    #[error(
        "no header row with at least {MIN_USABLE_COLUMNS} usable columns found in the first {} rows",
        MAX_HEADER_OFFSET + 1
    )]
    NoHeaderRow,
}

/// Decode raw file bytes into a [`RawTable`].
///
/// Header detection is an ordered strategy, not trial-and-error: offsets
/// `0..=3` are probed in order and the first row with at least three
/// non-placeholder names becomes the header; everything below it is data.
pub fn decode_table(bytes: &[u8], format: SourceFormat) -> Result<RawTable, DecodeError> {
    match format {
        SourceFormat::Csv => decode_csv(bytes),
        other => Err(DecodeError::UnsupportedFormat(other)),
    }
}

fn decode_csv(bytes: &[u8]) -> Result<RawTable, DecodeError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(bytes));

    let mut grid: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(|s| s.to_string()).collect());
    }

    let header_offset = (0..=MAX_HEADER_OFFSET)
        .find(|&offset| {
            grid.get(offset)
                .map(|row| usable_columns(row) >= MIN_USABLE_COLUMNS)
                .unwrap_or(false)
        })
        .ok_or(DecodeError::NoHeaderRow)?;

    debug!("header row found at offset {}", header_offset);

    let columns = grid[header_offset].clone();
    let mut table = RawTable::new(columns);
    for row in grid.into_iter().skip(header_offset + 1) {
        table.push_row(row.into_iter().map(cell_from_text).collect());
    }

    Ok(table)
}

fn usable_columns(row: &[String]) -> usize {
    row.iter().filter(|name| !is_placeholder(name)).count()
}

// Spreadsheet exporters label headerless columns "Unnamed: 0" and the
// like; those do not count as real column names.
fn is_placeholder(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || trimmed.to_lowercase().starts_with("unnamed")
}

fn cell_from_text(text: String) -> CellValue {
    if text.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(text)
    }
}
