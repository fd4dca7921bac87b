use crate::normalize::{normalize_amount, normalize_count};
use crate::period::parse_period;
use crate::schema::{AnalyzerConfig, CellValue, MonthlyRecord, RawTable, RoleMap};
use log::{debug, warn};
use thiserror::Error;

/// Period-cell sentinels marking instructional or footer rows that carry
/// no data. Hand-edited spreadsheets often leave these behind.
const SKIP_TOKENS: &[&str] = &["nan", "none", "", "observações", "instruções"];

#[derive(Error, Debug)]
enum RowFault {
    #[error("row is missing a cell for column '{0}'")]
    MissingCell(String),
}

/// Convert every data row into a [`MonthlyRecord`], in table order, then
/// sort ascending by period key.
///
/// Failure isolation: a fault in one row is logged with its index and the
/// row is dropped; it never aborts the rest of the import. Rows whose
/// period cell is blank or a known footer token are skipped silently.
pub fn process_rows(
    table: &RawTable,
    roles: &RoleMap,
    config: &AnalyzerConfig,
) -> Vec<MonthlyRecord> {
    let mut records = Vec::new();

    for index in 0..table.row_count() {
        let period_cell = table.cell(index, &roles.period);

        let period_text = match period_cell {
            None | Some(CellValue::Empty) => {
                debug!("row {}: empty period cell, skipping", index);
                continue;
            }
            Some(cell) => cell.to_string(),
        };

        if SKIP_TOKENS.contains(&period_text.trim().to_lowercase().as_str()) {
            debug!("row {}: period cell '{}' is not data, skipping", index, period_text);
            continue;
        }

        match build_record(table, roles, config, index, &period_text) {
            Ok(record) => records.push(record),
            Err(fault) => {
                warn!("row {} skipped: {}", index, fault);
            }
        }
    }

    // Stable sort; the zero-padded key makes lexicographic order
    // chronological.
    records.sort_by(|a, b| a.period_key.cmp(&b.period_key));
    records
}

fn build_record(
    table: &RawTable,
    roles: &RoleMap,
    config: &AnalyzerConfig,
    index: usize,
    period_text: &str,
) -> Result<MonthlyRecord, RowFault> {
    let period = parse_period(period_text, index, config.default_year);

    let inbound_amount = normalize_amount(required_cell(table, index, &roles.inbound_amount)?);
    let outbound_amount = normalize_amount(required_cell(table, index, &roles.outbound_amount)?);

    let inbound_count = count_cell(table, index, roles.inbound_count.as_deref());
    let outbound_count = count_cell(table, index, roles.outbound_count.as_deref());

    Ok(MonthlyRecord {
        period_key: period.key,
        display_label: period.label,
        inbound_amount,
        outbound_amount,
        inbound_count,
        outbound_count,
        period_inferred: period.inferred,
    })
}

fn required_cell<'a>(
    table: &'a RawTable,
    index: usize,
    column: &str,
) -> Result<&'a CellValue, RowFault> {
    table
        .cell(index, column)
        .ok_or_else(|| RowFault::MissingCell(column.to_string()))
}

// Count columns are optional; an absent role or a short/blank cell simply
// means zero notes.
fn count_cell(table: &RawTable, index: usize, column: Option<&str>) -> u32 {
    match column.and_then(|c| table.cell(index, c)) {
        Some(cell) => normalize_count(cell),
        None => 0,
    }
}
