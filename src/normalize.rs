use crate::schema::CellValue;
use log::warn;

const NULL_TOKENS: &[&str] = &["nan", "none"];

/// Convert a raw cell into a monetary amount. Total: junk degrades to 0.0
/// so that one malformed cell never aborts an import.
///
/// Strings are read as Brazilian-formatted money: currency markers and
/// spaces stripped, `.` as thousands separator and `,` as decimal
/// separator when a comma is present.
pub fn normalize_amount(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Empty => 0.0,
        CellValue::Number(n) => *n,
        CellValue::Text(raw) => normalize_text(raw),
    }
}

/// Same normalization, truncated to a non-negative note count.
pub fn normalize_count(cell: &CellValue) -> u32 {
    let value = normalize_amount(cell).trunc();
    if value <= 0.0 {
        0
    } else {
        value as u32
    }
}

fn normalize_text(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NULL_TOKENS.contains(&trimmed.to_lowercase().as_str()) {
        return 0.0;
    }

    let mut cleaned = trimmed
        .to_lowercase()
        .replace("r$", "")
        .replace(['$', ' '], "");

    if cleaned.contains(',') {
        // Brazilian format: periods are thousands separators, the comma is
        // the decimal separator.
        cleaned = cleaned.replace('.', "").replace(',', ".");
    }
    // Without a comma, a period with a >3 digit integer part is already a
    // plain decimal and is left untouched.

    let filtered: String = cleaned
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    match filtered.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            warn!("could not read '{}' as a monetary amount, using 0.0", raw);
            0.0
        }
    }
}
