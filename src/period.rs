/// Canonical Portuguese month names, used both for name matching and for
/// rebuilding display labels.
pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// A period cell resolved to a canonical month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPeriod {
    /// Always `YYYY-MM`, zero-padded; lexicographic order is
    /// chronological order.
    pub key: String,
    pub label: String,
    /// True when the month came from the row position rather than the
    /// cell content.
    pub inferred: bool,
}

/// Parse a period cell. Accepted shapes, in order:
///
/// - `DD/MM/YYYY` (the day is discarded)
/// - `MM/YYYY`, or `{month name}/YYYY` with case-insensitive substring
///   matching against [`MONTH_NAMES`]
/// - `YYYY-MM`
///
/// When no month can be read, `(row_index % 12) + 1` is used and the
/// result is flagged as inferred.
pub fn parse_period(raw: &str, row_index: usize, default_year: i32) -> ParsedPeriod {
    let text = raw.trim();

    let mut month: Option<u32> = None;
    let mut year = default_year;
    let mut matched_name: Option<usize> = None;

    if text.contains('/') {
        let parts: Vec<&str> = text.split('/').collect();
        match parts.len() {
            3 => {
                month = parse_digits(parts[1]);
                year = parse_digits(parts[2]).map(|y| y as i32).unwrap_or(default_year);
            }
            2 => {
                if let Some(m) = parse_digits(parts[0]) {
                    month = Some(m);
                } else {
                    matched_name = match_month_name(parts[0]);
                    month = matched_name.map(|i| i as u32 + 1);
                }
                year = parse_digits(parts[1]).map(|y| y as i32).unwrap_or(default_year);
            }
            _ => {}
        }
    } else if text.contains('-') {
        let parts: Vec<&str> = text.split('-').collect();
        if parts.len() == 2 {
            year = parse_digits(parts[0]).map(|y| y as i32).unwrap_or(default_year);
            month = parse_digits(parts[1]);
        }
    }

    let (month, inferred) = match month {
        Some(m) => (m, false),
        None => ((row_index % 12) as u32 + 1, true),
    };

    let label = match matched_name {
        Some(idx) => format!("{}/{}", MONTH_NAMES[idx], year),
        None => text.to_string(),
    };

    ParsedPeriod {
        key: format!("{:04}-{:02}", year, month),
        label,
        inferred,
    }
}

fn parse_digits(part: &str) -> Option<u32> {
    let part = part.trim();
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Index of the first canonical month whose name appears in the given
/// text, case-insensitively.
fn match_month_name(part: &str) -> Option<usize> {
    let folded = part.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| folded.contains(&name.to_lowercase()))
}
