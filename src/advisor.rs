use crate::aggregate::{CBS_RATE, IBS_RATE, PENSION_RATE};
use crate::classifier::{
    contains_any, fold, INBOUND_KEYWORDS, OUTBOUND_KEYWORDS, PERIOD_KEYWORDS, QUANTITY_TOKEN,
};
use crate::normalize::normalize_amount;
use crate::schema::{
    AnalyzerConfig, ColumnRole, ConfidenceLevel, RawTable, SufficiencyReport,
};
use std::collections::HashSet;

/// Minimum fraction of filled cells in an amount column before the
/// advisor recommends completing it.
const FILLED_FRACTION_FLOOR: f64 = 0.8;
const MIN_DISTINCT_PERIODS: usize = 3;

#[derive(Debug, Default)]
struct DetectedColumns {
    period: Option<String>,
    inbound: Option<String>,
    outbound: Option<String>,
    inbound_count: Option<String>,
    outbound_count: Option<String>,
}

// Looser cousin of the classifier's role detection: keyword presence only,
// no currency-marker requirement, because the advisor only decides whether
// a role exists at all.
fn detect_columns(table: &RawTable) -> DetectedColumns {
    let mut detected = DetectedColumns::default();

    for name in table.columns() {
        let folded = fold(name);

        if folded.contains(QUANTITY_TOKEN) && contains_any(&folded, INBOUND_KEYWORDS) {
            detected.inbound_count.get_or_insert_with(|| name.clone());
        } else if folded.contains(QUANTITY_TOKEN) && contains_any(&folded, OUTBOUND_KEYWORDS) {
            detected.outbound_count.get_or_insert_with(|| name.clone());
        } else if contains_any(&folded, PERIOD_KEYWORDS) {
            detected.period.get_or_insert_with(|| name.clone());
        } else if contains_any(&folded, INBOUND_KEYWORDS) {
            detected.inbound.get_or_insert_with(|| name.clone());
        } else if contains_any(&folded, OUTBOUND_KEYWORDS) {
            detected.outbound.get_or_insert_with(|| name.clone());
        }
    }

    detected
}

/// Assess whether the raw table carries enough data for a meaningful
/// impact estimate. Runs directly on the uninterpreted table, never on
/// classified records, and never blocks the main pipeline.
pub fn assess(table: &RawTable, config: &AnalyzerConfig) -> SufficiencyReport {
    let detected = detect_columns(table);

    let mut missing_roles = Vec::new();
    if detected.period.is_none() {
        missing_roles.push(ColumnRole::Period);
    }
    if detected.inbound.is_none() {
        missing_roles.push(ColumnRole::InboundAmount);
    }
    if detected.outbound.is_none() {
        missing_roles.push(ColumnRole::OutboundAmount);
    }

    let mut sufficient = missing_roles.is_empty();
    let mut findings = Vec::new();

    if sufficient {
        if table.row_count() == 0 {
            sufficient = false;
            findings.push(
                "The spreadsheet has no data rows; add at least one month of figures.".to_string(),
            );
        } else {
            let inbound = detected.inbound.as_deref().unwrap_or_default();
            let outbound = detected.outbound.as_deref().unwrap_or_default();
            let period = detected.period.as_deref().unwrap_or_default();

            if filled_fraction(table, inbound) < FILLED_FRACTION_FLOOR {
                findings.push(
                    "Some inbound amount cells are empty; fill them in for a more precise result."
                        .to_string(),
                );
            }
            if filled_fraction(table, outbound) < FILLED_FRACTION_FLOOR {
                findings.push(
                    "Some outbound amount cells are empty; fill them in for a more precise result."
                        .to_string(),
                );
            }

            if distinct_periods(table, period) < MIN_DISTINCT_PERIODS {
                findings.push(
                    "At least 3 months of history is recommended for a reliable analysis."
                        .to_string(),
                );
            }

            if column_total(table, inbound) == 0.0 {
                findings.push(
                    "The inbound total is zero; check that the data is correct.".to_string(),
                );
            }
            if column_total(table, outbound) == 0.0 {
                findings.push(
                    "The outbound total is zero; check that the data is correct.".to_string(),
                );
            }
        }
    }

    // Confidence counts only the data-quality findings above, not the
    // fixed guidance appended below.
    let (confidence, message) = match (sufficient, findings.len()) {
        (true, 0) => (
            ConfidenceLevel::High,
            "Data is sufficient to estimate the reform impact with high precision.",
        ),
        (true, 1..=2) => (
            ConfidenceLevel::Medium,
            "Data is sufficient, but a few points would improve precision.",
        ),
        (true, _) => (
            ConfidenceLevel::Medium,
            "Data is sufficient, but there are several important recommendations.",
        ),
        (false, _) => (
            ConfidenceLevel::Low,
            "Data is insufficient; essential columns or rows are missing.",
        ),
    };

    let mut recommendations = findings;

    if detected.inbound_count.is_none() && detected.outbound_count.is_none() {
        recommendations
            .push("Adding note counts helps validate the reported amounts.".to_string());
    }

    recommendations.push(format!(
        "CBS ({:.0}%) and IBS ({:.0}%) are estimated from the total outbound amount.",
        CBS_RATE * 100.0,
        IBS_RATE * 100.0
    ));
    recommendations.push(format!(
        "The pension contribution ({:.0}%) is estimated from the total inbound amount.",
        PENSION_RATE * 100.0
    ));
    recommendations.push(format!(
        "Check that the reported periods fall within the analysis year ({}).",
        config.default_year
    ));

    SufficiencyReport {
        sufficient,
        message: message.to_string(),
        missing_roles,
        recommendations,
        confidence,
    }
}

fn filled_fraction(table: &RawTable, column: &str) -> f64 {
    let rows = table.row_count();
    if rows == 0 {
        return 0.0;
    }
    let filled = (0..rows)
        .filter(|&i| table.cell(i, column).map(|c| !c.is_empty()).unwrap_or(false))
        .count();
    filled as f64 / rows as f64
}

fn distinct_periods(table: &RawTable, column: &str) -> usize {
    let mut seen = HashSet::new();
    for i in 0..table.row_count() {
        if let Some(cell) = table.cell(i, column) {
            if !cell.is_blank() {
                seen.insert(cell.to_string().trim().to_string());
            }
        }
    }
    seen.len()
}

fn column_total(table: &RawTable, column: &str) -> f64 {
    (0..table.row_count())
        .filter_map(|i| table.cell(i, column))
        .map(normalize_amount)
        .sum()
}
