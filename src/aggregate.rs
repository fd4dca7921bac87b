use crate::schema::{AnalyzerConfig, MonthlyRecord, TaxImpactSummary};
use chrono::NaiveDate;

/// Fixed reform rates. These are part of the simplified model, not
/// configuration.
pub const CBS_RATE: f64 = 0.12;
pub const IBS_RATE: f64 = 0.05;
pub const PENSION_RATE: f64 = 0.02;

/// Round a monetary value to cents. Applied once, at the point of output;
/// accumulation always runs at full precision.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sum the sorted record list into totals and fixed-rate impact figures.
///
/// With no records at all, the period bounds fall back to the full fiscal
/// year of the configured default year and every figure is zero.
pub fn summarize(records: Vec<MonthlyRecord>, config: &AnalyzerConfig) -> TaxImpactSummary {
    let inbound_total: f64 = records.iter().map(|r| r.inbound_amount).sum();
    let outbound_total: f64 = records.iter().map(|r| r.outbound_amount).sum();

    let cbs_impact = outbound_total * CBS_RATE;
    let ibs_impact = outbound_total * IBS_RATE;
    let pension_impact = inbound_total * PENSION_RATE;
    let net_impact = cbs_impact + ibs_impact - pension_impact;

    let (period_start, period_end) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first.period_key.clone(), last.period_key.clone()),
        _ => placeholder_range(config.default_year),
    };

    TaxImpactSummary {
        inbound_total: round_cents(inbound_total),
        outbound_total: round_cents(outbound_total),
        cbs_impact: round_cents(cbs_impact),
        ibs_impact: round_cents(ibs_impact),
        pension_impact: round_cents(pension_impact),
        net_impact: round_cents(net_impact),
        period_start,
        period_end,
        monthly_records: records,
    }
}

// Full-year placeholder bounds for an empty import.
fn placeholder_range(year: i32) -> (String, String) {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).expect("January 1st always exists");
    let end = NaiveDate::from_ymd_opt(year, 12, 31).expect("December 31st always exists");
    (
        start.format("%Y-%m-%d").to_string(),
        end.format("%Y-%m-%d").to_string(),
    )
}
