//! # Fiscal Impact Analyzer
//!
//! A library for turning semi-structured monthly-revenue spreadsheets
//! (unknown column naming and order, Brazilian-formatted numbers, stray
//! instruction rows) into a normalized, aggregated tax reform impact
//! summary plus a data-sufficiency assessment.
//!
//! ## Core Concepts
//!
//! - **Raw table**: the spreadsheet exactly as decoded, columns named as
//!   the user named them
//! - **Role classification**: deterministic, rule-based binding of each
//!   column to its semantic role (period, inbound/outbound amount,
//!   inbound/outbound note count)
//! - **Normalization**: locale-tolerant conversion of cells into amounts
//!   and canonical `YYYY-MM` period keys, with per-row failure isolation
//! - **Aggregation**: full-precision totals and fixed-rate CBS, IBS and
//!   pension impact figures, rounded to cents only at output
//! - **Sufficiency advice**: an independent heuristic pass that grades
//!   the input data without ever blocking the pipeline
//!
//! ## Example
//!
//! ```rust,ignore
//! use fiscal_impact_analyzer::*;
//!
//! let bytes = std::fs::read("faturamento.csv")?;
//! let table = decode_table(&bytes, SourceFormat::Csv)?;
//!
//! let outcome = TaxImpactAnalyzer::new().analyze(&table)?;
//! println!("net impact: {}", outcome.summary.net_impact);
//! for rec in &outcome.sufficiency.recommendations {
//!     println!("- {}", rec);
//! }
//! ```

pub mod advisor;
pub mod aggregate;
pub mod classifier;
pub mod decode;
pub mod error;
pub mod normalize;
pub mod period;
pub mod registry;
pub mod rows;
pub mod schema;
pub mod template;

pub use advisor::assess;
pub use aggregate::{round_cents, summarize, CBS_RATE, IBS_RATE, PENSION_RATE};
pub use classifier::{ClassificationTrace, ColumnClassifier, RoleDecision};
pub use decode::{decode_table, DecodeError, SourceFormat};
pub use error::{AnalysisError, Result};
pub use normalize::{normalize_amount, normalize_count};
pub use period::{parse_period, ParsedPeriod, MONTH_NAMES};
pub use registry::{clean_cnpj, format_cnpj, CompanyProfile, RegistryError};
pub use rows::process_rows;
pub use schema::*;
pub use template::{TemplateSchema, CANONICAL_HEADERS};

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything one analysis run produces: the aggregated summary, the
/// advisor's report, and the classifier's decision trace for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisOutcome {
    pub summary: TaxImpactSummary,
    pub sufficiency: SufficiencyReport,
    pub trace: ClassificationTrace,
}

impl AnalysisOutcome {
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The staged pipeline over a decoded table: classification must succeed
/// before any row is read, every row is visited before aggregation, and
/// the advisor runs independently of all three.
pub struct TaxImpactAnalyzer {
    config: AnalyzerConfig,
}

impl TaxImpactAnalyzer {
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, table: &RawTable) -> Result<AnalysisOutcome> {
        info!(
            "analyzing table with {} columns and {} rows",
            table.columns().len(),
            table.row_count()
        );

        let sufficiency = advisor::assess(table, &self.config);

        let (roles, trace) = ColumnClassifier::new().classify(table.columns())?;
        for decision in &trace.decisions {
            debug!(
                "column '{}' bound to {} by rule {}",
                decision.column, decision.role, decision.rule
            );
        }

        let records = rows::process_rows(table, &roles, &self.config);
        debug!("{} monthly records produced", records.len());

        let summary = aggregate::summarize(records, &self.config);

        Ok(AnalysisOutcome {
            summary,
            sufficiency,
            trace,
        })
    }
}

impl Default for TaxImpactAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper over [`TaxImpactAnalyzer`] with default
/// configuration.
pub fn analyze_table(table: &RawTable) -> Result<AnalysisOutcome> {
    TaxImpactAnalyzer::new().analyze(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|s| CellValue::from(*s)).collect()
    }

    #[test]
    fn test_end_to_end_analysis() {
        let table = RawTable::from_rows(
            &CANONICAL_HEADERS,
            vec![
                row(&["Janeiro/2025", "10.000,50", "8.000,00", "5", "4", ""]),
                row(&["Fevereiro/2025", "", "", "", "", ""]),
            ],
        );

        let outcome = analyze_table(&table).unwrap();

        let records = &outcome.summary.monthly_records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].period_key, "2025-01");
        assert_eq!(records[0].inbound_amount, 10000.50);
        assert_eq!(records[0].outbound_amount, 8000.00);
        assert_eq!(records[1].inbound_amount, 0.0);
        assert_eq!(records[1].outbound_amount, 0.0);

        assert_eq!(outcome.summary.inbound_total, 10000.50);
        assert_eq!(outcome.summary.outbound_total, 8000.00);
        assert_eq!(outcome.summary.cbs_impact, 960.00);
        assert_eq!(outcome.summary.ibs_impact, 400.00);
        assert_eq!(outcome.summary.pension_impact, 200.01);
        assert_eq!(outcome.summary.net_impact, 1159.99);

        assert_eq!(outcome.trace.decisions.len(), 5);
    }

    #[test]
    fn test_classification_failure_is_fatal() {
        let table = RawTable::from_rows(
            &["Coluna A", "Coluna B"],
            vec![row(&["x", "y"])],
        );

        let err = analyze_table(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingColumns { .. }));
    }

    #[test]
    fn test_advisor_report_is_attached() {
        let table = RawTable::from_rows(
            &CANONICAL_HEADERS,
            vec![row(&["Janeiro/2025", "100,00", "50,00", "1", "1", ""])],
        );

        let outcome = analyze_table(&table).unwrap();
        assert!(outcome.sufficiency.sufficient);
        assert!(!outcome.sufficiency.recommendations.is_empty());
    }
}
