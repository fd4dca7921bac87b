use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet cell as delivered by the decoder: a number, a piece
/// of text, or nothing at all. Hand-edited spreadsheets mix these freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Empty, or text that trims down to nothing.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::from(s.as_str())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

/// An ordered table exactly as decoded: column names as provided, rows as
/// positional cell lists. Rows may be ragged when the source file was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows<S: Into<String> + Clone>(columns: &[S], rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns: columns.iter().cloned().map(Into::into).collect(),
            rows,
        }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column name); `None` when the column is unknown or the
    /// row is too short to reach it.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// Semantic meaning assigned to a raw spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ColumnRole {
    Period,
    InboundAmount,
    OutboundAmount,
    InboundCount,
    OutboundCount,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Period => "month/period",
            ColumnRole::InboundAmount => "inbound amount",
            ColumnRole::OutboundAmount => "outbound amount",
            ColumnRole::InboundCount => "inbound note count",
            ColumnRole::OutboundCount => "outbound note count",
        };
        write!(f, "{}", name)
    }
}

/// The classifier's final binding of roles to original column names. The
/// three mandatory roles are fields by construction; the count roles are
/// optional in real-world spreadsheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleMap {
    pub period: String,
    pub inbound_amount: String,
    pub outbound_amount: String,
    pub inbound_count: Option<String>,
    pub outbound_count: Option<String>,
}

impl RoleMap {
    pub fn column_for(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::Period => Some(&self.period),
            ColumnRole::InboundAmount => Some(&self.inbound_amount),
            ColumnRole::OutboundAmount => Some(&self.outbound_amount),
            ColumnRole::InboundCount => self.inbound_count.as_deref(),
            ColumnRole::OutboundCount => self.outbound_count.as_deref(),
        }
    }
}

/// One normalized spreadsheet row. `period_key` is always `YYYY-MM`,
/// zero-padded, so lexicographic order is chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyRecord {
    pub period_key: String,
    pub display_label: String,
    pub inbound_amount: f64,
    pub outbound_amount: f64,
    pub inbound_count: u32,
    pub outbound_count: u32,
    /// True when the month could not be read from the cell and was filled
    /// in from the row position instead. Such periods are plausible but
    /// not trustworthy.
    pub period_inferred: bool,
}

/// Aggregated totals and fixed-rate tax impact figures over the full
/// record list, rounded to cents at the point of output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaxImpactSummary {
    pub inbound_total: f64,
    pub outbound_total: f64,
    pub cbs_impact: f64,
    pub ibs_impact: f64,
    pub pension_impact: f64,
    pub net_impact: f64,
    pub period_start: String,
    pub period_end: String,
    pub monthly_records: Vec<MonthlyRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Data-sufficiency assessment produced by the advisor. Advisory only: it
/// never gates the main pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SufficiencyReport {
    pub sufficient: bool,
    pub message: String,
    pub missing_roles: Vec<ColumnRole>,
    pub recommendations: Vec<String>,
    pub confidence: ConfidenceLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Year assumed when a period cell carries no usable year.
    pub default_year: i32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { default_year: 2025 }
    }
}
