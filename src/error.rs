use crate::decode::DecodeError;
use crate::schema::ColumnRole;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(
        "spreadsheet is missing required columns: {}; columns found: [{}]",
        join_roles(.missing),
        .columns.join(", ")
    )]
    MissingColumns {
        missing: Vec<ColumnRole>,
        columns: Vec<String>,
    },

    #[error("column '{column}' was bound to the {role} role but looks like a note-count column")]
    QuantityMisbound { role: ColumnRole, column: String },

    #[error("failed to decode spreadsheet: {0}")]
    Decode(#[from] DecodeError),
}

fn join_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
