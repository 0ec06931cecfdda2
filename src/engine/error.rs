// src/engine/error.rs

use arrow::error::ArrowError;
use thiserror::Error;

/// Failures of the aggregation engine.
///
/// Cloneable so a cached summary outcome can be handed to several readers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A column the operation needs is not in the table.
    #[error("schema mismatch: missing column `{column}` (available: {})", .available.join(", "))]
    SchemaMismatch {
        column: String,
        available: Vec<String>,
    },

    /// A month cell is null or not a number.
    #[error(
        "malformed numeric value in column `{column}` at row {row}: {}",
        .value.as_deref().unwrap_or("<null>")
    )]
    MalformedNumeric {
        column: String,
        row: usize,
        value: Option<String>,
    },

    /// The column exists but its Arrow type cannot be used here.
    #[error("column `{column}` has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },

    #[error("arrow: {0}")]
    Arrow(String),
}

impl From<ArrowError> for EngineError {
    fn from(err: ArrowError) -> Self {
        EngineError::Arrow(err.to_string())
    }
}

impl EngineError {
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, EngineError::SchemaMismatch { .. })
    }
}
