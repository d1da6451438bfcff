// crates/core/src/error.rs
use thiserror::Error;

/// Input rejected at the boundary, before any storage is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Invalid date '{value}' for {field} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("period_start {start} is after period_end {end}")]
    InvertedPeriod { start: String, end: String },

    #[error("{field} out of range: {message}")]
    OutOfRange {
        field: &'static str,
        message: String,
    },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown field '{field}' on table {table}")]
    UnknownField { table: &'static str, field: String },

    #[error("Field '{field}' on table {table} is read-only")]
    ReadOnlyField { table: &'static str, field: String },

    #[error("Field '{field}' expects {expected}")]
    InvalidFieldType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Table {0} does not accept writes through the records API")]
    TableNotWritable(&'static str),

    #[error("Request body must contain at least one field")]
    EmptyPatch,
}

impl ValidationError {
    pub fn out_of_range(field: &'static str, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            field,
            message: message.into(),
        }
    }
}

/// Failure reported by a storage backend behind one of the core storage traits.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}
