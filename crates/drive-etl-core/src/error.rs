//! Error types for drive-etl-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in drive-etl-core
#[derive(Debug, Error)]
pub enum Error {
    /// Column not found by name
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (count: {1})")]
    ColumnOutOfBounds(usize, usize),

    /// Duplicate column name
    #[error("Column name already exists: {0}")]
    DuplicateColumn(String),

    /// Column length does not match the table's row count
    #[error("Column {column} has {actual} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Header row index out of bounds for the raw grid
    #[error("Header row {0} out of bounds (grid has {1} rows)")]
    HeaderOutOfBounds(usize, usize),
}
