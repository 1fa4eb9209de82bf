//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur against a storage collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    /// Spreadsheet not found by key
    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    /// Worksheet not found within a spreadsheet
    #[error("Worksheet {sheet} not found in {key}")]
    WorksheetNotFound { key: String, sheet: String },

    /// File not found by key
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Folder not found by key
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
