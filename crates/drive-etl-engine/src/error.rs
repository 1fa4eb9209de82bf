//! Engine error types

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// One calculation's required-value violations, with original sheet row
/// numbers (1-based, offset by the source's declared start row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub calculation: String,
    pub rows: Vec<usize>,
}

/// Errors raised while interpreting a run's settings
#[derive(Debug, Error)]
pub enum Error {
    /// Nothing found at a declared settings/functions/worksheet location
    #[error("Resolution failed: {0}")]
    Resolution(String),

    /// Aggregated required-value violations, exhaustive across rows and
    /// across calculations within one dataset
    #[error("Noncompliant value(s) found: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    /// Template/export column count mismatch
    #[error("Sheet {sheet}: template has {actual} columns, export has {expected}")]
    Schema {
        sheet: String,
        expected: usize,
        actual: usize,
    },

    /// Calculation names a function missing from the loaded registry
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A function source resolved but did not yield a usable registry
    #[error("Function load failed: {0}")]
    FunctionLoad(String),

    /// Too few arguments for a function
    #[error("Function {function} expects at least {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// A function argument had the wrong shape
    #[error("Function {function}: {message}")]
    Argument { function: String, message: String },

    /// Storage collaborator error, propagated unmodified
    #[error(transparent)]
    Store(#[from] drive_etl_store::StoreError),

    /// Table shape error
    #[error(transparent)]
    Core(#[from] drive_etl_core::Error),

    /// Malformed settings or manifest document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| {
            let rows: Vec<String> = v.rows.iter().map(|r| r.to_string()).collect();
            format!("{} in row(s) {}", v.calculation, rows.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
