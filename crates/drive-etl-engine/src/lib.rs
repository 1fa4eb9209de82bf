//! # drive-etl-engine
//!
//! The settings-driven transformation pipeline: a declarative JSON
//! document describing inputs, per-column calculations, deduplication
//! keys, and exports is interpreted into a sequence of tabular operations
//! with exhaustive validation reporting.

pub mod calc;
pub mod dedup;
pub mod export;
pub mod functions;
pub mod loader;
pub mod resolve;
pub mod runner;
pub mod settings;

mod error;

pub use error::{Error, Result, Violation};
pub use export::ExportOutcome;
pub use functions::{CalcInput, FunctionDef, FunctionImpl, Registry};
pub use runner::{DatasetManager, DatasetOutcome};
pub use settings::{
    CalcSpec, ColumnRef, ColumnSpec, DatasetSettings, ExcelRef, ExportSpec, InputKind,
    InputSettings, RowSource, RowSourceOverlay, Settings, SettingsLocation,
};
