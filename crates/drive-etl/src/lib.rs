//! # drive-etl
//!
//! A configuration-driven ETL pipeline for sheet-sized tabular data.
//!
//! One declarative JSON settings document describes where input
//! worksheets live, which derived columns to calculate, how rows
//! deduplicate against a reference dataset, and which template workbooks
//! the results merge into. The pipeline runs synchronously, one dataset
//! and one export at a time, against injectable storage collaborators.
//!
//! ## Example
//!
//! ```rust,no_run
//! use drive_etl::prelude::*;
//!
//! let drive = LocalDrive::new("/data/store");
//! let workbooks = CsvWorkbook::new();
//! let mut manager = DatasetManager::new(&drive, &workbooks);
//!
//! let location = SettingsLocation::Path {
//!     path: "settings.json".into(),
//! };
//! let outcomes = manager.run_update(&location)?;
//! for dataset in &outcomes {
//!     for path in dataset.paths() {
//!         println!("created {}", path.display());
//!     }
//! }
//! # Ok::<(), drive_etl::Error>(())
//! ```

pub mod prelude;

// Re-export core types
pub use drive_etl_core::{Error as CoreError, Table, Value};

// Re-export storage collaborator types
pub use drive_etl_store::{
    sanitize_key, CsvWorkbook, Drive, FileInfo, LocalDrive, MemoryDrive, SheetAddr, SheetRef,
    StoreError, StoreResult, WorkbookIo, MIME_JSON, MIME_SPREADSHEET,
};

// Re-export engine types
pub use drive_etl_engine::{
    CalcInput,
    CalcSpec,
    ColumnRef,
    ColumnSpec,
    DatasetManager,
    DatasetOutcome,
    DatasetSettings,
    // Error types
    Error,
    ExcelRef,
    ExportOutcome,
    ExportSpec,
    FunctionDef,
    InputKind,
    InputSettings,
    // Main types
    Registry,
    Result,
    RowSource,
    RowSourceOverlay,
    Settings,
    SettingsLocation,
    Violation,
};
