//! Commonly used types, importable in one line

pub use drive_etl_core::{Table, Value};
pub use drive_etl_engine::{
    DatasetManager, DatasetOutcome, Error, ExportOutcome, Registry, Result, Settings,
    SettingsLocation,
};
pub use drive_etl_store::{
    CsvWorkbook, Drive, LocalDrive, MemoryDrive, SheetAddr, SheetRef, WorkbookIo,
};
