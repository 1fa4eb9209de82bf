//! # drive-etl-store
//!
//! Storage collaborator interfaces for drive-etl: the [`Drive`] trait for
//! the remote spreadsheet/file store, the [`WorkbookIo`] trait for local
//! workbook files, plus a directory-backed implementation ([`LocalDrive`])
//! and an in-memory one for tests ([`MemoryDrive`]).

mod drive;
mod error;
mod key;
mod local;
mod memory;
mod workbook;

pub use drive::{Drive, FileInfo, SheetAddr, SheetRef, MIME_JSON, MIME_SPREADSHEET};
pub use error::{StoreError, StoreResult};
pub use key::sanitize_key;
pub use local::LocalDrive;
pub use memory::MemoryDrive;
pub use workbook::{CsvWorkbook, WorkbookIo};
