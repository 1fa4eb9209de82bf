//! The remote storage collaborator interface

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Mime type reported for spreadsheet-typed files
pub const MIME_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";

/// Mime type reported for JSON documents
pub const MIME_JSON: &str = "application/json";

/// A worksheet reference: by position or by name.
///
/// Deserialized from a JSON number or a JSON string respectively, so a
/// sheet legitimately named "7" stays a name when written as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    /// Zero-based worksheet position
    Index(usize),
    /// Worksheet name
    Name(String),
}

impl Default for SheetRef {
    fn default() -> Self {
        SheetRef::Index(0)
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::Index(i) => write!(f, "#{}", i),
            SheetRef::Name(n) => f.write_str(n),
        }
    }
}

/// A resolved pointer to one worksheet of one spreadsheet.
///
/// Returned by operations that hand back a live append target.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetAddr {
    pub key: String,
    pub sheet: SheetRef,
}

/// Metadata for one file in a folder listing
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub id: String,
    pub title: String,
    pub modified: DateTime<Utc>,
    pub mime_type: String,
}

/// The remote spreadsheet/file store.
///
/// Every pipeline stage talks to storage through this trait; transport
/// errors propagate unmodified and no operation retries.
pub trait Drive {
    /// Read the full value grid of one worksheet
    fn read_worksheet(&self, key: &str, sheet: &SheetRef) -> StoreResult<Vec<Vec<String>>>;

    /// Append rows beneath the existing data of a worksheet
    fn append_rows(&self, addr: &SheetAddr, rows: &[Vec<String>]) -> StoreResult<()>;

    /// List files in a folder, optionally filtered by mime type
    fn list_files(&self, folder: &str, mime: Option<&str>) -> StoreResult<Vec<FileInfo>>;

    /// Fetch a file to local disk and return its path
    fn download(&self, key: &str) -> StoreResult<PathBuf>;

    /// Store a local file into a folder, returning its new key
    fn upload(&self, path: &Path, folder: &str) -> StoreResult<String>;
}
