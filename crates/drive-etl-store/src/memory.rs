//! In-memory drive, used by tests and examples

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::drive::{Drive, FileInfo, SheetAddr, SheetRef, MIME_SPREADSHEET};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct NamedSheet {
    title: String,
    grid: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    title: String,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    spreadsheets: HashMap<String, Vec<NamedSheet>>,
    files: HashMap<String, StoredFile>,
    folders: HashMap<String, Vec<FileInfo>>,
    uploads: Vec<(PathBuf, String)>,
}

/// An in-memory [`Drive`] for tests.
///
/// Spreadsheets, files, and folder listings are seeded through the
/// builder-style `add_*` methods; appended rows and uploads are observable
/// afterwards. Downloads materialize file content under `download_dir`.
#[derive(Debug)]
pub struct MemoryDrive {
    inner: RefCell<Inner>,
    download_dir: PathBuf,
}

impl MemoryDrive {
    pub fn new<P: Into<PathBuf>>(download_dir: P) -> Self {
        Self {
            inner: RefCell::new(Inner::default()),
            download_dir: download_dir.into(),
        }
    }

    /// Seed a spreadsheet with its worksheets
    pub fn add_spreadsheet<K: Into<String>>(
        &self,
        key: K,
        sheets: Vec<(String, Vec<Vec<String>>)>,
    ) {
        self.inner.borrow_mut().spreadsheets.insert(
            key.into(),
            sheets
                .into_iter()
                .map(|(title, grid)| NamedSheet { title, grid })
                .collect(),
        );
    }

    /// Seed a downloadable file
    pub fn add_file<K: Into<String>, T: Into<String>>(&self, key: K, title: T, content: Vec<u8>) {
        self.inner.borrow_mut().files.insert(
            key.into(),
            StoredFile {
                title: title.into(),
                content,
            },
        );
    }

    /// Register a file in a folder listing
    pub fn place_in_folder(
        &self,
        folder: &str,
        id: &str,
        title: &str,
        mime_type: &str,
        modified: DateTime<Utc>,
    ) {
        self.inner
            .borrow_mut()
            .folders
            .entry(folder.to_string())
            .or_default()
            .push(FileInfo {
                id: id.to_string(),
                title: title.to_string(),
                modified,
                mime_type: mime_type.to_string(),
            });
    }

    /// Register a seeded spreadsheet in a folder listing
    pub fn place_spreadsheet_in_folder(
        &self,
        folder: &str,
        id: &str,
        title: &str,
        modified: DateTime<Utc>,
    ) {
        self.place_in_folder(folder, id, title, MIME_SPREADSHEET, modified);
    }

    /// Current rows of a worksheet (test accessor)
    pub fn sheet_rows(&self, key: &str, sheet: &SheetRef) -> StoreResult<Vec<Vec<String>>> {
        let inner = self.inner.borrow();
        let sheets = inner
            .spreadsheets
            .get(key)
            .ok_or_else(|| StoreError::SpreadsheetNotFound(key.to_string()))?;
        Ok(find_sheet(key, sheets, sheet)?.grid.clone())
    }

    /// Files uploaded so far, as `(local path, folder)` pairs (test accessor)
    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.inner.borrow().uploads.clone()
    }
}

fn find_sheet<'a>(
    key: &str,
    sheets: &'a [NamedSheet],
    sheet: &SheetRef,
) -> StoreResult<&'a NamedSheet> {
    let found = match sheet {
        SheetRef::Index(i) => sheets.get(*i),
        SheetRef::Name(name) => sheets.iter().find(|s| s.title == *name),
    };
    found.ok_or_else(|| StoreError::WorksheetNotFound {
        key: key.to_string(),
        sheet: sheet.to_string(),
    })
}

impl Drive for MemoryDrive {
    fn read_worksheet(&self, key: &str, sheet: &SheetRef) -> StoreResult<Vec<Vec<String>>> {
        self.sheet_rows(key, sheet)
    }

    fn append_rows(&self, addr: &SheetAddr, rows: &[Vec<String>]) -> StoreResult<()> {
        let mut inner = self.inner.borrow_mut();
        let sheets = inner
            .spreadsheets
            .get_mut(&addr.key)
            .ok_or_else(|| StoreError::SpreadsheetNotFound(addr.key.clone()))?;
        let index = match &addr.sheet {
            SheetRef::Index(i) if *i < sheets.len() => *i,
            SheetRef::Name(name) => sheets
                .iter()
                .position(|s| s.title == *name)
                .ok_or_else(|| StoreError::WorksheetNotFound {
                    key: addr.key.clone(),
                    sheet: addr.sheet.to_string(),
                })?,
            _ => {
                return Err(StoreError::WorksheetNotFound {
                    key: addr.key.clone(),
                    sheet: addr.sheet.to_string(),
                })
            }
        };
        sheets[index].grid.extend(rows.iter().cloned());
        Ok(())
    }

    fn list_files(&self, folder: &str, mime: Option<&str>) -> StoreResult<Vec<FileInfo>> {
        let inner = self.inner.borrow();
        let entries = inner
            .folders
            .get(folder)
            .ok_or_else(|| StoreError::FolderNotFound(folder.to_string()))?;
        Ok(entries
            .iter()
            .filter(|f| mime.map_or(true, |m| f.mime_type == m))
            .cloned()
            .collect())
    }

    fn download(&self, key: &str) -> StoreResult<PathBuf> {
        let inner = self.inner.borrow();
        let file = inner
            .files
            .get(key)
            .ok_or_else(|| StoreError::FileNotFound(key.to_string()))?;
        let path = self.download_dir.join(&file.title);
        std::fs::write(&path, &file.content)?;
        Ok(path)
    }

    fn upload(&self, path: &Path, folder: &str) -> StoreResult<String> {
        let mut inner = self.inner.borrow_mut();
        inner.uploads.push((path.to_path_buf(), folder.to_string()));
        Ok(format!("{}/{}", folder, path.display()))
    }
}
