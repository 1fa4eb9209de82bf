//! Directory-backed drive
//!
//! Treats a local directory tree as the store: keys are forward-slash
//! relative paths, folders are subdirectories, and CSV files are
//! single-sheet spreadsheets named after their file stem. Lets the CLI run
//! a full pipeline offline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::drive::{Drive, FileInfo, SheetAddr, SheetRef, MIME_JSON, MIME_SPREADSHEET};
use crate::error::{StoreError, StoreResult};
use crate::workbook::{read_csv_grid, write_csv_grid};

/// A [`Drive`] over a local directory
#[derive(Debug)]
pub struct LocalDrive {
    root: PathBuf,
    /// Downloads are copied here so callers can mutate or rename them
    /// without touching the store
    work_dir: PathBuf,
}

impl LocalDrive {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::with_work_dir(root, std::env::temp_dir().join("drive-etl"))
    }

    pub fn with_work_dir<P: Into<PathBuf>, W: Into<PathBuf>>(root: P, work_dir: W) -> Self {
        Self {
            root: root.into(),
            work_dir: work_dir.into(),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn sheet_path(&self, key: &str, sheet: &SheetRef) -> StoreResult<PathBuf> {
        let path = self.resolve(key);
        if !path.is_file() {
            return Err(StoreError::SpreadsheetNotFound(key.to_string()));
        }
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let matches = match sheet {
            SheetRef::Index(0) => true,
            SheetRef::Index(_) => false,
            SheetRef::Name(name) => name == stem,
        };
        if !matches {
            return Err(StoreError::WorksheetNotFound {
                key: key.to_string(),
                sheet: sheet.to_string(),
            });
        }
        Ok(path)
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => MIME_SPREADSHEET,
        Some("json") => MIME_JSON,
        _ => "application/octet-stream",
    }
}

impl Drive for LocalDrive {
    fn read_worksheet(&self, key: &str, sheet: &SheetRef) -> StoreResult<Vec<Vec<String>>> {
        let path = self.sheet_path(key, sheet)?;
        read_csv_grid(&path)
    }

    fn append_rows(&self, addr: &SheetAddr, rows: &[Vec<String>]) -> StoreResult<()> {
        let path = self.sheet_path(&addr.key, &addr.sheet)?;
        let mut grid = read_csv_grid(&path)?;
        grid.extend(rows.iter().cloned());
        write_csv_grid(&path, &grid)
    }

    fn list_files(&self, folder: &str, mime: Option<&str>) -> StoreResult<Vec<FileInfo>> {
        let dir = self.resolve(folder);
        if !dir.is_dir() {
            return Err(StoreError::FolderNotFound(folder.to_string()));
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_mime = mime_for(&path);
            if mime.map_or(false, |m| m != file_mime) {
                continue;
            }
            let title = entry.file_name().to_string_lossy().to_string();
            let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
            files.push(FileInfo {
                id: format!("{}/{}", folder, title),
                title,
                modified,
                mime_type: file_mime.to_string(),
            });
        }
        Ok(files)
    }

    fn download(&self, key: &str) -> StoreResult<PathBuf> {
        let path = self.resolve(key);
        if !path.is_file() {
            return Err(StoreError::FileNotFound(key.to_string()));
        }
        std::fs::create_dir_all(&self.work_dir)?;
        let name = path
            .file_name()
            .ok_or_else(|| StoreError::FileNotFound(key.to_string()))?;
        let copy = self.work_dir.join(name);
        std::fs::copy(&path, &copy)?;
        Ok(copy)
    }

    fn upload(&self, path: &Path, folder: &str) -> StoreResult<String> {
        let dir = self.resolve(folder);
        if !dir.is_dir() {
            return Err(StoreError::FolderNotFound(folder.to_string()));
        }
        let name = path
            .file_name()
            .ok_or_else(|| StoreError::FileNotFound(path.display().to_string()))?;
        std::fs::copy(path, dir.join(name))?;
        Ok(format!("{}/{}", folder, name.to_string_lossy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_read_worksheet_by_index_and_stem() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "data/leads.csv", "A,B\n1,x\n");
        let drive = LocalDrive::new(dir.path());

        let grid = drive
            .read_worksheet("data/leads.csv", &SheetRef::Index(0))
            .unwrap();
        assert_eq!(grid, vec![vec!["A", "B"], vec!["1", "x"]]);

        let by_name = drive
            .read_worksheet("data/leads.csv", &SheetRef::Name("leads".to_string()))
            .unwrap();
        assert_eq!(by_name, grid);

        assert!(drive
            .read_worksheet("data/leads.csv", &SheetRef::Index(1))
            .is_err());
    }

    #[test]
    fn test_append_rows() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "leads.csv", "A\n1\n");
        let drive = LocalDrive::new(dir.path());

        let addr = SheetAddr {
            key: "leads.csv".to_string(),
            sheet: SheetRef::Index(0),
        };
        drive.append_rows(&addr, &[vec!["2".to_string()]]).unwrap();

        let grid = drive.read_worksheet("leads.csv", &SheetRef::Index(0)).unwrap();
        assert_eq!(grid, vec![vec!["A"], vec!["1"], vec!["2"]]);
    }

    #[test]
    fn test_list_files_by_mime() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "inbox/a.csv", "A\n");
        write(dir.path(), "inbox/b.json", "{}");
        let drive = LocalDrive::new(dir.path());

        let sheets = drive.list_files("inbox", Some(MIME_SPREADSHEET)).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].title, "a.csv");

        let json = drive.list_files("inbox", Some(MIME_JSON)).unwrap();
        assert_eq!(json.len(), 1);
        assert_eq!(json[0].id, "inbox/b.json");
    }

    #[test]
    fn test_download_copies_out_of_the_store() {
        let store = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write(store.path(), "templates/report.csv", "A\n");
        let drive = LocalDrive::with_work_dir(store.path(), work.path());

        let copy = drive.download("templates/report.csv").unwrap();
        assert_eq!(copy, work.path().join("report.csv"));
        // Mutating the copy leaves the stored template intact
        std::fs::remove_file(&copy).unwrap();
        assert!(store.path().join("templates/report.csv").is_file());
    }

    #[test]
    fn test_upload_copies_into_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        write(dir.path(), "result.csv", "A\n1\n");
        let drive = LocalDrive::new(dir.path());

        let key = drive
            .upload(&dir.path().join("result.csv"), "out")
            .unwrap();
        assert_eq!(key, "out/result.csv");
        assert!(dir.path().join("out/result.csv").is_file());
    }
}
