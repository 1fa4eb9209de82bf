//! The local workbook-file collaborator interface

use std::fs::File;
use std::path::Path;

use crate::error::{StoreError, StoreResult};

/// Read/write access to sheet-structured workbook files on local disk.
///
/// Writing one sheet preserves every sibling sheet in the file. A real
/// XLSX backend plugs in at this seam; the bundled [`CsvWorkbook`] treats
/// a CSV file as a single-sheet workbook named after the file stem.
pub trait WorkbookIo {
    /// The sheet names of a workbook file, in order
    fn sheet_names(&self, path: &Path) -> StoreResult<Vec<String>>;

    /// Read one sheet as a value grid
    fn read_sheet(&self, path: &Path, name: &str) -> StoreResult<Vec<Vec<String>>>;

    /// Replace one sheet's contents, leaving sibling sheets untouched
    fn write_sheet(&self, path: &Path, name: &str, grid: &[Vec<String>]) -> StoreResult<()>;
}

/// CSV-backed workbook: one sheet per file, named by the file stem
#[derive(Debug, Default)]
pub struct CsvWorkbook;

impl CsvWorkbook {
    pub fn new() -> Self {
        Self
    }

    fn stem(path: &Path) -> String {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

impl WorkbookIo for CsvWorkbook {
    fn sheet_names(&self, path: &Path) -> StoreResult<Vec<String>> {
        if !path.is_file() {
            return Err(StoreError::FileNotFound(path.display().to_string()));
        }
        Ok(vec![Self::stem(path)])
    }

    fn read_sheet(&self, path: &Path, name: &str) -> StoreResult<Vec<Vec<String>>> {
        if name != Self::stem(path) {
            return Err(StoreError::WorksheetNotFound {
                key: path.display().to_string(),
                sheet: name.to_string(),
            });
        }
        read_csv_grid(path)
    }

    fn write_sheet(&self, path: &Path, name: &str, grid: &[Vec<String>]) -> StoreResult<()> {
        if name != Self::stem(path) {
            return Err(StoreError::WorksheetNotFound {
                key: path.display().to_string(),
                sheet: name.to_string(),
            });
        }
        write_csv_grid(path, grid)
    }
}

/// Read a CSV file into a string grid, tolerating ragged rows
pub(crate) fn read_csv_grid(path: &Path) -> StoreResult<Vec<Vec<String>>> {
    let file = File::open(path)
        .map_err(|_| StoreError::FileNotFound(path.display().to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(grid)
}

/// Write a string grid as a CSV file, replacing any existing contents
pub(crate) fn write_csv_grid(path: &Path, grid: &[Vec<String>]) -> StoreResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
    for row in grid {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
