//! The export engine
//!
//! Projects configured columns, deduplicates, appends survivors to the
//! reference sheet, and merges the result into a template workbook under a
//! run-stamped output name. An empty projection produces no file and no
//! side effects.

use std::path::PathBuf;

use tracing::{info, warn};

use drive_etl_core::Table;
use drive_etl_store::{sanitize_key, Drive, SheetRef, WorkbookIo};

use crate::calc::{resolve_ref, Selection};
use crate::dedup::dedup;
use crate::error::{Error, Result};
use crate::functions::Registry;
use crate::settings::{ColumnSpec, ExportSpec, RowSource, RowSourceOverlay};

/// One export's result: the surviving rows and the produced file, if any
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub table: Table,
    pub path: Option<PathBuf>,
}

/// Run one export over the working table
pub fn export(
    table: &Table,
    spec: &ExportSpec,
    columns: &[ColumnSpec],
    registry: &Registry,
    drive: &dyn Drive,
    workbooks: &dyn WorkbookIo,
    stamp: &str,
) -> Result<ExportOutcome> {
    let mut picks = Vec::with_capacity(columns.len());
    for column in columns {
        match resolve_ref(table, &column.source)? {
            Selection::Single(index) => picks.push((index, column.name.clone())),
            Selection::Multi(_) => {
                return Err(Error::Resolution(format!(
                    "export column {} cannot reference multiple columns",
                    column.name
                )))
            }
        }
    }
    let projected = table.project(&picks)?;

    let reference = spec
        .reference_dataset
        .as_ref()
        .map(|overlay| RowSource::resolve(overlay, &RowSourceOverlay::default()))
        .transpose()?;
    let (unique, handle) = dedup(
        projected,
        spec.dedup_column.as_ref(),
        reference.as_ref(),
        registry,
        drive,
    )?;

    if unique.is_empty() {
        info!("no new rows to export");
        return Ok(ExportOutcome {
            table: unique,
            path: None,
        });
    }

    // Survivors register with the remote system of record before the local
    // template write; if the write fails the reference sheet is still
    // consistent.
    let mut appended = false;
    if let Some(handle) = &handle {
        let rows = align_to_reference(&unique, &handle.columns)?;
        drive.append_rows(&handle.addr, &rows)?;
        appended = true;
    }

    match merge_into_template(&unique, spec, columns, drive, workbooks, stamp) {
        Ok(path) => {
            info!(rows = unique.len(), path = %path.display(), "export written");
            if let Some(folder) = &spec.export_folder {
                drive.upload(&path, folder)?;
            }
            Ok(ExportOutcome {
                table: unique,
                path: Some(path),
            })
        }
        Err(error) => {
            if appended {
                warn!(
                    rows = unique.len(),
                    "rows were appended to the reference sheet but the export failed; \
                     the produced file is missing while the reference is already updated"
                );
            }
            Err(error)
        }
    }
}

/// Order appended rows by the reference sheet's own columns when they all
/// exist in the projection; otherwise append in projected order (covers a
/// headerless reference sheet).
fn align_to_reference(unique: &Table, reference_columns: &[String]) -> Result<Vec<Vec<String>>> {
    let aligned = !reference_columns.is_empty()
        && reference_columns
            .iter()
            .all(|c| unique.column_index(c).is_ok());
    if !aligned {
        return Ok(unique.rows_to_strings());
    }
    let picks: Vec<(usize, String)> = reference_columns
        .iter()
        .map(|c| Ok((unique.column_index(c)?, c.clone())))
        .collect::<Result<_>>()?;
    Ok(unique.project(&picks)?.rows_to_strings())
}

/// Merge the surviving rows beneath the template's existing rows and
/// rename the file with the export's sheet and the run stamp.
fn merge_into_template(
    unique: &Table,
    spec: &ExportSpec,
    columns: &[ColumnSpec],
    drive: &dyn Drive,
    workbooks: &dyn WorkbookIo,
    stamp: &str,
) -> Result<PathBuf> {
    let path = drive.download(&sanitize_key(&spec.excel.key))?;
    let sheet_name = match &spec.excel.sheet {
        SheetRef::Index(i) => {
            let names = workbooks.sheet_names(&path)?;
            names.get(*i).cloned().ok_or_else(|| {
                Error::Resolution(format!(
                    "template {} has no sheet at position {}",
                    path.display(),
                    i
                ))
            })?
        }
        SheetRef::Name(name) => name.clone(),
    };

    let template = workbooks.read_sheet(&path, &sheet_name)?;
    if let Some(header) = template.first() {
        // Column alignment is positional; count mismatches are config bugs
        if header.len() != unique.column_count() {
            return Err(Error::Schema {
                sheet: sheet_name,
                expected: unique.column_count(),
                actual: header.len(),
            });
        }
    }

    let mut merged: Vec<Vec<String>> =
        vec![columns.iter().map(|c| c.header().to_string()).collect()];
    merged.extend(template.iter().skip(1).cloned());
    merged.extend(unique.rows_to_strings());
    workbooks.write_sheet(&path, &sheet_name, &merged)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("xlsx")
        .to_string();
    let out_path = path.with_file_name(format!("New_{}_{}.{}", sheet_name, stamp, extension));
    std::fs::rename(&path, &out_path)?;
    Ok(out_path)
}
