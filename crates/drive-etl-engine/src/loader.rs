//! Table loading
//!
//! Resolves a dataset's input settings into row-source descriptors,
//! fetches each worksheet, and assembles one working table with normalized
//! headers. An empty result is a terminal "nothing to do" signal, never an
//! error.

use tracing::info;

use drive_etl_core::Table;
use drive_etl_store::{sanitize_key, Drive, SheetRef, MIME_SPREADSHEET};

use crate::error::{Error, Result};
use crate::settings::{InputKind, InputSettings, RowSource, RowSourceOverlay};

/// Characters that cut a raw header short
const HEADER_STOP_CHARS: [char; 3] = ['\n', '?', '('];

/// Normalize a raw header cell: truncate at the first stop character,
/// trim, and uppercase. `"Name (old)\n?"` becomes `"NAME"`.
pub fn normalize_header(raw: &str) -> String {
    let cut = raw
        .find(|c| HEADER_STOP_CHARS.contains(&c))
        .map(|i| &raw[..i])
        .unwrap_or(raw);
    cut.trim().to_uppercase()
}

/// A working table plus, per row, the 1-based row number it had in its
/// source sheet (used to report validation violations against the sheet
/// the operator actually sees).
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    pub origins: Vec<usize>,
}

/// Resolve a dataset's input settings into row-source descriptors
pub fn resolve_inputs(inputs: &InputSettings, drive: &dyn Drive) -> Result<Vec<RowSource>> {
    match &inputs.kind {
        InputKind::List { list } => {
            info!("inputs passed directly");
            list.iter()
                .map(|overlay| RowSource::resolve(overlay, &inputs.defaults))
                .collect()
        }
        InputKind::Sheet { location } => {
            let source = RowSource::resolve(location, &RowSourceOverlay::default())?;
            info!(key = %source.key, "inputs from sheet");
            inputs_from_sheet(&source, &inputs.defaults, drive)
        }
        InputKind::Folder { location } => {
            let key = sanitize_key(
                location
                    .key
                    .as_deref()
                    .ok_or_else(|| Error::Resolution("input folder has no key".to_string()))?,
            );
            info!(folder = %key, "inputs from folder");
            let files = drive.list_files(&key, Some(MIME_SPREADSHEET))?;
            files
                .iter()
                .map(|f| {
                    let overlay = RowSourceOverlay {
                        key: Some(f.id.clone()),
                        ..Default::default()
                    };
                    RowSource::resolve(&overlay, &inputs.defaults)
                })
                .collect()
        }
    }
}

/// Read an input-listing sheet: each data row describes one row source.
///
/// Recognized columns are `key`, `sheet`, `headers`, `start`, and `end`;
/// empty cells fall through to the defaults, unknown columns are ignored.
fn inputs_from_sheet(
    source: &RowSource,
    defaults: &RowSourceOverlay,
    drive: &dyn Drive,
) -> Result<Vec<RowSource>> {
    let table = load_one_raw(source, drive)?;
    let mut resolved = Vec::with_capacity(table.len());
    for row in table.rows() {
        let mut overlay = RowSourceOverlay::default();
        for (column, value) in table.columns().iter().zip(row) {
            let text = value.to_string();
            if text.is_empty() {
                continue;
            }
            match column.as_str() {
                "key" => overlay.key = Some(text),
                "sheet" => {
                    // Worksheet cells are stringly typed; an all-digit
                    // cell is coerced to a position.
                    overlay.sheet = Some(if text.chars().all(|c| c.is_ascii_digit()) {
                        SheetRef::Index(parse_row_field("sheet", &text)?)
                    } else {
                        SheetRef::Name(text)
                    })
                }
                "headers" => overlay.headers = Some(parse_row_field("headers", &text)?),
                "start" => overlay.start = Some(parse_row_field("start", &text)?),
                "end" => {
                    if !text.to_lowercase().contains("none") {
                        overlay.end = Some(parse_row_field("end", &text)?);
                    }
                }
                _ => {}
            }
        }
        resolved.push(RowSource::resolve(&overlay, defaults)?);
    }
    Ok(resolved)
}

fn parse_row_field(field: &str, text: &str) -> Result<usize> {
    text.parse().map_err(|_| {
        Error::Resolution(format!("input sheet field {} is not an integer: {}", field, text))
    })
}

/// Fetch one row source as a table, headers left verbatim
pub fn load_one_raw(source: &RowSource, drive: &dyn Drive) -> Result<Table> {
    let grid = drive.read_worksheet(&source.key, &source.sheet)?;
    Ok(Table::from_grid(&grid, source.headers, source.start, source.end)?)
}

/// Fetch every row source and concatenate into one working table.
///
/// Headers are normalized before concatenation, so sources whose raw
/// headers differ only in annotations line up on the same columns.
pub fn load_table(sources: &[RowSource], drive: &dyn Drive) -> Result<LoadedTable> {
    let mut tables = Vec::with_capacity(sources.len());
    let mut origins = Vec::new();
    for source in sources {
        info!(key = %source.key, sheet = %source.sheet, "loading input");
        let mut grid = drive.read_worksheet(&source.key, &source.sheet)?;
        if let Some(header_row) = grid.get_mut(source.headers) {
            for cell in header_row.iter_mut() {
                *cell = normalize_header(cell);
            }
        }
        let table = Table::from_grid(&grid, source.headers, source.start, source.end)?;
        origins.extend((0..table.len()).map(|j| source.start + j + 1));
        tables.push(table);
    }
    let table = Table::concat(tables)?;
    Ok(LoadedTable { table, origins })
}
