//! The settings document
//!
//! A run is driven entirely by one declarative JSON document. Every shape
//! here is a closed serde type: settings-type and input-type dispatch is a
//! match over a tagged enum, and worksheet/column references are
//! discriminated by the JSON value's own type (number vs. string) rather
//! than a "looks like an integer" test on strings.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value as Json};

use drive_etl_store::{sanitize_key, SheetRef};

use crate::error::{Error, Result};

/// Where a settings document (or function manifest) lives.
///
/// The same four shapes serve the top-level run settings and every
/// function source.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SettingsLocation {
    /// Inline literal document
    Object { object: Json },
    /// Local JSON file
    Path { path: PathBuf },
    /// Single remote file key
    Key { key: String },
    /// Remote folder; the most recently modified JSON file wins
    Folder { key: String },
}

/// A reference to one or more input columns
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    /// Absent or JSON null: the first column by position
    #[default]
    First,
    /// Column at a position
    Index(usize),
    /// Column by name
    Name(String),
    /// Several columns; the function is applied row-wise
    Many(Vec<ColumnRef>),
}

/// One projected output column
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSpec {
    /// Canonical name in the projected table
    pub name: String,
    /// Which working-table column feeds it
    #[serde(default)]
    pub source: ColumnRef,
    /// Header text written to the exported sheet, when different
    #[serde(default)]
    pub display_name: Option<String>,
}

impl ColumnSpec {
    /// The header text written to exported files
    pub fn header(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// One derived-column calculation
#[derive(Debug, Clone, Deserialize)]
pub struct CalcSpec {
    /// Name of the resulting column
    pub name: String,
    /// Registry key of the function to apply
    pub function: String,
    /// Input column reference(s)
    #[serde(default)]
    pub input: ColumnRef,
    /// Positional arguments passed after the input
    #[serde(default)]
    pub args: Vec<Json>,
    /// Keyword arguments
    #[serde(default)]
    pub kwargs: Map<String, Json>,
    /// When present, every output value must be in this set
    #[serde(default)]
    pub required_values: Option<Vec<String>>,
}

/// Partial row-source fields, as they appear in settings documents.
///
/// Merging never mutates a defaults value: [`RowSource::resolve`] builds a
/// fresh descriptor from the overlay layered over the declared defaults
/// layered over the standard ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowSourceOverlay {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub sheet: Option<SheetRef>,
    #[serde(default)]
    pub headers: Option<usize>,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

/// A resolved pointer to one worksheet's data range
#[derive(Debug, Clone, PartialEq)]
pub struct RowSource {
    pub key: String,
    pub sheet: SheetRef,
    /// Grid row holding the column names
    pub headers: usize,
    /// First data row
    pub start: usize,
    /// One past the last data row; open-ended when absent
    pub end: Option<usize>,
}

impl RowSource {
    /// Build a descriptor from an overlay and declared defaults.
    ///
    /// Standard defaults (first sheet, header row 0, data from row 1, no
    /// end) sit beneath the declared ones.
    pub fn resolve(overlay: &RowSourceOverlay, defaults: &RowSourceOverlay) -> Result<RowSource> {
        let key = overlay
            .key
            .as_deref()
            .or(defaults.key.as_deref())
            .ok_or_else(|| Error::Resolution("row source has no key".to_string()))?;
        Ok(RowSource {
            key: sanitize_key(key),
            sheet: overlay
                .sheet
                .clone()
                .or_else(|| defaults.sheet.clone())
                .unwrap_or_default(),
            headers: overlay.headers.or(defaults.headers).unwrap_or(0),
            start: overlay.start.or(defaults.start).unwrap_or(1),
            end: overlay.end.or(defaults.end),
        })
    }
}

/// Where a dataset's input rows come from
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputKind {
    /// Literal row-source descriptors
    List { list: Vec<RowSourceOverlay> },
    /// A sheet whose data rows each describe one row source
    Sheet { location: RowSourceOverlay },
    /// Every spreadsheet-typed file in a folder
    Folder { location: RowSourceOverlay },
}

/// A dataset's input configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    #[serde(flatten)]
    pub kind: InputKind,
    /// Defaults merged beneath every resolved row source
    #[serde(default)]
    pub defaults: RowSourceOverlay,
}

/// The template workbook an export merges into
#[derive(Debug, Clone, Deserialize)]
pub struct ExcelRef {
    pub key: String,
    #[serde(default)]
    pub sheet: SheetRef,
}

/// One export of a dataset
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSpec {
    /// Projected columns; a dataset-level parallel `columns` list may
    /// supply these instead
    #[serde(default)]
    pub columns: Option<Vec<ColumnSpec>>,
    /// Derives the uniqueness key; absent means no deduplication
    #[serde(default)]
    pub dedup_column: Option<CalcSpec>,
    /// Duplicate-exclusion baseline and append target
    #[serde(default)]
    pub reference_dataset: Option<RowSourceOverlay>,
    /// Template workbook and target sheet
    pub excel: ExcelRef,
    /// Folder the produced file uploads to
    #[serde(default)]
    pub export_folder: Option<String>,
}

/// One dataset: inputs, derived columns, exports
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSettings {
    /// Function source for this dataset; falls back to the top-level one
    #[serde(default)]
    pub functions: Option<SettingsLocation>,
    pub inputs: InputSettings,
    #[serde(default)]
    pub calculations: Vec<CalcSpec>,
    pub exports: Vec<ExportSpec>,
    /// Column lists parallel to `exports`, for exports that do not carry
    /// their own
    #[serde(default)]
    pub columns: Option<Vec<Vec<ColumnSpec>>>,
}

impl DatasetSettings {
    /// The column list for the export at `index`, from the export itself
    /// or the dataset-level parallel list
    pub fn export_columns(&self, index: usize) -> Result<&[ColumnSpec]> {
        if let Some(columns) = self.exports[index].columns.as_deref() {
            return Ok(columns);
        }
        self.columns
            .as_ref()
            .and_then(|lists| lists.get(index))
            .map(|list| list.as_slice())
            .ok_or_else(|| {
                Error::Resolution(format!("export {} declares no columns", index))
            })
    }
}

/// The root settings document
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Default function source for every dataset
    #[serde(default)]
    pub functions: Option<SettingsLocation>,
    pub datasets: Vec<DatasetSettings>,
}
