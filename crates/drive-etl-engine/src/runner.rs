//! The run orchestrator
//!
//! Resolves the settings document, loads the function registry, and drives
//! input loading, calculation, deduplication, and export for each declared
//! dataset in sequence.

use chrono::Utc;
use tracing::info;

use drive_etl_core::Table;
use drive_etl_store::{Drive, WorkbookIo};

use crate::calc::run_calculations;
use crate::error::Result;
use crate::export::{export, ExportOutcome};
use crate::functions::Registry;
use crate::loader::{load_table, resolve_inputs};
use crate::resolve::resolve_document;
use crate::settings::{DatasetSettings, Settings, SettingsLocation};

/// One dataset's results, one entry per declared export
#[derive(Debug, Clone)]
pub struct DatasetOutcome {
    pub exports: Vec<ExportOutcome>,
}

impl DatasetOutcome {
    fn nothing(dataset: &DatasetSettings) -> Self {
        Self {
            exports: dataset
                .exports
                .iter()
                .map(|_| ExportOutcome {
                    table: Table::empty(),
                    path: None,
                })
                .collect(),
        }
    }

    /// Paths of every file this dataset produced
    pub fn paths(&self) -> impl Iterator<Item = &std::path::Path> {
        self.exports
            .iter()
            .filter_map(|e| e.path.as_deref())
    }
}

/// Drives complete update runs against a storage collaborator.
///
/// Holds the only state that survives between pipeline stages: the loaded
/// function registry (replaced wholesale on every load) and the run-start
/// timestamp used to build unique output names.
pub struct DatasetManager<'a> {
    drive: &'a dyn Drive,
    workbooks: &'a dyn WorkbookIo,
    registry: Registry,
    start_stamp: String,
}

impl<'a> DatasetManager<'a> {
    pub fn new(drive: &'a dyn Drive, workbooks: &'a dyn WorkbookIo) -> Self {
        Self {
            drive,
            workbooks,
            registry: Registry::builtin(),
            start_stamp: String::new(),
        }
    }

    /// Resolve settings and run every declared dataset
    pub fn run_update(&mut self, location: &SettingsLocation) -> Result<Vec<DatasetOutcome>> {
        self.start_stamp = Utc::now().timestamp().to_string();
        let settings: Settings = serde_json::from_value(resolve_document(location, self.drive)?)?;
        info!(datasets = settings.datasets.len(), "settings resolved");

        let mut outcomes = Vec::with_capacity(settings.datasets.len());
        for (index, dataset) in settings.datasets.iter().enumerate() {
            info!(dataset = index, "updating dataset");
            outcomes.push(self.update_dataset(dataset, settings.functions.as_ref())?);
        }
        Ok(outcomes)
    }

    fn update_dataset(
        &mut self,
        dataset: &DatasetSettings,
        default_functions: Option<&SettingsLocation>,
    ) -> Result<DatasetOutcome> {
        if let Some(source) = dataset.functions.as_ref().or(default_functions) {
            self.registry = Registry::load(source, self.drive)?;
        }

        let sources = resolve_inputs(&dataset.inputs, self.drive)?;
        if sources.is_empty() {
            info!("no inputs found");
            return Ok(DatasetOutcome::nothing(dataset));
        }

        let loaded = load_table(&sources, self.drive)?;
        if loaded.table.is_empty() {
            info!("all input files are empty");
            return Ok(DatasetOutcome::nothing(dataset));
        }

        let mut table = loaded.table;
        run_calculations(
            &mut table,
            &dataset.calculations,
            &self.registry,
            &loaded.origins,
        )?;

        let mut exports = Vec::with_capacity(dataset.exports.len());
        for (index, spec) in dataset.exports.iter().enumerate() {
            let columns = dataset.export_columns(index)?;
            exports.push(export(
                &table,
                spec,
                columns,
                &self.registry,
                self.drive,
                self.workbooks,
                &self.start_stamp,
            )?);
        }
        Ok(DatasetOutcome { exports })
    }
}
