//! Settings-document resolution
//!
//! One resolver serves both the run settings and every function source:
//! inline object, local path, single remote file, or newest JSON file in a
//! remote folder.

use serde_json::Value as Json;
use tracing::info;

use drive_etl_store::{sanitize_key, Drive, MIME_JSON};

use crate::error::{Error, Result};
use crate::settings::SettingsLocation;

/// Fetch the JSON document a [`SettingsLocation`] points at
pub fn resolve_document(location: &SettingsLocation, drive: &dyn Drive) -> Result<Json> {
    match location {
        SettingsLocation::Object { object } => Ok(object.clone()),
        SettingsLocation::Path { path } => {
            let text = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        SettingsLocation::Key { key } => load_from_key(&sanitize_key(key), drive),
        SettingsLocation::Folder { key } => {
            let key = sanitize_key(key);
            let mut files = drive.list_files(&key, Some(MIME_JSON))?;
            files.sort_by_key(|f| f.modified);
            let newest = files.last().ok_or_else(|| {
                Error::Resolution(format!("no JSON files in folder {}", key))
            })?;
            info!(folder = %key, file = %newest.title, "resolved settings from folder");
            load_from_key(&newest.id, drive)
        }
    }
}

fn load_from_key(key: &str, drive: &dyn Drive) -> Result<Json> {
    info!(%key, "loading settings file");
    let path = drive.download(key)?;
    let text = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&text)?)
}
