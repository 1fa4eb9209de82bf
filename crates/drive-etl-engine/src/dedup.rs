//! The deduplication engine
//!
//! Computes a derived key column, excludes rows already present in a
//! reference dataset, and drops internal duplicates keeping the last
//! occurrence. The only row-count-reducing stage in the pipeline.

use std::collections::HashSet;

use rand::Rng;

use drive_etl_core::Table;
use drive_etl_store::{Drive, SheetAddr};

use crate::calc;
use crate::error::Result;
use crate::functions::Registry;
use crate::loader::load_one_raw;
use crate::settings::{CalcSpec, RowSource};

/// A live pointer to the reference sheet, for appending accepted rows
#[derive(Debug, Clone)]
pub struct ReferenceHandle {
    pub addr: SheetAddr,
    /// The reference table's column names, for aligning appended rows
    pub columns: Vec<String>,
}

/// Internal key column name, guaranteed collision-free with real columns
fn key_column_name(table: &Table) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = format!("dedup_key_{:08x}", rng.gen::<u32>());
        if !table.columns().iter().any(|c| *c == candidate) {
            return candidate;
        }
    }
}

/// Deduplicate a table by a derived key.
///
/// Without a key calculation the table passes through unchanged. With a
/// reference descriptor, rows whose key already exists in the reference
/// table are dropped first, and the reference sheet's address comes back
/// as a live append handle. Internal duplicates then resolve in favor of
/// the last occurrence. The key column never appears in the result.
pub fn dedup(
    mut table: Table,
    key_calc: Option<&CalcSpec>,
    reference: Option<&RowSource>,
    registry: &Registry,
    drive: &dyn Drive,
) -> Result<(Table, Option<ReferenceHandle>)> {
    let Some(key_calc) = key_calc else {
        return Ok((table, None));
    };

    let key_name = key_column_name(&table);
    let keys = calc::apply(&table, key_calc, registry)?;
    table.add_column(key_name.clone(), keys)?;
    let key_index = table.column_index(&key_name)?;

    let mut handle = None;
    if let Some(reference) = reference {
        let reference_table = load_one_raw(reference, drive)?;
        let reference_keys: HashSet<String> = calc::apply(&reference_table, key_calc, registry)?
            .iter()
            .map(|v| v.to_string())
            .collect();
        table.retain_rows(|_, row| !reference_keys.contains(&row[key_index].to_string()));
        handle = Some(ReferenceHandle {
            addr: SheetAddr {
                key: reference.key.clone(),
                sheet: reference.sheet.clone(),
            },
            columns: reference_table.columns().to_vec(),
        });
    }

    // Later rows win over earlier ones with the same key
    let keys: Vec<String> = table
        .column(key_index)?
        .iter()
        .map(|v| v.to_string())
        .collect();
    let mut seen = HashSet::new();
    let mut keep = vec![false; keys.len()];
    for (i, key) in keys.iter().enumerate().rev() {
        if seen.insert(key.clone()) {
            keep[i] = true;
        }
    }
    table.retain_rows(|i, _| keep[i]);

    table.drop_column(&key_name)?;
    Ok((table, handle))
}
