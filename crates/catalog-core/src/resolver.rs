//! Version resolver
//!
//! Programs are versioned by date. For every `program_id` the active row with
//! the latest date is current; equal dates fall back to the highest storage
//! key.

use catalog_model::{Program, ProgramKey};
use catalog_store::{CatalogTx, StoreResult};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Latest version date of every active program
///
/// # Errors
/// Returns error on storage failure
pub fn latest_active_versions(tx: &dyn CatalogTx) -> StoreResult<HashMap<String, DateTime<Utc>>> {
    tx.latest_active_dates()
}

/// Keep one row per `program_id`: latest date, then highest key
///
/// Rows dated before the program's entry in `latest` are dropped first.
/// Output keeps `program_id` order.
#[must_use]
pub fn select_current_versions(
    mut rows: Vec<Program>,
    latest: &HashMap<String, DateTime<Utc>>,
) -> Vec<Program> {
    rows.retain(|p| p.active && latest.get(&p.program_id) == Some(&p.date));
    rows.sort_by(|a, b| {
        a.program_id
            .cmp(&b.program_id)
            .then(b.date.cmp(&a.date))
            .then(b.key.cmp(&a.key))
    });

    let mut current: IndexMap<String, Program> = IndexMap::with_capacity(latest.len());
    for row in rows {
        current.entry(row.program_id.clone()).or_insert(row);
    }
    current.into_values().collect()
}

/// Current version of every active program
///
/// # Errors
/// Returns error on storage failure
pub fn current_programs(tx: &dyn CatalogTx) -> StoreResult<Vec<Program>> {
    let latest = latest_active_versions(tx)?;
    if latest.is_empty() {
        return Ok(Vec::new());
    }
    Ok(select_current_versions(tx.active_program_versions()?, &latest))
}

/// Current version of one program by business id
///
/// # Errors
/// Returns error on storage failure
pub fn current_program_by_id(tx: &dyn CatalogTx, program_id: &str) -> StoreResult<Option<Program>> {
    Ok(current_programs(tx)?
        .into_iter()
        .find(|p| p.program_id == program_id))
}

/// Program version by storage key, if that version is current
///
/// # Errors
/// Returns error on storage failure
pub fn current_program_by_key(tx: &dyn CatalogTx, key: ProgramKey) -> StoreResult<Option<Program>> {
    Ok(current_programs(tx)?.into_iter().find(|p| p.key == key))
}
