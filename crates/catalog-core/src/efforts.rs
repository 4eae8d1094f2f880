//! Software effort read model

use crate::links::LinkedEffortStrategy;
use crate::resolver::current_program_by_id;
use catalog_model::{EffortRecord, ProfileKind, SoftwareEffort};
use catalog_store::{CatalogTx, StoreResult};
use tracing::warn;

/// Expand a stored effort with parent identity, local profiles and links
///
/// # Errors
/// Returns error on storage failure
pub fn load_effort(
    tx: &dyn CatalogTx,
    links: &dyn LinkedEffortStrategy,
    record: &EffortRecord,
) -> StoreResult<SoftwareEffort> {
    let parent_uuid = match record.attributes.parent {
        Some(parent) => tx.effort_by_key(parent)?.map(|p| p.uuid),
        None => None,
    };

    let mut effort = SoftwareEffort::from_record(record, parent_uuid);
    for kind in ProfileKind::ALL {
        let Some(key) = record.attributes.local(kind) else {
            continue;
        };
        match tx.profile(kind, key)? {
            Some(profile) => effort.attach_profile(profile),
            None => warn!(uuid = %record.uuid, kind = %kind, profile = %key, "local profile missing"),
        }
    }
    effort.linked_software_efforts = links.load_links(tx, record.key)?;
    Ok(effort)
}

/// Efforts of a current program, `None` when the program is not current
///
/// # Errors
/// Returns error on storage failure
pub fn efforts_for_program(
    tx: &dyn CatalogTx,
    links: &dyn LinkedEffortStrategy,
    program_id: &str,
) -> StoreResult<Option<Vec<SoftwareEffort>>> {
    if current_program_by_id(tx, program_id)?.is_none() {
        return Ok(None);
    }
    tx.efforts_for_program(program_id)?
        .iter()
        .map(|record| load_effort(tx, links, record))
        .collect::<StoreResult<Vec<_>>>()
        .map(Some)
}
