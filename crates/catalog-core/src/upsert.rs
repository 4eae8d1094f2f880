//! Software effort upsert engine
//!
//! Saves one effort and its dependent profiles and links inside a single
//! transaction. The caller owns the transaction: any error returned here
//! leaves it uncommitted, so every write is rolled back.

use crate::links::{resolve_links, LinkedEffortStrategy};
use crate::reconcile::reconcile_profile;
use crate::resolver::current_program_by_id;
use catalog_model::{EffortAttributes, EffortKey, EffortPayload, ProfileKind};
use catalog_store::{CatalogTx, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Result of a save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// A new effort was created
    Created { uuid: Uuid },
    /// An existing effort was updated
    Updated { uuid: Uuid },
    /// The owning program has no current active version; nothing written
    ProgramNotFound,
    /// The payload was absent or carried neither name nor identity; nothing written
    EmptyPayload,
}

impl SaveOutcome {
    /// Identity of the saved effort
    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Option<Uuid> {
        match self {
            Self::Created { uuid } | Self::Updated { uuid } => Some(*uuid),
            Self::ProgramNotFound | Self::EmptyPayload => None,
        }
    }

    /// True when something was written
    #[inline]
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.uuid().is_some()
    }
}

fn parse_uuid(field: &'static str, raw: Option<&str>) -> Option<Uuid> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    match Uuid::parse_str(raw) {
        Ok(uuid) => Some(uuid),
        Err(e) => {
            warn!(field, value = raw, error = %e, "ignoring malformed uuid");
            None
        }
    }
}

/// True when `effort` is `start` or an ancestor of `start`
fn is_ancestor_or_self(
    tx: &dyn CatalogTx,
    effort: EffortKey,
    start: EffortKey,
) -> StoreResult<bool> {
    let mut seen = HashSet::new();
    let mut next = Some(start);
    while let Some(current) = next {
        if current == effort {
            return Ok(true);
        }
        if !seen.insert(current) {
            return Ok(false);
        }
        next = tx.effort_by_key(current)?.and_then(|r| r.attributes.parent);
    }
    Ok(false)
}

/// Save one effort for a program
///
/// # Errors
/// Returns error on storage failure; the transaction must then be dropped
pub fn save_effort_in(
    tx: &mut dyn CatalogTx,
    links: &dyn LinkedEffortStrategy,
    program_id: &str,
    payload: Option<EffortPayload>,
) -> StoreResult<SaveOutcome> {
    let Some(program) = current_program_by_id(tx, program_id)? else {
        error!(program_id, "cannot save effort: program not found");
        return Ok(SaveOutcome::ProgramNotFound);
    };

    let payload = match payload {
        Some(payload) if !payload.is_empty() => payload,
        _ => {
            warn!(program_id, "empty effort payload, nothing saved");
            return Ok(SaveOutcome::EmptyPayload);
        }
    };

    let parent = match parse_uuid("parent_uuid", payload.parent_uuid.as_deref()) {
        Some(parent_uuid) => match tx.effort_by_uuid(&parent_uuid)? {
            Some(parent) => Some(parent),
            None => {
                warn!(parent_uuid = %parent_uuid, "parent effort not found, saving as top-level");
                None
            }
        },
        None => None,
    };

    let existing = match parse_uuid("uuid", payload.uuid.as_deref()) {
        Some(uuid) => {
            let found = tx.effort_by_uuid(&uuid)?;
            if found.is_none() {
                warn!(uuid = %uuid, "no effort with supplied uuid, creating a new one");
            }
            found
        }
        None => None,
    };

    let (key, uuid, mut attributes) = match existing {
        Some(record) => (Some(record.key), record.uuid, record.attributes),
        None => (
            None,
            Uuid::new_v4(),
            EffortAttributes::new(payload.name.clone(), program.program_id.clone()),
        ),
    };

    attributes.name = payload.name.clone();
    attributes.program_id = program.program_id.clone();
    attributes.parent = match (parent, key) {
        (Some(parent), Some(key)) if is_ancestor_or_self(tx, key, parent.key)? => {
            warn!(
                uuid = %uuid,
                parent_uuid = %parent.uuid,
                "parent would make the effort its own ancestor, saving as top-level"
            );
            None
        }
        (Some(parent), _) => Some(parent.key),
        (None, _) => None,
    };

    for kind in ProfileKind::ALL {
        reconcile_profile(
            tx,
            &mut attributes,
            kind,
            payload.inherits(kind),
            payload.profile(kind),
        )?;
    }

    let (key, outcome): (EffortKey, SaveOutcome) = match key {
        Some(key) => {
            tx.update_effort(key, &attributes)?;
            (key, SaveOutcome::Updated { uuid })
        }
        None => (
            tx.insert_effort(uuid, &attributes)?,
            SaveOutcome::Created { uuid },
        ),
    };

    if let Some(refs) = payload.linked_software_efforts.as_deref() {
        let resolved = resolve_links(tx, refs)?;
        links.store_links(tx, key, &resolved)?;
    }

    info!(program_id, uuid = %uuid, ?outcome, "software effort saved");
    Ok(outcome)
}
