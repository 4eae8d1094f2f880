//! Linked-effort resolution and storage
//!
//! Callers reference other efforts loosely: a UUID string, a numeric storage
//! key, or an object carrying one of them. Each reference is resolved first
//! as a UUID, then, when purely numeric, as a storage key. Unresolved
//! references are logged and handled according to the storage shape:
//!
//! - [`RelationLinks`]: only resolved efforts are linked
//! - [`IdentifierListLinks`]: every position is kept, canonical UUID where
//!   resolved, raw identifier otherwise

use crate::config::LinkStorage;
use catalog_model::{EffortKey, EffortRecord, LinkedEffortRef};
use catalog_store::{CatalogTx, StoreResult};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// One linked-effort reference after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Identifier as supplied, or the raw value when none could be extracted
    pub raw: String,
    /// Matching effort, if any
    pub effort: Option<EffortRecord>,
}

impl ResolvedLink {
    /// Canonical UUID when resolved, raw identifier otherwise
    #[must_use]
    pub fn canonical(&self) -> String {
        self.effort
            .as_ref()
            .map_or_else(|| self.raw.clone(), |e| e.uuid.to_string())
    }
}

/// Look up an effort by a raw identifier: UUID first, then numeric key
///
/// # Errors
/// Returns error on storage failure
pub fn resolve_identifier(tx: &dyn CatalogTx, raw: &str) -> StoreResult<Option<EffortRecord>> {
    if let Ok(uuid) = Uuid::parse_str(raw) {
        if let Some(effort) = tx.effort_by_uuid(&uuid)? {
            return Ok(Some(effort));
        }
    }

    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(key) = raw.parse::<i64>() {
            return tx.effort_by_key(EffortKey(key));
        }
    }

    Ok(None)
}

/// Resolve every reference, keeping input order
///
/// # Errors
/// Returns error on storage failure
pub fn resolve_links(
    tx: &dyn CatalogTx,
    refs: &[LinkedEffortRef],
) -> StoreResult<Vec<ResolvedLink>> {
    refs.iter()
        .map(|link| -> StoreResult<ResolvedLink> {
            let Some(identifier) = link.identifier() else {
                warn!(link = %link, "linked effort carries no usable identifier");
                return Ok(ResolvedLink {
                    raw: link.pass_through(),
                    effort: None,
                });
            };

            let effort = resolve_identifier(tx, &identifier)?;
            if effort.is_none() {
                warn!(identifier = %identifier, "linked effort not found");
            }
            Ok(ResolvedLink {
                raw: identifier,
                effort,
            })
        })
        .collect()
}

/// Persistence of an effort's linked efforts
pub trait LinkedEffortStrategy: Send + Sync + Debug {
    /// Shape this strategy stores
    fn shape(&self) -> LinkStorage;

    /// Replace the links of `effort`
    ///
    /// # Errors
    /// Returns error on storage failure
    fn store_links(
        &self,
        tx: &mut dyn CatalogTx,
        effort: EffortKey,
        links: &[ResolvedLink],
    ) -> StoreResult<()>;

    /// Identifiers of the efforts linked from `effort`
    ///
    /// # Errors
    /// Returns error on storage failure
    fn load_links(&self, tx: &dyn CatalogTx, effort: EffortKey) -> StoreResult<Vec<String>>;
}

/// Many-to-many relation between effort rows
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationLinks;

impl LinkedEffortStrategy for RelationLinks {
    fn shape(&self) -> LinkStorage {
        LinkStorage::Relation
    }

    fn store_links(
        &self,
        tx: &mut dyn CatalogTx,
        effort: EffortKey,
        links: &[ResolvedLink],
    ) -> StoreResult<()> {
        let mut targets: Vec<EffortKey> = Vec::with_capacity(links.len());
        for key in links.iter().filter_map(|l| l.effort.as_ref().map(|e| e.key)) {
            if !targets.contains(&key) {
                targets.push(key);
            }
        }
        debug!(effort = %effort, linked = targets.len(), "storing link relation");
        tx.set_linked_effort_keys(effort, &targets)
    }

    fn load_links(&self, tx: &dyn CatalogTx, effort: EffortKey) -> StoreResult<Vec<String>> {
        let mut uuids = Vec::new();
        for key in tx.linked_effort_keys(effort)? {
            if let Some(linked) = tx.effort_by_key(key)? {
                uuids.push(linked.uuid.to_string());
            }
        }
        Ok(uuids)
    }
}

/// Ordered identifier strings stored on the effort row
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierListLinks;

impl LinkedEffortStrategy for IdentifierListLinks {
    fn shape(&self) -> LinkStorage {
        LinkStorage::IdentifierList
    }

    fn store_links(
        &self,
        tx: &mut dyn CatalogTx,
        effort: EffortKey,
        links: &[ResolvedLink],
    ) -> StoreResult<()> {
        let identifiers: Vec<String> = links.iter().map(ResolvedLink::canonical).collect();
        debug!(effort = %effort, linked = identifiers.len(), "storing link identifiers");
        tx.set_link_identifiers(effort, &identifiers)
    }

    fn load_links(&self, tx: &dyn CatalogTx, effort: EffortKey) -> StoreResult<Vec<String>> {
        tx.link_identifiers(effort)
    }
}

/// Strategy for a configured storage shape
#[must_use]
pub fn strategy_for(shape: LinkStorage) -> Arc<dyn LinkedEffortStrategy> {
    match shape {
        LinkStorage::Relation => Arc::new(RelationLinks),
        LinkStorage::IdentifierList => Arc::new(IdentifierListLinks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::EffortAttributes;
    use catalog_store::{in_transaction, CatalogStore, MemoryStore};
    use serde_json::json;

    fn seed(store: &MemoryStore) -> (EffortRecord, EffortRecord) {
        in_transaction(store, |tx| -> StoreResult<_> {
            let a = tx.insert_effort(Uuid::new_v4(), &EffortAttributes::new("a", "1"))?;
            let b = tx.insert_effort(Uuid::new_v4(), &EffortAttributes::new("b", "1"))?;
            Ok((tx.effort_by_key(a)?.unwrap(), tx.effort_by_key(b)?.unwrap()))
        })
        .unwrap()
    }

    fn refs(value: serde_json::Value) -> Vec<LinkedEffortRef> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn uuid_then_numeric_key() {
        let store = MemoryStore::new();
        let (a, b) = seed(&store);
        let tx = store.begin().unwrap();

        let by_uuid = resolve_identifier(&*tx, &a.uuid.to_string()).unwrap();
        assert_eq!(by_uuid.unwrap().key, a.key);

        let by_key = resolve_identifier(&*tx, &b.key.0.to_string()).unwrap();
        assert_eq!(by_key.unwrap().uuid, b.uuid);

        assert!(resolve_identifier(&*tx, "12abc").unwrap().is_none());
        assert!(resolve_identifier(&*tx, "-1").unwrap().is_none());
        assert!(resolve_identifier(&*tx, &Uuid::new_v4().to_string())
            .unwrap()
            .is_none());
    }

    #[test]
    fn resolution_keeps_positions() {
        let store = MemoryStore::new();
        let (a, b) = seed(&store);
        let tx = store.begin().unwrap();

        let links = resolve_links(
            &*tx,
            &refs(json!([
                a.uuid.to_string(),
                "legacy-42",
                { "pk": b.key.0 },
                { "name": "nothing usable" }
            ])),
        )
        .unwrap();

        let canonical: Vec<_> = links.iter().map(ResolvedLink::canonical).collect();
        assert_eq!(
            canonical,
            vec![
                a.uuid.to_string(),
                "legacy-42".to_string(),
                b.uuid.to_string(),
                r#"{"name":"nothing usable"}"#.to_string(),
            ]
        );
    }

    #[test]
    fn relation_drops_unresolved_and_duplicates() {
        let store = MemoryStore::new();
        let (a, b) = seed(&store);
        let mut tx = store.begin().unwrap();

        let links = resolve_links(
            &*tx,
            &refs(json!([b.uuid.to_string(), "ghost", b.key.0])),
        )
        .unwrap();
        RelationLinks.store_links(&mut *tx, a.key, &links).unwrap();

        assert_eq!(
            RelationLinks.load_links(&*tx, a.key).unwrap(),
            vec![b.uuid.to_string()]
        );
    }

    #[test]
    fn identifier_list_keeps_unresolved() {
        let store = MemoryStore::new();
        let (a, b) = seed(&store);
        let mut tx = store.begin().unwrap();

        let links = resolve_links(&*tx, &refs(json!(["ghost", b.key.0.to_string()]))).unwrap();
        IdentifierListLinks.store_links(&mut *tx, a.key, &links).unwrap();

        assert_eq!(
            IdentifierListLinks.load_links(&*tx, a.key).unwrap(),
            vec!["ghost".to_string(), b.uuid.to_string()]
        );
    }

    #[test]
    fn strategy_matches_shape() {
        assert_eq!(strategy_for(LinkStorage::Relation).shape(), LinkStorage::Relation);
        assert_eq!(
            strategy_for(LinkStorage::IdentifierList).shape(),
            LinkStorage::IdentifierList
        );
    }
}
