//! In-memory catalog store
//!
//! Each transaction takes the store lock, works on a private copy of the
//! state and swaps it in on commit. Dropping the transaction discards the
//! copy. Writers are serialized by the lock.

use crate::error::{StoreError, StoreResult};
use crate::store::{CatalogStore, CatalogTx};
use catalog_model::{
    EffortAttributes, EffortKey, EffortRecord, NewProgram, Program, ProfileData, ProfileKey,
    ProfileKind, ProgramKey,
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    programs: BTreeMap<ProgramKey, Program>,
    efforts: BTreeMap<EffortKey, EffortRecord>,
    profiles: BTreeMap<ProfileKind, BTreeMap<ProfileKey, ProfileData>>,
    links: BTreeMap<EffortKey, Vec<EffortKey>>,
    link_identifiers: BTreeMap<EffortKey, Vec<String>>,
    next_key: i64,
}

impl MemoryState {
    fn allocate(&mut self) -> i64 {
        self.next_key += 1;
        self.next_key
    }
}

/// Catalog store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    transactions: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions started so far
    #[inline]
    #[must_use]
    pub fn transactions_started(&self) -> u64 {
        self.transactions.load(Ordering::SeqCst)
    }
}

impl CatalogStore for MemoryStore {
    fn begin(&self) -> StoreResult<Box<dyn CatalogTx + '_>> {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        let guard = self.state.lock();
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

struct MemoryTx<'a> {
    guard: MutexGuard<'a, MemoryState>,
    working: MemoryState,
}

impl MemoryTx<'_> {
    fn effort_mut(&mut self, key: EffortKey) -> StoreResult<&mut EffortRecord> {
        self.working
            .efforts
            .get_mut(&key)
            .ok_or_else(|| StoreError::not_found("software effort", key))
    }
}

impl CatalogTx for MemoryTx<'_> {
    fn latest_active_dates(&self) -> StoreResult<HashMap<String, DateTime<Utc>>> {
        let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
        for program in self.working.programs.values().filter(|p| p.active) {
            latest
                .entry(program.program_id.clone())
                .and_modify(|date| *date = (*date).max(program.date))
                .or_insert(program.date);
        }
        Ok(latest)
    }

    fn active_program_versions(&self) -> StoreResult<Vec<Program>> {
        let mut rows: Vec<Program> = self
            .working
            .programs
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.program_id
                .cmp(&b.program_id)
                .then(b.date.cmp(&a.date))
                .then(b.key.cmp(&a.key))
        });
        Ok(rows)
    }

    fn insert_program(&mut self, program: &NewProgram) -> StoreResult<ProgramKey> {
        let key = ProgramKey(self.working.allocate());
        self.working
            .programs
            .insert(key, program.clone().into_program(key));
        Ok(key)
    }

    fn effort_by_uuid(&self, uuid: &Uuid) -> StoreResult<Option<EffortRecord>> {
        Ok(self
            .working
            .efforts
            .values()
            .find(|e| &e.uuid == uuid)
            .cloned())
    }

    fn effort_by_key(&self, key: EffortKey) -> StoreResult<Option<EffortRecord>> {
        Ok(self.working.efforts.get(&key).cloned())
    }

    fn efforts_for_program(&self, program_id: &str) -> StoreResult<Vec<EffortRecord>> {
        Ok(self
            .working
            .efforts
            .values()
            .filter(|e| e.attributes.program_id == program_id)
            .cloned()
            .collect())
    }

    fn insert_effort(
        &mut self,
        uuid: Uuid,
        attributes: &EffortAttributes,
    ) -> StoreResult<EffortKey> {
        if self.working.efforts.values().any(|e| e.uuid == uuid) {
            return Err(StoreError::corrupt(
                "software_efforts",
                format!("duplicate uuid {uuid}"),
            ));
        }
        let key = EffortKey(self.working.allocate());
        self.working.efforts.insert(
            key,
            EffortRecord {
                key,
                uuid,
                attributes: attributes.clone(),
            },
        );
        Ok(key)
    }

    fn update_effort(&mut self, key: EffortKey, attributes: &EffortAttributes) -> StoreResult<()> {
        self.effort_mut(key)?.attributes = attributes.clone();
        Ok(())
    }

    fn delete_effort(&mut self, key: EffortKey) -> StoreResult<()> {
        if self.working.efforts.remove(&key).is_none() {
            return Err(StoreError::not_found("software effort", key));
        }
        for effort in self.working.efforts.values_mut() {
            if effort.attributes.parent == Some(key) {
                effort.attributes.parent = None;
            }
        }
        self.working.links.remove(&key);
        for targets in self.working.links.values_mut() {
            targets.retain(|t| *t != key);
        }
        self.working.link_identifiers.remove(&key);
        Ok(())
    }

    fn profile(&self, kind: ProfileKind, key: ProfileKey) -> StoreResult<Option<ProfileData>> {
        Ok(self
            .working
            .profiles
            .get(&kind)
            .and_then(|rows| rows.get(&key))
            .cloned())
    }

    fn insert_profile(&mut self, data: &ProfileData) -> StoreResult<ProfileKey> {
        let key = ProfileKey(self.working.allocate());
        self.working
            .profiles
            .entry(data.kind())
            .or_default()
            .insert(key, data.clone());
        Ok(key)
    }

    fn update_profile(&mut self, key: ProfileKey, data: &ProfileData) -> StoreResult<()> {
        let row = self
            .working
            .profiles
            .get_mut(&data.kind())
            .and_then(|rows| rows.get_mut(&key))
            .ok_or_else(|| StoreError::not_found(data.kind().as_str(), key))?;
        *row = data.clone();
        Ok(())
    }

    fn delete_profile(&mut self, kind: ProfileKind, key: ProfileKey) -> StoreResult<()> {
        self.working
            .profiles
            .get_mut(&kind)
            .and_then(|rows| rows.remove(&key))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(kind.as_str(), key))
    }

    fn profile_count(&self, kind: ProfileKind) -> StoreResult<usize> {
        Ok(self.working.profiles.get(&kind).map_or(0, BTreeMap::len))
    }

    fn linked_effort_keys(&self, key: EffortKey) -> StoreResult<Vec<EffortKey>> {
        Ok(self.working.links.get(&key).cloned().unwrap_or_default())
    }

    fn set_linked_effort_keys(
        &mut self,
        key: EffortKey,
        targets: &[EffortKey],
    ) -> StoreResult<()> {
        self.effort_mut(key)?;
        if let Some(missing) = targets
            .iter()
            .find(|t| !self.working.efforts.contains_key(*t))
        {
            return Err(StoreError::not_found("software effort", missing));
        }
        self.working.links.insert(key, targets.to_vec());
        Ok(())
    }

    fn link_identifiers(&self, key: EffortKey) -> StoreResult<Vec<String>> {
        Ok(self
            .working
            .link_identifiers
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    fn set_link_identifiers(
        &mut self,
        key: EffortKey,
        identifiers: &[String],
    ) -> StoreResult<()> {
        self.effort_mut(key)?;
        self.working
            .link_identifiers
            .insert(key, identifiers.to_vec());
        Ok(())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
