//! Testing utilities for the program catalog workspace
//!
//! Shared fixtures and a fault-injecting store.

#![allow(missing_docs)]

use catalog_model::{
    DeveloperSetupProfile, EffortAttributes, EffortKey, EffortRecord, NewProgram, Program,
    ProfileData, ProfileKey, ProfileKind, ProgramKey, ProgramPath, StatementOfWorkProfile,
    TechnicalPointOfContactProfile, WorkLocationProfile,
};
use catalog_store::{CatalogStore, CatalogTx, MemoryStore, StoreError, StoreResult};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use uuid::Uuid;

// --- fixtures ---------------------------------------------------------------

pub fn date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()
}

pub fn program(program_id: &str, path: &str) -> NewProgram {
    NewProgram::new(
        program_id,
        ProgramPath::lexical(path),
        format!("Program {program_id}"),
        date(1),
    )
}

pub fn program_dated(program_id: &str, path: &str, day: u32) -> NewProgram {
    NewProgram {
        date: date(day),
        ..program(program_id, path)
    }
}

/// `1` → {`1.1` (expects efforts) → `1.1.1`, `1.2`}
pub fn sample_hierarchy() -> Vec<NewProgram> {
    vec![
        program("100", "1"),
        program("110", "1.1").expecting_software_effort(true),
        program("111", "1.1.1"),
        program("120", "1.2"),
    ]
}

pub fn seed_programs(store: &dyn CatalogStore, programs: &[NewProgram]) -> Vec<ProgramKey> {
    let mut tx = store.begin().unwrap();
    let keys = programs
        .iter()
        .map(|p| tx.insert_program(p).unwrap())
        .collect();
    tx.commit().unwrap();
    keys
}

pub fn seeded_memory_store(programs: &[NewProgram]) -> MemoryStore {
    let store = MemoryStore::new();
    seed_programs(&store, programs);
    store
}

pub fn seed_effort(store: &dyn CatalogStore, name: &str, program_id: &str) -> EffortRecord {
    let mut tx = store.begin().unwrap();
    let uuid = Uuid::new_v4();
    let key = tx
        .insert_effort(uuid, &EffortAttributes::new(name, program_id))
        .unwrap();
    let record = tx.effort_by_key(key).unwrap().unwrap();
    tx.commit().unwrap();
    record
}

pub fn effort(store: &dyn CatalogStore, uuid: &Uuid) -> Option<EffortRecord> {
    store.begin().unwrap().effort_by_uuid(uuid).unwrap()
}

pub fn profile_counts(store: &dyn CatalogStore) -> HashMap<ProfileKind, usize> {
    let tx = store.begin().unwrap();
    ProfileKind::ALL
        .into_iter()
        .map(|kind| (kind, tx.profile_count(kind).unwrap()))
        .collect()
}

pub fn total_profiles(store: &dyn CatalogStore) -> usize {
    profile_counts(store).values().sum()
}

pub fn statement_of_work(contract: &str) -> ProfileData {
    ProfileData::StatementOfWork(StatementOfWorkProfile {
        contract_number: Some(contract.into()),
        contract_type: Some("CPFF".into()),
        ..Default::default()
    })
}

pub fn developer_setup(repo: &str) -> ProfileData {
    ProfileData::DeveloperSetup(DeveloperSetupProfile {
        source_control_url: Some(repo.into()),
        primary_languages: vec!["rust".into()],
        ..Default::default()
    })
}

pub fn technical_contacts(lead: &str) -> ProfileData {
    ProfileData::TechnicalPointsOfContact(TechnicalPointOfContactProfile {
        software_lead_name: Some(lead.into()),
        ..Default::default()
    })
}

pub fn work_location(site: &str) -> ProfileData {
    ProfileData::WorkLocation(WorkLocationProfile {
        site: Some(site.into()),
        ..Default::default()
    })
}

pub fn current(programs: &[Program], program_id: &str) -> Option<Program> {
    programs.iter().find(|p| p.program_id == program_id).cloned()
}

// --- fault injection --------------------------------------------------------

/// Transaction operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    InsertProgram,
    InsertEffort,
    UpdateEffort,
    DeleteEffort,
    InsertProfile,
    UpdateProfile,
    DeleteProfile,
    SetLinkedEffortKeys,
    SetLinkIdentifiers,
    Commit,
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    point: FaultPoint,
    passes: usize,
}

/// Test side of a held commit, see [`FaultyStore::hold_next_commit`]
#[derive(Debug)]
pub struct CommitGate {
    reached: mpsc::Receiver<()>,
    release: mpsc::Sender<()>,
}

impl CommitGate {
    /// Block until the held transaction has committed
    pub fn wait_committed(&self) {
        self.reached.recv().unwrap();
    }

    /// Let the held transaction return to its caller
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

#[derive(Debug)]
struct CommitHold {
    reached: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
}

/// [`MemoryStore`] wrapper failing one chosen operation
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fault: Mutex<Option<Fault>>,
    hold: Mutex<Option<CommitHold>>,
    injected: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail every later `point` until cleared
    pub fn fail_on(&self, point: FaultPoint) {
        self.fail_after(point, 0);
    }

    /// Let `passes` calls of `point` through in each transaction, then fail
    pub fn fail_after(&self, point: FaultPoint, passes: usize) {
        *self.fault.lock() = Some(Fault { point, passes });
    }

    pub fn clear(&self) {
        *self.fault.lock() = None;
    }

    /// Pause the next transaction after its commit, before it returns
    ///
    /// The store is free for other transactions while the commit is held.
    pub fn hold_next_commit(&self) -> CommitGate {
        let (reached_tx, reached_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.hold.lock() = Some(CommitHold {
            reached: reached_tx,
            release: release_rx,
        });
        CommitGate {
            reached: reached_rx,
            release: release_tx,
        }
    }

    /// Number of faults raised so far
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl CatalogStore for FaultyStore {
    fn begin(&self) -> StoreResult<Box<dyn CatalogTx + '_>> {
        Ok(Box::new(FaultyTx {
            inner: self.inner.begin()?,
            fault: *self.fault.lock(),
            hold: self.hold.lock().take(),
            injected: &self.injected,
        }))
    }
}

struct FaultyTx<'a> {
    inner: Box<dyn CatalogTx + 'a>,
    fault: Option<Fault>,
    hold: Option<CommitHold>,
    injected: &'a AtomicUsize,
}

impl FaultyTx<'_> {
    fn check(&mut self, point: FaultPoint) -> StoreResult<()> {
        let Some(fault) = self.fault.as_mut() else {
            return Ok(());
        };
        if fault.point != point {
            return Ok(());
        }
        if fault.passes > 0 {
            fault.passes -= 1;
            return Ok(());
        }
        self.injected.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable(format!("injected fault at {point:?}")))
    }
}

impl CatalogTx for FaultyTx<'_> {
    fn latest_active_dates(&self) -> StoreResult<HashMap<String, DateTime<Utc>>> {
        self.inner.latest_active_dates()
    }

    fn active_program_versions(&self) -> StoreResult<Vec<Program>> {
        self.inner.active_program_versions()
    }

    fn insert_program(&mut self, program: &NewProgram) -> StoreResult<ProgramKey> {
        self.check(FaultPoint::InsertProgram)?;
        self.inner.insert_program(program)
    }

    fn effort_by_uuid(&self, uuid: &Uuid) -> StoreResult<Option<EffortRecord>> {
        self.inner.effort_by_uuid(uuid)
    }

    fn effort_by_key(&self, key: EffortKey) -> StoreResult<Option<EffortRecord>> {
        self.inner.effort_by_key(key)
    }

    fn efforts_for_program(&self, program_id: &str) -> StoreResult<Vec<EffortRecord>> {
        self.inner.efforts_for_program(program_id)
    }

    fn insert_effort(
        &mut self,
        uuid: Uuid,
        attributes: &EffortAttributes,
    ) -> StoreResult<EffortKey> {
        self.check(FaultPoint::InsertEffort)?;
        self.inner.insert_effort(uuid, attributes)
    }

    fn update_effort(&mut self, key: EffortKey, attributes: &EffortAttributes) -> StoreResult<()> {
        self.check(FaultPoint::UpdateEffort)?;
        self.inner.update_effort(key, attributes)
    }

    fn delete_effort(&mut self, key: EffortKey) -> StoreResult<()> {
        self.check(FaultPoint::DeleteEffort)?;
        self.inner.delete_effort(key)
    }

    fn profile(&self, kind: ProfileKind, key: ProfileKey) -> StoreResult<Option<ProfileData>> {
        self.inner.profile(kind, key)
    }

    fn insert_profile(&mut self, data: &ProfileData) -> StoreResult<ProfileKey> {
        self.check(FaultPoint::InsertProfile)?;
        self.inner.insert_profile(data)
    }

    fn update_profile(&mut self, key: ProfileKey, data: &ProfileData) -> StoreResult<()> {
        self.check(FaultPoint::UpdateProfile)?;
        self.inner.update_profile(key, data)
    }

    fn delete_profile(&mut self, kind: ProfileKind, key: ProfileKey) -> StoreResult<()> {
        self.check(FaultPoint::DeleteProfile)?;
        self.inner.delete_profile(kind, key)
    }

    fn profile_count(&self, kind: ProfileKind) -> StoreResult<usize> {
        self.inner.profile_count(kind)
    }

    fn linked_effort_keys(&self, key: EffortKey) -> StoreResult<Vec<EffortKey>> {
        self.inner.linked_effort_keys(key)
    }

    fn set_linked_effort_keys(
        &mut self,
        key: EffortKey,
        targets: &[EffortKey],
    ) -> StoreResult<()> {
        self.check(FaultPoint::SetLinkedEffortKeys)?;
        self.inner.set_linked_effort_keys(key, targets)
    }

    fn link_identifiers(&self, key: EffortKey) -> StoreResult<Vec<String>> {
        self.inner.link_identifiers(key)
    }

    fn set_link_identifiers(
        &mut self,
        key: EffortKey,
        identifiers: &[String],
    ) -> StoreResult<()> {
        self.check(FaultPoint::SetLinkIdentifiers)?;
        self.inner.set_link_identifiers(key, identifiers)
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.check(FaultPoint::Commit)?;
        let FaultyTx { inner, hold, .. } = *self;
        inner.commit()?;
        if let Some(hold) = hold {
            let _ = hold.reached.send(());
            let _ = hold.release.recv();
        }
        Ok(())
    }
}
