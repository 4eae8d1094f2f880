//! Storage contract
//!
//! A [`CatalogStore`] hands out [`CatalogTx`] units of work. Every read and
//! write of the catalog core goes through a transaction; a transaction that is
//! dropped without [`CatalogTx::commit`] rolls back.

use crate::error::{StoreError, StoreResult};
use catalog_model::{
    EffortAttributes, EffortKey, EffortRecord, NewProgram, Program, ProfileData, ProfileKey,
    ProfileKind, ProgramKey,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Transactional catalog storage
pub trait CatalogStore: Send + Sync {
    /// Start a transaction
    ///
    /// # Errors
    /// Returns error if the store cannot open a transaction
    fn begin(&self) -> StoreResult<Box<dyn CatalogTx + '_>>;
}

/// One atomic unit of work against the catalog
///
/// Writes are visible to later reads in the same transaction and to other
/// transactions only after commit.
pub trait CatalogTx {
    // --- programs -----------------------------------------------------------

    /// Latest version date of every active program
    /// (`SELECT program_id, MAX(date) ... GROUP BY program_id`)
    fn latest_active_dates(&self) -> StoreResult<HashMap<String, DateTime<Utc>>>;

    /// Every version row of active programs, ordered by `program_id`, then
    /// `date` descending, then storage key descending
    fn active_program_versions(&self) -> StoreResult<Vec<Program>>;

    /// Insert a new program version
    fn insert_program(&mut self, program: &NewProgram) -> StoreResult<ProgramKey>;

    // --- efforts ------------------------------------------------------------

    /// Effort by stable identity
    fn effort_by_uuid(&self, uuid: &Uuid) -> StoreResult<Option<EffortRecord>>;

    /// Effort by storage key
    fn effort_by_key(&self, key: EffortKey) -> StoreResult<Option<EffortRecord>>;

    /// Efforts owned by a program, in storage-key order
    fn efforts_for_program(&self, program_id: &str) -> StoreResult<Vec<EffortRecord>>;

    /// Insert an effort row
    fn insert_effort(&mut self, uuid: Uuid, attributes: &EffortAttributes)
        -> StoreResult<EffortKey>;

    /// Overwrite an effort row's attributes in one write
    fn update_effort(&mut self, key: EffortKey, attributes: &EffortAttributes) -> StoreResult<()>;

    /// Hard-delete an effort row
    ///
    /// Child efforts lose their parent; link rows naming the effort are removed.
    fn delete_effort(&mut self, key: EffortKey) -> StoreResult<()>;

    // --- local profiles -----------------------------------------------------

    /// Load a local profile
    fn profile(&self, kind: ProfileKind, key: ProfileKey) -> StoreResult<Option<ProfileData>>;

    /// Insert a local profile row
    fn insert_profile(&mut self, data: &ProfileData) -> StoreResult<ProfileKey>;

    /// Overwrite a local profile's fields in place
    fn update_profile(&mut self, key: ProfileKey, data: &ProfileData) -> StoreResult<()>;

    /// Hard-delete a local profile row
    fn delete_profile(&mut self, kind: ProfileKind, key: ProfileKey) -> StoreResult<()>;

    /// Number of stored profiles of a kind
    fn profile_count(&self, kind: ProfileKind) -> StoreResult<usize>;

    // --- linked efforts -----------------------------------------------------

    /// Targets of the many-to-many link relation
    fn linked_effort_keys(&self, key: EffortKey) -> StoreResult<Vec<EffortKey>>;

    /// Replace the many-to-many link relation of an effort
    fn set_linked_effort_keys(&mut self, key: EffortKey, targets: &[EffortKey])
        -> StoreResult<()>;

    /// Raw identifier list stored on an effort
    fn link_identifiers(&self, key: EffortKey) -> StoreResult<Vec<String>>;

    /// Replace the raw identifier list stored on an effort
    fn set_link_identifiers(&mut self, key: EffortKey, identifiers: &[String])
        -> StoreResult<()>;

    /// Make every write of this transaction durable
    fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Run `f` in a transaction, committing on success
///
/// Any error returned by `f` drops the transaction, rolling back every write.
///
/// # Errors
/// Returns the error of `f`, or the store error from begin/commit
pub fn in_transaction<T, E, F>(store: &dyn CatalogStore, f: F) -> Result<T, E>
where
    E: From<StoreError>,
    F: FnOnce(&mut dyn CatalogTx) -> Result<T, E>,
{
    let mut tx = store.begin()?;
    let value = f(&mut *tx)?;
    tx.commit()?;
    Ok(value)
}
