//! Program catalog service
//!
//! The service is constructed once and shared by handle. Storage work runs on
//! the blocking thread pool, one transaction per call.

use crate::cache::ProgramCache;
use crate::config::{CatalogConfig, LinkStorage};
use crate::deletion::delete_effort_in;
use crate::efforts::{efforts_for_program, load_effort};
use crate::error::{CatalogError, CatalogResult};
use crate::hierarchy::build_program_tree;
use crate::links::{strategy_for, LinkedEffortStrategy};
use crate::resolver::current_programs;
use crate::upsert::{save_effort_in, SaveOutcome};
use catalog_model::{
    EffortPayload, NewProgram, Program, ProgramKey, ProgramTreeNode, SoftwareEffort,
};
use catalog_store::{in_transaction, CatalogStore, CatalogTx, MemoryStore, SqliteStore};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Entry point for catalog reads and writes
#[derive(Clone)]
pub struct ProgramCatalogService {
    store: Arc<dyn CatalogStore>,
    cache: ProgramCache,
    links: Arc<dyn LinkedEffortStrategy>,
}

impl std::fmt::Debug for ProgramCatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramCatalogService")
            .field("cache", &self.cache)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl ProgramCatalogService {
    /// Create a service over `store`
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, config: &CatalogConfig) -> Self {
        Self {
            store,
            cache: ProgramCache::with_ttl(config.cache_capacity, config.cache_ttl()),
            links: strategy_for(config.link_storage),
        }
    }

    /// Create a service over the store named by `config`
    ///
    /// Opens the SQLite database at `database_path`, or an empty in-memory
    /// store when no path is configured.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened
    pub fn from_config(config: &CatalogConfig) -> CatalogResult<Self> {
        let store: Arc<dyn CatalogStore> = match &config.database_path {
            Some(path) => Arc::new(SqliteStore::open(path)?),
            None => {
                warn!("no database path configured, using in-memory storage");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(store, config))
    }

    /// Configured linked-effort storage shape
    #[inline]
    #[must_use]
    pub fn link_storage(&self) -> LinkStorage {
        self.links.shape()
    }

    async fn run<T, F>(&self, f: F) -> CatalogResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn CatalogTx, &dyn LinkedEffortStrategy) -> CatalogResult<T>
            + Send
            + 'static,
    {
        let store = Arc::clone(&self.store);
        let links = Arc::clone(&self.links);
        tokio::task::spawn_blocking(move || {
            in_transaction(&*store, |tx| f(tx, &*links))
        })
        .await?
    }

    async fn cached_programs(&self) -> CatalogResult<Vec<Program>> {
        self.cache
            .get_or_try_load(|| self.run(|tx, _| Ok(current_programs(tx)?)))
            .await
    }

    /// Program hierarchy built from the current programs
    ///
    /// `Ok(None)` when there are no current programs.
    ///
    /// # Errors
    /// Returns error on storage failure or when several roots exist
    pub async fn get_program_tree(&self) -> CatalogResult<Option<ProgramTreeNode>> {
        let programs = self.cached_programs().await?;
        Ok(build_program_tree(&programs)?)
    }

    /// Current version of every active program, ordered by `program_id`
    ///
    /// # Errors
    /// Returns error on storage failure
    pub async fn get_all_programs(&self) -> CatalogResult<Vec<Program>> {
        self.cached_programs().await
    }

    /// Current version of a program by business id
    ///
    /// # Errors
    /// Returns error on storage failure
    pub async fn get_program_by_id(&self, program_id: &str) -> CatalogResult<Option<Program>> {
        Ok(self
            .cached_programs()
            .await?
            .into_iter()
            .find(|p| p.program_id == program_id))
    }

    /// Program version by storage key, if that version is current
    ///
    /// # Errors
    /// Returns error on storage failure
    pub async fn get_program_by_key(&self, key: ProgramKey) -> CatalogResult<Option<Program>> {
        Ok(self
            .cached_programs()
            .await?
            .into_iter()
            .find(|p| p.key == key))
    }

    /// Efforts owned by a program
    ///
    /// `None` when the program has no current active version.
    ///
    /// # Errors
    /// Returns error on storage failure
    pub async fn get_efforts_for_program(
        &self,
        program_id: &str,
    ) -> CatalogResult<Option<Vec<SoftwareEffort>>> {
        let program_id = program_id.to_string();
        self.run(move |tx, links| Ok(efforts_for_program(tx, links, &program_id)?))
            .await
    }

    /// One effort by UUID
    ///
    /// A malformed UUID yields `None` without touching storage.
    ///
    /// # Errors
    /// Returns error on storage failure
    pub async fn get_effort(&self, uuid: &str) -> CatalogResult<Option<SoftwareEffort>> {
        let Ok(uuid) = Uuid::parse_str(uuid.trim()) else {
            warn!(uuid, "malformed effort uuid");
            return Ok(None);
        };
        self.run(move |tx, links| {
            tx.effort_by_uuid(&uuid)?
                .map(|record| load_effort(tx, links, &record))
                .transpose()
                .map_err(CatalogError::from)
        })
        .await
    }

    /// Create or update one effort of a program, atomically
    ///
    /// # Errors
    /// Returns error on storage failure; nothing is written in that case
    pub async fn save_effort(
        &self,
        program_id: &str,
        payload: Option<EffortPayload>,
    ) -> CatalogResult<SaveOutcome> {
        info!(program_id, "saving software effort");
        let program_id = program_id.to_string();
        self.run(move |tx, links| Ok(save_effort_in(tx, links, &program_id, payload)?))
            .await
    }

    /// Hard-delete an effort and its local profiles
    ///
    /// A malformed UUID yields `false` without touching storage; an unknown
    /// UUID yields `false`.
    ///
    /// # Errors
    /// Returns error on storage failure; nothing is deleted in that case
    pub async fn delete_effort(&self, uuid: &str) -> CatalogResult<bool> {
        let Ok(uuid) = Uuid::parse_str(uuid.trim()) else {
            warn!(uuid, "malformed effort uuid, nothing deleted");
            return Ok(false);
        };
        self.run(move |tx, _| Ok(delete_effort_in(tx, &uuid)?)).await
    }

    /// Store a new program version and drop the cached program list
    ///
    /// # Errors
    /// Returns error on storage failure
    pub async fn insert_program_version(&self, program: NewProgram) -> CatalogResult<ProgramKey> {
        let key = self
            .run(move |tx, _| Ok(tx.insert_program(&program)?))
            .await?;
        self.invalidate_program_cache().await;
        Ok(key)
    }

    /// Store several program versions in one transaction
    ///
    /// # Errors
    /// Returns error on storage failure; nothing is stored in that case
    pub async fn import_programs(&self, programs: Vec<NewProgram>) -> CatalogResult<Vec<ProgramKey>> {
        let count = programs.len();
        let keys = self
            .run(move |tx, _| {
                programs
                    .iter()
                    .map(|p| tx.insert_program(p).map_err(CatalogError::from))
                    .collect::<CatalogResult<Vec<_>>>()
            })
            .await?;
        self.invalidate_program_cache().await;
        info!(count, "program versions imported");
        Ok(keys)
    }

    /// Drop the cached program list so the next read hits storage
    pub async fn invalidate_program_cache(&self) {
        self.cache.invalidate().await;
    }
}
