//! Current-program cache using moka
//!
//! Holds the resolved list of current programs under a single key for a
//! fixed time-to-live. Every read hands out an independent copy, so callers
//! may mutate what they receive without affecting later reads.
//!
//! Each invalidation starts a new generation. A load that began in an earlier
//! generation never leaves its result in the cache.

use catalog_model::Program;
use moka::future::Cache;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Time-bounded cache of the current program list
#[derive(Debug, Clone)]
pub struct ProgramCache {
    inner: Cache<(), Arc<Vec<Program>>>,
    generation: Arc<AtomicU64>,
}

impl ProgramCache {
    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity.max(1))
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Copy of the cached list, if present and fresh
    #[inline]
    pub async fn get(&self) -> Option<Vec<Program>> {
        self.inner.get(&()).await.map(|cached| cached.as_ref().clone())
    }

    /// Replace the cached list
    #[inline]
    pub async fn insert(&self, programs: Vec<Program>) {
        self.inner.insert((), Arc::new(programs)).await;
    }

    /// Current invalidation generation
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cached list, loading and caching it on a miss
    ///
    /// A failed load caches nothing. A load overtaken by [`invalidate`]
    /// returns its result but does not cache it.
    ///
    /// [`invalidate`]: Self::invalidate
    ///
    /// # Errors
    /// Returns the loader's error
    pub async fn get_or_try_load<E, F, Fut>(&self, load: F) -> Result<Vec<Program>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Program>, E>>,
    {
        if let Some(cached) = self.get().await {
            debug!(programs = cached.len(), "program cache hit");
            return Ok(cached);
        }

        debug!("program cache miss");
        let generation = self.generation();
        let programs = load().await?;
        self.insert(programs.clone()).await;
        // An invalidation that ran after the check below clears this entry itself.
        if self.generation() != generation {
            debug!(generation, "program list loaded across an invalidation, dropping it");
            self.inner.invalidate(&()).await;
        }
        Ok(programs)
    }

    /// Drop the cached list and start a new generation
    #[inline]
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate(&()).await;
    }
}
