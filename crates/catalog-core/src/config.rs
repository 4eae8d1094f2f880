//! Catalog configuration

use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How an effort's linked efforts are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStorage {
    /// Many-to-many relation between effort rows
    #[default]
    Relation,
    /// Ordered list of raw identifier strings on the effort row
    IdentifierList,
}

impl std::str::FromStr for LinkStorage {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relation" => Ok(Self::Relation),
            "identifier_list" | "identifier-list" => Ok(Self::IdentifierList),
            other => Err(CatalogError::Config(format!(
                "unknown link storage {other:?}, expected relation or identifier_list"
            ))),
        }
    }
}

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Lifetime of the cached current-program list, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum cached entries
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Linked-effort storage shape
    #[serde(default)]
    pub link_storage: LinkStorage,

    /// SQLite database file; in-memory storage when absent
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_cache_capacity() -> u64 {
    1
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            link_storage: LinkStorage::default(),
            database_path: None,
        }
    }
}

impl CatalogConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not a valid configuration
    pub fn from_toml(content: &str) -> CatalogResult<Self> {
        toml::from_str(content).map_err(|e| CatalogError::Config(e.to_string()))
    }

    /// With cache lifetime
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    /// With linked-effort storage shape
    #[inline]
    #[must_use]
    pub fn with_link_storage(mut self, link_storage: LinkStorage) -> Self {
        self.link_storage = link_storage;
        self
    }

    /// With SQLite database file
    #[inline]
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Cache lifetime as a duration
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
