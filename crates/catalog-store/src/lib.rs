//! Program Catalog storage
//!
//! The catalog core talks to storage only through [`CatalogStore`] and
//! [`CatalogTx`]. Two backends are provided:
//!
//! - [`MemoryStore`]: process-local, used by tests and ephemeral runs
//! - [`SqliteStore`]: durable single-file database
//!
//! # Example
//!
//! ```rust
//! use catalog_store::{in_transaction, CatalogStore, MemoryStore, StoreError};
//! use catalog_model::EffortAttributes;
//! use uuid::Uuid;
//!
//! let store = MemoryStore::new();
//! let key = in_transaction(&store, |tx| {
//!     tx.insert_effort(Uuid::new_v4(), &EffortAttributes::new("Radar", "101"))
//! })?;
//!
//! let tx = store.begin()?;
//! assert_eq!(tx.effort_by_key(key)?.unwrap().attributes.name, "Radar");
//! # Ok::<(), StoreError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{in_transaction, CatalogStore, CatalogTx};
