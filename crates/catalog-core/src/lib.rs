//! Program Catalog core
//!
//! Implements:
//! - **Version resolution**: the current version of every active program
//! - **Hierarchy building**: a single-rooted program tree from path-encoded
//!   rows, with bottom-up aggregation of software-effort expectations
//! - **Effort upsert**: atomic create/update of an effort, its four local
//!   profiles, and its linked efforts
//! - **Effort deletion**: hard delete of an effort and its local profiles
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_core::{CatalogConfig, ProgramCatalogService};
//! use catalog_model::EffortPayload;
//! use catalog_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> catalog_core::CatalogResult<()> {
//! let service = ProgramCatalogService::new(Arc::new(MemoryStore::new()), &CatalogConfig::new());
//!
//! let outcome = service
//!     .save_effort("101", Some(EffortPayload::named("Flight Controls")))
//!     .await?;
//! let tree = service.get_program_tree().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod config;
pub mod deletion;
pub mod efforts;
pub mod error;
pub mod hierarchy;
pub mod links;
pub mod reconcile;
pub mod resolver;
pub mod service;
pub mod upsert;

pub use cache::ProgramCache;
pub use config::{CatalogConfig, LinkStorage};
pub use error::{CatalogError, CatalogResult, HierarchyError};
pub use hierarchy::build_program_tree;
pub use links::{
    resolve_identifier, strategy_for, IdentifierListLinks, LinkedEffortStrategy, RelationLinks,
    ResolvedLink,
};
pub use reconcile::{plan, ProfileAction};
pub use service::ProgramCatalogService;
pub use upsert::SaveOutcome;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
