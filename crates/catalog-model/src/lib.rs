//! Program Catalog domain model
//!
//! Shared vocabulary for the catalog crates:
//!
//! - **Programs**: versioned, path-positioned organizational units
//! - **Program tree**: the derived hierarchy of current programs
//! - **Software efforts**: units of work owned by a program, optionally nested
//! - **Profiles**: the four locally overridable configuration aspects
//! - **Payloads**: typed input for the effort upsert
//!
//! # Example
//!
//! ```rust
//! use catalog_model::{EffortPayload, ProfileData, ProfileKind, WorkLocationProfile};
//!
//! let payload = EffortPayload::named("Flight Controls").with_local_profile(
//!     ProfileData::WorkLocation(WorkLocationProfile {
//!         site: Some("Everett".into()),
//!         ..Default::default()
//!     }),
//! );
//!
//! assert!(!payload.inherits(ProfileKind::WorkLocation));
//! assert!(payload.inherits(ProfileKind::DeveloperSetup));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod effort;
pub mod error;
pub mod path;
pub mod payload;
pub mod profile;
pub mod program;

pub use effort::{EffortAttributes, EffortKey, EffortRecord, SoftwareEffort};
pub use error::{ModelError, PathError};
pub use path::ProgramPath;
pub use payload::{EffortPayload, LinkedEffortRef};
pub use profile::{
    DeveloperSetupProfile, ProfileData, ProfileKey, ProfileKind, StatementOfWorkProfile,
    TechnicalPointOfContactProfile, WorkLocationProfile,
};
pub use program::{NewProgram, Program, ProgramDetails, ProgramKey, ProgramTreeNode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
