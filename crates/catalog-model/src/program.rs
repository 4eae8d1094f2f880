//! Programs and the derived program tree
//!
//! A [`Program`] row is one immutable version of an organizational unit. Rows
//! sharing a `program_id` are successive versions; the latest-dated active row
//! is the current one. [`ProgramTreeNode`] is the transient tree view built
//! from the current rows.

use crate::path::ProgramPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key of a single program version row
///
/// Distinct from the business `program_id`, which is shared by every version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProgramKey(pub i64);

impl std::fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptive metadata carried by every program version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDetails {
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub status: Option<String>,
    pub primary_location: Option<String>,
    pub organization_leader_name: Option<String>,
    pub chief_engineer_name: Option<String>,
    pub program_affiliation: Option<String>,
    pub program_type: Option<String>,
    pub program_value: Option<String>,
}

/// One stored version of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Storage key of this version row
    pub key: ProgramKey,
    /// Business identifier shared across versions
    pub program_id: String,
    /// Position in the hierarchy
    pub path: ProgramPath,
    pub name: String,
    /// Version timestamp
    pub date: DateTime<Utc>,
    pub active: bool,
    pub expect_software_effort: bool,
    #[serde(flatten)]
    pub details: ProgramDetails,
}

/// A program version that has not been stored yet
///
/// Ingestion inserts these; the store assigns the [`ProgramKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProgram {
    pub program_id: String,
    pub path: ProgramPath,
    pub name: String,
    pub date: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub expect_software_effort: bool,
    #[serde(flatten)]
    pub details: ProgramDetails,
}

fn default_active() -> bool {
    true
}

impl NewProgram {
    /// Create an active program version with no metadata
    #[must_use]
    pub fn new(
        program_id: impl Into<String>,
        path: ProgramPath,
        name: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            program_id: program_id.into(),
            path,
            name: name.into(),
            date,
            active: true,
            expect_software_effort: false,
            details: ProgramDetails::default(),
        }
    }

    /// With expect-software-effort flag
    #[inline]
    #[must_use]
    pub fn expecting_software_effort(mut self, expects: bool) -> Self {
        self.expect_software_effort = expects;
        self
    }

    /// With active flag
    #[inline]
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// With descriptive metadata
    #[inline]
    #[must_use]
    pub fn with_details(mut self, details: ProgramDetails) -> Self {
        self.details = details;
        self
    }

    /// Attach the storage key assigned on insert
    #[must_use]
    pub fn into_program(self, key: ProgramKey) -> Program {
        Program {
            key,
            program_id: self.program_id,
            path: self.path,
            name: self.name,
            date: self.date,
            active: self.active,
            expect_software_effort: self.expect_software_effort,
            details: self.details,
        }
    }
}

/// Node of the program hierarchy
///
/// `has_descendant_expecting_software_effort` describes the node's proper
/// descendants only; a node's own `expecting_software_efforts` never sets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramTreeNode {
    pub program_id: String,
    pub program_name: String,
    pub program_path: ProgramPath,
    pub description: Option<String>,
    pub primary_location: Option<String>,
    pub status: Option<String>,
    pub organization_leader_name: Option<String>,
    pub chief_engineer_name: Option<String>,
    pub program_type: Option<String>,
    pub program_value: Option<String>,
    pub expecting_software_efforts: bool,
    pub has_descendant_expecting_software_effort: bool,
    /// Children in discovery order
    pub children: Vec<ProgramTreeNode>,
}

impl ProgramTreeNode {
    /// Leaf node for a program version, flags copied, no descendants yet
    #[must_use]
    pub fn from_program(program: &Program) -> Self {
        Self {
            program_id: program.program_id.clone(),
            program_name: program.name.clone(),
            program_path: program.path.clone(),
            description: program.details.description.clone(),
            primary_location: program.details.primary_location.clone(),
            status: program.details.status.clone(),
            organization_leader_name: program.details.organization_leader_name.clone(),
            chief_engineer_name: program.details.chief_engineer_name.clone(),
            program_type: program.details.program_type.clone(),
            program_value: program.details.program_value.clone(),
            expecting_software_efforts: program.expect_software_effort,
            has_descendant_expecting_software_effort: false,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, self included
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Find a node in this subtree by path
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&ProgramTreeNode> {
        if self.program_path.to_string() == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Pre-order walk of this subtree
    pub fn walk(&self) -> impl Iterator<Item = &ProgramTreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}
