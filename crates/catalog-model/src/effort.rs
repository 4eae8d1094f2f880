//! Software efforts
//!
//! [`EffortRecord`] is the stored shape: scalar fields plus foreign keys to
//! the four local profiles. [`SoftwareEffort`] is the read model handed to
//! callers, with profiles and linked efforts resolved.

use crate::profile::{
    DeveloperSetupProfile, ProfileData, ProfileKey, ProfileKind, StatementOfWorkProfile,
    TechnicalPointOfContactProfile, WorkLocationProfile,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage key of an effort row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffortKey(pub i64);

impl std::fmt::Display for EffortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable columns of an effort row
///
/// Invariant kept by the upsert engine: when `inherits(kind)` is true,
/// `local(kind)` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffortAttributes {
    pub name: String,
    /// Business id of the owning program
    pub program_id: String,
    pub parent: Option<EffortKey>,
    pub inherit_statement_of_work_profile: bool,
    pub inherit_developer_setup: bool,
    pub inherit_technical_points_of_contact: bool,
    pub inherit_work_location: bool,
    pub local_statement_of_work_profile: Option<ProfileKey>,
    pub local_developer_setup: Option<ProfileKey>,
    pub local_technical_points_of_contact: Option<ProfileKey>,
    pub local_work_location: Option<ProfileKey>,
}

impl EffortAttributes {
    /// Attributes for a new effort that inherits every aspect
    #[must_use]
    pub fn new(name: impl Into<String>, program_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program_id: program_id.into(),
            parent: None,
            inherit_statement_of_work_profile: true,
            inherit_developer_setup: true,
            inherit_technical_points_of_contact: true,
            inherit_work_location: true,
            local_statement_of_work_profile: None,
            local_developer_setup: None,
            local_technical_points_of_contact: None,
            local_work_location: None,
        }
    }

    /// Inherit flag for an aspect
    #[must_use]
    pub fn inherits(&self, kind: ProfileKind) -> bool {
        match kind {
            ProfileKind::StatementOfWork => self.inherit_statement_of_work_profile,
            ProfileKind::DeveloperSetup => self.inherit_developer_setup,
            ProfileKind::TechnicalPointsOfContact => self.inherit_technical_points_of_contact,
            ProfileKind::WorkLocation => self.inherit_work_location,
        }
    }

    /// Set the inherit flag for an aspect
    pub fn set_inherits(&mut self, kind: ProfileKind, inherit: bool) {
        match kind {
            ProfileKind::StatementOfWork => self.inherit_statement_of_work_profile = inherit,
            ProfileKind::DeveloperSetup => self.inherit_developer_setup = inherit,
            ProfileKind::TechnicalPointsOfContact => {
                self.inherit_technical_points_of_contact = inherit;
            }
            ProfileKind::WorkLocation => self.inherit_work_location = inherit,
        }
    }

    /// Linked local profile for an aspect
    #[must_use]
    pub fn local(&self, kind: ProfileKind) -> Option<ProfileKey> {
        match kind {
            ProfileKind::StatementOfWork => self.local_statement_of_work_profile,
            ProfileKind::DeveloperSetup => self.local_developer_setup,
            ProfileKind::TechnicalPointsOfContact => self.local_technical_points_of_contact,
            ProfileKind::WorkLocation => self.local_work_location,
        }
    }

    /// Set the local profile reference for an aspect
    pub fn set_local(&mut self, kind: ProfileKind, key: Option<ProfileKey>) {
        match kind {
            ProfileKind::StatementOfWork => self.local_statement_of_work_profile = key,
            ProfileKind::DeveloperSetup => self.local_developer_setup = key,
            ProfileKind::TechnicalPointsOfContact => self.local_technical_points_of_contact = key,
            ProfileKind::WorkLocation => self.local_work_location = key,
        }
    }
}

/// A stored effort row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffortRecord {
    pub key: EffortKey,
    /// Stable identity, assigned at creation
    pub uuid: Uuid,
    pub attributes: EffortAttributes,
}

/// Effort as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareEffort {
    pub uuid: Uuid,
    pub name: String,
    pub program_id: String,
    pub parent_uuid: Option<Uuid>,
    pub inherit_statement_of_work_profile: bool,
    pub inherit_developer_setup: bool,
    pub inherit_technical_points_of_contact: bool,
    pub inherit_work_location: bool,
    pub statement_of_work_profile: Option<StatementOfWorkProfile>,
    pub developer_setup: Option<DeveloperSetupProfile>,
    pub technical_points_of_contact: Option<TechnicalPointOfContactProfile>,
    pub work_location: Option<WorkLocationProfile>,
    /// Identifiers of linked efforts (canonical UUIDs where known)
    pub linked_software_efforts: Vec<String>,
}

impl SoftwareEffort {
    /// Read model for a record, profiles and links still empty
    #[must_use]
    pub fn from_record(record: &EffortRecord, parent_uuid: Option<Uuid>) -> Self {
        let attrs = &record.attributes;
        Self {
            uuid: record.uuid,
            name: attrs.name.clone(),
            program_id: attrs.program_id.clone(),
            parent_uuid,
            inherit_statement_of_work_profile: attrs.inherit_statement_of_work_profile,
            inherit_developer_setup: attrs.inherit_developer_setup,
            inherit_technical_points_of_contact: attrs.inherit_technical_points_of_contact,
            inherit_work_location: attrs.inherit_work_location,
            statement_of_work_profile: None,
            developer_setup: None,
            technical_points_of_contact: None,
            work_location: None,
            linked_software_efforts: Vec::new(),
        }
    }

    /// Place a loaded local profile in its slot
    pub fn attach_profile(&mut self, profile: ProfileData) {
        match profile {
            ProfileData::StatementOfWork(p) => self.statement_of_work_profile = Some(p),
            ProfileData::DeveloperSetup(p) => self.developer_setup = Some(p),
            ProfileData::TechnicalPointsOfContact(p) => {
                self.technical_points_of_contact = Some(p);
            }
            ProfileData::WorkLocation(p) => self.work_location = Some(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_attributes_inherit_everything() {
        let attrs = EffortAttributes::new("Flight Software", "101");
        for kind in ProfileKind::ALL {
            assert!(attrs.inherits(kind));
            assert!(attrs.local(kind).is_none());
        }
    }

    #[test]
    fn accessors_address_one_aspect() {
        let mut attrs = EffortAttributes::new("Ground Station", "101");
        attrs.set_inherits(ProfileKind::WorkLocation, false);
        attrs.set_local(ProfileKind::WorkLocation, Some(ProfileKey(3)));

        assert!(!attrs.inherit_work_location);
        assert_eq!(attrs.local_work_location, Some(ProfileKey(3)));
        assert!(attrs.inherit_developer_setup);
        assert!(attrs.local_developer_setup.is_none());
    }

    #[test]
    fn attach_profile_fills_matching_slot() {
        let record = EffortRecord {
            key: EffortKey(1),
            uuid: Uuid::new_v4(),
            attributes: EffortAttributes::new("Sim", "7"),
        };
        let mut effort = SoftwareEffort::from_record(&record, None);
        effort.attach_profile(ProfileData::WorkLocation(WorkLocationProfile {
            site: Some("Everett".into()),
            ..Default::default()
        }));

        assert_eq!(effort.work_location.unwrap().site.as_deref(), Some("Everett"));
        assert!(effort.developer_setup.is_none());
    }
}
