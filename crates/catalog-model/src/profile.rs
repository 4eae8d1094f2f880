//! Local configuration profiles
//!
//! Each software effort has four configuration aspects. For every aspect the
//! effort either inherits a default from above or owns exactly one local
//! profile row holding the override. [`ProfileKind`] names the aspect and
//! [`ProfileData`] carries the attributes of one local profile.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Storage key of a local profile row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileKey(pub i64);

impl std::fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four independently inheritable configuration aspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    StatementOfWork,
    DeveloperSetup,
    TechnicalPointsOfContact,
    WorkLocation,
}

impl ProfileKind {
    /// Every aspect, in a fixed order
    pub const ALL: [ProfileKind; 4] = [
        ProfileKind::StatementOfWork,
        ProfileKind::DeveloperSetup,
        ProfileKind::TechnicalPointsOfContact,
        ProfileKind::WorkLocation,
    ];

    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::StatementOfWork => "statement_of_work",
            ProfileKind::DeveloperSetup => "developer_setup",
            ProfileKind::TechnicalPointsOfContact => "technical_points_of_contact",
            ProfileKind::WorkLocation => "work_location",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract and scope terms of an effort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementOfWorkProfile {
    pub contract_number: Option<String>,
    pub contract_type: Option<String>,
    pub period_of_performance: Option<String>,
    pub deliverables: Option<String>,
    pub security_classification: Option<String>,
}

/// Tooling used by the effort's developers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeveloperSetupProfile {
    pub source_control_url: Option<String>,
    pub issue_tracker_url: Option<String>,
    pub ci_pipeline_url: Option<String>,
    pub primary_languages: Vec<String>,
    pub development_environment: Option<String>,
}

/// Technical contacts for the effort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalPointOfContactProfile {
    pub software_lead_name: Option<String>,
    pub software_lead_email: Option<String>,
    pub chief_architect_name: Option<String>,
    pub chief_architect_email: Option<String>,
    pub security_focal_email: Option<String>,
}

/// Where the effort's work is performed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkLocationProfile {
    pub site: Option<String>,
    pub building: Option<String>,
    pub network_domain: Option<String>,
    pub remote_work_permitted: Option<bool>,
}

/// Attributes of one local profile, tagged by aspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "attributes", rename_all = "snake_case")]
pub enum ProfileData {
    StatementOfWork(StatementOfWorkProfile),
    DeveloperSetup(DeveloperSetupProfile),
    TechnicalPointsOfContact(TechnicalPointOfContactProfile),
    WorkLocation(WorkLocationProfile),
}

impl ProfileData {
    /// Aspect this profile belongs to
    #[must_use]
    pub fn kind(&self) -> ProfileKind {
        match self {
            ProfileData::StatementOfWork(_) => ProfileKind::StatementOfWork,
            ProfileData::DeveloperSetup(_) => ProfileKind::DeveloperSetup,
            ProfileData::TechnicalPointsOfContact(_) => ProfileKind::TechnicalPointsOfContact,
            ProfileData::WorkLocation(_) => ProfileKind::WorkLocation,
        }
    }

    /// Flat attribute bag as stored
    ///
    /// # Errors
    /// Returns error if the attributes cannot be encoded
    pub fn to_attributes(&self) -> Result<serde_json::Value, ModelError> {
        let encoded = match self {
            ProfileData::StatementOfWork(p) => serde_json::to_value(p),
            ProfileData::DeveloperSetup(p) => serde_json::to_value(p),
            ProfileData::TechnicalPointsOfContact(p) => serde_json::to_value(p),
            ProfileData::WorkLocation(p) => serde_json::to_value(p),
        };
        encoded.map_err(|e| ModelError::profile_attributes(self.kind().as_str(), e))
    }

    /// Rebuild a profile of `kind` from its stored attribute bag
    ///
    /// # Errors
    /// Returns error if the attributes do not fit the kind's shape
    pub fn from_attributes(
        kind: ProfileKind,
        attributes: serde_json::Value,
    ) -> Result<Self, ModelError> {
        let decoded = match kind {
            ProfileKind::StatementOfWork => {
                serde_json::from_value(attributes).map(ProfileData::StatementOfWork)
            }
            ProfileKind::DeveloperSetup => {
                serde_json::from_value(attributes).map(ProfileData::DeveloperSetup)
            }
            ProfileKind::TechnicalPointsOfContact => {
                serde_json::from_value(attributes).map(ProfileData::TechnicalPointsOfContact)
            }
            ProfileKind::WorkLocation => {
                serde_json::from_value(attributes).map(ProfileData::WorkLocation)
            }
        };
        decoded.map_err(|e| ModelError::profile_attributes(kind.as_str(), e))
    }
}
