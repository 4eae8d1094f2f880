//! Effort upsert payload
//!
//! [`EffortPayload`] is the strongly-typed input for saving one effort. Linked
//! efforts arrive loosely typed from the caller (a UUID string, a numeric
//! storage key, or an object carrying one of them), which [`LinkedEffortRef`]
//! captures without losing the raw form.

use crate::profile::{
    DeveloperSetupProfile, ProfileData, ProfileKind, StatementOfWorkProfile,
    TechnicalPointOfContactProfile, WorkLocationProfile,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Keys checked, in order, when a linked effort arrives as an object
pub const LINK_OBJECT_KEYS: [&str; 3] = ["uuid", "id", "pk"];

/// One loosely-typed reference to another effort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkedEffortRef {
    /// Numeric storage key
    Key(i64),
    /// UUID string, or a numeric key written as text
    Text(String),
    /// Object carrying `uuid`, `id` or `pk`
    Object(serde_json::Map<String, Value>),
}

impl LinkedEffortRef {
    /// Reference by UUID
    #[must_use]
    pub fn uuid(uuid: Uuid) -> Self {
        Self::Text(uuid.to_string())
    }

    /// Identifier to resolve, if one can be extracted
    ///
    /// Text is trimmed. Objects yield the first non-empty string or non-zero
    /// number found under [`LINK_OBJECT_KEYS`].
    #[must_use]
    pub fn identifier(&self) -> Option<String> {
        match self {
            LinkedEffortRef::Key(key) => Some(key.to_string()),
            LinkedEffortRef::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            LinkedEffortRef::Object(map) => LINK_OBJECT_KEYS.iter().find_map(|key| {
                match map.get(*key)? {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
                    _ => None,
                }
            }),
        }
    }

    /// Form stored when the reference cannot be resolved
    ///
    /// The extracted identifier when there is one, otherwise the raw value as
    /// JSON text so the position is never lost.
    #[must_use]
    pub fn pass_through(&self) -> String {
        self.identifier().unwrap_or_else(|| match self {
            LinkedEffortRef::Key(key) => key.to_string(),
            LinkedEffortRef::Text(text) => text.clone(),
            LinkedEffortRef::Object(map) => Value::Object(map.clone()).to_string(),
        })
    }
}

impl std::fmt::Display for LinkedEffortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkedEffortRef::Key(key) => write!(f, "{key}"),
            LinkedEffortRef::Text(text) => write!(f, "{text:?}"),
            LinkedEffortRef::Object(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

fn default_inherit() -> bool {
    true
}

/// Input for saving one software effort
///
/// Absent inherit flags default to `true`. `linked_software_efforts: None`
/// leaves existing links untouched; `Some(vec![])` clears them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortPayload {
    /// Identity of an existing effort to update; loosely typed as received
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_uuid: Option<String>,

    #[serde(default = "default_inherit")]
    pub inherit_statement_of_work_profile: bool,
    #[serde(default = "default_inherit")]
    pub inherit_developer_setup: bool,
    #[serde(default = "default_inherit")]
    pub inherit_technical_points_of_contact: bool,
    #[serde(default = "default_inherit")]
    pub inherit_work_location: bool,

    #[serde(default)]
    pub statement_of_work_profile: Option<StatementOfWorkProfile>,
    #[serde(default)]
    pub developer_setup: Option<DeveloperSetupProfile>,
    #[serde(default)]
    pub technical_points_of_contact: Option<TechnicalPointOfContactProfile>,
    #[serde(default)]
    pub work_location: Option<WorkLocationProfile>,

    #[serde(default)]
    pub linked_software_efforts: Option<Vec<LinkedEffortRef>>,
}

impl Default for EffortPayload {
    fn default() -> Self {
        Self {
            uuid: None,
            name: String::new(),
            parent_uuid: None,
            inherit_statement_of_work_profile: true,
            inherit_developer_setup: true,
            inherit_technical_points_of_contact: true,
            inherit_work_location: true,
            statement_of_work_profile: None,
            developer_setup: None,
            technical_points_of_contact: None,
            work_location: None,
            linked_software_efforts: None,
        }
    }
}

impl EffortPayload {
    /// New payload for a named effort, inheriting every aspect
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Target an existing effort by UUID
    #[inline]
    #[must_use]
    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid.to_string());
        self
    }

    /// Nest under a parent effort
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: Uuid) -> Self {
        self.parent_uuid = Some(parent.to_string());
        self
    }

    /// Supply a local profile and stop inheriting its aspect
    #[must_use]
    pub fn with_local_profile(mut self, profile: ProfileData) -> Self {
        self.set_inherits(profile.kind(), false);
        match profile {
            ProfileData::StatementOfWork(p) => self.statement_of_work_profile = Some(p),
            ProfileData::DeveloperSetup(p) => self.developer_setup = Some(p),
            ProfileData::TechnicalPointsOfContact(p) => self.technical_points_of_contact = Some(p),
            ProfileData::WorkLocation(p) => self.work_location = Some(p),
        }
        self
    }

    /// Set the inherit flag for an aspect
    #[must_use]
    pub fn inheriting(mut self, kind: ProfileKind, inherit: bool) -> Self {
        self.set_inherits(kind, inherit);
        self
    }

    /// Replace linked efforts
    #[must_use]
    pub fn with_links(mut self, links: Vec<LinkedEffortRef>) -> Self {
        self.linked_software_efforts = Some(links);
        self
    }

    /// True when the payload carries neither identity nor name
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.uuid.as_deref().map_or(true, |u| u.trim().is_empty())
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

    fn set_inherits(&mut self, kind: ProfileKind, inherit: bool) {
        match kind {
            ProfileKind::StatementOfWork => self.inherit_statement_of_work_profile = inherit,
            ProfileKind::DeveloperSetup => self.inherit_developer_setup = inherit,
            ProfileKind::TechnicalPointsOfContact => {
                self.inherit_technical_points_of_contact = inherit;
            }
            ProfileKind::WorkLocation => self.inherit_work_location = inherit,
        }
    }

    /// Supplied profile data for an aspect
    #[must_use]
    pub fn profile(&self, kind: ProfileKind) -> Option<ProfileData> {
        match kind {
            ProfileKind::StatementOfWork => self
                .statement_of_work_profile
                .clone()
                .map(ProfileData::StatementOfWork),
            ProfileKind::DeveloperSetup => {
                self.developer_setup.clone().map(ProfileData::DeveloperSetup)
            }
            ProfileKind::TechnicalPointsOfContact => self
                .technical_points_of_contact
                .clone()
                .map(ProfileData::TechnicalPointsOfContact),
            ProfileKind::WorkLocation => self.work_location.clone().map(ProfileData::WorkLocation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn links_deserialize_in_every_shape() {
        let payload: EffortPayload = serde_json::from_value(json!({
            "name": "Mission Systems",
            "linked_software_efforts": [
                "5f0c7e6a-1111-4a3b-9c4d-000000000001",
                42,
                "17",
                { "uuid": "5f0c7e6a-1111-4a3b-9c4d-000000000002" },
                { "id": 9 },
                { "pk": "" }
            ]
        }))
        .unwrap();

        let links = payload.linked_software_efforts.unwrap();
        assert_eq!(links.len(), 6);
        assert!(matches!(links[1], LinkedEffortRef::Key(42)));
        assert!(matches!(links[2], LinkedEffortRef::Text(_)));
        assert!(matches!(links[3], LinkedEffortRef::Object(_)));
    }

    #[test]
    fn identifier_extraction() {
        assert_eq!(
            LinkedEffortRef::Text("  abc  ".into()).identifier().as_deref(),
            Some("abc")
        );
        assert_eq!(LinkedEffortRef::Text("   ".into()).identifier(), None);
        assert_eq!(LinkedEffortRef::Key(12).identifier().as_deref(), Some("12"));

        let object = |v: Value| match v {
            Value::Object(map) => LinkedEffortRef::Object(map),
            _ => unreachable!(),
        };
        assert_eq!(
            object(json!({ "id": 0, "pk": 5 })).identifier().as_deref(),
            Some("5")
        );
        assert_eq!(
            object(json!({ "uuid": "", "id": "x-1" })).identifier().as_deref(),
            Some("x-1")
        );
        assert_eq!(object(json!({ "name": "other" })).identifier(), None);
    }

    #[test]
    fn pass_through_keeps_raw_form() {
        let raw = match json!({ "name": "other" }) {
            Value::Object(map) => LinkedEffortRef::Object(map),
            _ => unreachable!(),
        };
        assert_eq!(raw.pass_through(), r#"{"name":"other"}"#);
        assert_eq!(LinkedEffortRef::Text(" 77 ".into()).pass_through(), "77");
    }

    #[test]
    fn inherit_flags_default_true() {
        let payload: EffortPayload = serde_json::from_value(json!({ "name": "x" })).unwrap();
        for kind in ProfileKind::ALL {
            assert!(payload.inherits(kind));
            assert!(payload.profile(kind).is_none());
        }
        assert!(payload.linked_software_efforts.is_none());
    }

    #[test]
    fn local_profile_clears_inherit() {
        let payload = EffortPayload::named("x").with_local_profile(ProfileData::WorkLocation(
            WorkLocationProfile {
                site: Some("Renton".into()),
                ..Default::default()
            },
        ));
        assert!(!payload.inherits(ProfileKind::WorkLocation));
        assert!(payload.inherits(ProfileKind::DeveloperSetup));
        assert_eq!(
            payload.profile(ProfileKind::WorkLocation).unwrap().kind(),
            ProfileKind::WorkLocation
        );
    }

    #[test]
    fn empty_payload_detection() {
        assert!(EffortPayload::default().is_empty());
        assert!(EffortPayload::named("   ").is_empty());
        assert!(!EffortPayload::named("Radar").is_empty());
        assert!(!EffortPayload::default().with_uuid(Uuid::new_v4()).is_empty());
    }
}
