//! Local profile reconciliation
//!
//! For each of the four aspects an effort either inherits or owns one local
//! profile. Given the payload's inherit flag, whether it supplied data, and
//! the effort's current profile reference:
//!
//! | inherit | data | existing | action                     |
//! |---------|------|----------|----------------------------|
//! | true    | any  | some     | destroy profile, clear ref |
//! | true    | any  | none     | nothing                    |
//! | false   | no   | any      | keep existing ref as is    |
//! | false   | yes  | some     | overwrite profile in place |
//! | false   | yes  | none     | create profile, link it    |

use catalog_model::{EffortAttributes, ProfileData, ProfileKey, ProfileKind};
use catalog_store::{CatalogTx, StoreResult};
use tracing::debug;

/// What reconciliation does to one aspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAction {
    /// Inherited and nothing linked
    Nothing,
    /// Inherited; the linked profile is hard-deleted
    Destroy(ProfileKey),
    /// Local without new data; the reference is left untouched
    Keep(Option<ProfileKey>),
    /// Local with data; the linked profile is overwritten
    Overwrite(ProfileKey),
    /// Local with data and nothing linked; a profile is created
    Create,
}

/// Decide the action for one aspect
#[must_use]
pub fn plan(inherit: bool, has_data: bool, existing: Option<ProfileKey>) -> ProfileAction {
    match (inherit, has_data, existing) {
        (true, _, Some(key)) => ProfileAction::Destroy(key),
        (true, _, None) => ProfileAction::Nothing,
        (false, false, existing) => ProfileAction::Keep(existing),
        (false, true, Some(key)) => ProfileAction::Overwrite(key),
        (false, true, None) => ProfileAction::Create,
    }
}

/// Reconcile one aspect of `attributes` against payload input
///
/// Sets the inherit flag and the local reference on `attributes`; the caller
/// persists the effort row afterwards.
///
/// # Errors
/// Returns error on storage failure
pub fn reconcile_profile(
    tx: &mut dyn CatalogTx,
    attributes: &mut EffortAttributes,
    kind: ProfileKind,
    inherit: bool,
    data: Option<ProfileData>,
) -> StoreResult<ProfileAction> {
    let action = plan(inherit, data.is_some(), attributes.local(kind));
    attributes.set_inherits(kind, inherit);

    match (action, data) {
        (ProfileAction::Nothing, _) | (ProfileAction::Keep(_), _) => {}
        (ProfileAction::Destroy(key), _) => {
            tx.delete_profile(kind, key)?;
            attributes.set_local(kind, None);
        }
        (ProfileAction::Overwrite(key), Some(data)) => {
            tx.update_profile(key, &data)?;
        }
        (ProfileAction::Create, Some(data)) => {
            let key = tx.insert_profile(&data)?;
            attributes.set_local(kind, Some(key));
        }
        (ProfileAction::Overwrite(_) | ProfileAction::Create, None) => {}
    }

    debug!(kind = %kind, ?action, "profile reconciled");
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::WorkLocationProfile;
    use catalog_store::{CatalogStore, MemoryStore};

    fn site(name: &str) -> ProfileData {
        ProfileData::WorkLocation(WorkLocationProfile {
            site: Some(name.into()),
            ..Default::default()
        })
    }

    #[test]
    fn plan_covers_every_branch() {
        let k = ProfileKey(7);
        assert_eq!(plan(true, true, Some(k)), ProfileAction::Destroy(k));
        assert_eq!(plan(true, false, Some(k)), ProfileAction::Destroy(k));
        assert_eq!(plan(true, true, None), ProfileAction::Nothing);
        assert_eq!(plan(false, false, Some(k)), ProfileAction::Keep(Some(k)));
        assert_eq!(plan(false, false, None), ProfileAction::Keep(None));
        assert_eq!(plan(false, true, Some(k)), ProfileAction::Overwrite(k));
        assert_eq!(plan(false, true, None), ProfileAction::Create);
    }

    #[test]
    fn create_then_overwrite_then_destroy() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        let mut attrs = EffortAttributes::new("Radar", "1");
        let kind = ProfileKind::WorkLocation;

        let action =
            reconcile_profile(&mut *tx, &mut attrs, kind, false, Some(site("Everett"))).unwrap();
        assert_eq!(action, ProfileAction::Create);
        let key = attrs.local(kind).unwrap();
        assert!(!attrs.inherits(kind));

        let action =
            reconcile_profile(&mut *tx, &mut attrs, kind, false, Some(site("Renton"))).unwrap();
        assert_eq!(action, ProfileAction::Overwrite(key));
        assert_eq!(attrs.local(kind), Some(key));
        assert_eq!(tx.profile(kind, key).unwrap(), Some(site("Renton")));

        let action = reconcile_profile(&mut *tx, &mut attrs, kind, false, None).unwrap();
        assert_eq!(action, ProfileAction::Keep(Some(key)));
        assert_eq!(tx.profile_count(kind).unwrap(), 1);

        let action = reconcile_profile(&mut *tx, &mut attrs, kind, true, None).unwrap();
        assert_eq!(action, ProfileAction::Destroy(key));
        assert!(attrs.inherits(kind));
        assert!(attrs.local(kind).is_none());
        assert_eq!(tx.profile_count(kind).unwrap(), 0);
    }

    #[test]
    fn inherit_ignores_supplied_data() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        let mut attrs = EffortAttributes::new("Radar", "1");

        let action = reconcile_profile(
            &mut *tx,
            &mut attrs,
            ProfileKind::WorkLocation,
            true,
            Some(site("Everett")),
        )
        .unwrap();
        assert_eq!(action, ProfileAction::Nothing);
        assert_eq!(tx.profile_count(ProfileKind::WorkLocation).unwrap(), 0);
    }
}
