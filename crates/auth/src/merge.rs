//! Permission merge engine.
//!
//! Folds the grants of a user's groups into one capability record per menu.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use menugate_core::{GroupId, MenuId};

use crate::{Capability, EffectivePermission, PermissionGrant};

/// Merged capabilities keyed by menu.
///
/// Menus without any matching grant are absent; [`PermissionMap::effective`]
/// reports them as all-false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<MenuId, EffectivePermission>);

impl PermissionMap {
    /// Explicit merged record, if any grant matched.
    pub fn get(&self, menu_id: &str) -> Option<&EffectivePermission> {
        self.0.get(menu_id)
    }

    /// Merged record, all-false when nothing matched.
    pub fn effective(&self, menu_id: &str) -> EffectivePermission {
        self.get(menu_id).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MenuId, &EffectivePermission)> {
        self.0.iter()
    }

    /// Every record in `self` is a bitwise subset of the same menu in `other`.
    pub fn is_subset_of(&self, other: &PermissionMap) -> bool {
        self.0
            .iter()
            .all(|(menu_id, perm)| perm.is_subset_of(&other.effective(menu_id.as_str())))
    }
}

/// OR-merge every grant held by one of `group_ids`.
///
/// Order-independent. An empty group set yields an empty map. A repeated
/// `(group, menu)` pair is merged like any other grant and logged.
pub fn merge<'a>(
    group_ids: &BTreeSet<GroupId>,
    grants: impl IntoIterator<Item = &'a PermissionGrant>,
) -> PermissionMap {
    let mut merged: BTreeMap<MenuId, EffectivePermission> = BTreeMap::new();
    if group_ids.is_empty() {
        return PermissionMap(merged);
    }

    let mut seen: HashSet<(&GroupId, &MenuId)> = HashSet::new();
    for grant in grants {
        if !group_ids.contains(&grant.group_id) {
            continue;
        }
        if !seen.insert((&grant.group_id, &grant.menu_id)) {
            tracing::warn!(
                group_id = %grant.group_id,
                menu_id = %grant.menu_id,
                "grant snapshot anomaly: repeated (group, menu) grant"
            );
        }
        *merged.entry(grant.menu_id.clone()).or_default() |= grant.capabilities();
    }

    PermissionMap(merged)
}

/// Groups among `group_ids` whose grant on `menu_id` includes `capability`.
pub fn contributing_groups<'a>(
    group_ids: &BTreeSet<GroupId>,
    grants: impl IntoIterator<Item = &'a PermissionGrant>,
    menu_id: &str,
    capability: Capability,
) -> Vec<GroupId> {
    let found: BTreeSet<GroupId> = grants
        .into_iter()
        .filter(|g| g.menu_id.as_str() == menu_id)
        .filter(|g| group_ids.contains(&g.group_id))
        .filter(|g| g.capabilities().allows(capability))
        .map(|g| g.group_id.clone())
        .collect();
    found.into_iter().collect()
}
