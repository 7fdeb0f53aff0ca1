use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use menugate_auth::{GrantSource, GroupGrantSet, PermissionGrant, StoreError};
use menugate_core::GroupId;

use super::{read, write};

/// In-memory grant table, one list per group.
#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    inner: RwLock<BTreeMap<GroupId, Vec<PermissionGrant>>>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete every grant of the group, then insert the new set.
    pub fn replace_group_grants(&self, set: GroupGrantSet) -> Result<(), StoreError> {
        let group_id = set.group_id().clone();
        let grants = set.into_grants();
        tracing::debug!(group_id = %group_id, grants = grants.len(), "replacing group grants");

        let mut map = write(&self.inner)?;
        if grants.is_empty() {
            map.remove(&group_id);
        } else {
            map.insert(group_id, grants);
        }
        Ok(())
    }

    pub fn delete_group_grants(&self, group_id: &GroupId) -> Result<usize, StoreError> {
        Ok(write(&self.inner)?.remove(group_id).map_or(0, |g| g.len()))
    }

    pub fn group_grants(&self, group_id: &GroupId) -> Result<Vec<PermissionGrant>, StoreError> {
        Ok(read(&self.inner)?.get(group_id).cloned().unwrap_or_default())
    }
}

impl GrantSource for InMemoryGrantStore {
    fn grants(&self) -> Result<Vec<PermissionGrant>, StoreError> {
        Ok(read(&self.inner)?.values().flatten().cloned().collect())
    }

    fn grants_for_groups(&self, group_ids: &BTreeSet<GroupId>) -> Result<Vec<PermissionGrant>, StoreError> {
        let map = read(&self.inner)?;
        Ok(group_ids
            .iter()
            .filter_map(|g| map.get(g))
            .flatten()
            .cloned()
            .collect())
    }
}
