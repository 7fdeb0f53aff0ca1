//! In-memory store adapters for tests/dev.
//!
//! Each store hands out fresh copies of its rows on every read, so callers
//! always work on a point-in-time snapshot.

pub mod directory;
pub mod grants;
pub mod menus;

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use menugate_auth::{
    GrantSource, GroupGrantSet, GroupMembershipResolver, Membership, MenuSource, PermissionGrant, StoreError,
};
use menugate_core::{GroupId, UserId};
use menugate_menu::MenuNode;

pub use directory::InMemoryGroupDirectory;
pub use grants::InMemoryGrantStore;
pub use menus::InMemoryMenuStore;

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(poisoned)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(poisoned)
}

/// Menu, grant and group stores wired together.
///
/// Cross-store maintenance (deleting a group together with its grants) lives
/// here.
#[derive(Debug, Default)]
pub struct InMemoryStores {
    pub menus: InMemoryMenuStore,
    pub grants: InMemoryGrantStore,
    pub directory: InMemoryGroupDirectory,
}

impl InMemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one group's grants wholesale.
    pub fn save_group_permissions(&self, set: GroupGrantSet) -> Result<(), StoreError> {
        if !self.directory.has_group(set.group_id())? {
            return Err(StoreError::Malformed(format!("unknown group '{}'", set.group_id())));
        }
        self.grants.replace_group_grants(set)
    }

    /// Remove a group, its grants and every membership pointing at it.
    pub fn delete_group(&self, group_id: &GroupId) -> Result<bool, StoreError> {
        self.grants.delete_group_grants(group_id)?;
        self.directory.delete_group(group_id)
    }
}

impl MenuSource for InMemoryStores {
    fn menus(&self) -> Result<Vec<MenuNode>, StoreError> {
        self.menus.menus()
    }
}

impl GrantSource for InMemoryStores {
    fn grants(&self) -> Result<Vec<PermissionGrant>, StoreError> {
        self.grants.grants()
    }

    fn grants_for_groups(&self, group_ids: &BTreeSet<GroupId>) -> Result<Vec<PermissionGrant>, StoreError> {
        self.grants.grants_for_groups(group_ids)
    }
}

impl GroupMembershipResolver for InMemoryStores {
    fn resolve(&self, user_id: &UserId) -> Result<Membership, StoreError> {
        self.directory.resolve(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menugate_auth::{Capability, Group};

    #[test]
    fn deleting_a_group_deletes_its_grants() {
        let stores = InMemoryStores::new();
        stores.directory.upsert_group(Group::new("ADMIN", "Administrators")).unwrap();
        stores
            .save_group_permissions(
                GroupGrantSet::replace(
                    GroupId::new("ADMIN"),
                    vec![PermissionGrant::new("ADMIN", "sys").with(Capability::Read)],
                )
                .unwrap(),
            )
            .unwrap();

        assert!(stores.delete_group(&GroupId::new("ADMIN")).unwrap());
        assert!(stores.grants.grants().unwrap().is_empty());
        assert!(!stores.directory.has_group(&GroupId::new("ADMIN")).unwrap());
    }

    #[test]
    fn saving_permissions_for_unknown_group_fails() {
        let stores = InMemoryStores::new();
        let set = GroupGrantSet::replace(GroupId::new("GHOST"), Vec::new()).unwrap();

        assert!(matches!(stores.save_group_permissions(set), Err(StoreError::Malformed(_))));
    }
}
