use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use menugate_auth::{Group, GroupMembershipResolver, Membership, StoreError};
use menugate_core::{Entity, GroupId, UserId};

use super::{read, write};

#[derive(Debug, Default)]
struct Directory {
    groups: BTreeMap<GroupId, Group>,
    members: BTreeMap<UserId, BTreeSet<GroupId>>,
}

/// In-memory user → group directory.
///
/// Users absent from the directory resolve as unauthenticated. Memberships in
/// inactive or undefined groups are dropped during resolution.
#[derive(Debug, Default)]
pub struct InMemoryGroupDirectory {
    inner: RwLock<Directory>,
}

impl InMemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_group(&self, group: Group) -> Result<(), StoreError> {
        group
            .validate()
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        write(&self.inner)?.groups.insert(group.id().clone(), group);
        Ok(())
    }

    pub fn has_group(&self, group_id: &GroupId) -> Result<bool, StoreError> {
        Ok(read(&self.inner)?.groups.contains_key(group_id))
    }

    /// Remove the group and every membership pointing at it.
    pub fn delete_group(&self, group_id: &GroupId) -> Result<bool, StoreError> {
        let mut dir = write(&self.inner)?;
        let existed = dir.groups.remove(group_id).is_some();
        for groups in dir.members.values_mut() {
            groups.remove(group_id);
        }
        Ok(existed)
    }

    /// Register a user with the given groups (replacing any previous set).
    /// An empty set is a valid, authenticated user with no access.
    pub fn set_memberships<G>(&self, user_id: impl Into<UserId>, group_ids: impl IntoIterator<Item = G>) -> Result<(), StoreError>
    where
        G: Into<GroupId>,
    {
        let groups = group_ids.into_iter().map(Into::into).collect();
        write(&self.inner)?.members.insert(user_id.into(), groups);
        Ok(())
    }

    pub fn remove_user(&self, user_id: &UserId) -> Result<bool, StoreError> {
        Ok(write(&self.inner)?.members.remove(user_id).is_some())
    }
}

impl GroupMembershipResolver for InMemoryGroupDirectory {
    fn resolve(&self, user_id: &UserId) -> Result<Membership, StoreError> {
        let dir = read(&self.inner)?;
        let Some(declared) = dir.members.get(user_id) else {
            return Ok(Membership::Unauthenticated);
        };

        let active = declared.iter().filter(|g| match dir.groups.get(*g) {
            Some(group) if group.active => true,
            Some(_) => {
                tracing::debug!(user_id = %user_id, group_id = %g, "skipping inactive group");
                false
            }
            None => {
                tracing::warn!(user_id = %user_id, group_id = %g, "membership references undefined group");
                false
            }
        });

        Ok(Membership::authenticated(user_id.clone(), active.cloned().collect::<Vec<_>>()))
    }
}
