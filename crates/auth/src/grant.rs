use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use menugate_core::{GroupId, MenuId};

use crate::{Capability, EffectivePermission};

/// "Group G has capability set C on menu M."
///
/// At most one grant exists per `(group_id, menu_id)`; a missing grant means
/// all four capabilities are false for that pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    pub group_id: GroupId,
    pub menu_id: MenuId,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub can_admin: bool,
}

impl PermissionGrant {
    /// Grant with every capability off.
    pub fn new(group_id: impl Into<GroupId>, menu_id: impl Into<MenuId>) -> Self {
        Self {
            group_id: group_id.into(),
            menu_id: menu_id.into(),
            can_read: false,
            can_write: false,
            can_delete: false,
            can_admin: false,
        }
    }

    pub fn with(self, capability: Capability) -> Self {
        let caps = self.capabilities().with(capability);
        Self {
            can_read: caps.can_read,
            can_write: caps.can_write,
            can_delete: caps.can_delete,
            can_admin: caps.can_admin,
            ..self
        }
    }

    pub fn capabilities(&self) -> EffectivePermission {
        EffectivePermission {
            can_read: self.can_read,
            can_write: self.can_write,
            can_delete: self.can_delete,
            can_admin: self.can_admin,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrantSetError {
    #[error("grant for menu '{menu_id}' belongs to group '{found}', expected '{expected}'")]
    ForeignGroup {
        expected: GroupId,
        found: GroupId,
        menu_id: MenuId,
    },

    #[error("menu '{0}' appears more than once in the grant set")]
    DuplicateMenu(MenuId),
}

/// Validated replacement of one group's complete grant list.
///
/// Grants are never patched: permission editing replaces the whole list for a
/// group (delete-all-then-insert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupGrantSet {
    group_id: GroupId,
    grants: Vec<PermissionGrant>,
}

impl GroupGrantSet {
    pub fn replace(group_id: GroupId, grants: Vec<PermissionGrant>) -> Result<Self, GrantSetError> {
        let mut seen: HashSet<&MenuId> = HashSet::new();
        for grant in &grants {
            if grant.group_id != group_id {
                return Err(GrantSetError::ForeignGroup {
                    expected: group_id.clone(),
                    found: grant.group_id.clone(),
                    menu_id: grant.menu_id.clone(),
                });
            }
            if !seen.insert(&grant.menu_id) {
                return Err(GrantSetError::DuplicateMenu(grant.menu_id.clone()));
            }
        }

        Ok(Self { group_id, grants })
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn grants(&self) -> &[PermissionGrant] {
        &self.grants
    }

    pub fn into_grants(self) -> Vec<PermissionGrant> {
        self.grants
    }
}
