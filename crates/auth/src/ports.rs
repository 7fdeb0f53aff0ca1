//! Collaborator contracts: snapshot sources and the membership resolver.
//!
//! Implementations live outside this crate (see `menugate-infra`). Failures
//! are reported as [`StoreError`] and propagated unchanged.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use menugate_core::{GroupId, UserId};
use menugate_menu::MenuNode;

use crate::{Membership, PermissionGrant};

/// Failure to obtain a snapshot from a collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed store data: {0}")]
    Malformed(String),
}

/// Supplies the flat menu snapshot.
pub trait MenuSource: Send + Sync {
    fn menus(&self) -> Result<Vec<MenuNode>, StoreError>;
}

/// Supplies the flat grant snapshot.
pub trait GrantSource: Send + Sync {
    fn grants(&self) -> Result<Vec<PermissionGrant>, StoreError>;

    /// Grants held by any of `group_ids`. Stores that can filter at the
    /// source should override this.
    fn grants_for_groups(&self, group_ids: &BTreeSet<GroupId>) -> Result<Vec<PermissionGrant>, StoreError> {
        let mut grants = self.grants()?;
        grants.retain(|g| group_ids.contains(&g.group_id));
        Ok(grants)
    }
}

/// Resolves an authenticated principal's group memberships.
pub trait GroupMembershipResolver: Send + Sync {
    fn resolve(&self, user_id: &UserId) -> Result<Membership, StoreError>;
}

impl<S> MenuSource for Arc<S>
where
    S: MenuSource + ?Sized,
{
    fn menus(&self) -> Result<Vec<MenuNode>, StoreError> {
        (**self).menus()
    }
}

impl<S> GrantSource for Arc<S>
where
    S: GrantSource + ?Sized,
{
    fn grants(&self) -> Result<Vec<PermissionGrant>, StoreError> {
        (**self).grants()
    }

    fn grants_for_groups(&self, group_ids: &BTreeSet<GroupId>) -> Result<Vec<PermissionGrant>, StoreError> {
        (**self).grants_for_groups(group_ids)
    }
}

impl<S> GroupMembershipResolver for Arc<S>
where
    S: GroupMembershipResolver + ?Sized,
{
    fn resolve(&self, user_id: &UserId) -> Result<Membership, StoreError> {
        (**self).resolve(user_id)
    }
}
