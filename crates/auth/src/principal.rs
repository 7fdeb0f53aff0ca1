use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use menugate_core::{GroupId, UserId};

/// An authenticated principal and the groups it belongs to.
///
/// `group_ids` may be empty: that is an authenticated user with no access,
/// not an anonymous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPrincipal {
    pub principal_id: UserId,
    pub group_ids: BTreeSet<GroupId>,
}

/// Result of resolving a user's group memberships.
///
/// Produced by the authentication collaborator; this crate never looks at
/// sessions or credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    Authenticated(AuthenticatedPrincipal),
    /// No valid principal for the identifier (unknown user, expired session, ...).
    Unauthenticated,
}

impl Membership {
    pub fn authenticated<G>(principal_id: impl Into<UserId>, group_ids: impl IntoIterator<Item = G>) -> Self
    where
        G: Into<GroupId>,
    {
        Membership::Authenticated(AuthenticatedPrincipal {
            principal_id: principal_id.into(),
            group_ids: group_ids.into_iter().map(Into::into).collect(),
        })
    }

    pub fn principal(&self) -> Option<&AuthenticatedPrincipal> {
        match self {
            Membership::Authenticated(p) => Some(p),
            Membership::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_groups_is_still_authenticated() {
        let membership = Membership::authenticated("alice", Vec::<GroupId>::new());
        assert!(membership.is_authenticated());
        assert!(membership.principal().unwrap().group_ids.is_empty());
    }

    #[test]
    fn group_ids_are_deduplicated_and_ordered() {
        let membership = Membership::authenticated("bob", ["USER", "ADMIN", "USER"]);
        let groups: Vec<_> = membership
            .principal()
            .unwrap()
            .group_ids
            .iter()
            .map(GroupId::as_str)
            .collect();
        assert_eq!(groups, vec!["ADMIN", "USER"]);
    }
}
