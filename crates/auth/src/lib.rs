//! `menugate-auth`: group-based menu permission resolution.
//!
//! This crate is intentionally decoupled from HTTP and storage: snapshots and
//! group memberships arrive through the traits in [`ports`], and every
//! decision is a pure function of those inputs.

pub mod capability;
pub mod explain;
pub mod grant;
pub mod group;
pub mod merge;
pub mod ports;
pub mod principal;
pub mod service;

pub use capability::{Capability, EffectivePermission};
pub use explain::{AccessExplanation, DenialKind, DenialReason};
pub use grant::{GrantSetError, GroupGrantSet, PermissionGrant};
pub use group::Group;
pub use merge::{merge, PermissionMap};
pub use ports::{GrantSource, GroupMembershipResolver, MenuSource, StoreError};
pub use principal::{AuthenticatedPrincipal, Membership};
pub use service::{AccessContext, AccessError, AnnotatedForest, MenuAuthorizationService};
