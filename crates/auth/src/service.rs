//! Menu authorization service.
//!
//! Composes the tree builder and the merge engine. Every call resolves the
//! caller's groups, fetches fresh snapshots and recomputes; nothing is cached
//! across calls because memberships and grants may change in between.

use chrono::{DateTime, Utc};
use thiserror::Error;

use menugate_core::UserId;
use menugate_menu::{MenuForest, MenuNode, MenuQuery, MenuTreeItem, Visibility};

use crate::explain::{explain, ExplainInput};
use crate::merge::contributing_groups;
use crate::{
    AccessExplanation, AuthenticatedPrincipal, Capability, EffectivePermission, GrantSource,
    GroupMembershipResolver, Membership, MenuSource, PermissionGrant, PermissionMap, StoreError, merge,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The membership resolver found no valid principal.
    #[error("unauthenticated")]
    Unauthenticated,

    /// A collaborator failed to deliver a snapshot.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Annotated forest
// ─────────────────────────────────────────────────────────────────────────────

/// Menu forest where every node carries the caller's effective permission.
#[derive(Debug, Clone)]
pub struct AnnotatedForest {
    forest: MenuForest,
    permissions: PermissionMap,
}

impl AnnotatedForest {
    pub fn forest(&self) -> &MenuForest {
        &self.forest
    }

    /// Effective permission of a node in this forest; `None` if the node is not in it.
    pub fn permission(&self, menu_id: &str) -> Option<EffectivePermission> {
        self.forest
            .contains(menu_id)
            .then(|| self.permissions.effective(menu_id))
    }

    /// Nodes in display order, each paired with its permission.
    pub fn entries(&self) -> Vec<(&MenuNode, EffectivePermission)> {
        self.forest
            .depth_first()
            .into_iter()
            .map(|r| (r.node(), self.permissions.effective(r.menu_id().as_str())))
            .collect()
    }

    pub fn to_tree(&self) -> Vec<MenuTreeItem<EffectivePermission>> {
        self.forest
            .to_tree_with(|m| self.permissions.effective(m.menu_id.as_str()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-request context
// ─────────────────────────────────────────────────────────────────────────────

/// One caller's view of one snapshot.
///
/// Holds the built forest and the merged permissions so a single request can
/// ask several questions without refetching. Must not outlive the request.
#[derive(Debug, Clone)]
pub struct AccessContext {
    principal: AuthenticatedPrincipal,
    forest: MenuForest,
    grants: Vec<PermissionGrant>,
    permissions: PermissionMap,
}

impl AccessContext {
    pub fn new(principal: AuthenticatedPrincipal, menus: Vec<MenuNode>, grants: Vec<PermissionGrant>) -> Self {
        let forest = MenuForest::build(menus);
        let permissions = merge(&principal.group_ids, &grants);

        tracing::debug!(
            principal_id = %principal.principal_id,
            groups = principal.group_ids.len(),
            menus = forest.len(),
            permissioned_menus = permissions.len(),
            anomalies = forest.anomalies().len(),
            "access context resolved"
        );

        Self {
            principal,
            forest,
            grants,
            permissions,
        }
    }

    pub fn principal(&self) -> &AuthenticatedPrincipal {
        &self.principal
    }

    pub fn forest(&self) -> &MenuForest {
        &self.forest
    }

    pub fn permissions(&self) -> &PermissionMap {
        &self.permissions
    }

    /// Every menu, disabled ones included, with the caller's permission attached.
    pub fn full_tree_with_permissions(&self) -> AnnotatedForest {
        AnnotatedForest {
            forest: self.forest.clone(),
            permissions: self.permissions.clone(),
        }
    }

    /// Menus the caller may see.
    ///
    /// A node survives when it is enabled and either readable or the parent of
    /// a surviving node. A disabled node removes its whole subtree.
    pub fn accessible_tree(&self) -> MenuForest {
        self.forest.prune(|menu| {
            if !menu.enabled {
                Visibility::Hidden
            } else if self.permissions.effective(menu.menu_id.as_str()).can_read {
                Visibility::Qualifies
            } else {
                Visibility::Scaffold
            }
        })
    }

    /// `false` for unknown menus; never an error.
    pub fn has_access(&self, menu_id: &str, capability: Capability) -> bool {
        self.forest.contains(menu_id) && self.permissions.effective(menu_id).allows(capability)
    }

    /// `None` when the menu is not in the snapshot, as opposed to
    /// `Some(EffectivePermission::NONE)` for a known menu with no grants.
    pub fn permissions_for(&self, menu_id: &str) -> Option<EffectivePermission> {
        self.forest
            .contains(menu_id)
            .then(|| self.permissions.effective(menu_id))
    }

    /// Matching menus with permissions attached. Hits whose parent did not
    /// match are listed at the root.
    pub fn search_with_permissions(&self, query: &MenuQuery) -> AnnotatedForest {
        AnnotatedForest {
            forest: self.forest.select(|m| query.matches(m)),
            permissions: self.permissions.clone(),
        }
    }

    pub fn explain_access(&self, menu_id: &str, capability: Capability, now: DateTime<Utc>) -> AccessExplanation {
        let menu_enabled = self.forest.get(menu_id).map(|r| r.node().enabled);
        explain(ExplainInput {
            principal_id: &self.principal.principal_id,
            group_ids: self.principal.group_ids.iter().cloned().collect(),
            menu_id,
            capability,
            menu_enabled,
            effective: self.permissions.effective(menu_id),
            contributing_groups: contributing_groups(&self.principal.group_ids, &self.grants, menu_id, capability),
            now,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

/// Entry point for menu authorization queries.
///
/// Stateless across calls; safe to share between threads when the
/// collaborators are.
#[derive(Debug, Clone)]
pub struct MenuAuthorizationService<M, G, R> {
    menus: M,
    grants: G,
    resolver: R,
}

impl<M, G, R> MenuAuthorizationService<M, G, R>
where
    M: MenuSource,
    G: GrantSource,
    R: GroupMembershipResolver,
{
    pub fn new(menus: M, grants: G, resolver: R) -> Self {
        Self { menus, grants, resolver }
    }

    /// Resolve the caller and load one consistent snapshot.
    ///
    /// Membership is resolved first: an unauthenticated caller never triggers
    /// a snapshot fetch.
    pub fn context(&self, user_id: &UserId) -> Result<AccessContext, AccessError> {
        let principal = match self.resolver.resolve(user_id)? {
            Membership::Authenticated(principal) => principal,
            Membership::Unauthenticated => {
                tracing::debug!(user_id = %user_id, "membership resolver reported no principal");
                return Err(AccessError::Unauthenticated);
            }
        };

        let menus = self.menus.menus()?;
        let grants = self.grants.grants_for_groups(&principal.group_ids)?;

        Ok(AccessContext::new(principal, menus, grants))
    }

    pub fn full_tree_with_permissions(&self, user_id: &UserId) -> Result<AnnotatedForest, AccessError> {
        Ok(self.context(user_id)?.full_tree_with_permissions())
    }

    pub fn accessible_tree(&self, user_id: &UserId) -> Result<MenuForest, AccessError> {
        Ok(self.context(user_id)?.accessible_tree())
    }

    pub fn has_access(&self, user_id: &UserId, menu_id: &str, capability: Capability) -> Result<bool, AccessError> {
        Ok(self.context(user_id)?.has_access(menu_id, capability))
    }

    pub fn permissions_for(&self, user_id: &UserId, menu_id: &str) -> Result<Option<EffectivePermission>, AccessError> {
        Ok(self.context(user_id)?.permissions_for(menu_id))
    }

    pub fn search_with_permissions(&self, user_id: &UserId, query: &MenuQuery) -> Result<AnnotatedForest, AccessError> {
        Ok(self.context(user_id)?.search_with_permissions(query))
    }

    pub fn explain_access(
        &self,
        user_id: &UserId,
        menu_id: &str,
        capability: Capability,
    ) -> Result<AccessExplanation, AccessError> {
        Ok(self.context(user_id)?.explain_access(menu_id, capability, Utc::now()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use menugate_core::GroupId;
    use proptest::prelude::*;

    use crate::DenialKind;

    struct Fixed {
        menus: Vec<MenuNode>,
        grants: Vec<PermissionGrant>,
        fetches: AtomicUsize,
    }

    impl MenuSource for Fixed {
        fn menus(&self) -> Result<Vec<MenuNode>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.menus.clone())
        }
    }

    impl GrantSource for Fixed {
        fn grants(&self) -> Result<Vec<PermissionGrant>, StoreError> {
            Ok(self.grants.clone())
        }
    }

    struct Directory(Vec<(&'static str, Vec<&'static str>)>);

    impl GroupMembershipResolver for Directory {
        fn resolve(&self, user_id: &UserId) -> Result<Membership, StoreError> {
            Ok(self
                .0
                .iter()
                .find(|(u, _)| *u == user_id.as_str())
                .map(|(u, groups)| Membership::authenticated(*u, groups.iter().copied()))
                .unwrap_or(Membership::Unauthenticated))
        }
    }

    struct Down;

    impl MenuSource for Down {
        fn menus(&self) -> Result<Vec<MenuNode>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    fn fixed(menus: Vec<MenuNode>, grants: Vec<PermissionGrant>) -> std::sync::Arc<Fixed> {
        std::sync::Arc::new(Fixed {
            menus,
            grants,
            fetches: AtomicUsize::new(0),
        })
    }

    fn erp_menus() -> Vec<MenuNode> {
        vec![
            MenuNode::new("sys", "System").with_sort_order(9),
            MenuNode::new("sys-menu", "Menus").with_parent("sys").with_target("/admin/menus"),
            MenuNode::new("sys-group", "Groups").with_parent("sys").with_target("/admin/groups").with_sort_order(1),
            MenuNode::new("work", "Work").with_sort_order(1),
            MenuNode::new("work-report", "Reports").with_parent("work").with_target("/reports"),
            MenuNode::new("work-old", "Old reports").with_parent("work").with_target("/old").disabled(),
        ]
    }

    fn erp_grants() -> Vec<PermissionGrant> {
        vec![
            PermissionGrant::new("ADMIN", "sys-menu").with(Capability::Read).with(Capability::Admin),
            PermissionGrant::new("USER", "work-report").with(Capability::Read),
            PermissionGrant::new("USER", "work-old").with(Capability::Read),
            PermissionGrant::new("AUDIT", "sys-group").with(Capability::Write),
        ]
    }

    fn user(id: &str) -> UserId {
        UserId::new(id)
    }

    fn service(
        menus: Vec<MenuNode>,
        grants: Vec<PermissionGrant>,
    ) -> MenuAuthorizationService<std::sync::Arc<Fixed>, std::sync::Arc<Fixed>, Directory> {
        let store = fixed(menus, grants);
        MenuAuthorizationService::new(
            store.clone(),
            store,
            Directory(vec![
                ("root", vec!["ADMIN", "USER"]),
                ("clerk", vec!["USER"]),
                ("auditor", vec!["AUDIT"]),
                ("nobody", vec![]),
            ]),
        )
    }

    fn root_ids(forest: &MenuForest) -> Vec<String> {
        forest.roots().map(|r| r.menu_id().to_string()).collect()
    }

    #[test]
    fn accessible_tree_keeps_scaffolding_above_readable_menus() {
        let svc = service(erp_menus(), erp_grants());
        let tree = svc.accessible_tree(&user("clerk")).unwrap();

        assert_eq!(root_ids(&tree), vec!["work"]);
        let children: Vec<_> = tree.get("work").unwrap().children().map(|c| c.menu_id().to_string()).collect();
        // "work-old" is readable but disabled.
        assert_eq!(children, vec!["work-report"]);
    }

    #[test]
    fn write_without_read_does_not_make_a_menu_visible() {
        let svc = service(erp_menus(), erp_grants());
        assert!(svc.accessible_tree(&user("auditor")).unwrap().is_empty());
        assert!(svc.has_access(&user("auditor"), "sys-group", Capability::Write).unwrap());
    }

    #[test]
    fn full_tree_keeps_every_node_including_disabled() {
        let svc = service(erp_menus(), erp_grants());
        let annotated = svc.full_tree_with_permissions(&user("clerk")).unwrap();

        assert_eq!(annotated.forest().len(), 6);
        assert_eq!(root_ids(annotated.forest()), vec!["work", "sys"]);
        assert!(annotated.permission("work-old").unwrap().can_read);
        assert_eq!(annotated.permission("sys-menu"), Some(EffectivePermission::NONE));
        assert_eq!(annotated.permission("missing"), None);
        assert_eq!(annotated.entries().len(), 6);
    }

    #[test]
    fn annotated_tree_serializes_permission_bits_inline() {
        let svc = service(erp_menus(), erp_grants());
        let tree = svc.full_tree_with_permissions(&user("root")).unwrap().to_tree();

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[1]["menuId"], "sys");
        assert_eq!(json[1]["canRead"], false);
        assert_eq!(json[1]["Items"][0]["menuId"], "sys-menu");
        assert_eq!(json[1]["Items"][0]["canAdmin"], true);
    }

    #[test]
    fn unknown_menu_is_not_found_and_not_accessible() {
        let svc = service(erp_menus(), erp_grants());
        assert_eq!(svc.permissions_for(&user("root"), "nope").unwrap(), None);
        assert!(!svc.has_access(&user("root"), "nope", Capability::Read).unwrap());
    }

    #[test]
    fn known_menu_without_grants_is_found_with_no_permissions() {
        let svc = service(erp_menus(), erp_grants());
        assert_eq!(
            svc.permissions_for(&user("clerk"), "sys").unwrap(),
            Some(EffectivePermission::NONE)
        );
    }

    #[test]
    fn grant_for_menu_missing_from_snapshot_grants_nothing() {
        let svc = service(
            erp_menus(),
            vec![PermissionGrant::new("USER", "ghost").with(Capability::Read)],
        );
        assert!(!svc.has_access(&user("clerk"), "ghost", Capability::Read).unwrap());
    }

    #[test]
    fn unauthenticated_caller_is_refused_before_any_fetch() {
        let store = fixed(erp_menus(), erp_grants());
        let svc = MenuAuthorizationService::new(store.clone(), store.clone(), Directory(vec![]));

        assert_eq!(svc.accessible_tree(&user("ghost")).unwrap_err(), AccessError::Unauthenticated);
        assert_eq!(
            svc.has_access(&user("ghost"), "sys", Capability::Read).unwrap_err(),
            AccessError::Unauthenticated
        );
        assert_eq!(store.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn authenticated_user_without_groups_sees_nothing() {
        let svc = service(erp_menus(), erp_grants());
        let tree = svc.accessible_tree(&user("nobody")).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn store_failure_propagates_unchanged() {
        let store = fixed(vec![], vec![]);
        let svc = MenuAuthorizationService::new(Down, store, Directory(vec![("clerk", vec!["USER"])]));

        assert_eq!(
            svc.accessible_tree(&user("clerk")).unwrap_err(),
            AccessError::Store(StoreError::Unavailable("connection refused".to_string()))
        );
    }

    #[test]
    fn search_lists_hits_with_permissions() {
        let svc = service(erp_menus(), erp_grants());
        let hits = svc
            .search_with_permissions(&user("root"), &MenuQuery::by_target("/admin"))
            .unwrap();

        assert_eq!(root_ids(hits.forest()), vec!["sys-menu", "sys-group"]);
        assert!(hits.permission("sys-menu").unwrap().can_admin);
        assert_eq!(hits.permission("sys"), None);
    }

    #[test]
    fn explanation_names_contributing_groups() {
        let svc = service(erp_menus(), erp_grants());
        let explanation = svc.explain_access(&user("root"), "sys-menu", Capability::Admin).unwrap();

        assert!(explanation.granted);
        assert_eq!(explanation.contributing_groups, vec![GroupId::new("ADMIN")]);
        assert_eq!(explanation.menu_enabled, Some(true));
        assert!(explanation.denial_reason.is_none());
    }

    #[test]
    fn explanation_distinguishes_unknown_menu_from_missing_capability() {
        let svc = service(erp_menus(), erp_grants());

        let unknown = svc.explain_access(&user("clerk"), "nope", Capability::Read).unwrap();
        assert_eq!(unknown.denial_reason.unwrap().kind, DenialKind::UnknownMenu);
        assert_eq!(unknown.effective, None);

        let missing = svc.explain_access(&user("clerk"), "work-report", Capability::Delete).unwrap();
        assert!(!missing.granted);
        assert_eq!(missing.denial_reason.unwrap().kind, DenialKind::MissingCapability);
        assert_eq!(missing.effective, Some(EffectivePermission::NONE.with(Capability::Read)));
    }

    #[test]
    fn context_answers_several_questions_from_one_fetch() {
        let store = fixed(erp_menus(), erp_grants());
        let svc = MenuAuthorizationService::new(store.clone(), store.clone(), Directory(vec![("clerk", vec!["USER"])]));

        let ctx = svc.context(&user("clerk")).unwrap();
        assert!(ctx.has_access("work-report", Capability::Read));
        assert!(!ctx.has_access("work-report", Capability::Write));
        assert_eq!(ctx.accessible_tree().len(), 2);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Properties
    // ─────────────────────────────────────────────────────────────────────────

    fn arb_context() -> impl Strategy<Value = AccessContext> {
        let menus = prop::collection::vec(
            (any::<prop::sample::Index>(), any::<bool>(), any::<bool>()),
            1..25,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (parent, has_parent, enabled))| {
                    let mut node = MenuNode::new(format!("m{i}"), "m");
                    node.enabled = enabled;
                    if has_parent && i > 0 {
                        node = node.with_parent(format!("m{}", parent.index(i)));
                    }
                    node
                })
                .collect::<Vec<_>>()
        });
        let grants = prop::collection::vec((0usize..25, any::<bool>()), 0..25).prop_map(|rows| {
            rows.into_iter()
                .map(|(m, read)| PermissionGrant {
                    can_read: read,
                    ..PermissionGrant::new("G", format!("m{m}"))
                })
                .collect::<Vec<_>>()
        });

        (menus, grants).prop_map(|(menus, grants)| {
            let principal = AuthenticatedPrincipal {
                principal_id: UserId::new("u"),
                group_ids: BTreeSet::from([GroupId::new("G")]),
            };
            AccessContext::new(principal, menus, grants)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: every node of the accessible tree is enabled and has a
        /// readable, enabled node somewhere in its subtree.
        #[test]
        fn accessible_tree_contains_no_dead_subtrees(ctx in arb_context()) {
            let tree = ctx.accessible_tree();
            for node in tree.depth_first() {
                prop_assert!(node.node().enabled);

                let mut stack = vec![node];
                let mut found = false;
                while let Some(n) = stack.pop() {
                    if n.node().enabled && ctx.permissions().effective(n.menu_id().as_str()).can_read {
                        found = true;
                        break;
                    }
                    stack.extend(n.children());
                }
                prop_assert!(found);
            }
        }

        /// Property: the accessible tree never breaks a parent link.
        #[test]
        fn accessible_tree_preserves_parent_links(ctx in arb_context()) {
            let tree = ctx.accessible_tree();
            for node in tree.depth_first() {
                let original = ctx.forest().get(node.menu_id().as_str()).unwrap();
                let parent = node.parent().map(|p| p.menu_id().clone());
                let original_parent = original.parent().map(|p| p.menu_id().clone());
                prop_assert_eq!(parent, original_parent);
            }
        }

        /// Property: unknown menus are never accessible.
        #[test]
        fn unknown_menu_never_grants_access(ctx in arb_context(), suffix in "[a-z]{1,6}") {
            let unknown = format!("unknown-{suffix}");
            for cap in Capability::ALL {
                prop_assert!(!ctx.has_access(&unknown, cap));
            }
            prop_assert_eq!(ctx.permissions_for(&unknown), None);
        }
    }
}
