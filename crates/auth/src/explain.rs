//! Access explanation (audit trail).
//!
//! Answers "why was this menu operation allowed or denied?" in a form that
//! can be logged or returned to an administrator.

use chrono::{DateTime, Utc};
use serde::Serialize;

use menugate_core::{GroupId, MenuId, UserId};

use crate::{Capability, EffectivePermission};

/// Detailed explanation of one access decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessExplanation {
    pub menu_id: MenuId,
    pub capability: Capability,
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    pub principal_id: UserId,
    pub group_ids: Vec<GroupId>,

    /// Groups whose grant carries the requested capability.
    pub contributing_groups: Vec<GroupId>,

    /// Merged record for the menu; `None` when the menu is unknown.
    pub effective: Option<EffectivePermission>,

    /// Whether the menu is enabled. Informational: capabilities do not depend on it.
    pub menu_enabled: Option<bool>,

    pub denial_reason: Option<DenialReason>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    UnknownMenu,
    MissingCapability,
}

pub(crate) struct ExplainInput<'a> {
    pub principal_id: &'a UserId,
    pub group_ids: Vec<GroupId>,
    pub menu_id: &'a str,
    pub capability: Capability,
    pub menu_enabled: Option<bool>,
    pub effective: EffectivePermission,
    pub contributing_groups: Vec<GroupId>,
    pub now: DateTime<Utc>,
}

pub(crate) fn explain(input: ExplainInput<'_>) -> AccessExplanation {
    let ExplainInput {
        principal_id,
        group_ids,
        menu_id,
        capability,
        menu_enabled,
        effective,
        contributing_groups,
        now,
    } = input;

    let base = |granted: bool, reason: String, effective: Option<EffectivePermission>, denial_reason| AccessExplanation {
        menu_id: MenuId::new(menu_id),
        capability,
        granted,
        reason,
        principal_id: principal_id.clone(),
        group_ids: group_ids.clone(),
        contributing_groups: contributing_groups.clone(),
        effective,
        menu_enabled,
        denial_reason,
        evaluated_at: now,
    };

    if menu_enabled.is_none() {
        return base(
            false,
            format!("Menu '{menu_id}' does not exist in the current menu snapshot"),
            None,
            Some(DenialReason {
                kind: DenialKind::UnknownMenu,
                message: format!("Unknown menu: '{menu_id}'"),
                suggestions: vec!["Check the menu identifier against the menu administration screen".to_string()],
            }),
        );
    }

    if effective.allows(capability) {
        let names: Vec<&str> = contributing_groups.iter().map(GroupId::as_str).collect();
        return base(
            true,
            format!("Capability '{capability}' granted on '{menu_id}' by group(s) {names:?}"),
            Some(effective),
            None,
        );
    }

    let mut suggestions = vec![format!(
        "Grant '{capability}' on menu '{menu_id}' to one of the principal's groups"
    )];
    if group_ids.is_empty() {
        suggestions.insert(0, "Assign the principal to at least one group".to_string());
    }

    base(
        false,
        format!(
            "No group of the principal grants '{capability}' on '{menu_id}'. Effective capabilities: {:?}",
            effective.granted()
        ),
        Some(effective),
        Some(DenialReason {
            kind: DenialKind::MissingCapability,
            message: format!("Missing capability: '{capability}'"),
            suggestions,
        }),
    )
}
