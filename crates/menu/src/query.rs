use serde::{Deserialize, Serialize};

use crate::node::MenuNode;

/// Menu search criteria.
///
/// A row matches when its title contains `title` or its target contains
/// `target` (case-insensitive). An empty query matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuQuery {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

impl MenuQuery {
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            target: None,
        }
    }

    pub fn by_target(target: impl Into<String>) -> Self {
        Self {
            title: None,
            target: Some(target.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        blank(&self.title) && blank(&self.target)
    }

    pub fn matches(&self, menu: &MenuNode) -> bool {
        if self.is_empty() {
            return true;
        }

        let title_hit = self
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .is_some_and(|t| contains_ci(&menu.title, t));
        let target_hit = match (self.target.as_deref(), menu.target.as_deref()) {
            (Some(needle), Some(target)) if !needle.trim().is_empty() => contains_ci(target, needle),
            _ => false,
        };

        title_hit || target_hit
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}
