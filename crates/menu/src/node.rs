use serde::{Deserialize, Serialize};

use menugate_core::{Entity, MenuId};

fn default_enabled() -> bool {
    true
}

/// One row of the menu snapshot.
///
/// `parent_id = None` marks a root. `target = None` marks a pure grouping node
/// (navigational scaffolding with nothing to open).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub menu_id: MenuId,
    #[serde(default)]
    pub parent_id: Option<MenuId>,
    pub title: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MenuNode {
    /// Enabled root node with no target, sort order 0.
    pub fn new(menu_id: impl Into<MenuId>, title: impl Into<String>) -> Self {
        Self {
            menu_id: menu_id.into(),
            parent_id: None,
            title: title.into(),
            target: None,
            icon: None,
            sort_order: 0,
            enabled: true,
            description: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<MenuId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_grouping(&self) -> bool {
        self.target.is_none()
    }

    /// Sibling order key: `sort_order` ascending, then `menu_id` lexical.
    pub(crate) fn sibling_key(&self) -> (i32, &str) {
        (self.sort_order, self.menu_id.as_str())
    }
}

impl Entity for MenuNode {
    type Id = MenuId;

    fn id(&self) -> &Self::Id {
        &self.menu_id
    }
}
