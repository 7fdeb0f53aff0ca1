//! Nested, serializable rendering of a forest.

use serde::Serialize;

use crate::node::MenuNode;

/// Placeholder annotation for plain (unannotated) trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoAnnotation {}

/// One node of the nested view, with its children under `Items`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuTreeItem<A = NoAnnotation> {
    #[serde(flatten)]
    pub menu: MenuNode,
    #[serde(flatten)]
    pub annotation: A,
    #[serde(rename = "Items")]
    pub items: Vec<MenuTreeItem<A>>,
}
