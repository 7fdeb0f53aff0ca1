//! Arena-backed menu forest.
//!
//! Nodes live in a single `Vec` and are addressed by position; child lists
//! hold positions, never references. Lookups from the outside go through the
//! `MenuId` index.

use std::collections::HashMap;

use serde::Serialize;

use menugate_core::MenuId;

use crate::node::MenuNode;
use crate::view::{MenuTreeItem, NoAnnotation};

// ─────────────────────────────────────────────────────────────────────────────
// Anomalies
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of recoverable defect found in a menu snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// A second row reused an existing `menu_id`; the first row was kept.
    DuplicateMenuId,
    /// The row names itself as parent; it was placed at the root.
    SelfParent,
    /// The parent does not exist in the snapshot; the row was placed at the root.
    OrphanParent,
    /// The row sits on a loop of parent references; its parent link was cut
    /// and it was placed at the root.
    ParentCycle,
}

/// A recoverable defect in the snapshot, together with the fallback applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotAnomaly {
    pub kind: AnomalyKind,
    pub menu_id: MenuId,
    pub parent_id: Option<MenuId>,
}

fn report(anomalies: &mut Vec<SnapshotAnomaly>, kind: AnomalyKind, node: &MenuNode) {
    tracing::warn!(
        kind = ?kind,
        menu_id = %node.menu_id,
        parent_id = ?node.parent_id.as_ref().map(MenuId::as_str),
        "menu snapshot anomaly"
    );
    anomalies.push(SnapshotAnomaly {
        kind,
        menu_id: node.menu_id.clone(),
        parent_id: node.parent_id.clone(),
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Forest
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of evaluating one node while pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The node and its whole subtree are removed.
    Hidden,
    /// The node survives on its own merit.
    Qualifies,
    /// The node survives only if at least one child survives.
    Scaffold,
}

/// Rooted forest of menu nodes.
///
/// Invariants (established by [`MenuForest::build`]):
/// - every `menu_id` appears at most once;
/// - every node is reachable from exactly one root, exactly once;
/// - roots and every child list are ordered by `(sort_order, menu_id)`.
#[derive(Debug, Clone, Default)]
pub struct MenuForest {
    nodes: Vec<MenuNode>,
    children: Vec<Vec<usize>>,
    parents: Vec<Option<usize>>,
    roots: Vec<usize>,
    index: HashMap<MenuId, usize>,
    anomalies: Vec<SnapshotAnomaly>,
}

impl MenuForest {
    /// Build a forest from a flat snapshot.
    ///
    /// Pass 1 indexes rows by `menu_id` (duplicates: keep first). Pass 2 links
    /// each row under its parent or collects it as a root (self parents and
    /// orphans become roots). Rows trapped in a parent loop are then promoted
    /// so that every row stays reachable. Never fails.
    pub fn build(flat: impl IntoIterator<Item = MenuNode>) -> Self {
        let mut anomalies = Vec::new();
        let mut nodes: Vec<MenuNode> = Vec::new();
        let mut index: HashMap<MenuId, usize> = HashMap::new();

        for menu in flat {
            if index.contains_key(&menu.menu_id) {
                report(&mut anomalies, AnomalyKind::DuplicateMenuId, &menu);
                continue;
            }
            index.insert(menu.menu_id.clone(), nodes.len());
            nodes.push(menu);
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut parents: Vec<Option<usize>> = vec![None; nodes.len()];
        let mut roots: Vec<usize> = Vec::new();

        for (idx, node) in nodes.iter().enumerate() {
            let Some(parent_id) = &node.parent_id else {
                roots.push(idx);
                continue;
            };

            if *parent_id == node.menu_id {
                report(&mut anomalies, AnomalyKind::SelfParent, node);
                roots.push(idx);
                continue;
            }

            match index.get(parent_id) {
                Some(&parent) => {
                    children[parent].push(idx);
                    parents[idx] = Some(parent);
                }
                None => {
                    report(&mut anomalies, AnomalyKind::OrphanParent, node);
                    roots.push(idx);
                }
            }
        }

        break_cycles(&nodes, &mut children, &mut parents, &mut roots, &mut anomalies);

        let by_sibling_key = |a: &usize, b: &usize| nodes[*a].sibling_key().cmp(&nodes[*b].sibling_key());
        roots.sort_by(by_sibling_key);
        for list in &mut children {
            list.sort_by(by_sibling_key);
        }

        Self {
            nodes,
            children,
            parents,
            roots,
            index,
            anomalies,
        }
    }

    /// Build a forest over enabled rows only.
    ///
    /// Children of a disabled row lose their parent and surface as roots.
    pub fn build_enabled(flat: impl IntoIterator<Item = MenuNode>) -> Self {
        Self::build(flat.into_iter().filter(|m| m.enabled))
    }

    /// Number of distinct nodes in the forest.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, menu_id: &str) -> bool {
        self.index.contains_key(menu_id)
    }

    pub fn get(&self, menu_id: &str) -> Option<MenuRef<'_>> {
        self.index.get(menu_id).map(|&idx| MenuRef { forest: self, idx })
    }

    pub fn roots(&self) -> impl Iterator<Item = MenuRef<'_>> + '_ {
        self.roots.iter().map(move |&idx| MenuRef { forest: self, idx })
    }

    /// All nodes, parents before children, siblings in display order.
    pub fn depth_first(&self) -> Vec<MenuRef<'_>> {
        self.depth_first_indices()
            .into_iter()
            .map(|idx| MenuRef { forest: self, idx })
            .collect()
    }

    /// Anomalies detected while building this forest.
    pub fn anomalies(&self) -> &[SnapshotAnomaly] {
        &self.anomalies
    }

    /// Remove nodes bottom-up.
    ///
    /// Children are evaluated before their parent; a `Scaffold` parent is kept
    /// only when some child survived, a `Hidden` parent drops its whole
    /// subtree. Surviving nodes keep their relative order. The result carries
    /// no anomalies.
    pub fn prune<F>(&self, visibility: F) -> MenuForest
    where
        F: Fn(&MenuNode) -> Visibility,
    {
        let order = self.depth_first_indices();
        let mut survives = vec![false; self.nodes.len()];

        // Reverse pre-order visits every child before its parent.
        for &idx in order.iter().rev() {
            survives[idx] = match visibility(&self.nodes[idx]) {
                Visibility::Hidden => false,
                Visibility::Qualifies => true,
                Visibility::Scaffold => self.children[idx].iter().any(|&c| survives[c]),
            };
        }

        // A survivor below a removed node would be cut off from its breadcrumb.
        let mut keep = vec![false; self.nodes.len()];
        for &idx in &order {
            keep[idx] = survives[idx] && self.parents[idx].is_none_or(|p| keep[p]);
        }

        self.rebuild(&order, &keep)
    }

    /// Keep exactly the nodes matching `keep`.
    ///
    /// A kept node whose parent was dropped becomes a root. Used for search
    /// results, where the intermediate levels of a hit need not match.
    pub fn select<F>(&self, matches: F) -> MenuForest
    where
        F: Fn(&MenuNode) -> bool,
    {
        let order = self.depth_first_indices();
        let keep: Vec<bool> = self.nodes.iter().map(matches).collect();
        self.rebuild(&order, &keep)
    }

    fn depth_first_indices(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.children[idx].iter().rev().copied());
        }
        out
    }

    /// Copy the kept nodes into a fresh arena. `order` must list parents
    /// before children.
    fn rebuild(&self, order: &[usize], keep: &[bool]) -> MenuForest {
        let mut out = MenuForest::default();
        let mut remap: Vec<Option<usize>> = vec![None; self.nodes.len()];

        for &idx in order {
            if !keep[idx] {
                continue;
            }
            let new_idx = out.nodes.len();
            remap[idx] = Some(new_idx);
            out.index.insert(self.nodes[idx].menu_id.clone(), new_idx);
            out.nodes.push(self.nodes[idx].clone());
            out.children.push(Vec::new());

            let parent = self.parents[idx].and_then(|p| remap[p]);
            out.parents.push(parent);
            match parent {
                Some(p) => out.children[p].push(new_idx),
                None => out.roots.push(new_idx),
            }
        }

        let nodes = &out.nodes;
        out.roots.sort_by(|a, b| nodes[*a].sibling_key().cmp(&nodes[*b].sibling_key()));
        out
    }

    /// Nested, serializable view of the forest.
    pub fn to_tree(&self) -> Vec<MenuTreeItem<NoAnnotation>> {
        self.to_tree_with(|_| NoAnnotation {})
    }

    /// Nested view with a per-node annotation.
    pub fn to_tree_with<A, F>(&self, annotate: F) -> Vec<MenuTreeItem<A>>
    where
        F: Fn(&MenuNode) -> A,
    {
        self.roots().map(|root| root.to_item(&annotate)).collect()
    }
}

/// Promote one member of every parent loop to a root.
///
/// After linking, any node not reachable from a root must sit on, or hang
/// below, a loop. For each loop the member with the smallest `menu_id` is cut
/// from its parent, which keeps the choice independent of input order.
fn break_cycles(
    nodes: &[MenuNode],
    children: &mut [Vec<usize>],
    parents: &mut [Option<usize>],
    roots: &mut Vec<usize>,
    anomalies: &mut Vec<SnapshotAnomaly>,
) {
    let mut reached = vec![false; nodes.len()];
    mark_reachable(roots, children, &mut reached);

    let mut candidates: Vec<usize> = (0..nodes.len()).filter(|&i| !reached[i]).collect();
    candidates.sort_by(|a, b| nodes[*a].menu_id.cmp(&nodes[*b].menu_id));

    // Walk stamps: `walked[i] == start` marks `i` as seen on the walk from `start`.
    let mut walked = vec![usize::MAX; nodes.len()];

    for start in candidates {
        if reached[start] {
            continue;
        }

        // Walk up until a node repeats: that node is on the loop.
        let mut cur = start;
        while walked[cur] != start {
            walked[cur] = start;
            match parents[cur] {
                Some(parent) => cur = parent,
                None => break,
            }
        }

        let mut member = cur;
        let mut pick = cur;
        loop {
            if nodes[member].menu_id < nodes[pick].menu_id {
                pick = member;
            }
            match parents[member] {
                Some(parent) if parent != cur => member = parent,
                _ => break,
            }
        }

        if let Some(parent) = parents[pick].take() {
            children[parent].retain(|&c| c != pick);
        }
        report(anomalies, AnomalyKind::ParentCycle, &nodes[pick]);
        roots.push(pick);
        mark_reachable(&[pick], children, &mut reached);
    }
}

fn mark_reachable(from: &[usize], children: &[Vec<usize>], reached: &mut [bool]) {
    let mut stack: Vec<usize> = from.to_vec();
    while let Some(idx) = stack.pop() {
        if reached[idx] {
            continue;
        }
        reached[idx] = true;
        stack.extend(children[idx].iter().copied());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node handle
// ─────────────────────────────────────────────────────────────────────────────

/// Borrowed handle to one node of a [`MenuForest`].
#[derive(Debug, Clone, Copy)]
pub struct MenuRef<'a> {
    forest: &'a MenuForest,
    idx: usize,
}

impl<'a> MenuRef<'a> {
    pub fn node(&self) -> &'a MenuNode {
        &self.forest.nodes[self.idx]
    }

    pub fn menu_id(&self) -> &'a MenuId {
        &self.node().menu_id
    }

    pub fn children(&self) -> impl Iterator<Item = MenuRef<'a>> + 'a {
        let forest = self.forest;
        forest.children[self.idx]
            .iter()
            .map(move |&idx| MenuRef { forest, idx })
    }

    pub fn parent(&self) -> Option<MenuRef<'a>> {
        let forest = self.forest;
        forest.parents[self.idx].map(|idx| MenuRef { forest, idx })
    }

    pub fn has_children(&self) -> bool {
        !self.forest.children[self.idx].is_empty()
    }

    fn to_item<A, F>(&self, annotate: &F) -> MenuTreeItem<A>
    where
        F: Fn(&MenuNode) -> A,
    {
        MenuTreeItem {
            menu: self.node().clone(),
            annotation: annotate(self.node()),
            items: self.children().map(|c| c.to_item(annotate)).collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
