//! `menugate-menu`: menu records and the menu tree builder.
//!
//! Turns a flat point-in-time menu snapshot into an arena-backed forest.
//! Malformed rows (duplicate ids, self parents, orphans, parent loops) never
//! fail the build: they degrade to a defined fallback and are logged.

pub mod forest;
pub mod node;
pub mod query;
pub mod view;

pub use forest::{AnomalyKind, MenuForest, MenuRef, SnapshotAnomaly, Visibility};
pub use node::MenuNode;
pub use query::MenuQuery;
pub use view::{MenuTreeItem, NoAnnotation};
