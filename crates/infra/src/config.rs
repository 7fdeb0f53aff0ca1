//! Environment-driven configuration.

use std::path::PathBuf;

pub const SNAPSHOT_DIR_VAR: &str = "MENUGATE_SNAPSHOT_DIR";
pub const DEFAULT_SNAPSHOT_DIR: &str = "./snapshot";

/// Where the JSON snapshot store finds its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    pub dir: PathBuf,
}

impl SnapshotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SnapshotConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = match lookup(SNAPSHOT_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => {
                tracing::warn!("{SNAPSHOT_DIR_VAR} not set; using {DEFAULT_SNAPSHOT_DIR}");
                PathBuf::from(DEFAULT_SNAPSHOT_DIR)
            }
        };
        Self { dir }
    }
}
