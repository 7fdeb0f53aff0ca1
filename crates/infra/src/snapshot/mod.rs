//! File-backed snapshot sources.

pub mod json;

pub use json::JsonSnapshotStore;
