//! `menugate-infra`: store adapters and configuration.
//!
//! Implements the snapshot and membership ports of `menugate-auth` over
//! in-memory tables (tests/dev) and JSON files (operator tooling).

pub mod config;
pub mod snapshot;
pub mod store;

pub use config::SnapshotConfig;
pub use snapshot::JsonSnapshotStore;
pub use store::{InMemoryGrantStore, InMemoryGroupDirectory, InMemoryMenuStore, InMemoryStores};
