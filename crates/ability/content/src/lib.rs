//! Data-driven ability content.
//!
//! Loaders turn TOML files into the values the core reads through its oracle
//! traits:
//! - Ability configuration (flattened into a dotted-path [`ConfigSnapshot`])
//! - Sandbox scenarios (entities and world conditions for a [`SnapshotWorld`])
//!
//! [`ConfigSnapshot`]: ability_core::ConfigSnapshot
//! [`SnapshotWorld`]: ability_core::SnapshotWorld

pub mod loaders;

pub use loaders::{ConfigLoader, LoadReport, LoadResult, ScenarioLoader};
