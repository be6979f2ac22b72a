//! Traits describing the world the abilities run in.
//!
//! Oracles expose entity positions, world conditions, actor status and the
//! configuration snapshot. The [`Env`] aggregate bundles the read-only ones so
//! the engine can evaluate gating and targeting without coupling to a concrete
//! host. Mutations never go through an oracle: they are emitted into an
//! [`EffectSink`] and applied by the host after the pass.
mod actors;
mod config;
mod effects;
mod snapshot;
mod world;

pub use actors::ActorOracle;
pub use config::{ConfigOracle, ConfigValue};
pub use effects::{Effect, EffectBuffer, EffectSink, StatusEffect, StatusEffectKind};
pub use snapshot::{
    ConfigSnapshot, EntityRecord, ProtectedRegion, SnapshotWorld, WorldConditions, WorldUpdate,
};
pub use world::WorldOracle;

/// Aggregates the read-only oracles required by activation and progression.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    world: &'a dyn WorldOracle,
    actors: &'a dyn ActorOracle,
    config: &'a dyn ConfigOracle,
}

impl<'a> Env<'a> {
    pub fn new(
        world: &'a dyn WorldOracle,
        actors: &'a dyn ActorOracle,
        config: &'a dyn ConfigOracle,
    ) -> Self {
        Self {
            world,
            actors,
            config,
        }
    }

    pub fn world(&self) -> &'a dyn WorldOracle {
        self.world
    }

    pub fn actors(&self) -> &'a dyn ActorOracle {
        self.actors
    }

    pub fn config(&self) -> &'a dyn ConfigOracle {
        self.config
    }
}

impl std::fmt::Debug for Env<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env").finish_non_exhaustive()
    }
}
