//! The host world the simulation worker owns.
use ability_core::{ActorOracle, EffectSink, SnapshotWorld, WorldOracle, WorldUpdate};

/// A mutable world the simulation thread reads through the oracle traits
/// and writes through [`EffectSink`] once per pass.
///
/// The worker is its only owner, so implementations need no interior
/// locking.
pub trait WorldHost: Send + 'static {
    fn world(&self) -> &dyn WorldOracle;

    fn actors(&self) -> &dyn ActorOracle;

    fn effects(&mut self) -> &mut dyn EffectSink;

    /// Applies an input event (sneak toggle, movement, spawn...).
    /// Returns `false` when the update names an unknown entity.
    fn apply(&mut self, update: WorldUpdate) -> bool;
}

impl WorldHost for SnapshotWorld {
    fn world(&self) -> &dyn WorldOracle {
        self
    }

    fn actors(&self) -> &dyn ActorOracle {
        self
    }

    fn effects(&mut self) -> &mut dyn EffectSink {
        self
    }

    fn apply(&mut self, update: WorldUpdate) -> bool {
        SnapshotWorld::apply(self, update)
    }
}
