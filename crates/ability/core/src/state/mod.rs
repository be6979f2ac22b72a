//! Plain data describing entities, positions and actor status.
//!
//! Nothing here owns behaviour: the engine reads these values through the
//! oracle traits in [`crate::env`] and never mutates the world directly.
pub mod types;

pub use types::{ActorFlags, EntityId, EntityKind, Location, Millis, Tick, Vec3, WorldId};
