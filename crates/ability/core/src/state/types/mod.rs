mod common;
mod entity;
mod flags;

pub use common::{EntityId, Location, Millis, Tick, Vec3, WorldId};
pub use entity::EntityKind;
pub use flags::ActorFlags;
