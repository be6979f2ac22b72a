use crate::ability::AbilityKind;
use crate::state::{EntityId, EntityKind, Location, Vec3, WorldId};

/// Read-only view of entities and world conditions.
///
/// Implementations must be cheap to query: the engine calls these from the
/// simulation thread on every tick and never caches the answers.
pub trait WorldOracle: Send + Sync {
    fn location(&self, entity: EntityId) -> Option<Location>;

    fn kind(&self, entity: EntityId) -> Option<EntityKind>;

    fn is_alive(&self, entity: EntityId) -> bool;

    /// Entities within `radius` of `center`, in the host's iteration order.
    ///
    /// Only live entities in the same world are reported.
    fn entities_near(&self, center: &Location, radius: f64) -> Vec<EntityId>;

    fn is_night(&self, world: WorldId) -> bool;

    fn is_full_moon(&self, world: WorldId) -> bool;

    fn is_undead(&self, entity: EntityId) -> bool {
        self.kind(entity).is_some_and(EntityKind::is_undead)
    }

    fn is_region_protected(&self, ability: AbilityKind, location: &Location) -> bool;

    /// Direction the entity is looking in. Not necessarily normalized.
    fn aim_direction(&self, entity: EntityId) -> Option<Vec3>;

    /// The point `distance` blocks along the entity's aim.
    fn targeted_location(&self, entity: EntityId, distance: f64) -> Option<Location> {
        let origin = self.location(entity)?;
        let aim = self.aim_direction(entity)?;
        Some(origin.offset(aim.normalize() * distance))
    }

    /// Resolves a live entity by display name, if the host already knows it.
    fn find_by_name(&self, name: &str) -> Option<EntityId>;
}
