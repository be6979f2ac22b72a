use crate::ability::AbilityKind;
use crate::state::{ActorFlags, EntityId};

/// Bending profile queries for actors.
///
/// Entities without a profile (ordinary mobs) report `None` from [`flags`]
/// and `false` from every capability query.
///
/// [`flags`]: ActorOracle::flags
pub trait ActorOracle: Send + Sync {
    fn flags(&self, entity: EntityId) -> Option<ActorFlags>;

    /// Whether the actor has the ability bound and is otherwise allowed to use it.
    fn can_bend(&self, actor: EntityId, ability: AbilityKind) -> bool;

    fn can_ignore_own_cooldown(&self, actor: EntityId, ability: AbilityKind) -> bool;

    fn is_in_override_state(&self, actor: EntityId) -> bool {
        self.flags(actor).is_some_and(ActorFlags::is_overridden)
    }

    fn is_sneaking(&self, actor: EntityId) -> bool {
        self.flags(actor).is_some_and(ActorFlags::is_sneaking)
    }
}
