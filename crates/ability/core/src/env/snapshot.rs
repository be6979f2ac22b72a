//! In-memory oracle implementations.
//!
//! [`ConfigSnapshot`] is the frozen key/value view handed to the engine after
//! a config load. [`SnapshotWorld`] is a small sandbox world implementing every
//! oracle plus [`EffectSink`]; the server binary hosts it and tests build
//! synthetic scenes with it.
use std::collections::HashMap;

use super::{ActorOracle, ConfigOracle, ConfigValue, Effect, EffectSink, StatusEffect, WorldOracle};
use crate::ability::AbilityKind;
use crate::state::{ActorFlags, EntityId, EntityKind, Location, Millis, Vec3, WorldId};

// ============================================================================
// Config
// ============================================================================

/// Flat map of dotted configuration paths to values.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigSnapshot {
    values: HashMap<String, ConfigValue>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(path.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(path, value);
        self
    }

    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        self.values.get(path)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl ConfigOracle for ConfigSnapshot {
    fn value(&self, path: &str) -> Option<&ConfigValue> {
        self.values.get(path)
    }
}

// ============================================================================
// Sandbox world
// ============================================================================

/// One entity in the sandbox world.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: Option<String>,
    pub location: Location,
    pub alive: bool,
    /// `None` for entities without a bending profile.
    pub flags: Option<ActorFlags>,
    pub aim: Vec3,
    pub velocity: Vec3,
    pub abilities: Vec<AbilityKind>,
    pub cooldown_exempt: bool,
}

impl EntityRecord {
    pub fn new(id: EntityId, kind: EntityKind, location: Location) -> Self {
        let flags = kind.is_player().then(ActorFlags::empty);
        Self {
            id,
            kind,
            name: None,
            location,
            alive: true,
            flags,
            aim: Vec3::new(1.0, 0.0, 0.0),
            velocity: Vec3::ZERO,
            abilities: Vec::new(),
            cooldown_exempt: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_flags(mut self, flags: ActorFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn aiming(mut self, direction: Vec3) -> Self {
        self.aim = direction;
        self
    }

    pub fn bending(mut self, ability: AbilityKind) -> Self {
        if !self.abilities.contains(&ability) {
            self.abilities.push(ability);
        }
        self
    }

    pub fn ignoring_cooldowns(mut self) -> Self {
        self.cooldown_exempt = true;
        self
    }

    pub fn dead(mut self) -> Self {
        self.alive = false;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConditions {
    pub night: bool,
    pub full_moon: bool,
}

impl WorldConditions {
    pub const DAY: Self = Self {
        night: false,
        full_moon: false,
    };
    pub const FULL_MOON_NIGHT: Self = Self {
        night: true,
        full_moon: true,
    };
}

/// Spherical region where abilities are not allowed to affect entities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProtectedRegion {
    pub center: Location,
    pub radius: f64,
}

impl ProtectedRegion {
    pub fn contains(&self, location: &Location) -> bool {
        self.center
            .distance(location)
            .is_some_and(|distance| distance <= self.radius)
    }
}

/// Host-side input applied to the sandbox between ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldUpdate {
    SetSneaking { entity: EntityId, sneaking: bool },
    SetFlags { entity: EntityId, flags: ActorFlags },
    Teleport { entity: EntityId, location: Location },
    Aim { entity: EntityId, direction: Vec3 },
    Spawn(EntityRecord),
    Despawn(EntityId),
    Kill(EntityId),
    SetConditions { world: WorldId, conditions: WorldConditions },
}

/// In-memory world: entities in insertion order, per-world conditions and
/// protected regions. Applied effects are kept in an append-only log.
#[derive(Clone, Debug, Default)]
pub struct SnapshotWorld {
    entities: Vec<EntityRecord>,
    conditions: HashMap<WorldId, WorldConditions>,
    protected: Vec<ProtectedRegion>,
    applied: Vec<Effect>,
}

impl SnapshotWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity, replacing any existing record with the same id.
    pub fn spawn(&mut self, record: EntityRecord) {
        match self.entities.iter_mut().find(|e| e.id == record.id) {
            Some(existing) => *existing = record,
            None => self.entities.push(record),
        }
    }

    pub fn with_entity(mut self, record: EntityRecord) -> Self {
        self.spawn(record);
        self
    }

    pub fn set_conditions(&mut self, world: WorldId, conditions: WorldConditions) {
        self.conditions.insert(world, conditions);
    }

    pub fn with_conditions(mut self, world: WorldId, conditions: WorldConditions) -> Self {
        self.set_conditions(world, conditions);
        self
    }

    pub fn protect(&mut self, region: ProtectedRegion) {
        self.protected.push(region);
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.iter()
    }

    pub fn applied_effects(&self) -> &[Effect] {
        &self.applied
    }

    pub fn clear_applied_effects(&mut self) {
        self.applied.clear();
    }

    /// Applies a host input. Returns `false` when the update names an unknown entity.
    pub fn apply(&mut self, update: WorldUpdate) -> bool {
        match update {
            WorldUpdate::SetSneaking { entity, sneaking } => self.update(entity, |record| {
                let flags = record.flags.get_or_insert_with(ActorFlags::empty);
                flags.set(ActorFlags::SNEAKING, sneaking);
            }),
            WorldUpdate::SetFlags { entity, flags } => {
                self.update(entity, |record| record.flags = Some(flags))
            }
            WorldUpdate::Teleport { entity, location } => {
                self.update(entity, |record| record.location = location)
            }
            WorldUpdate::Aim { entity, direction } => {
                self.update(entity, |record| record.aim = direction)
            }
            WorldUpdate::Spawn(record) => {
                self.spawn(record);
                true
            }
            WorldUpdate::Despawn(entity) => {
                let before = self.entities.len();
                self.entities.retain(|e| e.id != entity);
                self.entities.len() != before
            }
            WorldUpdate::Kill(entity) => self.update(entity, |record| record.alive = false),
            WorldUpdate::SetConditions { world, conditions } => {
                self.set_conditions(world, conditions);
                true
            }
        }
    }

    fn update(&mut self, entity: EntityId, f: impl FnOnce(&mut EntityRecord)) -> bool {
        match self.entity_mut(entity) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    fn conditions(&self, world: WorldId) -> WorldConditions {
        self.conditions.get(&world).copied().unwrap_or_default()
    }
}

impl WorldOracle for SnapshotWorld {
    fn location(&self, entity: EntityId) -> Option<Location> {
        self.entity(entity).map(|e| e.location)
    }

    fn kind(&self, entity: EntityId) -> Option<EntityKind> {
        self.entity(entity).map(|e| e.kind)
    }

    fn is_alive(&self, entity: EntityId) -> bool {
        self.entity(entity).is_some_and(|e| e.alive)
    }

    fn entities_near(&self, center: &Location, radius: f64) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.alive)
            .filter(|e| {
                center
                    .distance(&e.location)
                    .is_some_and(|distance| distance <= radius)
            })
            .map(|e| e.id)
            .collect()
    }

    fn is_night(&self, world: WorldId) -> bool {
        self.conditions(world).night
    }

    fn is_full_moon(&self, world: WorldId) -> bool {
        self.conditions(world).full_moon
    }

    fn is_region_protected(&self, _ability: AbilityKind, location: &Location) -> bool {
        self.protected.iter().any(|region| region.contains(location))
    }

    fn aim_direction(&self, entity: EntityId) -> Option<Vec3> {
        self.entity(entity).map(|e| e.aim)
    }

    fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|e| {
                e.alive
                    && e.name
                        .as_deref()
                        .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
            })
            .map(|e| e.id)
    }
}

impl ActorOracle for SnapshotWorld {
    fn flags(&self, entity: EntityId) -> Option<ActorFlags> {
        self.entity(entity).and_then(|e| e.flags)
    }

    fn can_bend(&self, actor: EntityId, ability: AbilityKind) -> bool {
        self.entity(actor)
            .is_some_and(|e| e.alive && e.abilities.contains(&ability))
    }

    fn can_ignore_own_cooldown(&self, actor: EntityId, _ability: AbilityKind) -> bool {
        self.entity(actor).is_some_and(|e| e.cooldown_exempt)
    }
}

impl EffectSink for SnapshotWorld {
    fn apply_zero_damage_interrupt(&mut self, entity: EntityId, ability: AbilityKind) {
        self.applied
            .push(Effect::ZeroDamageInterrupt { entity, ability });
    }

    fn apply_velocity(&mut self, ability: AbilityKind, entity: EntityId, velocity: Vec3) {
        if let Some(record) = self.entity_mut(entity) {
            record.velocity = velocity;
        }
        self.applied.push(Effect::Velocity {
            ability,
            entity,
            velocity,
        });
    }

    fn apply_temporary_status_effect(&mut self, entity: EntityId, effect: StatusEffect) {
        self.applied.push(Effect::Status { entity, effect });
    }

    fn break_conflicting_hold(&mut self, entity: EntityId) {
        self.applied.push(Effect::BreakConflictingHold { entity });
    }

    fn reset_fall_distance(&mut self, entity: EntityId) {
        self.applied.push(Effect::ResetFallDistance { entity });
    }

    fn clear_creature_target(&mut self, entity: EntityId) {
        self.applied.push(Effect::ClearCreatureTarget { entity });
    }

    fn show_action_bar(&mut self, entity: EntityId, message: &str) {
        self.applied.push(Effect::ActionBar {
            entity,
            message: message.to_owned(),
        });
    }

    fn track_knockback(&mut self, entity: EntityId, source: EntityId, window: Millis) {
        self.applied.push(Effect::TrackKnockback {
            entity,
            source,
            window,
        });
    }

    fn clear_knockback_tracker(&mut self, entity: EntityId) {
        self.applied.push(Effect::ClearKnockbackTracker { entity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64) -> Location {
        Location::new(WorldId::OVERWORLD, Vec3::new(x, 64.0, 0.0))
    }

    #[test]
    fn entities_near_keeps_insertion_order_and_skips_dead() {
        let world = SnapshotWorld::new()
            .with_entity(EntityRecord::new(EntityId(3), EntityKind::Cow, at(2.0)))
            .with_entity(EntityRecord::new(EntityId(1), EntityKind::Pig, at(1.0)))
            .with_entity(EntityRecord::new(EntityId(2), EntityKind::Sheep, at(1.5)).dead())
            .with_entity(EntityRecord::new(
                EntityId(4),
                EntityKind::Cow,
                Location::new(WorldId(1), Vec3::new(1.0, 64.0, 0.0)),
            ));

        assert_eq!(
            world.entities_near(&at(0.0), 5.0),
            vec![EntityId(3), EntityId(1)]
        );
    }

    #[test]
    fn sneaking_update_creates_profile_when_missing() {
        let mut world =
            SnapshotWorld::new().with_entity(EntityRecord::new(EntityId(1), EntityKind::Cow, at(0.0)));
        assert_eq!(world.flags(EntityId(1)), None);

        assert!(world.apply(WorldUpdate::SetSneaking {
            entity: EntityId(1),
            sneaking: true,
        }));
        assert!(world.is_sneaking(EntityId(1)));
        assert!(!world.apply(WorldUpdate::Kill(EntityId(99))));
    }

    #[test]
    fn protected_region_is_world_scoped() {
        let mut world = SnapshotWorld::new();
        world.protect(ProtectedRegion {
            center: at(0.0),
            radius: 3.0,
        });
        let kind = AbilityKind::Bloodbending;
        assert!(world.is_region_protected(kind, &at(2.0)));
        assert!(!world.is_region_protected(kind, &at(4.0)));
        assert!(!world.is_region_protected(
            kind,
            &Location::new(WorldId(7), Vec3::new(0.0, 64.0, 0.0))
        ));
    }

    #[test]
    fn config_snapshot_widens_integers() {
        let config = ConfigSnapshot::new()
            .with("a.range", 12_i64)
            .with("a.flag", true);
        assert_eq!(config.get_f64("a.range"), Some(12.0));
        assert_eq!(config.get_i64("a.flag"), None);
        assert_eq!(config.get_bool("a.flag"), Some(true));
    }
}
