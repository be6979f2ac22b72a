//! World mutations requested by abilities.
//!
//! The engine never touches entities directly. Every side effect is handed to
//! an [`EffectSink`]; the runtime collects them in an [`EffectBuffer`] during
//! the tick pass and flushes the buffer into the host world afterwards.
use crate::ability::AbilityKind;
use crate::state::{EntityId, Millis, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusEffectKind {
    Slowness,
}

/// A potion-style effect that expires on its own after `duration_ticks`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: StatusEffectKind,
    pub duration_ticks: u32,
    pub amplifier: u8,
}

impl StatusEffect {
    pub const fn new(kind: StatusEffectKind, duration_ticks: u32, amplifier: u8) -> Self {
        Self {
            kind,
            duration_ticks,
            amplifier,
        }
    }
}

/// Host-side operations an ability may request.
pub trait EffectSink {
    /// Zero-damage hit attributed to `ability`; interrupts whatever the entity was doing.
    fn apply_zero_damage_interrupt(&mut self, entity: EntityId, ability: AbilityKind);

    fn apply_velocity(&mut self, ability: AbilityKind, entity: EntityId, velocity: Vec3);

    fn apply_temporary_status_effect(&mut self, entity: EntityId, effect: StatusEffect);

    /// Frees the entity from any other hold-style ability (breath holds and the like).
    fn break_conflicting_hold(&mut self, entity: EntityId);

    fn reset_fall_distance(&mut self, entity: EntityId);

    fn clear_creature_target(&mut self, entity: EntityId);

    fn show_action_bar(&mut self, entity: EntityId, message: &str);

    /// Attributes horizontal knockback damage to `source` for `window` milliseconds.
    fn track_knockback(&mut self, entity: EntityId, source: EntityId, window: Millis);

    fn clear_knockback_tracker(&mut self, entity: EntityId);
}

/// One recorded call on an [`EffectSink`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    ZeroDamageInterrupt {
        entity: EntityId,
        ability: AbilityKind,
    },
    Velocity {
        ability: AbilityKind,
        entity: EntityId,
        velocity: Vec3,
    },
    Status {
        entity: EntityId,
        effect: StatusEffect,
    },
    BreakConflictingHold {
        entity: EntityId,
    },
    ResetFallDistance {
        entity: EntityId,
    },
    ClearCreatureTarget {
        entity: EntityId,
    },
    ActionBar {
        entity: EntityId,
        message: String,
    },
    TrackKnockback {
        entity: EntityId,
        source: EntityId,
        window: Millis,
    },
    ClearKnockbackTracker {
        entity: EntityId,
    },
}

impl Effect {
    /// The entity the effect lands on.
    pub fn entity(&self) -> EntityId {
        match self {
            Self::ZeroDamageInterrupt { entity, .. }
            | Self::Velocity { entity, .. }
            | Self::Status { entity, .. }
            | Self::BreakConflictingHold { entity }
            | Self::ResetFallDistance { entity }
            | Self::ClearCreatureTarget { entity }
            | Self::ActionBar { entity, .. }
            | Self::TrackKnockback { entity, .. }
            | Self::ClearKnockbackTracker { entity } => *entity,
        }
    }

    /// Replays this effect onto another sink.
    pub fn apply_to(self, sink: &mut dyn EffectSink) {
        match self {
            Self::ZeroDamageInterrupt { entity, ability } => {
                sink.apply_zero_damage_interrupt(entity, ability)
            }
            Self::Velocity {
                ability,
                entity,
                velocity,
            } => sink.apply_velocity(ability, entity, velocity),
            Self::Status { entity, effect } => sink.apply_temporary_status_effect(entity, effect),
            Self::BreakConflictingHold { entity } => sink.break_conflicting_hold(entity),
            Self::ResetFallDistance { entity } => sink.reset_fall_distance(entity),
            Self::ClearCreatureTarget { entity } => sink.clear_creature_target(entity),
            Self::ActionBar { entity, message } => sink.show_action_bar(entity, &message),
            Self::TrackKnockback {
                entity,
                source,
                window,
            } => sink.track_knockback(entity, source, window),
            Self::ClearKnockbackTracker { entity } => sink.clear_knockback_tracker(entity),
        }
    }
}

/// Ordered buffer of effects produced during one pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectBuffer {
    effects: Vec<Effect>,
}

impl EffectBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Effect> + '_ {
        self.effects.drain(..)
    }

    /// Applies every buffered effect to `sink` in order, leaving the buffer empty.
    pub fn flush_into(&mut self, sink: &mut dyn EffectSink) {
        for effect in self.effects.drain(..) {
            effect.apply_to(sink);
        }
    }

    /// The most recent velocity requested for `entity`, if any.
    pub fn last_velocity_of(&self, entity: EntityId) -> Option<Vec3> {
        self.effects.iter().rev().find_map(|effect| match effect {
            Effect::Velocity {
                entity: target,
                velocity,
                ..
            } if *target == entity => Some(*velocity),
            _ => None,
        })
    }

    pub fn count_for(&self, entity: EntityId) -> usize {
        self.effects
            .iter()
            .filter(|effect| effect.entity() == entity)
            .count()
    }
}

impl EffectSink for EffectBuffer {
    fn apply_zero_damage_interrupt(&mut self, entity: EntityId, ability: AbilityKind) {
        self.effects
            .push(Effect::ZeroDamageInterrupt { entity, ability });
    }

    fn apply_velocity(&mut self, ability: AbilityKind, entity: EntityId, velocity: Vec3) {
        self.effects.push(Effect::Velocity {
            ability,
            entity,
            velocity,
        });
    }

    fn apply_temporary_status_effect(&mut self, entity: EntityId, effect: StatusEffect) {
        self.effects.push(Effect::Status { entity, effect });
    }

    fn break_conflicting_hold(&mut self, entity: EntityId) {
        self.effects.push(Effect::BreakConflictingHold { entity });
    }

    fn reset_fall_distance(&mut self, entity: EntityId) {
        self.effects.push(Effect::ResetFallDistance { entity });
    }

    fn clear_creature_target(&mut self, entity: EntityId) {
        self.effects.push(Effect::ClearCreatureTarget { entity });
    }

    fn show_action_bar(&mut self, entity: EntityId, message: &str) {
        self.effects.push(Effect::ActionBar {
            entity,
            message: message.to_owned(),
        });
    }

    fn track_knockback(&mut self, entity: EntityId, source: EntityId, window: Millis) {
        self.effects.push(Effect::TrackKnockback {
            entity,
            source,
            window,
        });
    }

    fn clear_knockback_tracker(&mut self, entity: EntityId) {
        self.effects.push(Effect::ClearKnockbackTracker { entity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_preserves_order_and_empties_buffer() {
        let mut buffer = EffectBuffer::new();
        buffer.break_conflicting_hold(EntityId(1));
        buffer.apply_velocity(
            AbilityKind::Bloodbending,
            EntityId(1),
            Vec3::new(0.0, 1.0, 0.0),
        );

        let mut sink = EffectBuffer::new();
        buffer.flush_into(&mut sink);

        assert!(buffer.is_empty());
        let replayed: Vec<_> = sink.iter().cloned().collect();
        assert_eq!(
            replayed,
            vec![
                Effect::BreakConflictingHold {
                    entity: EntityId(1)
                },
                Effect::Velocity {
                    ability: AbilityKind::Bloodbending,
                    entity: EntityId(1),
                    velocity: Vec3::new(0.0, 1.0, 0.0),
                },
            ]
        );
    }

    #[test]
    fn last_velocity_picks_latest_request() {
        let mut buffer = EffectBuffer::new();
        let kind = AbilityKind::Bloodbending;
        buffer.apply_velocity(kind, EntityId(2), Vec3::new(1.0, 0.0, 0.0));
        buffer.apply_velocity(kind, EntityId(3), Vec3::new(0.0, 0.0, 1.0));
        buffer.apply_velocity(kind, EntityId(2), Vec3::new(0.0, 2.0, 0.0));

        assert_eq!(
            buffer.last_velocity_of(EntityId(2)),
            Some(Vec3::new(0.0, 2.0, 0.0))
        );
        assert_eq!(buffer.last_velocity_of(EntityId(9)), None);
    }
}
