//! Bloodbending: hold living entities in place and fling them on release.
//!
//! A normal actor holds one target picked along its aim and pulls it towards
//! a point six blocks ahead. An actor in override state holds everything in
//! range and keeps rescanning, so entities join and leave the hold mid-channel.
use tracing::debug;

use super::{AbilityKind, AcquisitionMode, StepContext, TerminationCause, probe_line};
use crate::config::BloodbendingConfig;
use crate::engine::AbilityEvent;
use crate::env::{Env, StatusEffect, StatusEffectKind};
use crate::error::AbilityError;
use crate::gating::{self, Acquirer, DenyReason, TargetFacts};
use crate::registry::AcquireOutcome;
use crate::state::{EntityId, Location, Millis, Vec3};

const KIND: AbilityKind = AbilityKind::Bloodbending;

const SLOWNESS: StatusEffect = StatusEffect::new(
    StatusEffectKind::Slowness,
    BloodbendingConfig::SLOWNESS_TICKS,
    BloodbendingConfig::SLOWNESS_AMPLIFIER,
);

#[derive(Clone, Debug, PartialEq)]
pub struct Bloodbending {
    config: BloodbendingConfig,
    mode: AcquisitionMode,
    target: Option<EntityId>,
    force: Vec3,
}

impl Bloodbending {
    pub fn new(config: BloodbendingConfig, mode: AcquisitionMode) -> Self {
        Self {
            config,
            mode,
            target: None,
            force: Vec3::ZERO,
        }
    }

    /// Snapshots the config for `actor`, scaled for night, and picks the mode.
    pub(crate) fn configure(env: &Env<'_>, actor: EntityId) -> Result<Self, DenyReason> {
        let location = env
            .world()
            .location(actor)
            .ok_or(DenyReason::ActorUnavailable)?;
        let config = BloodbendingConfig::from_oracle(env.config())
            .scaled_for_night(env.world().is_night(location.world));
        let mode = if env.actors().is_in_override_state(actor) {
            AcquisitionMode::Area
        } else {
            AcquisitionMode::Line
        };
        Ok(Self::new(config, mode))
    }

    pub fn config(&self) -> &BloodbendingConfig {
        &self.config
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    /// The single line-mode target, once acquired.
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn force(&self) -> Vec3 {
        self.force
    }

    pub(crate) fn activate(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<Vec<EntityId>, DenyReason> {
        let rules = self.config.rules();
        gating::actor_admission(&rules, &ctx.env, ctx.actor, KIND)?;
        let location = ctx
            .env
            .world()
            .location(ctx.actor)
            .ok_or(DenyReason::ActorUnavailable)?;

        match self.mode {
            AcquisitionMode::Area => Ok(self.sweep(ctx, &location)),
            AcquisitionMode::Line => self.acquire_line_target(ctx, location).map(|t| vec![t]),
        }
    }

    fn acquire_line_target(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
        location: Location,
    ) -> Result<EntityId, DenyReason> {
        let world = ctx.env.world();
        let candidate =
            probe_line(world, ctx.actor, self.config.range).ok_or(DenyReason::NoTarget)?;
        let facts = TargetFacts::observe(&ctx.env, ctx.registry, KIND, candidate)
            .ok_or(DenyReason::NoTarget)?;
        let acquirer = Acquirer {
            id: ctx.actor,
            location,
            overridden: false,
        };
        gating::target_eligibility(
            &self.config.rules(),
            ctx.exemptions,
            &acquirer,
            &facts,
            |at| world.is_region_protected(KIND, at),
        )?;

        match ctx.registry.acquire(KIND, candidate, ctx.actor, ctx.now) {
            AcquireOutcome::RejectedForeignOwnership { .. } => Err(DenyReason::ForeignController),
            outcome => {
                ctx.effects.apply_zero_damage_interrupt(candidate, KIND);
                ctx.effects.clear_knockback_tracker(candidate);
                ctx.effects.break_conflicting_hold(candidate);
                if outcome == AcquireOutcome::Acquired {
                    ctx.journal.push(AbilityEvent::TargetAcquired {
                        kind: KIND,
                        target: candidate,
                        controller: ctx.actor,
                    });
                }
                self.target = Some(candidate);
                Ok(candidate)
            }
        }
    }

    /// Area scan: acquires every newly eligible entity in range and returns
    /// everything currently held, in scan order.
    fn sweep(&self, ctx: &mut StepContext<'_, '_>, location: &Location) -> Vec<EntityId> {
        let world = ctx.env.world();
        let rules = self.config.rules();
        let acquirer = Acquirer {
            id: ctx.actor,
            location: *location,
            overridden: true,
        };
        let mut held = Vec::new();

        for candidate in world.entities_near(location, self.config.range) {
            let Some(facts) = TargetFacts::observe(&ctx.env, ctx.registry, KIND, candidate) else {
                continue;
            };
            let gate = gating::target_eligibility(&rules, ctx.exemptions, &acquirer, &facts, |at| {
                world.is_region_protected(KIND, at)
            });
            if gate.is_err() {
                continue;
            }
            match ctx.registry.acquire(KIND, candidate, ctx.actor, ctx.now) {
                AcquireOutcome::Acquired => {
                    ctx.effects.apply_zero_damage_interrupt(candidate, KIND);
                    ctx.effects.break_conflicting_hold(candidate);
                    ctx.journal.push(AbilityEvent::TargetAcquired {
                        kind: KIND,
                        target: candidate,
                        controller: ctx.actor,
                    });
                    held.push(candidate);
                }
                AcquireOutcome::AlreadyOwnedBySelf => held.push(candidate),
                AcquireOutcome::RejectedForeignOwnership { owner } => {
                    debug!(target: "ability::bloodbending", %candidate, %owner, "target held by another actor");
                }
            }
        }

        held
    }

    pub(crate) fn channel(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<Option<TerminationCause>, AbilityError> {
        if self.config.duration > 0 && ctx.elapsed() > self.config.duration {
            return Ok(Some(TerminationCause::Expired));
        }
        if !ctx.env.actors().is_sneaking(ctx.actor) {
            return Ok(Some(TerminationCause::Released));
        }
        let location = ctx
            .env
            .world()
            .location(ctx.actor)
            .ok_or(AbilityError::ActorMissing(ctx.actor))?;

        // Area holds ignore undead immunity, so only line holds are pruned here.
        let rules = self.config.rules();
        if !rules.undead_allowed && self.mode == AcquisitionMode::Line {
            self.release_where(ctx, |ctx, target| ctx.env.world().is_undead(target));
        }
        if let Err(reason) = gating::actor_admission(&rules, &ctx.env, ctx.actor, KIND) {
            return Ok(Some(TerminationCause::Interrupted(reason)));
        }

        match self.mode {
            AcquisitionMode::Area => {
                self.channel_area(ctx, &location);
                Ok(None)
            }
            AcquisitionMode::Line => self.channel_line(ctx, &location),
        }
    }

    fn channel_area(&mut self, ctx: &mut StepContext<'_, '_>, location: &Location) {
        let held = self.sweep(ctx, location);
        self.release_where(ctx, |_, target| !held.contains(&target));

        self.force = Vec3::ZERO;
        for target in held {
            self.hold(ctx, target);
        }
    }

    fn channel_line(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
        location: &Location,
    ) -> Result<Option<TerminationCause>, AbilityError> {
        self.release_where(ctx, |ctx, target| {
            let Some(facts) = TargetFacts::observe(&ctx.env, ctx.registry, KIND, target) else {
                return true;
            };
            !facts.alive
                || !facts.location.same_world(location)
                || gating::target_unbendable(facts.flags).is_err()
                || gating::target_override(facts.flags).is_err()
        });

        let Some(target) = self.target else {
            return Ok(Some(TerminationCause::TargetLost));
        };
        if ctx.registry.owner_of(KIND, target) != Some(ctx.actor) {
            return Ok(Some(TerminationCause::TargetLost));
        }
        let Some(target_location) = ctx.env.world().location(target) else {
            return Ok(Some(TerminationCause::TargetLost));
        };

        let anchor = ctx
            .env
            .world()
            .targeted_location(ctx.actor, BloodbendingConfig::PULL_ANCHOR)
            .ok_or(AbilityError::AimUnavailable(ctx.actor))?;
        self.force = pull_force(&anchor, &target_location);
        self.hold(ctx, target);
        Ok(None)
    }

    /// Per-tick hold effects on one target.
    fn hold(&self, ctx: &mut StepContext<'_, '_>, target: EntityId) {
        let kind = ctx.env.world().kind(target);
        ctx.effects.apply_velocity(KIND, target, self.force);
        ctx.effects.apply_temporary_status_effect(target, SLOWNESS);
        ctx.effects.reset_fall_distance(target);
        if kind.is_some_and(|kind| kind.is_creature()) {
            ctx.effects.clear_creature_target(target);
        }
        if kind.is_some_and(|kind| kind.is_player()) {
            ctx.effects
                .show_action_bar(target, &self.config.action_bar_message);
        }
        ctx.effects.break_conflicting_hold(target);
    }

    /// Releases this actor's entries matching `predicate`.
    ///
    /// Works from a snapshot of the actor's targets, so removal never races
    /// the iteration.
    fn release_where(
        &self,
        ctx: &mut StepContext<'_, '_>,
        mut predicate: impl FnMut(&StepContext<'_, '_>, EntityId) -> bool,
    ) {
        for target in ctx.registry.targets_of(KIND, ctx.actor) {
            if predicate(ctx, target) && ctx.registry.release(KIND, target, ctx.actor) {
                ctx.journal.push(AbilityEvent::TargetReleased {
                    kind: KIND,
                    target,
                    controller: ctx.actor,
                });
            }
        }
    }

    /// Final impulse for every held target.
    pub(crate) fn release(&mut self, ctx: &mut StepContext<'_, '_>) -> Result<(), AbilityError> {
        let world = ctx.env.world();
        let location = world
            .location(ctx.actor)
            .ok_or(AbilityError::ActorMissing(ctx.actor))?;
        let aim = world
            .aim_direction(ctx.actor)
            .ok_or(AbilityError::AimUnavailable(ctx.actor))?;

        for target in ctx.registry.targets_of(KIND, ctx.actor) {
            let Some(target_location) = world.location(target) else {
                continue;
            };
            let impulse =
                release_impulse(&location, aim, &target_location, self.config.knockback);
            ctx.effects.apply_velocity(KIND, target, impulse);
            ctx.effects.track_knockback(
                target,
                ctx.actor,
                BloodbendingConfig::KNOCKBACK_TRACK_WINDOW,
            );
        }
        Ok(())
    }

    /// Normal terminations always write the cooldown. Anything else only does
    /// for a line-mode hold by a non-override actor ending within the
    /// anti-spam floor.
    pub(crate) fn cooldown_after(
        &self,
        cause: TerminationCause,
        elapsed: Millis,
        actor_overridden: bool,
    ) -> Option<Millis> {
        let anti_spam = self.mode == AcquisitionMode::Line
            && self.target.is_some()
            && !actor_overridden
            && elapsed < BloodbendingConfig::ANTI_SPAM_FLOOR;
        (cause.is_normal() || anti_spam).then_some(self.config.cooldown)
    }
}

/// Outward impulse for a released target: `normalize(aim) * knockback`, or
/// zero when the target is in another world.
pub fn release_impulse(actor: &Location, aim: Vec3, target: &Location, knockback: f64) -> Vec3 {
    if !actor.same_world(target) {
        return Vec3::ZERO;
    }
    aim.normalize() * knockback
}

/// Line-mode pull towards `anchor`, zero inside the dead zone or across worlds.
pub fn pull_force(anchor: &Location, target: &Location) -> Vec3 {
    match anchor.distance(target) {
        Some(distance) if distance >= BloodbendingConfig::PULL_DEAD_ZONE => {
            (anchor.position - target.position).normalize() * BloodbendingConfig::PULL_SPEED
        }
        _ => Vec3::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorldId;

    fn at(world: u32, x: f64, y: f64, z: f64) -> Location {
        Location::new(WorldId(world), Vec3::new(x, y, z))
    }

    #[test]
    fn release_impulse_is_normalized_aim_times_knockback() {
        let impulse = release_impulse(
            &at(0, 0.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 4.0),
            &at(0, 2.0, 0.0, 0.0),
            10.0,
        );
        assert!((impulse.y - 6.0).abs() < 1e-9);
        assert!((impulse.z - 8.0).abs() < 1e-9);
        assert_eq!(impulse.x, 0.0);
    }

    #[test]
    fn release_impulse_is_zero_across_worlds() {
        let impulse = release_impulse(
            &at(0, 0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            &at(1, 2.0, 0.0, 0.0),
            4.0,
        );
        assert_eq!(impulse, Vec3::ZERO);
    }

    #[test]
    fn pull_force_has_dead_zone() {
        let anchor = at(0, 6.0, 0.0, 0.0);
        let far = pull_force(&anchor, &at(0, 2.0, 0.0, 0.0));
        assert!((far.x - 0.5).abs() < 1e-9);

        assert_eq!(pull_force(&anchor, &at(0, 5.5, 0.0, 0.0)), Vec3::ZERO);
        assert_eq!(pull_force(&anchor, &at(2, 2.0, 0.0, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn anti_spam_cooldown_only_for_quick_line_holds() {
        let mut ability = Bloodbending::new(BloodbendingConfig::default(), AcquisitionMode::Line);
        ability.target = Some(EntityId(2));
        let toggled = TerminationCause::Toggled;

        assert_eq!(ability.cooldown_after(toggled, 500, false), Some(10_000));
        assert_eq!(ability.cooldown_after(toggled, 1500, false), None);
        assert_eq!(ability.cooldown_after(toggled, 500, true), None);
        assert_eq!(
            ability.cooldown_after(TerminationCause::Released, 5000, true),
            Some(10_000)
        );

        let area = Bloodbending::new(BloodbendingConfig::default(), AcquisitionMode::Area);
        assert_eq!(area.cooldown_after(toggled, 100, false), None);
    }
}
