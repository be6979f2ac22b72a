//! Gating predicates.
//!
//! Each predicate is a pure function returning [`Gate`]. They are independent
//! conjunctions, so order never changes the outcome; the combinators below
//! still run local checks (id equality, entity category, flags) before the
//! world queries so the region lookup only happens for otherwise eligible
//! targets.
use std::collections::HashSet;

use crate::ability::AbilityKind;
use crate::config::GatingRules;
use crate::env::Env;
use crate::registry::TargetRegistry;
use crate::state::{ActorFlags, EntityId, EntityKind, Location};

/// Why an activation or a target was refused.
///
/// Never an error of the public API: rejections are ordinary outcomes and
/// carry no side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DenyReason {
    #[error("can only be used at night")]
    NotNight,
    #[error("can only be used during a full moon")]
    NotFullMoon,
    #[error("actor cannot bend this ability")]
    CannotBend,
    #[error("ability is on cooldown")]
    OnCooldown,
    #[error("no target in range")]
    NoTarget,
    #[error("actor is not present in the world")]
    ActorUnavailable,
    #[error("cannot target self")]
    SelfTarget,
    #[error("target is not a living entity")]
    NotLiving,
    #[error("target is decorative")]
    Decorative,
    #[error("target type is bloodless")]
    Bloodless,
    #[error("undead targets are not allowed")]
    UndeadImmune,
    #[error("target is a bloodbender")]
    TargetIsBloodbender,
    #[error("target cannot be bloodbent")]
    TargetUnbendable,
    #[error("target is in an override state")]
    TargetOverridden,
    #[error("target is controlled by another actor")]
    ForeignController,
    #[error("target is inside a protected region")]
    RegionProtected,
    #[error("target is in another world")]
    OtherWorld,
    #[error("target is dead")]
    TargetDead,
}

impl DenyReason {
    /// Stable identifier for caller-side messaging.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotNight => "NOT_NIGHT",
            Self::NotFullMoon => "NOT_FULL_MOON",
            Self::CannotBend => "CANNOT_BEND",
            Self::OnCooldown => "ON_COOLDOWN",
            Self::NoTarget => "NO_TARGET",
            Self::ActorUnavailable => "ACTOR_UNAVAILABLE",
            Self::SelfTarget => "SELF_TARGET",
            Self::NotLiving => "NOT_LIVING",
            Self::Decorative => "DECORATIVE",
            Self::Bloodless => "BLOODLESS",
            Self::UndeadImmune => "UNDEAD_IMMUNE",
            Self::TargetIsBloodbender => "TARGET_IS_BLOODBENDER",
            Self::TargetUnbendable => "TARGET_UNBENDABLE",
            Self::TargetOverridden => "TARGET_OVERRIDDEN",
            Self::ForeignController => "FOREIGN_CONTROLLER",
            Self::RegionProtected => "REGION_PROTECTED",
            Self::OtherWorld => "OTHER_WORLD",
            Self::TargetDead => "TARGET_DEAD",
        }
    }
}

pub type Gate = Result<(), DenyReason>;

fn require(condition: bool, reason: DenyReason) -> Gate {
    if condition { Ok(()) } else { Err(reason) }
}

// ============================================================================
// Actor predicates
// ============================================================================

/// Night-only restriction. Override and "anytime" actors are exempt.
pub fn time_of_day(rules: &GatingRules, is_night: bool, actor: ActorFlags) -> Gate {
    require(
        !rules.night_only || is_night || actor.ignores_time(),
        DenyReason::NotNight,
    )
}

/// Full-moon restriction. Override and "anytime" actors are exempt.
pub fn full_moon(rules: &GatingRules, is_full_moon: bool, actor: ActorFlags) -> Gate {
    require(
        !rules.full_moon_only || is_full_moon || actor.ignores_time(),
        DenyReason::NotFullMoon,
    )
}

pub fn can_bend(can_bend: bool, actor: ActorFlags) -> Gate {
    require(can_bend || actor.is_overridden(), DenyReason::CannotBend)
}

/// Time, moon and permission checks that govern both activation and every
/// channeling tick.
pub fn actor_admission(
    rules: &GatingRules,
    env: &Env<'_>,
    actor: EntityId,
    ability: AbilityKind,
) -> Gate {
    let location = env
        .world()
        .location(actor)
        .ok_or(DenyReason::ActorUnavailable)?;
    let flags = env.actors().flags(actor).unwrap_or_default();

    time_of_day(rules, env.world().is_night(location.world), flags)?;
    full_moon(rules, env.world().is_full_moon(location.world), flags)?;
    can_bend(env.actors().can_bend(actor, ability), flags)
}

// ============================================================================
// Target predicates
// ============================================================================

pub fn self_target(actor: EntityId, target: EntityId) -> Gate {
    require(actor != target, DenyReason::SelfTarget)
}

pub fn alive(is_alive: bool) -> Gate {
    require(is_alive, DenyReason::TargetDead)
}

pub fn same_world(actor: &Location, target: &Location) -> Gate {
    require(actor.same_world(target), DenyReason::OtherWorld)
}

/// Living, non-decorative entities only.
pub fn living(kind: EntityKind) -> Gate {
    require(kind.is_living(), DenyReason::NotLiving)?;
    require(!kind.is_decorative(), DenyReason::Decorative)
}

pub fn bloodless(exempt: &HashSet<EntityKind>, kind: EntityKind) -> Gate {
    require(!exempt.contains(&kind), DenyReason::Bloodless)
}

pub fn undead(rules: &GatingRules, is_undead: bool) -> Gate {
    require(rules.undead_allowed || !is_undead, DenyReason::UndeadImmune)
}

/// Other bloodbenders are protected unless cross-bending is configured.
pub fn cross_bending(rules: &GatingRules, target: Option<ActorFlags>) -> Gate {
    let bloodbender = target.is_some_and(ActorFlags::is_bloodbender);
    require(
        rules.cross_bending || !bloodbender,
        DenyReason::TargetIsBloodbender,
    )
}

/// Overridden actors can never be targeted.
pub fn target_override(target: Option<ActorFlags>) -> Gate {
    require(
        !target.is_some_and(ActorFlags::is_overridden),
        DenyReason::TargetOverridden,
    )
}

pub fn target_unbendable(target: Option<ActorFlags>) -> Gate {
    require(
        !target.is_some_and(|flags| flags.contains(ActorFlags::UNBENDABLE)),
        DenyReason::TargetUnbendable,
    )
}

/// Denies targets held by somebody else, unless the acquirer is overridden
/// and cross-bending is permitted.
pub fn foreign_controller(
    rules: &GatingRules,
    acquirer: &Acquirer,
    owner: Option<EntityId>,
) -> Gate {
    match owner {
        Some(owner) if owner != acquirer.id => require(
            acquirer.overridden && rules.cross_bending,
            DenyReason::ForeignController,
        ),
        _ => Ok(()),
    }
}

pub fn region(is_protected: bool) -> Gate {
    require(!is_protected, DenyReason::RegionProtected)
}

/// The acting entity as seen by the target checks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Acquirer {
    pub id: EntityId,
    pub location: Location,
    pub overridden: bool,
}

/// Everything the target checks need to know about one candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetFacts {
    pub id: EntityId,
    pub kind: EntityKind,
    pub location: Location,
    pub alive: bool,
    pub flags: Option<ActorFlags>,
    pub undead: bool,
    pub owner: Option<EntityId>,
}

impl TargetFacts {
    /// Reads a candidate's facts from the world. `None` when it no longer exists.
    pub fn observe(
        env: &Env<'_>,
        registry: &TargetRegistry,
        ability: AbilityKind,
        id: EntityId,
    ) -> Option<Self> {
        let world = env.world();
        Some(Self {
            id,
            kind: world.kind(id)?,
            location: world.location(id)?,
            alive: world.is_alive(id),
            flags: env.actors().flags(id),
            undead: world.is_undead(id),
            owner: registry.owner_of(ability, id),
        })
    }
}

/// Full eligibility check for one candidate target.
///
/// An overridden acquirer skips the undead and cross-bending restrictions.
/// `region_protected` is only called once every other check has passed.
pub fn target_eligibility(
    rules: &GatingRules,
    exempt: &HashSet<EntityKind>,
    acquirer: &Acquirer,
    target: &TargetFacts,
    region_protected: impl FnOnce(&Location) -> bool,
) -> Gate {
    self_target(acquirer.id, target.id)?;
    alive(target.alive)?;
    same_world(&acquirer.location, &target.location)?;
    living(target.kind)?;
    bloodless(exempt, target.kind)?;
    target_unbendable(target.flags)?;
    target_override(target.flags)?;
    if !acquirer.overridden {
        undead(rules, target.undead)?;
        cross_bending(rules, target.flags)?;
    }
    foreign_controller(rules, acquirer, target.owner)?;
    region(region_protected(&target.location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Vec3, WorldId};

    fn rules() -> GatingRules {
        GatingRules {
            night_only: true,
            full_moon_only: true,
            undead_allowed: false,
            cross_bending: false,
        }
    }

    fn here() -> Location {
        Location::new(WorldId::OVERWORLD, Vec3::ZERO)
    }

    fn acquirer(overridden: bool) -> Acquirer {
        Acquirer {
            id: EntityId(1),
            location: here(),
            overridden,
        }
    }

    fn candidate(kind: EntityKind) -> TargetFacts {
        TargetFacts {
            id: EntityId(2),
            kind,
            location: here(),
            alive: true,
            flags: None,
            undead: kind.is_undead(),
            owner: None,
        }
    }

    #[test]
    fn time_restrictions_respect_bypass_flags() {
        let rules = rules();
        assert_eq!(
            time_of_day(&rules, false, ActorFlags::empty()),
            Err(DenyReason::NotNight)
        );
        assert_eq!(time_of_day(&rules, false, ActorFlags::BLOODBEND_ANYTIME), Ok(()));
        assert_eq!(full_moon(&rules, false, ActorFlags::OVERRIDE), Ok(()));
        assert_eq!(
            full_moon(&rules, false, ActorFlags::SNEAKING),
            Err(DenyReason::NotFullMoon)
        );
        let relaxed = GatingRules {
            night_only: false,
            ..rules
        };
        assert_eq!(time_of_day(&relaxed, false, ActorFlags::empty()), Ok(()));
    }

    #[test]
    fn cheap_checks_run_before_region_query() {
        let mut queried = false;
        let mut target = candidate(EntityKind::Cow);
        target.id = EntityId(1);

        let gate = target_eligibility(&rules(), &HashSet::new(), &acquirer(false), &target, |_| {
            queried = true;
            true
        });

        assert_eq!(gate, Err(DenyReason::SelfTarget));
        assert!(!queried);
    }

    #[test]
    fn override_acquirer_skips_undead_and_cross_bending() {
        let exempt = HashSet::new();
        let zombie = candidate(EntityKind::Zombie);
        assert_eq!(
            target_eligibility(&rules(), &exempt, &acquirer(false), &zombie, |_| false),
            Err(DenyReason::UndeadImmune)
        );
        assert_eq!(
            target_eligibility(&rules(), &exempt, &acquirer(true), &zombie, |_| false),
            Ok(())
        );

        let mut bender = candidate(EntityKind::Player);
        bender.flags = Some(ActorFlags::BLOODBENDER);
        assert_eq!(
            target_eligibility(&rules(), &exempt, &acquirer(false), &bender, |_| false),
            Err(DenyReason::TargetIsBloodbender)
        );
    }

    #[test]
    fn overridden_and_unbendable_targets_are_always_excluded() {
        let exempt = HashSet::new();
        let mut target = candidate(EntityKind::Player);
        target.flags = Some(ActorFlags::OVERRIDE);
        assert_eq!(
            target_eligibility(&rules(), &exempt, &acquirer(true), &target, |_| false),
            Err(DenyReason::TargetOverridden)
        );
        target.flags = Some(ActorFlags::UNBENDABLE);
        assert_eq!(
            target_eligibility(&rules(), &exempt, &acquirer(true), &target, |_| false),
            Err(DenyReason::TargetUnbendable)
        );
    }

    #[test]
    fn foreign_controller_needs_override_and_cross_bending() {
        let owned = Some(EntityId(9));
        assert_eq!(
            foreign_controller(&rules(), &acquirer(true), owned),
            Err(DenyReason::ForeignController)
        );
        let permissive = GatingRules {
            cross_bending: true,
            ..rules()
        };
        assert_eq!(foreign_controller(&permissive, &acquirer(true), owned), Ok(()));
        assert_eq!(
            foreign_controller(&permissive, &acquirer(false), owned),
            Err(DenyReason::ForeignController)
        );
        assert_eq!(foreign_controller(&rules(), &acquirer(false), Some(EntityId(1))), Ok(()));
    }

    #[test]
    fn bloodless_and_decorative_kinds() {
        let exempt: HashSet<_> = [EntityKind::Skeleton].into_iter().collect();
        assert_eq!(bloodless(&exempt, EntityKind::Skeleton), Err(DenyReason::Bloodless));
        assert_eq!(living(EntityKind::ArmorStand), Err(DenyReason::Decorative));
        assert_eq!(living(EntityKind::Arrow), Err(DenyReason::NotLiving));
        assert_eq!(DenyReason::Bloodless.code(), "BLOODLESS");
    }
}
