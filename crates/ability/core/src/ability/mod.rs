//! The channel-ability lifecycle.
//!
//! Every ability shares one state machine ([`LifecycleState`]); only the
//! activation and targeting policy differs per variant. Variants form the
//! closed [`Ability`] enum and [`AbilityInstance`] drives whichever one it
//! holds through the lifecycle.
mod bloodbending;
mod instance;
mod targeting;

use std::collections::HashSet;

pub use bloodbending::{Bloodbending, pull_force, release_impulse};
pub use instance::{AbilityInstance, InstanceId};
pub use targeting::probe_line;

use crate::engine::AbilityEvent;
use crate::env::{EffectSink, Env};
use crate::error::AbilityError;
use crate::gating::DenyReason;
use crate::registry::TargetRegistry;
use crate::state::{EntityId, EntityKind, Millis, Vec3};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityKind {
    Bloodbending,
}

impl AbilityKind {
    pub const ALL: [Self; 1] = [Self::Bloodbending];
}

/// How an instance picks its targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AcquisitionMode {
    /// Override-state actors hold every eligible entity in range, rescanned each tick.
    Area,
    /// A single target picked by probing along the actor's aim.
    Line,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifecycleState {
    Activating,
    Channeling,
    Releasing,
    Expiring,
    Interrupted,
    Terminated,
}

impl LifecycleState {
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Activating | Self::Channeling)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationCause {
    /// The actor let go of the maintain gesture.
    Released,
    /// Explicit release with force.
    Launched,
    /// The configured duration ran out.
    Expired,
    /// A gating predicate stopped holding mid-channel.
    Interrupted(DenyReason),
    /// Line mode lost its only target.
    TargetLost,
    /// The actor activated the ability again while it was running.
    Toggled,
    Disconnected,
    /// The step returned an error.
    Faulted,
}

impl TerminationCause {
    /// Normal terminations always earn a cooldown.
    pub const fn is_normal(&self) -> bool {
        matches!(self, Self::Released | Self::Launched | Self::Expired)
    }

    /// State the instance passes through before it is terminated.
    pub const fn exit_state(&self) -> LifecycleState {
        match self {
            Self::Released | Self::Launched => LifecycleState::Releasing,
            Self::Expired => LifecycleState::Expiring,
            _ => LifecycleState::Interrupted,
        }
    }
}

/// Borrowed services one activation or tick step works with.
pub(crate) struct StepContext<'a, 'b> {
    pub env: Env<'a>,
    pub registry: &'b TargetRegistry,
    pub exemptions: &'b HashSet<EntityKind>,
    pub effects: &'b mut dyn EffectSink,
    pub journal: &'b mut Vec<AbilityEvent>,
    pub actor: EntityId,
    pub started_at: Millis,
    pub now: Millis,
}

impl StepContext<'_, '_> {
    pub fn elapsed(&self) -> Millis {
        self.now.saturating_sub(self.started_at)
    }
}

/// Closed set of ability variants.
#[derive(Clone, Debug, PartialEq)]
pub enum Ability {
    Bloodbending(Bloodbending),
}

impl Ability {
    /// Reads the configuration snapshot for a new instance of `kind`.
    pub(crate) fn configure(
        kind: AbilityKind,
        env: &Env<'_>,
        actor: EntityId,
    ) -> Result<Self, DenyReason> {
        match kind {
            AbilityKind::Bloodbending => Bloodbending::configure(env, actor).map(Self::Bloodbending),
        }
    }

    pub fn kind(&self) -> AbilityKind {
        match self {
            Self::Bloodbending(_) => AbilityKind::Bloodbending,
        }
    }

    pub fn mode(&self) -> AcquisitionMode {
        match self {
            Self::Bloodbending(ability) => ability.mode(),
        }
    }

    /// Force currently applied to held targets.
    pub fn force(&self) -> Vec3 {
        match self {
            Self::Bloodbending(ability) => ability.force(),
        }
    }

    pub(crate) fn activate(&mut self, ctx: &mut StepContext<'_, '_>) -> Result<Vec<EntityId>, DenyReason> {
        match self {
            Self::Bloodbending(ability) => ability.activate(ctx),
        }
    }

    pub(crate) fn channel(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<Option<TerminationCause>, AbilityError> {
        match self {
            Self::Bloodbending(ability) => ability.channel(ctx),
        }
    }

    pub(crate) fn release(&mut self, ctx: &mut StepContext<'_, '_>) -> Result<(), AbilityError> {
        match self {
            Self::Bloodbending(ability) => ability.release(ctx),
        }
    }

    /// Cooldown to write for a termination, if any.
    pub fn cooldown_after(
        &self,
        cause: TerminationCause,
        elapsed: Millis,
        actor_overridden: bool,
    ) -> Option<Millis> {
        match self {
            Self::Bloodbending(ability) => ability.cooldown_after(cause, elapsed, actor_overridden),
        }
    }
}
