use std::fmt;

use super::{Ability, AbilityKind, AcquisitionMode, LifecycleState, StepContext, TerminationCause};
use crate::error::AbilityError;
use crate::gating::DenyReason;
use crate::state::{EntityId, Millis};

/// Monotonic id assigned by the engine to every instance it creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// One run of an ability bound to one actor.
///
/// Created in `Activating`, moved to `Channeling` by a successful
/// [`activate`](Self::activate), stepped once per tick until a termination
/// cause appears, then concluded. The engine owns every instance; nothing
/// outside the simulation thread ever sees one mutably.
#[derive(Clone, Debug, PartialEq)]
pub struct AbilityInstance {
    id: InstanceId,
    actor: EntityId,
    started_at: Millis,
    state: LifecycleState,
    ability: Ability,
}

impl AbilityInstance {
    pub(crate) fn new(id: InstanceId, actor: EntityId, now: Millis, ability: Ability) -> Self {
        Self {
            id,
            actor,
            started_at: now,
            state: LifecycleState::Activating,
            ability,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    pub fn kind(&self) -> AbilityKind {
        self.ability.kind()
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.ability.mode()
    }

    pub fn started_at(&self) -> Millis {
        self.started_at
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn ability(&self) -> &Ability {
        &self.ability
    }

    /// Runs the gating and acquisition step. On success the instance is channeling.
    pub(crate) fn activate(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<Vec<EntityId>, DenyReason> {
        debug_assert_eq!(self.state, LifecycleState::Activating);
        let targets = self.ability.activate(ctx)?;
        self.state = LifecycleState::Channeling;
        Ok(targets)
    }

    /// One channeling step. Returns the cause once the instance has terminated.
    pub(crate) fn tick(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<Option<TerminationCause>, AbilityError> {
        if self.state != LifecycleState::Channeling {
            return Err(AbilityError::UnexpectedState {
                actor: self.actor,
                state: self.state,
            });
        }
        match self.ability.channel(ctx)? {
            None => Ok(None),
            Some(cause) => self.conclude(ctx, cause).map(Some),
        }
    }

    /// Moves through the exit state for `cause` and applies its final effect.
    ///
    /// Only `Releasing` has one: the outward impulse on every held target.
    pub(crate) fn conclude(
        &mut self,
        ctx: &mut StepContext<'_, '_>,
        cause: TerminationCause,
    ) -> Result<TerminationCause, AbilityError> {
        self.state = cause.exit_state();
        let result = match self.state {
            LifecycleState::Releasing => self.ability.release(ctx),
            _ => Ok(()),
        };
        self.state = LifecycleState::Terminated;
        result.map(|()| cause)
    }
}
