//! Common error infrastructure for ability-core.
//!
//! Gating failures are not errors: they are [`DenyReason`](crate::DenyReason)
//! values returned inside an activation outcome. The types here cover the
//! cases where a single instance cannot make progress at all. The engine logs
//! them, terminates the affected instance and carries on with the pass.

use crate::ability::LifecycleState;
use crate::state::EntityId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: temporary condition, the next tick may succeed
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistency that requires investigation
/// - **Fatal**: unrecoverable, the process cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all ability-core errors.
///
/// All error enums in the crate implement this so callers can classify them
/// without matching on concrete variants.
pub trait CoreError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Failure inside one instance's activation or progression step.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityError {
    /// The actor is no longer present in the world.
    #[error("actor {0} is not present in the world")]
    ActorMissing(EntityId),

    /// The host could not report where the actor is looking.
    #[error("aim direction for {0} is unavailable")]
    AimUnavailable(EntityId),

    /// The instance was stepped from a state that does not allow it.
    #[error("instance for {actor} cannot progress from {state:?}")]
    UnexpectedState {
        actor: EntityId,
        state: LifecycleState,
    },
}

impl CoreError for AbilityError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActorMissing(_) | Self::AimUnavailable(_) => ErrorSeverity::Recoverable,
            Self::UnexpectedState { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActorMissing(_) => "ABILITY_ACTOR_MISSING",
            Self::AimUnavailable(_) => "ABILITY_AIM_UNAVAILABLE",
            Self::UnexpectedState { .. } => "ABILITY_UNEXPECTED_STATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let missing = AbilityError::ActorMissing(EntityId(4));
        assert!(missing.severity().is_recoverable());
        assert_eq!(missing.error_code(), "ABILITY_ACTOR_MISSING");
        assert_eq!(missing.to_string(), "actor #4 is not present in the world");

        let state = AbilityError::UnexpectedState {
            actor: EntityId(4),
            state: LifecycleState::Terminated,
        };
        assert!(state.severity().is_internal());
    }
}
