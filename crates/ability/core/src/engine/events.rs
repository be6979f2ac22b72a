use crate::ability::{AbilityKind, AcquisitionMode, InstanceId, TerminationCause};
use crate::directory::InstanceKey;
use crate::gating::DenyReason;
use crate::registry::TargetEntry;
use crate::state::{EntityId, Millis};

/// Lifecycle events journaled by the engine, drained by the runtime after each call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityEvent {
    Activated {
        instance: InstanceId,
        actor: EntityId,
        kind: AbilityKind,
        mode: AcquisitionMode,
        targets: Vec<EntityId>,
    },
    Rejected {
        actor: EntityId,
        kind: AbilityKind,
        reason: DenyReason,
    },
    /// A second activation switched the running instance off.
    Deactivated {
        actor: EntityId,
        kind: AbilityKind,
    },
    TargetAcquired {
        kind: AbilityKind,
        target: EntityId,
        controller: EntityId,
    },
    TargetReleased {
        kind: AbilityKind,
        target: EntityId,
        controller: EntityId,
    },
    Terminated {
        instance: InstanceId,
        actor: EntityId,
        kind: AbilityKind,
        cause: TerminationCause,
        cooldown_until: Option<Millis>,
    },
}

/// Result of an activation request.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationOutcome {
    Started {
        instance: InstanceId,
        mode: AcquisitionMode,
        targets: Vec<EntityId>,
    },
    /// The actor already had a live instance; it was terminated instead.
    Deactivated,
    /// Gating refused the activation. Nothing was written.
    Rejected(DenyReason),
}

impl ActivationOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

/// Summary of one scheduler pass.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    pub now: Millis,
    /// Instances still channeling after the pass.
    pub progressed: usize,
    pub terminated: Vec<(InstanceKey, TerminationCause)>,
}

/// What a config reload threw away.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReloadReport {
    pub cleared: Vec<InstanceKey>,
    /// Registry entries whose controlling instance was cleared. Released by the reload.
    pub orphans: Vec<TargetEntry>,
}
