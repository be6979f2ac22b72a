//! Ability lifecycle rules and shared targeting state.
//!
//! `ability-core` defines the channel-ability state machine, the shared
//! [`TargetRegistry`], the [`CooldownLedger`], gating predicates and the
//! [`AbilityEngine`] that drives every live instance once per tick. Nothing in
//! this crate blocks or spawns: the runtime crate owns threads and calls into
//! the engine from its single simulation thread.
pub mod ability;
pub mod config;
pub mod cooldown;
pub mod directory;
pub mod engine;
pub mod env;
pub mod error;
pub mod exemption;
pub mod gating;
pub mod registry;
pub mod state;

pub use ability::{
    Ability, AbilityInstance, AbilityKind, AcquisitionMode, Bloodbending, InstanceId,
    LifecycleState, TerminationCause, probe_line, pull_force, release_impulse,
};
pub use config::{BloodbendingConfig, ConfigWarning, GatingRules};
pub use cooldown::CooldownLedger;
pub use directory::{AlreadyActive, InstanceDirectory, InstanceKey};
pub use engine::{
    AbilityEngine, AbilityEvent, AbilityServices, ActivationOutcome, ReloadReport, TickReport,
};
pub use env::{
    ActorOracle, ConfigOracle, ConfigSnapshot, ConfigValue, Effect, EffectBuffer, EffectSink, Env,
    EntityRecord, ProtectedRegion, SnapshotWorld, StatusEffect, StatusEffectKind,
    WorldConditions, WorldOracle, WorldUpdate,
};
pub use error::{AbilityError, CoreError, ErrorSeverity};
pub use exemption::{ExemptionReport, ExemptionSet};
pub use gating::{DenyReason, Gate};
pub use registry::{AcquireOutcome, TargetEntry, TargetRegistry};
pub use state::{ActorFlags, EntityId, EntityKind, Location, Millis, Tick, Vec3, WorldId};
