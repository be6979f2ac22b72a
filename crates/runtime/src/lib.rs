//! Runtime orchestration for the ability simulation.
//!
//! This crate wires the synchronous [`ability_core::AbilityEngine`] into a
//! tokio-based runtime. Consumers embed [`Runtime`] to drive ticks, subscribe
//! to events, and resolve entities through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`host`] adapts a host world to the engine's oracle traits
//! - [`workers`] keeps the simulation loop and resolver internal to the crate
pub mod api;
pub mod events;
pub mod host;
pub mod runtime;

mod workers;

pub use api::{
    BlockingDirectory, EntityDirectory, LookupError, Result, RuntimeError, RuntimeHandle,
};
pub use events::{Event, EventBus, TickEvent, Topic};
pub use host::WorldHost;
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
