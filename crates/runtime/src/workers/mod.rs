//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker owns the engine and the host world; the resolver
//! runs slow entity lookups on the background pool and reports back through
//! the worker's inbound queue.

mod resolver;
mod simulation;

pub(crate) use resolver::{Inbound, Resolver};
pub use simulation::{Command, SimulationWorker};
pub(crate) use simulation::Clock;
