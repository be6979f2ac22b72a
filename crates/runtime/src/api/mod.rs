//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration and workers.

pub mod directory;
pub mod errors;
pub mod handle;

pub use directory::{BlockingDirectory, EntityDirectory};
pub use errors::{LookupError, Result, RuntimeError};
pub use handle::RuntimeHandle;
