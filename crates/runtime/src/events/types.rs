//! Event types for different topics.

use ability_core::{Millis, Tick};
use serde::{Deserialize, Serialize};

/// Published after every scheduler pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvent {
    pub tick: Tick,
    /// Logical time of the pass.
    pub now: Millis,
    /// Instances still channeling after the pass.
    pub live: usize,
    pub terminated: usize,
}
