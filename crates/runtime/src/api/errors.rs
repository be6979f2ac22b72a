//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and background lookups so clients
//! can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("failed to start simulation thread")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("simulation thread panicked")]
    WorkerPanicked,

    #[error("runtime requires a world host before building")]
    MissingWorld,

    #[error("runtime must be built from within a tokio runtime")]
    MissingAsyncRuntime,

    #[error("lookup of '{name}' failed")]
    LookupFailed {
        name: String,
        #[source]
        source: LookupError,
    },
}

/// Failure of a background entity lookup.
///
/// Cloned once per waiting caller when several resolves share one lookup.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("directory error: {0}")]
    Directory(String),

    #[error("lookup task aborted: {0}")]
    Task(String),
}
