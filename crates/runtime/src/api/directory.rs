//! Slow-path entity lookups that run off the simulation thread.
use std::sync::Arc;

use ability_core::EntityId;
use async_trait::async_trait;

use super::errors::LookupError;

/// Resolves entity names the host world does not know yet.
///
/// Lookups run on the background pool. Their results are handed back to the
/// simulation worker and only become visible at the next tick boundary.
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<EntityId>, LookupError>;
}

/// Adapts a synchronous (possibly blocking) lookup function.
///
/// Each call runs on tokio's blocking pool via `spawn_blocking`.
pub struct BlockingDirectory<F> {
    lookup: Arc<F>,
}

impl<F> BlockingDirectory<F>
where
    F: Fn(&str) -> Result<Option<EntityId>, LookupError> + Send + Sync + 'static,
{
    pub fn new(lookup: F) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

#[async_trait]
impl<F> EntityDirectory for BlockingDirectory<F>
where
    F: Fn(&str) -> Result<Option<EntityId>, LookupError> + Send + Sync + 'static,
{
    async fn lookup(&self, name: &str) -> Result<Option<EntityId>, LookupError> {
        let lookup = Arc::clone(&self.lookup);
        let name = name.to_owned();
        tokio::task::spawn_blocking(move || lookup(&name))
            .await
            .map_err(|e| LookupError::Task(e.to_string()))?
    }
}
