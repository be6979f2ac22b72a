//! Cross-thread entity resolution.
//!
//! The simulation worker asks the resolver for names it cannot answer
//! locally. The lookup runs on the background pool and posts an
//! [`Inbound::Resolved`] message; the worker applies it at the next tick
//! boundary.
use std::sync::Arc;

use ability_core::EntityId;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{EntityDirectory, LookupError};

/// Messages posted to the simulation worker from background tasks.
#[derive(Debug)]
pub(crate) enum Inbound {
    Resolved {
        name: String,
        result: Result<Option<EntityId>, LookupError>,
    },
}

pub(crate) struct Resolver {
    directory: Option<Arc<dyn EntityDirectory>>,
    pool: Handle,
    inbound_tx: mpsc::Sender<Inbound>,
}

impl Resolver {
    pub(crate) fn new(
        directory: Option<Arc<dyn EntityDirectory>>,
        pool: Handle,
        inbound_tx: mpsc::Sender<Inbound>,
    ) -> Self {
        Self {
            directory,
            pool,
            inbound_tx,
        }
    }

    /// Whether a slow path exists at all.
    pub(crate) fn has_directory(&self) -> bool {
        self.directory.is_some()
    }

    /// Starts a background lookup for `name`.
    ///
    /// The lookup itself runs in its own task so a panic inside the
    /// directory surfaces as a `JoinError` instead of losing the reply.
    pub(crate) fn spawn_lookup(&self, name: String) {
        let Some(directory) = self.directory.clone() else {
            return;
        };
        let inbound_tx = self.inbound_tx.clone();
        let pool = self.pool.clone();

        self.pool.spawn(async move {
            let query = name.clone();
            let result = match pool.spawn(async move { directory.lookup(&query).await }).await {
                Ok(result) => result,
                Err(error) => {
                    warn!(target: "runtime::resolver", %name, %error, "lookup task aborted");
                    Err(LookupError::Task(error.to_string()))
                }
            };
            if inbound_tx
                .send(Inbound::Resolved { name, result })
                .await
                .is_err()
            {
                debug!(target: "runtime::resolver", "simulation worker gone, lookup result dropped");
            }
        });
    }
}
