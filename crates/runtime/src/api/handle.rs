//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving abilities or streaming events from specific topics. Registry and
//! exemption queries read the shared services directly and never wait on the
//! simulation thread.
use tokio::sync::{broadcast, mpsc, oneshot};

use ability_core::{
    AbilityKind, AbilityServices, ActivationOutcome, ConfigSnapshot, EntityId, ExemptionReport,
    Millis, ReloadReport, TickReport, Vec3, WorldUpdate,
};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    services: AbilityServices,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        services: AbilityServices,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            services,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Activation input for `actor`. A second activation toggles the
    /// running instance off.
    pub async fn activate(&self, actor: EntityId, kind: AbilityKind) -> Result<ActivationOutcome> {
        self.request(|reply| Command::Activate { actor, kind, reply })
            .await
    }

    /// Releases the running instance with force. `false` when nothing was running.
    pub async fn launch(&self, actor: EntityId, kind: AbilityKind) -> Result<bool> {
        self.request(|reply| Command::Launch { actor, kind, reply })
            .await
    }

    /// Terminates every instance the actor owns.
    pub async fn disconnect(&self, actor: EntityId) -> Result<usize> {
        self.request(|reply| Command::Disconnect { actor, reply })
            .await
    }

    /// Applies a host input to the world owned by the simulation thread.
    pub async fn input(&self, update: WorldUpdate) -> Result<bool> {
        self.request(|reply| Command::Input { update, reply })
            .await
    }

    /// Runs one tick now, regardless of the auto-tick interval.
    pub async fn step(&self) -> Result<TickReport> {
        self.request(|reply| Command::Step { reply }).await
    }

    pub async fn current_force_vector(&self, entity: EntityId) -> Result<Option<Vec3>> {
        self.request(|reply| Command::ForceVector { entity, reply })
            .await
    }

    pub async fn cooldown_remaining(&self, actor: EntityId, kind: AbilityKind) -> Result<Millis> {
        self.request(|reply| Command::CooldownRemaining { actor, kind, reply })
            .await
    }

    /// Clears every live instance without cleanup effects. With `Some(config)`
    /// the new configuration applies to every later activation.
    pub async fn reload_all(&self, config: Option<ConfigSnapshot>) -> Result<ReloadReport> {
        self.request(|reply| Command::ReloadAll { config, reply })
            .await
    }

    /// Resolves an entity by name.
    ///
    /// Names of entities live in the world are answered immediately.
    /// Anything else is looked up off-thread on every call and answered
    /// after the next tick boundary.
    pub async fn resolve(&self, name: impl Into<String>) -> Result<Option<EntityId>> {
        let name = name.into();
        self.request(|reply| Command::Resolve { name, reply })
            .await?
    }

    /// Atomically replaces the bloodless set. Malformed entries are skipped.
    pub fn reload_exemption_set<S: AsRef<str>>(&self, entries: &[S]) -> ExemptionReport {
        self.services.exemptions.reload(entries)
    }

    pub fn is_targeted(&self, entity: EntityId) -> bool {
        self.services.registry.is_targeted(entity)
    }

    pub fn owner_of(&self, entity: EntityId) -> Option<EntityId> {
        AbilityKind::ALL
            .iter()
            .find_map(|kind| self.services.registry.owner_of(*kind, entity))
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Ability` - Activations, rejections, target changes, terminations
    /// - `Topic::Tick` - One summary per scheduler pass
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Asks the worker to stop. Commands queued behind it are dropped.
    pub(crate) async fn request_shutdown(&self) {
        if self.command_tx.send(Command::Shutdown).await.is_err() {
            tracing::debug!("simulation worker already stopped");
        }
    }
}
