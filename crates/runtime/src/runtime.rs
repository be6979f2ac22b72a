//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation thread, wires up command/event channels,
//! and exposes a builder-based API for clients to drive the simulation.

use std::sync::Arc;
use std::thread;

use ability_core::{AbilityEngine, AbilityServices, ConfigSnapshot, Millis};
use tokio::sync::mpsc;
use tracing::error;

use crate::api::{EntityDirectory, Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::host::WorldHost;
use crate::workers::{Clock, Command, Inbound, Resolver, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Logical milliseconds per tick; also the auto-tick period.
    pub tick_millis: Millis,
    /// Drive ticks from a timer. When off, ticks only run on
    /// [`RuntimeHandle::step`].
    pub auto_tick: bool,
    pub command_buffer_size: usize,
    pub inbound_buffer_size: usize,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_millis: 50,
            auto_tick: true,
            command_buffer_size: 32,
            inbound_buffer_size: 64,
            event_buffer_size: 100,
        }
    }
}

/// Main runtime that drives the ability simulation
///
/// Design: Runtime owns the simulation thread.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_thread: thread::JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Stops the simulation thread and waits for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.request_shutdown().await;
        drop(self.handle);

        let sim_thread = self.sim_thread;
        tokio::task::spawn_blocking(move || sim_thread.join())
            .await
            .map_err(RuntimeError::WorkerJoin)?
            .map_err(|_| RuntimeError::WorkerPanicked)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    world: Option<Box<dyn WorldHost>>,
    ability_config: ConfigSnapshot,
    services: AbilityServices,
    directory: Option<Arc<dyn EntityDirectory>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            world: None,
            ability_config: ConfigSnapshot::new(),
            services: AbilityServices::default(),
            directory: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the world the simulation thread owns (required)
    pub fn world(mut self, world: impl WorldHost) -> Self {
        self.world = Some(Box::new(world));
        self
    }

    /// Ability configuration read at every activation
    pub fn ability_config(mut self, config: ConfigSnapshot) -> Self {
        self.ability_config = config;
        self
    }

    /// Share an existing registry and exemption set
    pub fn services(mut self, services: AbilityServices) -> Self {
        self.services = services;
        self
    }

    /// Slow path for [`RuntimeHandle::resolve`]
    pub fn directory(mut self, directory: impl EntityDirectory + 'static) -> Self {
        self.directory = Some(Arc::new(directory));
        self
    }

    /// Build the runtime and start the simulation thread.
    ///
    /// Background lookups run on the tokio runtime this is called from.
    pub async fn build(self) -> Result<Runtime> {
        let world = self.world.ok_or(RuntimeError::MissingWorld)?;
        let pool = tokio::runtime::Handle::try_current()
            .map_err(|_| RuntimeError::MissingAsyncRuntime)?;

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>(self.config.inbound_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = RuntimeHandle::new(command_tx, event_bus.clone(), self.services.clone());

        let worker = SimulationWorker::new(
            AbilityEngine::new(self.services),
            world,
            self.ability_config,
            command_rx,
            inbound_rx,
            Resolver::new(self.directory, pool, inbound_tx),
            event_bus,
            Clock {
                tick_millis: self.config.tick_millis,
                auto_tick: self.config.auto_tick,
            },
        );

        let sim_thread = thread::Builder::new()
            .name("ability-sim".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(target: "runtime", error = %e, "failed to start simulation runtime");
                        return;
                    }
                };
                rt.block_on(worker.run());
            })
            .map_err(RuntimeError::WorkerSpawn)?;

        Ok(Runtime { handle, sim_thread })
    }
}
