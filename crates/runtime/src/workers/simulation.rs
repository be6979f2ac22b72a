//! Simulation worker that owns the [`AbilityEngine`] and the host world.
//!
//! Receives commands from [`RuntimeHandle`], runs them against the engine on
//! its own thread, and publishes lifecycle events to the [`EventBus`]. Every
//! tick drains the inbound queue first, then steps every live instance once.
//!
//! [`RuntimeHandle`]: crate::api::RuntimeHandle
use std::collections::HashMap;
use std::time::Duration;

use ability_core::{
    AbilityEngine, AbilityKind, ActivationOutcome, ConfigSnapshot, EffectBuffer, EntityId, Env,
    Millis, ReloadReport, Tick, TickReport, Vec3, WorldUpdate,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::resolver::{Inbound, Resolver};
use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, TickEvent};
use crate::host::WorldHost;

type ResolveReply = oneshot::Sender<Result<Option<EntityId>>>;

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Activation input (toggles an already running instance off).
    Activate {
        actor: EntityId,
        kind: AbilityKind,
        reply: oneshot::Sender<ActivationOutcome>,
    },
    /// Release with force.
    Launch {
        actor: EntityId,
        kind: AbilityKind,
        reply: oneshot::Sender<bool>,
    },
    /// The actor left; every instance it owns is terminated.
    Disconnect {
        actor: EntityId,
        reply: oneshot::Sender<usize>,
    },
    /// Host input applied to the world before the next tick.
    Input {
        update: WorldUpdate,
        reply: oneshot::Sender<bool>,
    },
    /// Runs one tick immediately.
    Step { reply: oneshot::Sender<TickReport> },
    ForceVector {
        entity: EntityId,
        reply: oneshot::Sender<Option<Vec3>>,
    },
    CooldownRemaining {
        actor: EntityId,
        kind: AbilityKind,
        reply: oneshot::Sender<Millis>,
    },
    /// Clears every instance, optionally swapping in a new configuration.
    ReloadAll {
        config: Option<ConfigSnapshot>,
        reply: oneshot::Sender<ReloadReport>,
    },
    Resolve { name: String, reply: ResolveReply },
    Shutdown,
}

/// Tick scheduling parameters for the worker.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Clock {
    pub tick_millis: Millis,
    pub auto_tick: bool,
}

/// Background task that processes ability commands and drives ticks.
pub struct SimulationWorker {
    engine: AbilityEngine,
    host: Box<dyn WorldHost>,
    config: ConfigSnapshot,
    effects: EffectBuffer,
    command_rx: mpsc::Receiver<Command>,
    inbound_rx: mpsc::Receiver<Inbound>,
    resolver: Resolver,
    event_bus: EventBus,
    /// Callers waiting on a background lookup, keyed by lowercased name.
    pending: HashMap<String, Vec<(String, ResolveReply)>>,
    clock: Clock,
    tick: Tick,
}

impl SimulationWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        engine: AbilityEngine,
        host: Box<dyn WorldHost>,
        config: ConfigSnapshot,
        command_rx: mpsc::Receiver<Command>,
        inbound_rx: mpsc::Receiver<Inbound>,
        resolver: Resolver,
        event_bus: EventBus,
        clock: Clock,
    ) -> Self {
        Self {
            engine,
            host,
            config,
            effects: EffectBuffer::new(),
            command_rx,
            inbound_rx,
            resolver,
            event_bus,
            pending: HashMap::new(),
            clock,
            tick: 0,
        }
    }

    fn now(&self) -> Millis {
        self.tick.saturating_mul(self.clock.tick_millis)
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        info!(
            target: "runtime::worker",
            tick_millis = self.clock.tick_millis,
            auto_tick = self.clock.auto_tick,
            "simulation worker started"
        );

        let mut interval = tokio::time::interval(Duration::from_millis(self.clock.tick_millis.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                _ = interval.tick(), if self.clock.auto_tick => {
                    self.step();
                }
            }
        }

        info!(target: "runtime::worker", tick = self.tick, "simulation worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Activate { actor, kind, reply } => {
                let outcome = self.activate(actor, kind);
                if reply.send(outcome).is_err() {
                    debug!("Activate reply channel closed (caller dropped)");
                }
            }
            Command::Launch { actor, kind, reply } => {
                let launched = self.launch(actor, kind);
                if reply.send(launched).is_err() {
                    debug!("Launch reply channel closed (caller dropped)");
                }
            }
            Command::Disconnect { actor, reply } => {
                let count = self.disconnect(actor);
                if reply.send(count).is_err() {
                    debug!("Disconnect reply channel closed (caller dropped)");
                }
            }
            Command::Input { update, reply } => {
                let applied = self.host.apply(update);
                if reply.send(applied).is_err() {
                    debug!("Input reply channel closed (caller dropped)");
                }
            }
            Command::Step { reply } => {
                let report = self.step();
                if reply.send(report).is_err() {
                    debug!("Step reply channel closed (caller dropped)");
                }
            }
            Command::ForceVector { entity, reply } => {
                if reply.send(self.engine.current_force_vector(entity)).is_err() {
                    debug!("ForceVector reply channel closed (caller dropped)");
                }
            }
            Command::CooldownRemaining { actor, kind, reply } => {
                let now = self.now();
                if reply
                    .send(self.engine.cooldown_remaining(actor, kind, now))
                    .is_err()
                {
                    debug!("CooldownRemaining reply channel closed (caller dropped)");
                }
            }
            Command::ReloadAll { config, reply } => {
                let report = self.reload_all(config);
                if reply.send(report).is_err() {
                    debug!("ReloadAll reply channel closed (caller dropped)");
                }
            }
            Command::Resolve { name, reply } => self.resolve(name, reply),
            Command::Shutdown => {}
        }
    }

    fn activate(&mut self, actor: EntityId, kind: AbilityKind) -> ActivationOutcome {
        let now = self.now();
        let outcome = {
            let env = Env::new(self.host.world(), self.host.actors(), &self.config);
            self.engine
                .activate(&env, &mut self.effects, actor, kind, now)
        };
        self.flush();
        outcome
    }

    fn launch(&mut self, actor: EntityId, kind: AbilityKind) -> bool {
        let now = self.now();
        let launched = {
            let env = Env::new(self.host.world(), self.host.actors(), &self.config);
            self.engine.launch(&env, &mut self.effects, actor, kind, now)
        };
        self.flush();
        launched
    }

    fn disconnect(&mut self, actor: EntityId) -> usize {
        let now = self.now();
        let count = {
            let env = Env::new(self.host.world(), self.host.actors(), &self.config);
            self.engine.disconnect(&env, &mut self.effects, actor, now)
        };
        self.flush();
        count
    }

    /// One tick: apply finished lookups, then step every instance.
    fn step(&mut self) -> TickReport {
        self.tick += 1;
        self.drain_inbound();

        let now = self.now();
        let report = {
            let env = Env::new(self.host.world(), self.host.actors(), &self.config);
            self.engine.progress_all(&env, &mut self.effects, now)
        };
        self.flush();

        self.event_bus.publish(Event::Tick(TickEvent {
            tick: self.tick,
            now,
            live: report.progressed,
            terminated: report.terminated.len(),
        }));
        report
    }

    fn reload_all(&mut self, config: Option<ConfigSnapshot>) -> ReloadReport {
        if let Some(config) = config {
            self.config = config;
        }
        let report = self.engine.reload_all();
        self.publish_journal();
        report
    }

    /// Applies buffered effects to the host and publishes journaled events.
    fn flush(&mut self) {
        self.effects.flush_into(self.host.effects());
        self.publish_journal();
    }

    fn publish_journal(&mut self) {
        for event in self.engine.drain_events() {
            self.event_bus.publish(Event::Ability(event));
        }
    }

    // ========================================================================
    // Resolver
    // ========================================================================

    /// Only entities live in the host world are answered synchronously.
    /// Every other name goes to the directory; concurrent requests for the
    /// same name share one lookup.
    fn resolve(&mut self, name: String, reply: ResolveReply) {
        let local = self
            .host
            .world()
            .find_by_name(&name)
            .filter(|&entity| self.host.world().is_alive(entity));
        if local.is_some() || !self.resolver.has_directory() {
            if reply.send(Ok(local)).is_err() {
                debug!("Resolve reply channel closed (caller dropped)");
            }
            return;
        }

        let key = name.to_ascii_lowercase();
        let waiters = self.pending.entry(key).or_default();
        let first = waiters.is_empty();
        waiters.push((name.clone(), reply));
        if first {
            debug!(target: "runtime::worker", %name, "resolving off-thread");
            self.resolver.spawn_lookup(name);
        }
    }

    fn drain_inbound(&mut self) {
        while let Ok(message) = self.inbound_rx.try_recv() {
            match message {
                Inbound::Resolved { name, result } => self.complete_lookup(name, result),
            }
        }
    }

    fn complete_lookup(
        &mut self,
        name: String,
        result: std::result::Result<Option<EntityId>, crate::api::LookupError>,
    ) {
        let key = name.to_ascii_lowercase();
        if let Err(error) = &result {
            warn!(target: "runtime::worker", %name, %error, "entity lookup failed");
        }

        for (requested, reply) in self.pending.remove(&key).unwrap_or_default() {
            let answer = result
                .clone()
                .map_err(|source| RuntimeError::LookupFailed {
                    name: requested,
                    source,
                });
            if reply.send(answer).is_err() {
                debug!(target: "runtime::worker", name = %key, "resolve waiter dropped");
            }
        }
    }
}
