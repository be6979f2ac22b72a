//! Activation, per-tick progression and termination of every live instance.
//!
//! The [`AbilityEngine`] owns the [`InstanceDirectory`] and the
//! [`CooldownLedger`] and shares the [`TargetRegistry`] and [`ExemptionSet`]
//! through [`AbilityServices`]. It is a plain synchronous reducer: the caller
//! passes the world as an [`Env`] plus an [`EffectSink`] on every call, and
//! drains the journaled [`AbilityEvent`]s afterwards.
mod events;

pub use events::{AbilityEvent, ActivationOutcome, ReloadReport, TickReport};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ability::{
    Ability, AbilityInstance, AbilityKind, InstanceId, StepContext, TerminationCause,
};
use crate::cooldown::CooldownLedger;
use crate::directory::{AlreadyActive, InstanceDirectory, InstanceKey};
use crate::env::{EffectSink, Env};
use crate::error::{AbilityError, CoreError};
use crate::exemption::{ExemptionReport, ExemptionSet};
use crate::gating::DenyReason;
use crate::registry::TargetRegistry;
use crate::state::{EntityId, Millis, Vec3};

/// Process-wide services shared with readers on other threads.
#[derive(Clone, Debug, Default)]
pub struct AbilityServices {
    pub registry: Arc<TargetRegistry>,
    pub exemptions: Arc<ExemptionSet>,
}

impl AbilityServices {
    pub fn new(registry: Arc<TargetRegistry>, exemptions: Arc<ExemptionSet>) -> Self {
        Self {
            registry,
            exemptions,
        }
    }
}

#[derive(Debug)]
pub struct AbilityEngine {
    services: AbilityServices,
    directory: InstanceDirectory,
    cooldowns: CooldownLedger,
    journal: Vec<AbilityEvent>,
    next_instance: u64,
}

impl AbilityEngine {
    pub fn new(services: AbilityServices) -> Self {
        Self {
            services,
            directory: InstanceDirectory::new(),
            cooldowns: CooldownLedger::new(),
            journal: Vec::new(),
            next_instance: 1,
        }
    }

    pub fn services(&self) -> &AbilityServices {
        &self.services
    }

    pub fn directory(&self) -> &InstanceDirectory {
        &self.directory
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        &self.cooldowns
    }

    pub fn instance(&self, actor: EntityId, kind: AbilityKind) -> Option<&AbilityInstance> {
        self.directory.lookup(&InstanceKey::new(actor, kind))
    }

    /// Takes every event journaled since the last drain.
    pub fn drain_events(&mut self) -> Vec<AbilityEvent> {
        std::mem::take(&mut self.journal)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Handles an activation input.
    ///
    /// A live instance for the same actor and ability is terminated instead
    /// (toggle). Otherwise the cooldown is checked, the config snapshotted
    /// and the activation step run. Rejections leave no trace besides the
    /// journaled event.
    pub fn activate(
        &mut self,
        env: &Env<'_>,
        effects: &mut dyn EffectSink,
        actor: EntityId,
        kind: AbilityKind,
        now: Millis,
    ) -> ActivationOutcome {
        let key = InstanceKey::new(actor, kind);
        if let Err(AlreadyActive(existing)) = self.directory.try_activate(key) {
            self.conclude(env, effects, *existing, TerminationCause::Toggled, now);
            self.journal.push(AbilityEvent::Deactivated { actor, kind });
            return ActivationOutcome::Deactivated;
        }

        if !env.actors().can_ignore_own_cooldown(actor, kind)
            && self.cooldowns.is_cooling_down(actor, kind, now)
        {
            return self.reject(actor, kind, DenyReason::OnCooldown);
        }

        let ability = match Ability::configure(kind, env, actor) {
            Ok(ability) => ability,
            Err(reason) => return self.reject(actor, kind, reason),
        };
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let mut instance = AbilityInstance::new(id, actor, now, ability);

        let exemptions = self.services.exemptions.snapshot();
        let result = {
            let mut ctx = StepContext {
                env: *env,
                registry: &self.services.registry,
                exemptions: &exemptions,
                effects: &mut *effects,
                journal: &mut self.journal,
                actor,
                started_at: now,
                now,
            };
            instance.activate(&mut ctx)
        };

        match result {
            Ok(targets) => {
                let mode = instance.mode();
                info!(
                    target: "ability::engine",
                    %actor,
                    %kind,
                    ?mode,
                    targets = targets.len(),
                    "ability activated"
                );
                self.journal.push(AbilityEvent::Activated {
                    instance: id,
                    actor,
                    kind,
                    mode,
                    targets: targets.clone(),
                });
                self.directory.insert(instance);
                ActivationOutcome::Started {
                    instance: id,
                    mode,
                    targets,
                }
            }
            Err(reason) => self.reject(actor, kind, reason),
        }
    }

    /// Release with force. Returns `false` when nothing was running.
    pub fn launch(
        &mut self,
        env: &Env<'_>,
        effects: &mut dyn EffectSink,
        actor: EntityId,
        kind: AbilityKind,
        now: Millis,
    ) -> bool {
        self.terminate(env, effects, actor, kind, TerminationCause::Launched, now)
    }

    /// Ends the instance for `(actor, kind)` with `cause`, running the full cleanup.
    pub fn terminate(
        &mut self,
        env: &Env<'_>,
        effects: &mut dyn EffectSink,
        actor: EntityId,
        kind: AbilityKind,
        cause: TerminationCause,
        now: Millis,
    ) -> bool {
        match self.directory.remove(&InstanceKey::new(actor, kind)) {
            Some(instance) => {
                self.conclude(env, effects, instance, cause, now);
                true
            }
            None => false,
        }
    }

    /// Terminates every instance the actor owns. Returns how many there were.
    pub fn disconnect(
        &mut self,
        env: &Env<'_>,
        effects: &mut dyn EffectSink,
        actor: EntityId,
        now: Millis,
    ) -> usize {
        let keys = self.directory.of_actor(actor);
        for key in &keys {
            self.terminate(env, effects, actor, key.kind, TerminationCause::Disconnected, now);
        }
        keys.len()
    }

    /// One scheduler tick: steps every live instance once.
    ///
    /// Keys are snapshotted first and each instance is taken out of the
    /// directory while it runs. A failing instance is terminated as
    /// `Faulted`; the pass continues with the rest. Elapsed cooldowns are
    /// dropped at the end of the pass.
    pub fn progress_all(
        &mut self,
        env: &Env<'_>,
        effects: &mut dyn EffectSink,
        now: Millis,
    ) -> TickReport {
        let exemptions = self.services.exemptions.snapshot();
        let mut report = TickReport {
            now,
            ..TickReport::default()
        };

        for key in self.directory.keys() {
            let Some(mut instance) = self.directory.remove(&key) else {
                continue;
            };
            let result = {
                let mut ctx = StepContext {
                    env: *env,
                    registry: &self.services.registry,
                    exemptions: &exemptions,
                    effects: &mut *effects,
                    journal: &mut self.journal,
                    actor: key.actor,
                    started_at: instance.started_at(),
                    now,
                };
                instance.tick(&mut ctx)
            };

            match result {
                Ok(None) => {
                    self.directory.insert(instance);
                    report.progressed += 1;
                }
                Ok(Some(cause)) => {
                    self.finish(env, &instance, cause, now);
                    report.terminated.push((key, cause));
                }
                Err(error) => {
                    self.fault(env, &instance, &error, now);
                    report.terminated.push((key, TerminationCause::Faulted));
                }
            }
        }

        self.cooldowns.purge_expired(now);
        report
    }

    // ========================================================================
    // Reload
    // ========================================================================

    /// Clears the directory without per-instance cleanup.
    ///
    /// No final impulse is applied and no cooldown is written. Registry
    /// entries left behind by the cleared instances are reported, logged and
    /// released so they cannot leak.
    pub fn reload_all(&mut self) -> ReloadReport {
        let cleared: Vec<InstanceKey> = self
            .directory
            .reload_all()
            .iter()
            .map(|instance| InstanceKey::new(instance.actor(), instance.kind()))
            .collect();

        let orphans = self.services.registry.snapshot();
        for entry in &orphans {
            warn!(
                target: "ability::engine",
                kind = %entry.kind,
                entity = %entry.target,
                controller = %entry.controller,
                "releasing orphaned target after reload"
            );
            if self
                .services
                .registry
                .release(entry.kind, entry.target, entry.controller)
            {
                self.journal.push(AbilityEvent::TargetReleased {
                    kind: entry.kind,
                    target: entry.target,
                    controller: entry.controller,
                });
            }
        }

        info!(
            target: "ability::engine",
            cleared = cleared.len(),
            orphans = orphans.len(),
            "instances cleared for reload"
        );
        ReloadReport { cleared, orphans }
    }

    /// Atomically replaces the bloodless set.
    pub fn reload_exemption_set<S: AsRef<str>>(&self, entries: &[S]) -> ExemptionReport {
        self.services.exemptions.reload(entries)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_targeted(&self, entity: EntityId) -> bool {
        self.services.registry.is_targeted(entity)
    }

    pub fn owner_of(&self, entity: EntityId) -> Option<EntityId> {
        AbilityKind::ALL
            .iter()
            .find_map(|kind| self.services.registry.owner_of(*kind, entity))
    }

    /// Force the controlling instance currently applies to `entity`.
    pub fn current_force_vector(&self, entity: EntityId) -> Option<Vec3> {
        AbilityKind::ALL.iter().find_map(|kind| {
            let owner = self.services.registry.owner_of(*kind, entity)?;
            self.instance(owner, *kind)
                .map(|instance| instance.ability().force())
        })
    }

    pub fn cooldown_remaining(&self, actor: EntityId, kind: AbilityKind, now: Millis) -> Millis {
        self.cooldowns.remaining(actor, kind, now)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn reject(&mut self, actor: EntityId, kind: AbilityKind, reason: DenyReason) -> ActivationOutcome {
        debug!(
            target: "ability::engine",
            %actor,
            %kind,
            reason = reason.code(),
            "activation rejected"
        );
        self.journal
            .push(AbilityEvent::Rejected { actor, kind, reason });
        ActivationOutcome::Rejected(reason)
    }

    /// Runs the exit transition for an instance already removed from the directory.
    fn conclude(
        &mut self,
        env: &Env<'_>,
        effects: &mut dyn EffectSink,
        mut instance: AbilityInstance,
        cause: TerminationCause,
        now: Millis,
    ) {
        let exemptions = self.services.exemptions.snapshot();
        let result = {
            let mut ctx = StepContext {
                env: *env,
                registry: &self.services.registry,
                exemptions: &exemptions,
                effects: &mut *effects,
                journal: &mut self.journal,
                actor: instance.actor(),
                started_at: instance.started_at(),
                now,
            };
            instance.conclude(&mut ctx, cause)
        };

        match result {
            Ok(cause) => self.finish(env, &instance, cause, now),
            Err(error) => self.fault(env, &instance, &error, now),
        }
    }

    fn fault(&mut self, env: &Env<'_>, instance: &AbilityInstance, error: &AbilityError, now: Millis) {
        warn!(
            target: "ability::engine",
            actor = %instance.actor(),
            kind = %instance.kind(),
            code = error.error_code(),
            severity = error.severity().as_str(),
            %error,
            "instance faulted"
        );
        self.finish(env, instance, TerminationCause::Faulted, now);
    }

    /// Terminated cleanup: releases every entry the actor holds for this
    /// ability and writes the cooldown the ability asks for.
    fn finish(
        &mut self,
        env: &Env<'_>,
        instance: &AbilityInstance,
        cause: TerminationCause,
        now: Millis,
    ) {
        let actor = instance.actor();
        let kind = instance.kind();

        for entry in self.services.registry.release_all_owned_by(kind, actor) {
            self.journal.push(AbilityEvent::TargetReleased {
                kind,
                target: entry.target,
                controller: actor,
            });
        }

        let elapsed = now.saturating_sub(instance.started_at());
        let overridden = env.actors().is_in_override_state(actor);
        let cooldown_until = instance
            .ability()
            .cooldown_after(cause, elapsed, overridden)
            .map(|cooldown| now.saturating_add(cooldown));
        if let Some(ready_at) = cooldown_until {
            self.cooldowns.insert(actor, kind, ready_at);
        }

        info!(
            target: "ability::engine",
            %actor,
            %kind,
            ?cause,
            elapsed,
            cooldown_until,
            "ability terminated"
        );
        self.journal.push(AbilityEvent::Terminated {
            instance: instance.id(),
            actor,
            kind,
            cause,
            cooldown_until,
        });
    }
}
