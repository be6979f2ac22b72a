//! Headless ability host.
//!
//! Composition root that assembles:
//! 1. Ability configuration and a sandbox world from TOML content
//! 2. The runtime (simulation thread + resolver) via `RuntimeBuilder`
//! 3. A scripted session: resolve the bender, channel, release, shut down
//!
//! ```bash
//! ABILITY_DEMO_TICKS=20 RUST_LOG=debug cargo run -p ability-server
//! ```
mod config;
mod logging;

use ability_content::{ConfigLoader, ScenarioLoader};
use ability_core::{AbilityKind, ActivationOutcome, WorldUpdate};
use anyhow::{Context, Result};
use runtime::{Event, Runtime, RuntimeConfig, RuntimeHandle, Topic};
use tokio::sync::broadcast::error::RecvError;

use crate::config::ServerConfig;

const KIND: AbilityKind = AbilityKind::Bloodbending;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!("Starting ability server");
    tracing::info!("Ability config: {}", config.ability_config.display());
    tracing::info!("Scenario: {}", config.scenario.display());

    let (ability_config, report) = ConfigLoader::load(&config.ability_config)?;
    if !report.is_clean() {
        tracing::warn!("{} config entries fell back to defaults", report.warnings.len());
    }
    let bloodless = ConfigLoader::bloodless(&ability_config).to_vec();
    let world = ScenarioLoader::load(&config.scenario)?;

    let runtime = Runtime::builder()
        .config(RuntimeConfig {
            tick_millis: config.tick_millis,
            auto_tick: false,
            ..RuntimeConfig::default()
        })
        .world(world)
        .ability_config(ability_config)
        .build()
        .await?;
    let handle = runtime.handle();

    let exemptions = handle.reload_exemption_set(bloodless.as_slice());
    tracing::info!("Bloodless set loaded: {} kinds", exemptions.accepted);

    let logger = tokio::spawn(log_events(handle.clone()));

    let session = run_session(&handle, &config).await;

    runtime.shutdown().await?;
    logger.abort();
    session?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Channels for `demo_ticks` ticks, then stops sneaking to release.
async fn run_session(handle: &RuntimeHandle, config: &ServerConfig) -> Result<()> {
    let actor = handle
        .resolve(config.actor.as_str())
        .await?
        .with_context(|| format!("no entity named '{}' in the scenario", config.actor))?;

    let targets = match handle.activate(actor, KIND).await? {
        ActivationOutcome::Started { mode, targets, .. } => {
            tracing::info!("{} started bloodbending ({:?}): {:?}", actor, mode, targets);
            targets
        }
        outcome => {
            tracing::warn!("{} could not bloodbend: {:?}", actor, outcome);
            return Ok(());
        }
    };

    for tick in 1..=config.demo_ticks {
        let report = handle.step().await?;
        if !report.terminated.is_empty() {
            tracing::info!("Channel ended early: {:?}", report.terminated);
            return Ok(());
        }
        if tick % 10 == 0 {
            for target in &targets {
                let force = handle.current_force_vector(*target).await?;
                tracing::info!("tick {}: force on {} = {:?}", tick, target, force);
            }
        }
    }

    handle
        .input(WorldUpdate::SetSneaking {
            entity: actor,
            sneaking: false,
        })
        .await?;
    let report = handle.step().await?;
    tracing::info!("Released: {:?}", report.terminated);

    let cooldown = handle.cooldown_remaining(actor, KIND).await?;
    tracing::info!("{} is on cooldown for {}ms", actor, cooldown);
    Ok(())
}

async fn log_events(handle: RuntimeHandle) {
    let mut events = handle.subscribe(Topic::Ability);
    loop {
        match events.recv().await {
            Ok(Event::Ability(event)) => tracing::info!(target: "ability::events", ?event),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(target: "ability::events", skipped, "event logger lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
