use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ability_core::{
    AbilityEvent, AbilityKind, ActivationOutcome, ActorFlags, BloodbendingConfig, ConfigSnapshot,
    EntityId, EntityKind, EntityRecord, Location, SnapshotWorld, TerminationCause, Vec3, WorldId,
    WorldUpdate,
};
use runtime::{
    BlockingDirectory, Event, LookupError, Runtime, RuntimeConfig, RuntimeError, RuntimeHandle,
    TickEvent, Topic,
};
use tokio::time::timeout;

const KIND: AbilityKind = AbilityKind::Bloodbending;
const BENDER: EntityId = EntityId(1);
const PIG: EntityId = EntityId(2);
const WAIT: Duration = Duration::from_secs(5);

fn at(x: f64) -> Location {
    Location::new(WorldId::OVERWORLD, Vec3::new(x, 64.0, 0.0))
}

fn world() -> SnapshotWorld {
    SnapshotWorld::new()
        .with_entity(
            EntityRecord::new(BENDER, EntityKind::Player, at(0.0))
                .named("Hama")
                .with_flags(ActorFlags::SNEAKING)
                .bending(KIND),
        )
        .with_entity(EntityRecord::new(PIG, EntityKind::Pig, at(2.0)))
}

fn any_time() -> ConfigSnapshot {
    ConfigSnapshot::new()
        .with(BloodbendingConfig::NIGHT_ONLY, false)
        .with(BloodbendingConfig::FULL_MOON_ONLY, false)
}

fn manual() -> RuntimeConfig {
    RuntimeConfig {
        tick_millis: 50,
        auto_tick: false,
        ..RuntimeConfig::default()
    }
}

async fn manual_runtime() -> Runtime {
    Runtime::builder()
        .config(manual())
        .world(world())
        .ability_config(any_time())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn activation_and_ticks_through_the_handle() {
    let runtime = manual_runtime().await;
    let handle = runtime.handle();
    let mut ability_rx = handle.subscribe(Topic::Ability);
    let mut tick_rx = handle.subscribe(Topic::Tick);

    let outcome = handle.activate(BENDER, KIND).await.unwrap();
    assert!(outcome.is_started());
    assert!(handle.is_targeted(PIG));
    assert_eq!(handle.owner_of(PIG), Some(BENDER));

    let report = handle.step().await.unwrap();
    assert_eq!(report.now, 50);
    assert_eq!(report.progressed, 1);

    let force = handle.current_force_vector(PIG).await.unwrap().unwrap();
    assert!((force.x - 0.5).abs() < 1e-9);

    let mut saw_activated = false;
    while let Ok(event) = ability_rx.try_recv() {
        if let Event::Ability(AbilityEvent::Activated { actor, .. }) = event {
            saw_activated = actor == BENDER;
        }
    }
    assert!(saw_activated);
    assert!(matches!(
        tick_rx.try_recv(),
        Ok(Event::Tick(TickEvent { tick: 1, now: 50, live: 1, terminated: 0 }))
    ));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn unsneak_releases_and_starts_cooldown() {
    let runtime = manual_runtime().await;
    let handle = runtime.handle();
    let mut ability_rx = handle.subscribe(Topic::Ability);

    assert!(handle.activate(BENDER, KIND).await.unwrap().is_started());
    assert!(
        handle
            .input(WorldUpdate::SetSneaking {
                entity: BENDER,
                sneaking: false,
            })
            .await
            .unwrap()
    );
    let report = handle.step().await.unwrap();
    assert_eq!(report.terminated.len(), 1);
    assert_eq!(report.terminated[0].1, TerminationCause::Released);
    assert!(!handle.is_targeted(PIG));
    assert_eq!(
        handle.cooldown_remaining(BENDER, KIND).await.unwrap(),
        BloodbendingConfig::DEFAULT_COOLDOWN
    );

    let terminated = std::iter::from_fn(|| ability_rx.try_recv().ok()).any(|event| {
        matches!(
            event,
            Event::Ability(AbilityEvent::Terminated {
                cause: TerminationCause::Released,
                ..
            })
        )
    });
    assert!(terminated);

    assert_eq!(
        handle.activate(BENDER, KIND).await.unwrap(),
        ActivationOutcome::Rejected(ability_core::DenyReason::OnCooldown)
    );
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn reload_all_clears_and_swaps_config() {
    let runtime = manual_runtime().await;
    let handle = runtime.handle();

    assert!(handle.activate(BENDER, KIND).await.unwrap().is_started());
    let report = handle.reload_all(Some(ConfigSnapshot::new())).await.unwrap();
    assert_eq!(report.cleared.len(), 1);
    assert!(!handle.is_targeted(PIG));

    // The new config is night-only and the sandbox world is always day.
    assert_eq!(
        handle.activate(BENDER, KIND).await.unwrap(),
        ActivationOutcome::Rejected(ability_core::DenyReason::NotNight)
    );
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn exemption_reload_is_visible_to_the_next_activation() {
    let runtime = manual_runtime().await;
    let handle = runtime.handle();

    let report = handle.reload_exemption_set(&["PIG", "unicorn"]);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.skipped.len(), 1);

    assert_eq!(
        handle.activate(BENDER, KIND).await.unwrap(),
        ActivationOutcome::Rejected(ability_core::DenyReason::Bloodless)
    );
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn resolve_fast_path_needs_no_tick() {
    let runtime = Runtime::builder()
        .config(manual())
        .world(world())
        .directory(BlockingDirectory::new(|_: &str| Ok(Some(EntityId(99)))))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let found = timeout(WAIT, handle.resolve("hama")).await.unwrap().unwrap();
    assert_eq!(found, Some(BENDER));
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn resolve_without_directory_answers_none() {
    let runtime = manual_runtime().await;
    let handle = runtime.handle();
    assert_eq!(handle.resolve("nobody").await.unwrap(), None);
    runtime.shutdown().await.unwrap();
}

async fn resolve_after_ticks(
    handle: &RuntimeHandle,
    name: &'static str,
) -> runtime::Result<Option<EntityId>> {
    let pending = tokio::spawn({
        let handle = handle.clone();
        async move { handle.resolve(name).await }
    });
    for _ in 0..100 {
        handle.step().await.unwrap();
        if pending.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    timeout(WAIT, pending).await.unwrap().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resolve_slow_path_completes_after_a_tick() {
    let runtime = Runtime::builder()
        .config(manual())
        .world(world())
        .directory(BlockingDirectory::new(|name: &str| {
            Ok((name == "Zuko").then_some(EntityId(42)))
        }))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let pending = tokio::spawn({
        let handle = handle.clone();
        async move { handle.resolve("Zuko").await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!pending.is_finished());

    for _ in 0..100 {
        handle.step().await.unwrap();
        if pending.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let found = timeout(WAIT, pending).await.unwrap().unwrap().unwrap();
    assert_eq!(found, Some(EntityId(42)));
    runtime.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn directory_answers_are_never_served_stale() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runtime = Runtime::builder()
        .config(manual())
        .world(world())
        .directory(BlockingDirectory::new({
            let calls = Arc::clone(&calls);
            move |_: &str| {
                let previous = calls.fetch_add(1, Ordering::SeqCst);
                Ok(Some(if previous == 0 { EntityId(42) } else { EntityId(99) }))
            }
        }))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let first = resolve_after_ticks(&handle, "Zuko").await.unwrap();
    let second = resolve_after_ticks(&handle, "Zuko").await.unwrap();
    assert_eq!(first, Some(EntityId(42)));
    assert_eq!(second, Some(EntityId(99)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn dead_world_entities_are_not_answered_locally() {
    let runtime = manual_runtime().await;
    let handle = runtime.handle();

    assert_eq!(handle.resolve("Hama").await.unwrap(), Some(BENDER));
    assert!(handle.input(WorldUpdate::Kill(BENDER)).await.unwrap());
    assert_eq!(handle.resolve("Hama").await.unwrap(), None);
    runtime.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_failures_surface_as_lookup_failed() {
    let runtime = Runtime::builder()
        .config(manual())
        .world(world())
        .directory(BlockingDirectory::new(|name: &str| {
            if name == "boom" {
                panic!("directory exploded");
            }
            Err(LookupError::Directory("offline".into()))
        }))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    for name in ["boom", "offline"] {
        let pending = tokio::spawn({
            let handle = handle.clone();
            async move { handle.resolve(name).await }
        });
        for _ in 0..100 {
            handle.step().await.unwrap();
            if pending.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let result = timeout(WAIT, pending).await.unwrap().unwrap();
        match result {
            Err(RuntimeError::LookupFailed { name: failed, .. }) => assert_eq!(failed, name),
            other => panic!("expected LookupFailed, got {other:?}"),
        }
    }
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn auto_tick_publishes_tick_events() {
    let runtime = Runtime::builder()
        .config(RuntimeConfig {
            tick_millis: 10,
            auto_tick: true,
            ..RuntimeConfig::default()
        })
        .world(world())
        .build()
        .await
        .unwrap();
    let mut tick_rx = runtime.handle().subscribe(Topic::Tick);

    let event = timeout(WAIT, tick_rx.recv()).await.unwrap().unwrap();
    assert!(matches!(event, Event::Tick(TickEvent { now, tick, .. }) if now == tick * 10));
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn builder_requires_a_world() {
    let result = Runtime::builder().build().await;
    assert!(matches!(result, Err(RuntimeError::MissingWorld)));
}

#[tokio::test]
async fn handle_fails_cleanly_after_shutdown() {
    let runtime = manual_runtime().await;
    let handle = runtime.handle();
    runtime.shutdown().await.unwrap();

    assert!(matches!(
        handle.step().await,
        Err(RuntimeError::CommandChannelClosed)
    ));
}
