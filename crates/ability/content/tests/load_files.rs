use std::io::Write;

use ability_content::{ConfigLoader, ScenarioLoader};
use ability_core::{
    AbilityEngine, AbilityKind, AbilityServices, ActivationOutcome, BloodbendingConfig, DenyReason,
    EffectBuffer, EntityId, Env,
};
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loaded_files_drive_an_activation() {
    let config = write_temp(
        r#"
[Abilities.Water.Bloodbending]
CanOnlyBeUsedAtNight = false
CanOnlyBeUsedDuringFullMoon = false
Cooldown = 3000
Bloodless = ["SKELETON"]
"#,
    );
    let scenario = write_temp(
        r#"
[[entities]]
id = 1
kind = "PLAYER"
position = [0.0, 64.0, 0.0]
aim = [1.0, 0.0, 0.0]
flags = ["SNEAKING"]
abilities = ["Bloodbending"]

[[entities]]
id = 2
kind = "SKELETON"
position = [2.0, 64.0, 0.0]

[[entities]]
id = 3
kind = "COW"
position = [5.0, 64.0, 0.0]
"#,
    );

    let (snapshot, report) = ConfigLoader::load(config.path()).unwrap();
    assert!(report.is_clean(), "{:?}", report.warnings);
    let world = ScenarioLoader::load(scenario.path()).unwrap();

    let engine_services = AbilityServices::default();
    let exemptions = engine_services
        .exemptions
        .reload(ConfigLoader::bloodless(&snapshot));
    assert_eq!(exemptions.accepted, 1);

    let mut engine = AbilityEngine::new(engine_services);
    let mut effects = EffectBuffer::new();
    let env = Env::new(&world, &world, &snapshot);

    // The skeleton is nearer but bloodless, so the probe's pick is refused.
    let outcome = engine.activate(&env, &mut effects, EntityId(1), AbilityKind::Bloodbending, 0);
    assert_eq!(outcome, ActivationOutcome::Rejected(DenyReason::Bloodless));
    assert_eq!(BloodbendingConfig::from_oracle(&snapshot).cooldown, 3000);
}

#[test]
fn missing_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(ConfigLoader::load(&missing).is_err());
    assert!(ScenarioLoader::load(&missing).is_err());
}
