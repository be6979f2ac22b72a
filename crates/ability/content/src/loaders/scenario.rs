//! Scenario loader.
//!
//! A scenario seeds a [`SnapshotWorld`] with entities, per-world conditions
//! and protected regions. Used by the server binary and by tests.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use ability_core::{
    AbilityKind, ActorFlags, EntityId, EntityKind, EntityRecord, Location, ProtectedRegion,
    SnapshotWorld, Vec3, WorldConditions, WorldId,
};
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioToml {
    #[serde(default)]
    worlds: Vec<WorldToml>,
    #[serde(default)]
    entities: Vec<EntityToml>,
    #[serde(default)]
    protected: Vec<RegionToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorldToml {
    id: u32,
    #[serde(default)]
    night: bool,
    #[serde(default)]
    full_moon: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityToml {
    id: u32,
    kind: String,
    name: Option<String>,
    #[serde(default)]
    world: u32,
    position: [f64; 3],
    aim: Option<[f64; 3]>,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    abilities: Vec<String>,
    #[serde(default)]
    cooldown_exempt: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegionToml {
    #[serde(default)]
    world: u32,
    center: [f64; 3],
    radius: f64,
}

fn vec3([x, y, z]: [f64; 3]) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Loader for sandbox scenarios from TOML files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    pub fn load(path: &Path) -> LoadResult<SnapshotWorld> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Builds a world from scenario TOML.
    ///
    /// Unlike the ability config, a scenario is all-or-nothing: an unknown
    /// entity kind, flag or ability fails the whole load.
    pub fn parse(content: &str) -> LoadResult<SnapshotWorld> {
        let data: ScenarioToml = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario TOML: {}", e))?;

        let mut world = SnapshotWorld::new();
        for entry in data.worlds {
            world.set_conditions(
                WorldId(entry.id),
                WorldConditions {
                    night: entry.night,
                    full_moon: entry.full_moon,
                },
            );
        }

        for region in data.protected {
            if !(region.radius.is_finite() && region.radius >= 0.0) {
                anyhow::bail!("Protected region radius must be non-negative, got {}", region.radius);
            }
            world.protect(ProtectedRegion {
                center: Location::new(WorldId(region.world), vec3(region.center)),
                radius: region.radius,
            });
        }

        let mut seen = HashSet::new();
        for entry in data.entities {
            if !seen.insert(entry.id) {
                anyhow::bail!("Duplicate entity id {} in scenario", entry.id);
            }
            world.spawn(entity(entry)?);
        }

        Ok(world)
    }
}

fn entity(entry: EntityToml) -> LoadResult<EntityRecord> {
    let id = EntityId(entry.id);
    let kind = EntityKind::from_str(&entry.kind)
        .map_err(|_| anyhow::anyhow!("Entity {}: unknown kind '{}'", id, entry.kind))?;
    let location = Location::new(WorldId(entry.world), vec3(entry.position));

    let mut record = EntityRecord::new(id, kind, location);
    if let Some(name) = entry.name {
        record = record.named(name);
    }
    if let Some(aim) = entry.aim {
        record = record.aiming(vec3(aim));
    }
    if !entry.flags.is_empty() {
        let mut flags = ActorFlags::empty();
        for name in &entry.flags {
            let flag = ActorFlags::from_name(&name.to_ascii_uppercase())
                .ok_or_else(|| anyhow::anyhow!("Entity {}: unknown flag '{}'", id, name))?;
            flags |= flag;
        }
        record = record.with_flags(flags);
    }
    for name in &entry.abilities {
        let ability = AbilityKind::from_str(name)
            .map_err(|_| anyhow::anyhow!("Entity {}: unknown ability '{}'", id, name))?;
        record = record.bending(ability);
    }
    if entry.cooldown_exempt {
        record = record.ignoring_cooldowns();
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_core::{ActorOracle, WorldOracle};

    const SAMPLE: &str = r#"
[[worlds]]
id = 0
night = true
full_moon = true

[[entities]]
id = 1
kind = "PLAYER"
name = "Hama"
position = [0.0, 64.0, 0.0]
aim = [1.0, 0.0, 0.0]
flags = ["sneaking", "BLOODBENDER"]
abilities = ["Bloodbending"]

[[entities]]
id = 2
kind = "pig"
position = [3.0, 64.0, 0.0]

[[protected]]
center = [100.0, 64.0, 0.0]
radius = 5.0
"#;

    #[test]
    fn builds_world_from_toml() {
        let world = ScenarioLoader::parse(SAMPLE).unwrap();

        assert!(world.is_night(WorldId::OVERWORLD));
        assert!(world.is_full_moon(WorldId::OVERWORLD));
        assert_eq!(world.find_by_name("hama"), Some(EntityId(1)));
        assert!(world.is_sneaking(EntityId(1)));
        assert!(world.can_bend(EntityId(1), AbilityKind::Bloodbending));
        assert_eq!(world.kind(EntityId(2)), Some(EntityKind::Pig));
        assert_eq!(world.flags(EntityId(2)), None);
        assert!(world.is_region_protected(
            AbilityKind::Bloodbending,
            &Location::new(WorldId::OVERWORLD, Vec3::new(102.0, 64.0, 0.0)),
        ));
    }

    #[test]
    fn unknown_names_fail_the_load() {
        let unknown_kind = r#"
[[entities]]
id = 1
kind = "DRAGON"
position = [0.0, 0.0, 0.0]
"#;
        assert!(ScenarioLoader::parse(unknown_kind).is_err());

        let unknown_flag = r#"
[[entities]]
id = 1
kind = "PLAYER"
position = [0.0, 0.0, 0.0]
flags = ["FLYING"]
"#;
        assert!(ScenarioLoader::parse(unknown_flag).is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let duplicate = r#"
[[entities]]
id = 4
kind = "COW"
position = [0.0, 0.0, 0.0]

[[entities]]
id = 4
kind = "PIG"
position = [1.0, 0.0, 0.0]
"#;
        assert!(ScenarioLoader::parse(duplicate).is_err());
    }
}
