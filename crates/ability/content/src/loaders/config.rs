//! Ability configuration loader.
//!
//! Nested TOML tables are flattened into dotted paths, so
//! `[Abilities.Water.Bloodbending] Range = 12.0` becomes the entry
//! `"Abilities.Water.Bloodbending.Range"`.

use std::path::Path;

use ability_core::{
    BloodbendingConfig, ConfigOracle, ConfigSnapshot, ConfigValue, ConfigWarning, ExemptionSet,
};
use toml::{Table, Value};
use tracing::warn;

use crate::loaders::{LoadResult, read_file};

/// Entries that were skipped or will fall back to their defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub warnings: Vec<ConfigWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn log(&self) {
        for warning in &self.warnings {
            warn!(target: "ability::content", %warning, "config entry ignored");
        }
    }
}

/// Loader for ability configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Syntax errors fail the load. Individual bad entries only produce
    /// warnings in the returned [`LoadReport`].
    pub fn load(path: &Path) -> LoadResult<(ConfigSnapshot, LoadReport)> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<(ConfigSnapshot, LoadReport)> {
        let table: Table = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        let mut snapshot = ConfigSnapshot::new();
        let mut report = LoadReport::default();
        flatten("", &table, &mut snapshot, &mut report);

        let (_, warnings) = BloodbendingConfig::read(&snapshot);
        report.warnings.extend(warnings);
        match snapshot.get(BloodbendingConfig::BLOODLESS) {
            None | Some(ConfigValue::List(_)) => {}
            Some(other) => report.warnings.push(ConfigWarning::WrongType {
                path: BloodbendingConfig::BLOODLESS.to_owned(),
                expected: "list",
                found: other.type_name(),
            }),
        }
        let (_, exemptions) = ExemptionSet::from_entries(Self::bloodless(&snapshot));
        report.warnings.extend(exemptions.skipped);

        report.log();
        Ok((snapshot, report))
    }

    /// The raw bloodless entries, empty when the key is missing or mistyped.
    pub fn bloodless(config: &ConfigSnapshot) -> &[String] {
        config
            .get_string_list(BloodbendingConfig::BLOODLESS)
            .unwrap_or_default()
    }
}

fn flatten(prefix: &str, table: &Table, snapshot: &mut ConfigSnapshot, report: &mut LoadReport) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(inner) => flatten(&path, inner, snapshot, report),
            Value::Boolean(flag) => snapshot.insert(path, *flag),
            Value::Integer(number) => snapshot.insert(path, *number),
            Value::Float(number) => snapshot.insert(path, *number),
            Value::String(text) => snapshot.insert(path, text.as_str()),
            Value::Array(items) => match string_list(items) {
                Some(list) => snapshot.insert(path, list),
                None => report
                    .warnings
                    .push(ConfigWarning::Unsupported { path, found: "non-string array" }),
            },
            Value::Datetime(_) => report
                .warnings
                .push(ConfigWarning::Unsupported { path, found: "datetime" }),
        }
    }
}

fn string_list(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[Properties.Water]
NightFactor = 2.0

[Abilities.Water.Bloodbending]
CanOnlyBeUsedAtNight = false
Range = 12.0
Cooldown = 4000
Bloodless = ["SKELETON", "blaze"]
"#;

    #[test]
    fn nested_tables_become_dotted_paths() {
        let (snapshot, report) = ConfigLoader::parse(SAMPLE).unwrap();
        assert!(report.is_clean());
        assert_eq!(snapshot.get_f64(BloodbendingConfig::NIGHT_FACTOR), Some(2.0));
        assert_eq!(snapshot.get_bool(BloodbendingConfig::NIGHT_ONLY), Some(false));
        assert_eq!(snapshot.get_i64(BloodbendingConfig::COOLDOWN), Some(4000));
        assert_eq!(ConfigLoader::bloodless(&snapshot).len(), 2);

        let config = BloodbendingConfig::from_oracle(&snapshot);
        assert_eq!(config.range, 12.0);
        assert_eq!(config.cooldown, 4000);
    }

    #[test]
    fn bad_entries_are_reported_not_fatal() {
        let (snapshot, report) = ConfigLoader::parse(
            r#"
[Abilities.Water.Bloodbending]
Range = "far"
Bloodless = ["ZOMBIE", "dragon"]
Seen = 1979-05-27T07:32:00Z
Mixed = [1, "two"]
"#,
        )
        .unwrap();

        assert_eq!(report.warnings.len(), 4);
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            ConfigWarning::UnknownEntityKind { value, .. } if value == "dragon"
        )));
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            ConfigWarning::WrongType { path, .. } if path == BloodbendingConfig::RANGE
        )));
        assert!(snapshot.get("Abilities.Water.Bloodbending.Seen").is_none());
        assert_eq!(
            BloodbendingConfig::from_oracle(&snapshot).range,
            BloodbendingConfig::DEFAULT_RANGE
        );
    }

    #[test]
    fn mistyped_bloodless_list_warns() {
        let (snapshot, report) = ConfigLoader::parse(
            r#"
[Abilities.Water.Bloodbending]
Bloodless = "SKELETON"
"#,
        )
        .unwrap();
        assert!(ConfigLoader::bloodless(&snapshot).is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn syntax_errors_fail_the_load() {
        assert!(ConfigLoader::parse("[Abilities\nRange = ").is_err());
    }
}
