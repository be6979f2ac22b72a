//! Process configuration read from the environment.
use std::env;
use std::path::PathBuf;

use ability_core::Millis;

/// Server settings.
///
/// Environment variables (a `.env` file is loaded first if present):
/// - `ABILITY_CONFIG` - ability config TOML (default: bundled `config/abilities.toml`)
/// - `ABILITY_SCENARIO` - sandbox scenario TOML (default: bundled `config/scenario.toml`)
/// - `ABILITY_TICK_MILLIS` - logical milliseconds per tick (default: 50)
/// - `ABILITY_DEMO_TICKS` - ticks to channel before releasing (default: 40)
/// - `ABILITY_ACTOR` - name of the entity that bends (default: `Hama`)
/// - `ABILITY_LOG_DIR` - also write logs to `<dir>/server.log`
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub ability_config: PathBuf,
    pub scenario: PathBuf,
    pub tick_millis: Millis,
    pub demo_ticks: u32,
    pub actor: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");
        Self {
            ability_config: bundled.join("abilities.toml"),
            scenario: bundled.join("scenario.toml"),
            tick_millis: 50,
            demo_ticks: 40,
            actor: "Hama".to_owned(),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = read_env::<PathBuf>("ABILITY_CONFIG") {
            config.ability_config = path;
        }
        if let Some(path) = read_env::<PathBuf>("ABILITY_SCENARIO") {
            config.scenario = path;
        }
        if let Some(millis) = read_env::<Millis>("ABILITY_TICK_MILLIS") {
            config.tick_millis = millis.max(1);
        }
        if let Some(ticks) = read_env::<u32>("ABILITY_DEMO_TICKS") {
            config.demo_ticks = ticks;
        }
        if let Some(actor) = read_env::<String>("ABILITY_ACTOR") {
            config.actor = actor;
        }
        config.log_dir = read_env::<PathBuf>("ABILITY_LOG_DIR");

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
