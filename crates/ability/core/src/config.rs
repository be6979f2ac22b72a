//! Bloodbending tunables read from the configuration snapshot.
//!
//! Values are read once per activation so a live instance keeps the settings
//! it started with even if the configuration is reloaded mid-channel.
use tracing::warn;

use crate::env::{ConfigOracle, ConfigValue};
use crate::state::Millis;

/// Non-fatal problem with a single configuration entry.
///
/// The offending entry is skipped (or replaced by its default) and loading
/// continues.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    #[error("{path}: expected {expected}, found {found}; using default")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: value out of range; using default")]
    OutOfRange { path: String },

    #[error("{path}: unknown entity type '{value}', entry skipped")]
    UnknownEntityKind { path: String, value: String },

    #[error("{path}: unsupported {found} value, entry skipped")]
    Unsupported { path: String, found: &'static str },
}

/// The subset of the config that drives gating predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GatingRules {
    pub night_only: bool,
    pub full_moon_only: bool,
    pub undead_allowed: bool,
    pub cross_bending: bool,
}

/// Per-instance configuration snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BloodbendingConfig {
    pub night_only: bool,
    pub undead_allowed: bool,
    pub full_moon_only: bool,
    pub cross_bending: bool,
    pub range: f64,
    pub duration: Millis,
    pub cooldown: Millis,
    pub knockback: f64,
    pub action_bar_message: String,
    pub night_factor: f64,
}

impl BloodbendingConfig {
    // ===== config paths =====
    pub const NIGHT_ONLY: &'static str = "Abilities.Water.Bloodbending.CanOnlyBeUsedAtNight";
    pub const UNDEAD_ALLOWED: &'static str = "Abilities.Water.Bloodbending.CanBeUsedOnUndeadMobs";
    pub const FULL_MOON_ONLY: &'static str =
        "Abilities.Water.Bloodbending.CanOnlyBeUsedDuringFullMoon";
    pub const CROSS_BENDING: &'static str =
        "Abilities.Water.Bloodbending.CanBloodbendOtherBloodbenders";
    pub const RANGE: &'static str = "Abilities.Water.Bloodbending.Range";
    pub const DURATION: &'static str = "Abilities.Water.Bloodbending.Duration";
    pub const COOLDOWN: &'static str = "Abilities.Water.Bloodbending.Cooldown";
    pub const KNOCKBACK: &'static str = "Abilities.Water.Bloodbending.Knockback";
    pub const ACTION_BAR_MESSAGE: &'static str = "Abilities.Water.Bloodbending.ActionBarMessage";
    pub const BLOODLESS: &'static str = "Abilities.Water.Bloodbending.Bloodless";
    pub const NIGHT_FACTOR: &'static str = "Properties.Water.NightFactor";

    // ===== fixed tuning =====
    /// Radius collected around each step of the line probe.
    pub const PROBE_RADIUS: f64 = 1.7;
    /// Distance ahead of the actor's aim a line-mode target is pulled towards.
    pub const PULL_ANCHOR: f64 = 6.0;
    pub const PULL_SPEED: f64 = 0.5;
    /// Below this distance to the anchor the pull force is zero.
    pub const PULL_DEAD_ZONE: f64 = 0.6;
    pub const SLOWNESS_TICKS: u32 = 60;
    pub const SLOWNESS_AMPLIFIER: u8 = 1;
    pub const KNOCKBACK_TRACK_WINDOW: Millis = 200;
    /// Terminations sooner than this after activation still earn a cooldown.
    pub const ANTI_SPAM_FLOOR: Millis = 1200;

    // ===== defaults =====
    pub const DEFAULT_RANGE: f64 = 10.0;
    pub const DEFAULT_DURATION: Millis = 8000;
    pub const DEFAULT_COOLDOWN: Millis = 10_000;
    pub const DEFAULT_KNOCKBACK: f64 = 4.0;
    pub const DEFAULT_ACTION_BAR_MESSAGE: &'static str = "* Bloodbent *";
    pub const DEFAULT_NIGHT_FACTOR: f64 = 1.5;

    /// Reads every key, falling back to defaults. Problems are returned, not logged.
    pub fn read(config: &dyn ConfigOracle) -> (Self, Vec<ConfigWarning>) {
        let defaults = Self::default();
        let mut reader = Reader {
            config,
            warnings: Vec::new(),
        };

        let settings = Self {
            night_only: reader.bool(Self::NIGHT_ONLY, defaults.night_only),
            undead_allowed: reader.bool(Self::UNDEAD_ALLOWED, defaults.undead_allowed),
            full_moon_only: reader.bool(Self::FULL_MOON_ONLY, defaults.full_moon_only),
            cross_bending: reader.bool(Self::CROSS_BENDING, defaults.cross_bending),
            range: reader.non_negative_f64(Self::RANGE, defaults.range),
            duration: reader.millis(Self::DURATION, defaults.duration),
            cooldown: reader.millis(Self::COOLDOWN, defaults.cooldown),
            knockback: reader.finite_f64(Self::KNOCKBACK, defaults.knockback),
            action_bar_message: reader.string(Self::ACTION_BAR_MESSAGE, &defaults.action_bar_message),
            night_factor: reader.positive_f64(Self::NIGHT_FACTOR, defaults.night_factor),
        };

        (settings, reader.warnings)
    }

    /// Like [`read`](Self::read), logging each warning.
    pub fn from_oracle(config: &dyn ConfigOracle) -> Self {
        let (settings, warnings) = Self::read(config);
        for warning in &warnings {
            warn!(target: "ability::config", %warning, "config entry ignored");
        }
        settings
    }

    /// Applies the night factor.
    ///
    /// Only configurations that are *not* night-only are scaled: range,
    /// duration and knockback grow, cooldown shrinks. A value that would
    /// overflow to infinity keeps its unscaled value.
    pub fn scaled_for_night(&self, is_night: bool) -> Self {
        if self.night_only || !is_night {
            return self.clone();
        }
        let factor = self.night_factor;
        let scale = |value: f64| Some(value * factor).filter(|v| v.is_finite()).unwrap_or(value);
        Self {
            range: scale(self.range),
            duration: (self.duration as f64 * factor).round() as Millis,
            cooldown: (self.cooldown as f64 / factor).round() as Millis,
            knockback: scale(self.knockback),
            ..self.clone()
        }
    }

    pub fn rules(&self) -> GatingRules {
        GatingRules {
            night_only: self.night_only,
            full_moon_only: self.full_moon_only,
            undead_allowed: self.undead_allowed,
            cross_bending: self.cross_bending,
        }
    }
}

impl Default for BloodbendingConfig {
    fn default() -> Self {
        Self {
            night_only: true,
            undead_allowed: true,
            full_moon_only: true,
            cross_bending: false,
            range: Self::DEFAULT_RANGE,
            duration: Self::DEFAULT_DURATION,
            cooldown: Self::DEFAULT_COOLDOWN,
            knockback: Self::DEFAULT_KNOCKBACK,
            action_bar_message: Self::DEFAULT_ACTION_BAR_MESSAGE.to_owned(),
            night_factor: Self::DEFAULT_NIGHT_FACTOR,
        }
    }
}

struct Reader<'a> {
    config: &'a dyn ConfigOracle,
    warnings: Vec<ConfigWarning>,
}

impl Reader<'_> {
    fn mistyped(&mut self, path: &str, expected: &'static str, found: &ConfigValue) {
        self.warnings.push(ConfigWarning::WrongType {
            path: path.to_owned(),
            expected,
            found: found.type_name(),
        });
    }

    fn bool(&mut self, path: &str, default: bool) -> bool {
        match self.config.value(path) {
            None => default,
            Some(ConfigValue::Bool(value)) => *value,
            Some(other) => {
                self.mistyped(path, "bool", other);
                default
            }
        }
    }

    fn f64(&mut self, path: &str, default: f64) -> f64 {
        match self.config.value(path) {
            None => default,
            Some(ConfigValue::Float(value)) => *value,
            Some(ConfigValue::Integer(value)) => *value as f64,
            Some(other) => {
                self.mistyped(path, "number", other);
                default
            }
        }
    }

    fn finite_f64(&mut self, path: &str, default: f64) -> f64 {
        let value = self.f64(path, default);
        if !value.is_finite() {
            self.warnings.push(ConfigWarning::OutOfRange {
                path: path.to_owned(),
            });
            return default;
        }
        value
    }

    fn non_negative_f64(&mut self, path: &str, default: f64) -> f64 {
        let value = self.finite_f64(path, default);
        if value < 0.0 {
            self.warnings.push(ConfigWarning::OutOfRange {
                path: path.to_owned(),
            });
            return default;
        }
        value
    }

    fn positive_f64(&mut self, path: &str, default: f64) -> f64 {
        let value = self.non_negative_f64(path, default);
        if value == 0.0 {
            self.warnings.push(ConfigWarning::OutOfRange {
                path: path.to_owned(),
            });
            return default;
        }
        value
    }

    fn millis(&mut self, path: &str, default: Millis) -> Millis {
        match self.config.value(path) {
            None => default,
            Some(ConfigValue::Integer(value)) => match Millis::try_from(*value) {
                Ok(millis) => millis,
                Err(_) => {
                    self.warnings.push(ConfigWarning::OutOfRange {
                        path: path.to_owned(),
                    });
                    default
                }
            },
            Some(other) => {
                self.mistyped(path, "integer", other);
                default
            }
        }
    }

    fn string(&mut self, path: &str, default: &str) -> String {
        match self.config.value(path) {
            None => default.to_owned(),
            Some(ConfigValue::String(value)) => value.clone(),
            Some(other) => {
                self.mistyped(path, "string", other);
                default.to_owned()
            }
        }
    }
}
