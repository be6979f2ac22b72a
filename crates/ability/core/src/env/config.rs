//! Configuration oracle for exposing dotted-path settings to the engine.

/// A single typed configuration value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl ConfigValue {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<&[&str]> for ConfigValue {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

/// Provides access to configuration values keyed by dotted path
/// (`"Abilities.Water.Bloodbending.Range"`).
///
/// The typed getters return `None` both for missing keys and for values of
/// the wrong type; callers that must tell the two apart use [`value`].
///
/// [`value`]: ConfigOracle::value
pub trait ConfigOracle: Send + Sync {
    fn value(&self, path: &str) -> Option<&ConfigValue>;

    fn get_bool(&self, path: &str) -> Option<bool> {
        match self.value(path)? {
            ConfigValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to floats.
    fn get_f64(&self, path: &str) -> Option<f64> {
        match self.value(path)? {
            ConfigValue::Float(value) => Some(*value),
            ConfigValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    fn get_i64(&self, path: &str) -> Option<i64> {
        match self.value(path)? {
            ConfigValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    fn get_string(&self, path: &str) -> Option<&str> {
        match self.value(path)? {
            ConfigValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    fn get_string_list(&self, path: &str) -> Option<&[String]> {
        match self.value(path)? {
            ConfigValue::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }
}
