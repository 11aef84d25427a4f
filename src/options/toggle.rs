//! Boolean-or-object option shorthand.

use crate::types::OptionsRecord;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// How a fragment was switched in the global options.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Toggle {
    /// `false`: the fragment produces nothing.
    Disabled,
    /// `true`: the fragment runs with its built-in defaults.
    #[default]
    EnabledDefault,
    /// An options object: defaults shallow-merged under it.
    EnabledWith(OptionsRecord),
}

impl Toggle {
    /// Interpret any JSON value as a toggle.
    ///
    /// Never fails. Shapes other than booleans and objects are coerced by
    /// truthiness: `null`, `0` and `""` disable, anything else enables with defaults.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Toggle::EnabledWith(map.clone()),
            Value::Bool(true) => Toggle::EnabledDefault,
            Value::Bool(false) | Value::Null => Toggle::Disabled,
            Value::Number(n) => {
                if n.as_f64().is_some_and(|f| f != 0.0) {
                    Toggle::EnabledDefault
                } else {
                    Toggle::Disabled
                }
            }
            Value::String(s) if s.is_empty() => Toggle::Disabled,
            Value::String(_) | Value::Array(_) => Toggle::EnabledDefault,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Toggle::Disabled)
    }

    /// The explicit options object, if one was given.
    pub fn record(&self) -> Option<&OptionsRecord> {
        match self {
            Toggle::EnabledWith(map) => Some(map),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Toggle::Disabled => Value::Bool(false),
            Toggle::EnabledDefault => Value::Bool(true),
            Toggle::EnabledWith(map) => Value::Object(map.clone()),
        }
    }
}

impl From<bool> for Toggle {
    fn from(enabled: bool) -> Self {
        if enabled {
            Toggle::EnabledDefault
        } else {
            Toggle::Disabled
        }
    }
}

impl From<OptionsRecord> for Toggle {
    fn from(record: OptionsRecord) -> Self {
        Toggle::EnabledWith(record)
    }
}

impl From<Value> for Toggle {
    fn from(value: Value) -> Self {
        Toggle::from_value(&value)
    }
}

impl Serialize for Toggle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Toggle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Toggle::from_value(&value))
    }
}
