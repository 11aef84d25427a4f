//! Core data types shared by fragments, the composer and sinks.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Free-form options object, as authored by users or produced by fragment defaults.
pub type OptionsRecord = Map<String, Value>;

/// Plugins of a block, keyed by the local alias rules refer to.
pub type PluginMap = IndexMap<String, Plugin>;

/// Rule settings of a block, keyed by rule id (`plugin/rule` or a core rule name).
pub type RuleMap = IndexMap<String, RuleEntry>;

/// Opaque plugin capability.
///
/// The engine never looks inside a plugin. It compares plugins by `id` and
/// passes the payload through untouched.
#[derive(Clone)]
pub struct Plugin {
    id: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Plugin {
    /// Create a plugin handle carrying `payload`.
    pub fn new(id: impl Into<Arc<str>>, payload: impl Any + Send + Sync) -> Self {
        Self {
            id: id.into(),
            payload: Arc::new(payload),
        }
    }

    /// Create a plugin handle with no payload, e.g. when read back from a config file.
    pub fn opaque(id: impl Into<Arc<str>>) -> Self {
        Self::new(id, ())
    }

    /// Stable identity of the plugin (usually its package name).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Downcast the payload.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl PartialEq for Plugin {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Plugin {}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Plugin").field(&self.id).finish()
    }
}

impl Serialize for Plugin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de> Deserialize<'de> for Plugin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(Plugin::opaque(id))
    }
}

/// Rule severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Off,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.as_str() {
                "off" => Some(Severity::Off),
                "warn" => Some(Severity::Warn),
                "error" => Some(Severity::Error),
                _ => None,
            },
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(Severity::Off),
                Some(1) => Some(Severity::Warn),
                Some(2) => Some(Severity::Error),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity plus rule options.
///
/// Serializes the way the analysis tool expects: a bare severity string when
/// there are no options, otherwise `[severity, ...options]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub severity: Severity,
    pub options: Vec<Value>,
}

impl RuleEntry {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: Vec::new(),
        }
    }

    pub fn off() -> Self {
        Self::new(Severity::Off)
    }

    pub fn warn() -> Self {
        Self::new(Severity::Warn)
    }

    pub fn error() -> Self {
        Self::new(Severity::Error)
    }

    /// Append one option value.
    pub fn with(mut self, option: impl Into<Value>) -> Self {
        self.options.push(option.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.severity != Severity::Off
    }
}

impl From<Severity> for RuleEntry {
    fn from(severity: Severity) -> Self {
        RuleEntry::new(severity)
    }
}

impl Serialize for RuleEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.options.is_empty() {
            return serializer.serialize_str(self.severity.as_str());
        }
        let mut seq = serializer.serialize_seq(Some(self.options.len() + 1))?;
        seq.serialize_element(self.severity.as_str())?;
        for option in &self.options {
            seq.serialize_element(option)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for RuleEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Array(mut items) if !items.is_empty() => {
                let severity = Severity::from_value(&items[0])
                    .ok_or_else(|| de::Error::custom(format!("invalid severity: {}", items[0])))?;
                items.remove(0);
                Ok(RuleEntry {
                    severity,
                    options: items,
                })
            }
            other => Severity::from_value(&other)
                .map(RuleEntry::new)
                .ok_or_else(|| de::Error::custom(format!("invalid rule entry: {}", other))),
        }
    }
}

/// A named, optionally glob-scoped collection of plugins, rules and settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBlock {
    /// Block name, e.g. `rulestack/typescript/rules`.
    #[serde(default)]
    pub name: String,

    /// Files this block applies to. `None` means every file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    /// Files excluded from this block, or globally when the block has nothing else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores: Option<Vec<String>>,

    #[serde(
        default,
        rename = "languageOptions",
        alias = "language_options",
        skip_serializing_if = "Option::is_none"
    )]
    pub language_options: Option<OptionsRecord>,

    #[serde(
        default,
        rename = "linterOptions",
        alias = "linter_options",
        skip_serializing_if = "Option::is_none"
    )]
    pub linter_options: Option<OptionsRecord>,

    /// Processor reference in `plugin/processor` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub plugins: PluginMap,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub rules: RuleMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<OptionsRecord>,

    /// Whether another block may share this block's name.
    #[serde(skip)]
    pub repeatable: bool,
}

impl RuleBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn files<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = Some(globs.into_iter().map(Into::into).collect());
        self
    }

    pub fn ignores<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignores = Some(globs.into_iter().map(Into::into).collect());
        self
    }

    /// Set language options from a JSON object. Non-object values are ignored.
    pub fn language_options(mut self, options: Value) -> Self {
        if let Value::Object(map) = options {
            self.language_options = Some(map);
        }
        self
    }

    /// Set linter options from a JSON object. Non-object values are ignored.
    pub fn linter_options(mut self, options: Value) -> Self {
        if let Value::Object(map) = options {
            self.linter_options = Some(map);
        }
        self
    }

    pub fn processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = Some(processor.into());
        self
    }

    pub fn plugin(mut self, alias: impl Into<String>, plugin: Plugin) -> Self {
        self.plugins.insert(alias.into(), plugin);
        self
    }

    pub fn rule(mut self, id: impl Into<String>, entry: impl Into<RuleEntry>) -> Self {
        self.rules.insert(id.into(), entry.into());
        self
    }

    /// Insert every rule from `rules`, replacing same-id entries in place.
    pub fn rules<I, K>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = (K, RuleEntry)>,
        K: Into<String>,
    {
        self.rules
            .extend(rules.into_iter().map(|(id, entry)| (id.into(), entry)));
        self
    }

    /// Set settings from a JSON object. Non-object values are ignored.
    pub fn settings(mut self, settings: Value) -> Self {
        if let Value::Object(map) = settings {
            self.settings = Some(map);
        }
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_entry_serialization() {
        assert_eq!(
            serde_json::to_value(RuleEntry::error()).unwrap(),
            json!("error")
        );
        assert_eq!(
            serde_json::to_value(RuleEntry::warn().with("never")).unwrap(),
            json!(["warn", "never"])
        );
    }

    #[test]
    fn test_rule_entry_accepts_numeric_severity() {
        let entry: RuleEntry = serde_json::from_value(json!([2, {"max": 3}])).unwrap();
        assert_eq!(entry.severity, Severity::Error);
        assert_eq!(entry.options, vec![json!({"max": 3})]);

        let off: RuleEntry = serde_json::from_value(json!(0)).unwrap();
        assert!(!off.is_enabled());
    }

    #[test]
    fn test_rule_entry_rejects_garbage() {
        assert!(serde_json::from_value::<RuleEntry>(json!("loud")).is_err());
        assert!(serde_json::from_value::<RuleEntry>(json!([])).is_err());
    }

    #[test]
    fn test_plugin_identity_and_payload() {
        let a = Plugin::new("vitest", 7u32);
        let b = Plugin::opaque("vitest");
        assert_eq!(a, b);
        assert_eq!(a.payload::<u32>(), Some(&7));
        assert_eq!(b.payload::<u32>(), None);
        assert_eq!(serde_json::to_value(&a).unwrap(), json!("vitest"));
    }

    #[test]
    fn test_block_serializes_camel_case_and_skips_empty() {
        let block = RuleBlock::new("demo")
            .language_options(json!({"sourceType": "module"}))
            .rule("no-var", RuleEntry::error());
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "demo",
                "languageOptions": {"sourceType": "module"},
                "rules": {"no-var": "error"}
            })
        );
    }

    #[test]
    fn test_block_reads_snake_case_aliases() {
        let block: RuleBlock = serde_json::from_value(json!({
            "name": "user",
            "language_options": {"ecmaVersion": 2022},
            "plugins": {"x": "eslint-plugin-x"},
            "rules": {"x/y": ["warn", 1]}
        }))
        .unwrap();
        assert!(block.language_options.is_some());
        assert_eq!(block.plugins["x"].id(), "eslint-plugin-x");
        assert_eq!(block.rules["x/y"].severity, Severity::Warn);
        assert!(!block.repeatable);
    }
}
