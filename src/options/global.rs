//! The global options object handed to the composer.

use super::toggle::Toggle;
use crate::error::ComposeError;
use crate::types::{OptionsRecord, RuleBlock};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Kind of project being linted. `Lib` turns on stricter library rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[default]
    App,
    Lib,
}

/// Keys that may never appear at the top level.
pub const RESERVED_KEYS: &[&str] = &["files"];

/// Keys of the top-level block.
const BLOCK_KEYS: &[(&str, &str)] = &[
    ("name", "name"),
    ("language_options", "language_options"),
    ("languageOptions", "language_options"),
    ("linter_options", "linter_options"),
    ("linterOptions", "linter_options"),
    ("processor", "processor"),
    ("plugins", "plugins"),
    ("rules", "rules"),
    ("settings", "settings"),
];

/// Keys read by the composer itself.
const ENGINE_KEYS: &[&str] = &[
    "auto_rename_plugins",
    "autoRenamePlugins",
    "component_exts",
    "componentExts",
    "type",
];

/// Whether a top-level key names a fragment toggle.
pub(crate) fn is_fragment_key(key: &str) -> bool {
    !RESERVED_KEYS.contains(&key)
        && !ENGINE_KEYS.contains(&key)
        && !BLOCK_KEYS.iter().any(|(k, _)| *k == key)
}

/// Global options: fragment toggles, engine switches and an optional top-level block.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Value")]
pub struct GlobalOptions {
    /// Fragment name to toggle, in authoring order. Absent fragments use their defaults.
    pub fragments: IndexMap<String, Toggle>,

    /// Rewrite plugin identifiers through the alias table (default: true).
    pub auto_rename_plugins: bool,

    /// Extra component file extensions, e.g. `vue`.
    pub component_exts: Vec<String>,

    pub project_type: ProjectType,

    /// Rules/settings block appended after everything else.
    ///
    /// Held unchecked here; `compose` rejects it if it declares `files`.
    pub top_level: Option<RuleBlock>,

    /// Reserved keys present in the authored object, whatever their value.
    pub reserved_keys: Vec<String>,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            fragments: IndexMap::new(),
            auto_rename_plugins: true,
            component_exts: Vec::new(),
            project_type: ProjectType::default(),
            top_level: None,
            reserved_keys: Vec::new(),
        }
    }
}

impl GlobalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fragment's toggle.
    pub fn toggle(mut self, fragment: impl Into<String>, toggle: impl Into<Toggle>) -> Self {
        self.fragments.insert(fragment.into(), toggle.into());
        self
    }

    pub fn enable(self, fragment: impl Into<String>) -> Self {
        self.toggle(fragment, Toggle::EnabledDefault)
    }

    pub fn disable(self, fragment: impl Into<String>) -> Self {
        self.toggle(fragment, Toggle::Disabled)
    }

    /// Enable a fragment with explicit options. Non-object values are coerced.
    pub fn configure(self, fragment: impl Into<String>, options: Value) -> Self {
        self.toggle(fragment, Toggle::from_value(&options))
    }

    pub fn auto_rename_plugins(mut self, enabled: bool) -> Self {
        self.auto_rename_plugins = enabled;
        self
    }

    pub fn component_exts<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component_exts = exts.into_iter().map(Into::into).collect();
        self
    }

    pub fn project_type(mut self, project_type: ProjectType) -> Self {
        self.project_type = project_type;
        self
    }

    pub fn top_level(mut self, block: RuleBlock) -> Self {
        self.top_level = Some(block);
        self
    }

    /// The toggle the caller set for `fragment`, if any.
    pub fn toggle_for(&self, fragment: &str) -> Option<&Toggle> {
        self.fragments.get(fragment)
    }

    /// Parse a global options object as authored in a config file.
    ///
    /// Block keys (`rules`, `settings`, ...) form the top-level block; engine keys
    /// are lifted out; everything else is a fragment toggle. A top-level `files`
    /// key is recorded in `reserved_keys` so that `compose` can reject it before
    /// any fragment runs. Malformed engine values keep their default.
    pub fn from_value(value: Value) -> Result<Self, ComposeError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(ComposeError::InvalidConfig(format!(
                    "global options must be an object, got {}",
                    other
                )));
            }
        };

        let mut options = Self::default();
        let mut block = OptionsRecord::new();

        for (key, value) in map {
            if RESERVED_KEYS.contains(&key.as_str()) {
                options.reserved_keys.push(key);
                continue;
            }
            if let Some((_, canonical)) = BLOCK_KEYS.iter().find(|(k, _)| *k == key) {
                block.insert(canonical.to_string(), value);
                continue;
            }

            match key.as_str() {
                "auto_rename_plugins" | "autoRenamePlugins" => {
                    options.auto_rename_plugins = Toggle::from_value(&value).is_enabled();
                }
                "component_exts" | "componentExts" => {
                    options.component_exts = component_exts(&key, value);
                }
                "type" => match serde_json::from_value(value) {
                    Ok(project_type) => options.project_type = project_type,
                    Err(e) => warn!(key = %key, "Ignoring malformed option: {}", e),
                },
                // `ignores: [..]` is shorthand for the ignores fragment's globs.
                "ignores" if value.is_array() => {
                    let mut record = OptionsRecord::new();
                    record.insert("globs".to_string(), value);
                    options
                        .fragments
                        .insert(key, Toggle::EnabledWith(record));
                }
                _ => {
                    options.fragments.insert(key, Toggle::from_value(&value));
                }
            }
        }

        if !block.is_empty() {
            let top_level: RuleBlock = serde_json::from_value(Value::Object(block))
                .map_err(|e| ComposeError::InvalidConfig(format!("top-level block: {}", e)))?;
            options.top_level = Some(top_level);
        }

        Ok(options)
    }
}

/// A single string is one extension; non-string entries are dropped.
fn component_exts(key: &str, value: Value) -> Vec<String> {
    match value {
        Value::String(ext) => vec![ext],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(ext) => Some(ext),
                other => {
                    warn!(key = %key, "Dropping non-string extension {}", other);
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!(key = %key, "Ignoring malformed option {}", other);
            Vec::new()
        }
    }
}

impl TryFrom<Value> for GlobalOptions {
    type Error = ComposeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        GlobalOptions::from_value(value)
    }
}
