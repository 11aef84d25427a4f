//! Per-fragment option resolution.
//!
//! Turns the global options object into one [`FragmentDescriptor`] per
//! registered fragment. Resolution is pure and never fails: end users author
//! these options, so odd shapes degrade to defaults with a warning.

use super::global::{GlobalOptions, ProjectType};
use super::merge::shallow_merge;
use super::toggle::Toggle;
use crate::fragments::{FragmentProvider, Registry};
use crate::types::OptionsRecord;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::warn;

/// Name of the fragment whose resolved options are shared with other fragments.
const STYLISTIC: &str = "stylistic";
const TYPESCRIPT: &str = "typescript";

/// Resolved state of one fragment. Created once, consumed once by the linearizer.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDescriptor {
    pub name: String,
    pub enabled: bool,
    pub options: OptionsRecord,
}

/// Cross-fragment knowledge derived from the global options.
///
/// Fragments never ask each other anything. A fragment that needs to know,
/// say, whether TypeScript support is on reads it from here while building
/// its defaults, so the fact ends up in its own resolved options.
#[derive(Debug, Clone, Default)]
pub struct Facts {
    enabled: BTreeSet<String>,
    stylistic: Option<OptionsRecord>,
    typescript: OptionsRecord,
    component_exts: Vec<String>,
    project_type: ProjectType,
}

impl Facts {
    /// Facts with only an enabled set; the rest empty.
    pub fn with_enabled<I, S>(enabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: enabled.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the shared stylistic options.
    pub fn with_stylistic(mut self, stylistic: OptionsRecord) -> Self {
        self.stylistic = Some(stylistic);
        self
    }

    pub fn is_enabled(&self, fragment: &str) -> bool {
        self.enabled.contains(fragment)
    }

    /// Resolved stylistic options, or `None` when stylistic rules are off.
    pub fn stylistic(&self) -> Option<&OptionsRecord> {
        self.stylistic.as_ref()
    }

    /// Stylistic options as a value: the options object, or `false`.
    pub fn stylistic_value(&self) -> Value {
        match &self.stylistic {
            Some(record) => Value::Object(record.clone()),
            None => Value::Bool(false),
        }
    }

    /// Options the caller gave the typescript fragment (empty when `true` or absent).
    pub fn typescript(&self) -> &OptionsRecord {
        &self.typescript
    }

    pub fn component_exts(&self) -> &[String] {
        &self.component_exts
    }

    pub fn project_type(&self) -> ProjectType {
        self.project_type
    }
}

fn is_enabled(global: &GlobalOptions, provider: &dyn FragmentProvider) -> bool {
    match global.toggle_for(provider.name()) {
        None => provider.default_enabled(),
        Some(toggle) => toggle.is_enabled() || provider.required(),
    }
}

/// Resolve one fragment's descriptor.
///
/// `true` and `{}` both yield exactly `provider.defaults(facts)`.
pub fn resolve(
    global: &GlobalOptions,
    provider: &dyn FragmentProvider,
    facts: &Facts,
) -> FragmentDescriptor {
    let name = provider.name().to_string();
    if !is_enabled(global, provider) {
        return FragmentDescriptor {
            name,
            enabled: false,
            options: OptionsRecord::new(),
        };
    }

    let defaults = provider.defaults(facts);
    let options = match global.toggle_for(provider.name()) {
        Some(Toggle::EnabledWith(record)) => shallow_merge(&defaults, record),
        _ => defaults,
    };

    FragmentDescriptor {
        name,
        enabled: true,
        options,
    }
}

/// Resolve every registered fragment, in registry order.
pub fn resolve_all(global: &GlobalOptions, registry: &Registry) -> (Facts, Vec<FragmentDescriptor>) {
    for key in global.fragments.keys() {
        if registry.get(key).is_none() {
            warn!(fragment = %key, "Ignoring options for unknown fragment");
        }
    }

    let mut enabled = BTreeSet::new();
    for provider in registry.iter() {
        if provider.required() && global.toggle_for(provider.name()) == Some(&Toggle::Disabled) {
            warn!(
                fragment = provider.name(),
                "Fragment cannot be disabled; using its defaults"
            );
        }
        if is_enabled(global, provider.as_ref()) {
            enabled.insert(provider.name().to_string());
        }
    }

    let mut facts = Facts {
        enabled,
        stylistic: None,
        typescript: global
            .toggle_for(TYPESCRIPT)
            .and_then(Toggle::record)
            .cloned()
            .unwrap_or_default(),
        component_exts: global.component_exts.clone(),
        project_type: global.project_type,
    };

    if let Some(provider) = registry.get(STYLISTIC) {
        let descriptor = resolve(global, provider.as_ref(), &facts);
        if descriptor.enabled {
            facts.stylistic = Some(descriptor.options);
        }
    }

    let descriptors = registry
        .iter()
        .map(|provider| resolve(global, provider.as_ref(), &facts))
        .collect();

    (facts, descriptors)
}

/// Serialize typed options into a record.
pub fn to_record<T: Serialize>(options: &T) -> OptionsRecord {
    match serde_json::to_value(options) {
        Ok(Value::Object(map)) => map,
        _ => OptionsRecord::new(),
    }
}

/// Decode a resolved record into a fragment's typed options.
///
/// Keys whose values do not fit the typed shape are dropped with a warning and
/// the default for that key is kept.
pub fn decode<T>(fragment: &str, record: &OptionsRecord) -> T
where
    T: DeserializeOwned + Serialize + Default,
{
    if let Ok(options) = serde_json::from_value(Value::Object(record.clone())) {
        return options;
    }

    let mut accepted = to_record(&T::default());
    for (key, value) in record {
        let mut candidate = accepted.clone();
        candidate.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(candidate.clone())).is_ok() {
            accepted = candidate;
        } else {
            warn!(fragment, option = %key, value = %value, "Ignoring option with unexpected shape");
        }
    }

    serde_json::from_value(Value::Object(accepted)).unwrap_or_default()
}
