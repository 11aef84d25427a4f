//! Fragment providers.
//!
//! A fragment is a named, independently switchable unit of configuration.
//! Its provider turns resolved options into an ordered list of rule blocks.
//! Providers never look at each other: whatever they need to know about the
//! rest of the configuration arrives through [`Facts`] when their defaults
//! are built.
//!
//! Built-in fragments, by stage:
//! 1. **Ignores** - `gitignore`, `ignores`
//! 2. **Base** - `javascript`, `node`, `jsdoc`, `unicorn`
//! 3. **Imports** - `imports`
//! 4. **Language extensions** - `jsx`, `typescript`, `react`, `svelte`, `astro`
//! 5. **Sort** - `sort`
//! 6. **Stylistic** - `stylistic`
//! 7. **Add-ons** - `regexp`, `tailwind`, `test`, `pnpm`
//! 8. **Data formats** - `jsonc`, `yaml`, `toml`, `markdown`
//! 9. **Formatters** - `formatters`

pub mod addons;
pub mod base;
pub mod data;
pub mod formatters;
pub mod frameworks;
pub mod ignores;
pub mod imports;
pub mod language;
pub mod sort;
pub mod stylistic;

use crate::error::ProviderError;
use crate::options::Facts;
use crate::plugins::PluginLoader;
use crate::types::{OptionsRecord, RuleBlock, RuleMap};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Prefix of every built-in block name.
pub const BLOCK_PREFIX: &str = "rulestack";

/// Build a block name: `rulestack/<fragment>/<part>`.
pub fn block_name(fragment: &str, part: &str) -> String {
    format!("{}/{}/{}", BLOCK_PREFIX, fragment, part)
}

/// Fixed precedence of fragment stages. Earlier stages come first in the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Ignores = 1,
    Base = 2,
    Imports = 3,
    LanguageExtension = 4,
    Sort = 5,
    Stylistic = 6,
    AddOns = 7,
    DataFormats = 8,
    Formatters = 9,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 9] = [
        Stage::Ignores,
        Stage::Base,
        Stage::Imports,
        Stage::LanguageExtension,
        Stage::Sort,
        Stage::Stylistic,
        Stage::AddOns,
        Stage::DataFormats,
        Stage::Formatters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ignores => "ignores",
            Stage::Base => "base",
            Stage::Imports => "imports",
            Stage::LanguageExtension => "language-extension",
            Stage::Sort => "sort",
            Stage::Stylistic => "stylistic",
            Stage::AddOns => "add-ons",
            Stage::DataFormats => "data-formats",
            Stage::Formatters => "formatters",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a provider may use while producing blocks.
pub struct ProduceContext<'a> {
    /// Loader for the provider's plugin dependencies.
    pub loader: &'a dyn PluginLoader,
    /// Project root, for fragments that discover files.
    pub root: &'a Path,
}

/// A fragment provider.
#[async_trait]
pub trait FragmentProvider: Send + Sync {
    /// Fragment key in the global options.
    fn name(&self) -> &'static str;

    fn stage(&self) -> Stage;

    /// Whether the fragment runs when the global options don't mention it.
    fn default_enabled(&self) -> bool {
        false
    }

    /// Required fragments ignore `false`.
    fn required(&self) -> bool {
        false
    }

    /// Fragments that must be enabled whenever this one is.
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether blocks of this fragment may share names with other repeatable blocks.
    fn repeatable(&self) -> bool {
        false
    }

    /// Built-in options, before the user's object is merged over them.
    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        OptionsRecord::new()
    }

    /// Produce the fragment's blocks from its resolved options.
    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError>;
}

/// Ordered set of fragment providers. Declared order is the within-stage order.
#[derive(Clone, Default)]
pub struct Registry {
    providers: Vec<Arc<dyn FragmentProvider>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. A provider with the same name is replaced in place.
    pub fn register(mut self, provider: impl FragmentProvider + 'static) -> Self {
        self.insert(Arc::new(provider));
        self
    }

    pub fn insert(&mut self, provider: Arc<dyn FragmentProvider>) {
        match self
            .providers
            .iter_mut()
            .find(|p| p.name() == provider.name())
        {
            Some(slot) => *slot = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FragmentProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn FragmentProvider>> {
        self.providers.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Registry of every built-in fragment.
pub fn builtin_registry() -> Registry {
    Registry::new()
        .register(ignores::Gitignore)
        .register(ignores::Ignores)
        .register(base::Javascript)
        .register(base::Node::new())
        .register(base::Jsdoc::new())
        .register(base::Unicorn::new())
        .register(imports::Imports::new())
        .register(language::Jsx)
        .register(language::Typescript::new())
        .register(frameworks::React::new())
        .register(frameworks::Svelte::new())
        .register(frameworks::Astro::new())
        .register(sort::Sort::new())
        .register(stylistic::Stylistic::new())
        .register(addons::Regexp::new())
        .register(addons::Tailwind::new())
        .register(addons::Test::new())
        .register(addons::Pnpm::new())
        .register(data::Jsonc::new())
        .register(data::Yaml::new())
        .register(data::Toml::new())
        .register(data::Markdown::new())
        .register(formatters::Formatters::new())
}

/// Append user overrides to a rule map, replacing same-id entries in place.
pub(crate) fn apply_overrides(rules: &mut RuleMap, overrides: &RuleMap) {
    for (id, entry) in overrides {
        rules.insert(id.clone(), entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_unique() {
        let registry = builtin_registry();
        let names = registry.names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
        assert_eq!(names.len(), 23);
    }

    #[test]
    fn test_builtin_declared_order_follows_stages() {
        let registry = builtin_registry();
        let stages: Vec<Stage> = registry.iter().map(|p| p.stage()).collect();
        let mut sorted = stages.clone();
        sorted.sort();
        assert_eq!(stages, sorted);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = builtin_registry().register(language::Jsx);
        assert_eq!(registry.len(), 23);
        assert_eq!(registry.names()[7], "jsx");
    }

    #[test]
    fn test_block_name() {
        assert_eq!(block_name("test", "rules"), "rulestack/test/rules");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::LanguageExtension.to_string(), "language-extension");
        assert!(Stage::Ignores < Stage::Formatters);
    }
}
