//! Base language fragments: core JavaScript, Node, JSDoc and unicorn.

use super::{FragmentProvider, ProduceContext, Stage, apply_overrides, block_name};
use crate::error::ProviderError;
use crate::globs::GLOB_SRC;
use crate::options::{Facts, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, RuleBlock, RuleEntry, RuleMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Options shared by fragments that only take rule overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverridesOptions {
    pub overrides: RuleMap,
}

/// Core language rules. Always on.
pub struct Javascript;

#[async_trait]
impl FragmentProvider for Javascript {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn stage(&self) -> Stage {
        Stage::Base
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn required(&self) -> bool {
        true
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&OverridesOptions::default())
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        _cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: OverridesOptions = decode(self.name(), options);

        let setup = RuleBlock::new(block_name("javascript", "setup"))
            .language_options(json!({
                "ecmaVersion": "latest",
                "sourceType": "module",
                "parserOptions": {
                    "ecmaFeatures": { "jsx": true },
                    "ecmaVersion": "latest",
                    "sourceType": "module"
                }
            }))
            .linter_options(json!({ "reportUnusedDisableDirectives": true }));

        let mut rules = RuleMap::new();
        rules.insert("array-callback-return".into(), RuleEntry::error());
        rules.insert("eqeqeq".into(), RuleEntry::error().with("smart"));
        rules.insert("no-debugger".into(), RuleEntry::error());
        rules.insert("no-dupe-keys".into(), RuleEntry::error());
        rules.insert("no-empty".into(), RuleEntry::error().with(json!({ "allowEmptyCatch": true })));
        rules.insert("no-unused-expressions".into(), RuleEntry::error().with(json!({
            "allowShortCircuit": true,
            "allowTaggedTemplates": true,
            "allowTernary": true
        })));
        rules.insert("no-unused-vars".into(), RuleEntry::error().with(json!({
            "args": "none",
            "caughtErrors": "none",
            "ignoreRestSiblings": true,
            "vars": "all"
        })));
        rules.insert("no-var".into(), RuleEntry::error());
        rules.insert("prefer-const".into(), RuleEntry::error().with(json!({
            "destructuring": "all",
            "ignoreReadBeforeAssign": true
        })));
        rules.insert("prefer-template".into(), RuleEntry::error());
        apply_overrides(&mut rules, &options.overrides);

        let mut block = RuleBlock::new(block_name("javascript", "rules"));
        block.rules = rules;
        Ok(vec![setup, block])
    }
}

/// Node runtime rules.
pub struct Node {
    plugin: PluginSlot,
}

impl Node {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-n"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Node {
    fn name(&self) -> &'static str {
        "node"
    }

    fn stage(&self) -> Stage {
        Stage::Base
    }

    fn default_enabled(&self) -> bool {
        true
    }

    async fn produce(
        &self,
        _options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let plugin = self.plugin.get(cx.loader).await?;
        Ok(vec![
            RuleBlock::new(block_name("node", "rules"))
                .plugin("n", plugin)
                .rule("n/handle-callback-err", RuleEntry::error().with("^(err|error)$"))
                .rule("n/no-deprecated-api", RuleEntry::error())
                .rule("n/no-exports-assign", RuleEntry::error())
                .rule("n/no-new-require", RuleEntry::error())
                .rule("n/no-path-concat", RuleEntry::error())
                .rule("n/prefer-global/buffer", RuleEntry::error().with("never"))
                .rule("n/prefer-global/process", RuleEntry::error().with("never"))
                .rule("n/process-exit-as-throw", RuleEntry::error()),
        ])
    }
}

/// Options of the `jsdoc` fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsdocOptions {
    /// Add formatting rules for doc comments.
    pub stylistic: bool,
}

/// Doc comment rules.
pub struct Jsdoc {
    plugin: PluginSlot,
}

impl Jsdoc {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-jsdoc"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Jsdoc {
    fn name(&self) -> &'static str {
        "jsdoc"
    }

    fn stage(&self) -> Stage {
        Stage::Base
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&JsdocOptions {
            stylistic: facts.stylistic().is_some(),
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: JsdocOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut block = RuleBlock::new(block_name("jsdoc", "rules"))
            .plugin("jsdoc", plugin)
            .rule("jsdoc/check-access", RuleEntry::warn())
            .rule("jsdoc/check-param-names", RuleEntry::warn())
            .rule("jsdoc/check-property-names", RuleEntry::warn())
            .rule("jsdoc/check-types", RuleEntry::warn())
            .rule("jsdoc/empty-tags", RuleEntry::warn())
            .rule("jsdoc/implements-on-classes", RuleEntry::warn())
            .rule("jsdoc/no-defaults", RuleEntry::warn())
            .rule("jsdoc/require-param-name", RuleEntry::warn())
            .rule("jsdoc/require-returns-check", RuleEntry::warn());
        if options.stylistic {
            block = block
                .rule("jsdoc/check-alignment", RuleEntry::warn())
                .rule("jsdoc/multiline-blocks", RuleEntry::warn());
        }
        Ok(vec![block])
    }
}

/// Options of the `unicorn` fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnicornOptions {
    /// Enable every recommended rule instead of the curated subset.
    pub all_recommended: bool,
    pub overrides: RuleMap,
}

/// Curated unicorn rules.
pub struct Unicorn {
    plugin: PluginSlot,
}

impl Unicorn {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-unicorn"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Unicorn {
    fn name(&self) -> &'static str {
        "unicorn"
    }

    fn stage(&self) -> Stage {
        Stage::Base
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&UnicornOptions::default())
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: UnicornOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut block = RuleBlock::new(block_name("unicorn", "rules")).plugin("unicorn", plugin);
        if options.all_recommended {
            // The plugin's own recommended set is pulled in by the consuming tool
            block = block.settings(json!({ "unicorn": { "extends": "recommended" } }));
        } else {
            block = block
                .rule("unicorn/consistent-empty-array-spread", RuleEntry::error())
                .rule("unicorn/error-message", RuleEntry::error())
                .rule("unicorn/escape-case", RuleEntry::error())
                .rule("unicorn/new-for-builtins", RuleEntry::error())
                .rule("unicorn/no-instanceof-builtins", RuleEntry::error())
                .rule("unicorn/no-new-array", RuleEntry::error())
                .rule("unicorn/no-new-buffer", RuleEntry::error())
                .rule("unicorn/number-literal-case", RuleEntry::error())
                .rule("unicorn/prefer-dom-node-text-content", RuleEntry::error())
                .rule("unicorn/prefer-includes", RuleEntry::error())
                .rule("unicorn/prefer-node-protocol", RuleEntry::error())
                .rule("unicorn/prefer-number-properties", RuleEntry::error())
                .rule("unicorn/prefer-string-starts-ends-with", RuleEntry::error())
                .rule("unicorn/prefer-type-error", RuleEntry::error())
                .rule("unicorn/throw-new-error", RuleEntry::error());
        }
        apply_overrides(&mut block.rules, &options.overrides);
        Ok(vec![block.files([GLOB_SRC])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::BuiltinLoader;
    use serde_json::Value;
    use std::path::Path;

    fn record(value: Value) -> OptionsRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    async fn produce(provider: &dyn FragmentProvider, options: OptionsRecord) -> Vec<RuleBlock> {
        let loader = BuiltinLoader::new();
        let cx = ProduceContext {
            loader: &loader,
            root: Path::new("."),
        };
        provider.produce(&options, &cx).await.unwrap()
    }

    #[tokio::test]
    async fn test_javascript_overrides_replace_in_place() {
        let options = record(json!({"overrides": {"no-var": "off", "no-alert": "warn"}}));
        let blocks = produce(&Javascript, options).await;
        let rules = &blocks[1].rules;
        assert!(!rules["no-var"].is_enabled());
        assert_eq!(rules.keys().last().map(String::as_str), Some("no-alert"));
    }

    #[tokio::test]
    async fn test_jsdoc_follows_stylistic_fact() {
        let jsdoc = Jsdoc::new();
        let plain = produce(&jsdoc, jsdoc.defaults(&Facts::default())).await;
        assert!(!plain[0].rules.contains_key("jsdoc/check-alignment"));

        let styled = produce(&jsdoc, record(json!({"stylistic": true}))).await;
        assert!(styled[0].rules.contains_key("jsdoc/check-alignment"));
    }

    #[tokio::test]
    async fn test_unicorn_all_recommended() {
        let unicorn = Unicorn::new();
        let blocks = produce(&unicorn, record(json!({"all_recommended": true}))).await;
        assert!(blocks[0].rules.is_empty());
        assert!(blocks[0].settings.is_some());
    }

    #[tokio::test]
    async fn test_node_uses_natural_plugin_id() {
        let blocks = produce(&Node::new(), OptionsRecord::new()).await;
        assert_eq!(blocks[0].plugins["n"].id(), "eslint-plugin-n");
        assert!(blocks[0].rules.keys().all(|id| id.starts_with("n/")));
    }
}
