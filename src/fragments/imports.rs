//! Import and module rules.

use super::{FragmentProvider, ProduceContext, Stage, apply_overrides, block_name};
use crate::error::ProviderError;
use crate::options::{Facts, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, RuleBlock, RuleEntry, RuleMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportsOptions {
    /// Add layout rules (newline after imports, no duplicate specifiers).
    pub stylistic: bool,
    pub overrides: RuleMap,
}

pub struct Imports {
    plugin: PluginSlot,
}

impl Imports {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-import-lite"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Imports {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn stage(&self) -> Stage {
        Stage::Imports
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&ImportsOptions {
            stylistic: facts.stylistic().is_some(),
            overrides: RuleMap::new(),
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: ImportsOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut block = RuleBlock::new(block_name("imports", "rules"))
            .plugin("import-lite", plugin)
            .rule("import-lite/consistent-type-specifier-style", RuleEntry::error().with("top-level"))
            .rule("import-lite/first", RuleEntry::error())
            .rule("import-lite/no-duplicates", RuleEntry::error())
            .rule("import-lite/no-mutable-exports", RuleEntry::error())
            .rule("import-lite/no-named-default", RuleEntry::error());
        if options.stylistic {
            block = block.rule(
                "import-lite/newline-after-import",
                RuleEntry::error().with(serde_json::json!({ "count": 1 })),
            );
        }
        apply_overrides(&mut block.rules, &options.overrides);
        Ok(vec![block])
    }
}
