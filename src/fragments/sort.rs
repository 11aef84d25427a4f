//! Sorting rules (perfectionist), switchable per construct.

use super::{FragmentProvider, ProduceContext, Stage, apply_overrides, block_name};
use crate::error::ProviderError;
use crate::options::{Facts, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, RuleBlock, RuleEntry, RuleMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Which constructs get sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortOptions {
    pub array_includes: bool,
    pub classes: bool,
    pub decorators: bool,
    pub enums: bool,
    pub heritage_clauses: bool,
    pub interfaces: bool,
    pub intersection_types: bool,
    pub jsx_props: bool,
    pub maps: bool,
    pub modules: bool,
    pub object_types: bool,
    pub objects: bool,
    pub sets: bool,
    pub switch_case: bool,
    pub union_types: bool,
    pub variable_declarations: bool,
    pub overrides: RuleMap,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            array_includes: true,
            classes: false,
            decorators: true,
            enums: true,
            heritage_clauses: true,
            interfaces: true,
            intersection_types: true,
            jsx_props: true,
            maps: false,
            modules: false,
            object_types: true,
            objects: true,
            sets: true,
            switch_case: true,
            union_types: true,
            variable_declarations: true,
            overrides: RuleMap::new(),
        }
    }
}

impl SortOptions {
    /// Optional rules in emission order, paired with their switch.
    fn switches(&self) -> [(&'static str, bool); 16] {
        [
            ("sort-variable-declarations", self.variable_declarations),
            ("sort-intersection-types", self.intersection_types),
            ("sort-heritage-clauses", self.heritage_clauses),
            ("sort-array-includes", self.array_includes),
            ("sort-object-types", self.object_types),
            ("sort-union-types", self.union_types),
            ("sort-switch-case", self.switch_case),
            ("sort-decorators", self.decorators),
            ("sort-interfaces", self.interfaces),
            ("sort-jsx-props", self.jsx_props),
            ("sort-modules", self.modules),
            ("sort-classes", self.classes),
            ("sort-objects", self.objects),
            ("sort-enums", self.enums),
            ("sort-sets", self.sets),
            ("sort-maps", self.maps),
        ]
    }
}

fn natural() -> Value {
    json!({ "order": "asc", "type": "natural" })
}

pub struct Sort {
    plugin: PluginSlot,
}

impl Sort {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-perfectionist"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Sort {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn stage(&self) -> Stage {
        Stage::Sort
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&SortOptions::default())
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: SortOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut rules = RuleBlock::new(block_name("sort", "rules"))
            .rule("perfectionist/sort-exports", RuleEntry::error().with(natural()))
            .rule(
                "perfectionist/sort-imports",
                RuleEntry::error().with(json!({
                    "groups": [
                        "type",
                        ["parent-type", "sibling-type", "index-type", "internal-type"],
                        "builtin",
                        "external",
                        "internal",
                        ["parent", "sibling", "index"],
                        "side-effect",
                        "object",
                        "unknown"
                    ],
                    "newlinesBetween": "ignore",
                    "order": "asc",
                    "type": "natural"
                })),
            )
            .rule("perfectionist/sort-named-exports", RuleEntry::error().with(natural()))
            .rule("perfectionist/sort-named-imports", RuleEntry::error().with(natural()));

        for (rule, enabled) in options.switches() {
            if !enabled {
                continue;
            }
            let entry = if rule == "sort-modules" {
                RuleEntry::error().with(json!({
                    "order": "asc",
                    "partitionByComment": { "block": false, "line": true },
                    "type": "natural"
                }))
            } else {
                RuleEntry::error().with(natural())
            };
            rules = rules.rule(format!("perfectionist/{}", rule), entry);
        }
        apply_overrides(&mut rules.rules, &options.overrides);

        Ok(vec![
            RuleBlock::new(block_name("sort", "setup")).plugin("perfectionist", plugin),
            rules,
        ])
    }
}
