//! Domain add-ons: regular expressions, Tailwind classes, tests and pnpm catalogs.

use super::{FragmentProvider, ProduceContext, Stage, apply_overrides, block_name};
use crate::error::ProviderError;
use crate::globs::{GLOB_PACKAGE_JSON, GLOB_PNPM_WORKSPACE, GLOB_SRC, glob_tests};
use crate::options::{Facts, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, RuleBlock, RuleEntry, RuleMap, Severity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Options of the `regexp` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexpOptions {
    /// Severity of every enabled rule: `error` or `warn`.
    pub level: String,
    pub overrides: RuleMap,
}

impl Default for RegexpOptions {
    fn default() -> Self {
        Self {
            level: "error".to_string(),
            overrides: RuleMap::new(),
        }
    }
}

pub struct Regexp {
    plugin: PluginSlot,
}

impl Regexp {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-regexp"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Regexp {
    fn name(&self) -> &'static str {
        "regexp"
    }

    fn stage(&self) -> Stage {
        Stage::AddOns
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&RegexpOptions::default())
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: RegexpOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;
        let severity = if options.level == "warn" {
            Severity::Warn
        } else {
            Severity::Error
        };

        let mut block = RuleBlock::new(block_name("regexp", "rules"))
            .plugin("regexp", plugin)
            .rules(
                [
                    "regexp/control-character-escape",
                    "regexp/match-any",
                    "regexp/no-dupe-characters-character-class",
                    "regexp/no-empty-capturing-group",
                    "regexp/no-super-linear-backtracking",
                    "regexp/no-useless-escape",
                    "regexp/no-useless-lazy",
                    "regexp/prefer-character-class",
                    "regexp/prefer-quantifier",
                    "regexp/strict",
                ]
                .map(|id| (id, RuleEntry::new(severity))),
            );
        apply_overrides(&mut block.rules, &options.overrides);
        Ok(vec![block])
    }
}

/// Options of the `tailwind` fragment. Lists extend the built-in ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailwindOptions {
    /// Stylesheet holding the Tailwind configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    pub attributes: Vec<String>,
    pub callees: Vec<String>,
    pub tags: Vec<String>,
    pub variables: Vec<String>,
    pub overrides: RuleMap,
}

const TAILWIND_ATTRIBUTES: &[&str] = &["class", "className"];
const TAILWIND_CALLEES: &[&str] = &[
    "cc", "clb", "clsx", "cn", "cnb", "ctl", "cva", "cx", "dcnb", "objstr", "tv", "twJoin",
    "twMerge",
];
const TAILWIND_VARIABLES: &[&str] = &["className", "classNames", "classes", "style", "styles"];

fn extend(builtin: &[&str], extra: &[String]) -> Vec<String> {
    builtin
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().cloned())
        .collect()
}

pub struct Tailwind {
    plugin: PluginSlot,
}

impl Tailwind {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-better-tailwindcss"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Tailwind {
    fn name(&self) -> &'static str {
        "tailwind"
    }

    fn stage(&self) -> Stage {
        Stage::AddOns
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&TailwindOptions::default())
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: TailwindOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let matchers = json!({
            "attributes": extend(TAILWIND_ATTRIBUTES, &options.attributes),
            "callees": extend(TAILWIND_CALLEES, &options.callees),
            "tags": options.tags,
            "variables": extend(TAILWIND_VARIABLES, &options.variables),
        });
        let entry_point = options
            .entry_point
            .as_ref()
            .map_or(Value::Null, |p| Value::String(p.clone()));
        let with = |extra: Value| {
            let mut merged = matchers.clone();
            if let (Value::Object(target), Value::Object(extra)) = (&mut merged, extra) {
                target.extend(extra);
            }
            RuleEntry::error().with(merged)
        };

        let mut block = RuleBlock::new(block_name("tailwind", "rules"))
            .files([GLOB_SRC])
            .plugin("better-tailwindcss", plugin)
            .rule(
                "better-tailwindcss/enforce-consistent-class-order",
                with(json!({ "entryPoint": entry_point, "order": "improved" })),
            )
            .rule(
                "better-tailwindcss/enforce-consistent-line-wrapping",
                with(json!({ "entryPoint": entry_point, "group": "newLine", "printWidth": 10000 })),
            )
            .rule(
                "better-tailwindcss/enforce-consistent-variable-syntax",
                with(json!({ "syntax": "parentheses" })),
            )
            .rule(
                "better-tailwindcss/no-conflicting-classes",
                with(json!({ "entryPoint": entry_point })),
            )
            .rule("better-tailwindcss/no-duplicate-classes", with(json!({})))
            .rule(
                "better-tailwindcss/no-unnecessary-whitespace",
                with(json!({ "allowMultiline": true })),
            )
            .rule(
                "better-tailwindcss/no-unregistered-classes",
                with(json!({ "detectComponentClasses": false, "entryPoint": entry_point })),
            )
            .settings(json!({ "better-tailwindcss": { "entryPoint": entry_point } }));
        apply_overrides(&mut block.rules, &options.overrides);
        Ok(vec![block])
    }
}

/// Options of the `test` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestOptions {
    pub files: Vec<String>,
    /// Turn off TypeScript rules that do not fit test files.
    pub typescript: bool,
    pub overrides: RuleMap,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            files: glob_tests(),
            typescript: false,
            overrides: RuleMap::new(),
        }
    }
}

/// Vitest rules for test files.
pub struct Test {
    plugin: PluginSlot,
}

impl Test {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("@vitest/eslint-plugin"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Test {
    fn name(&self) -> &'static str {
        "test"
    }

    fn stage(&self) -> Stage {
        Stage::AddOns
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&TestOptions {
            typescript: facts.is_enabled("typescript"),
            ..Default::default()
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: TestOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut rules = RuleBlock::new(block_name("test", "rules"))
            .files(options.files)
            .rule(
                "vitest/consistent-test-it",
                RuleEntry::error().with(json!({ "fn": "it", "withinDescribe": "it" })),
            )
            .rule("vitest/no-identical-title", RuleEntry::error())
            .rule("vitest/no-import-node-test", RuleEntry::error())
            .rule("vitest/no-only-tests", RuleEntry::error())
            .rule("vitest/prefer-hooks-in-order", RuleEntry::error())
            .rule("vitest/prefer-lowercase-title", RuleEntry::error())
            .rule("antfu/no-top-level-await", RuleEntry::off())
            .rule("no-unused-expressions", RuleEntry::off())
            .rule("n/prefer-global/process", RuleEntry::off());
        if options.typescript {
            rules = rules.rule("@typescript-eslint/explicit-function-return-type", RuleEntry::off());
        }
        apply_overrides(&mut rules.rules, &options.overrides);

        Ok(vec![
            RuleBlock::new(block_name("test", "setup")).plugin("vitest", plugin),
            rules,
        ])
    }
}

/// Options of the `pnpm` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PnpmOptions {
    /// Check catalog usage in `package.json`.
    pub json: bool,
    /// Check the workspace file.
    pub yaml: bool,
}

impl Default for PnpmOptions {
    fn default() -> Self {
        Self {
            json: true,
            yaml: true,
        }
    }
}

/// pnpm catalog rules.
pub struct Pnpm {
    plugin: PluginSlot,
}

impl Pnpm {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-pnpm"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Pnpm {
    fn name(&self) -> &'static str {
        "pnpm"
    }

    fn stage(&self) -> Stage {
        Stage::AddOns
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&PnpmOptions::default())
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: PnpmOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut blocks = Vec::new();
        if options.json {
            blocks.push(
                RuleBlock::new(block_name("pnpm", "package-json"))
                    .files([GLOB_PACKAGE_JSON])
                    .language_options(json!({ "parser": "jsonc-eslint-parser" }))
                    .plugin("pnpm", plugin.clone())
                    .rule("pnpm/json-enforce-catalog", RuleEntry::error())
                    .rule("pnpm/json-prefer-workspace-settings", RuleEntry::error())
                    .rule("pnpm/json-valid-catalog", RuleEntry::error()),
            );
        }
        if options.yaml {
            blocks.push(
                RuleBlock::new(block_name("pnpm", "pnpm-workspace-yaml"))
                    .files([GLOB_PNPM_WORKSPACE])
                    .language_options(json!({ "parser": "yaml-eslint-parser" }))
                    .plugin("pnpm", plugin)
                    .rule("pnpm/yaml-no-duplicate-catalog-item", RuleEntry::error())
                    .rule("pnpm/yaml-no-unused-catalog-item", RuleEntry::error()),
            );
        }
        Ok(blocks)
    }
}
