//! Framework rules: React, Svelte and Astro.

use super::{FragmentProvider, ProduceContext, Stage, apply_overrides, block_name};
use crate::error::ProviderError;
use crate::globs::{GLOB_ASTRO, GLOB_SRC, GLOB_SVELTE};
use crate::options::{Facts, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, RuleBlock, RuleEntry, RuleMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Options of the `react` fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactOptions {
    /// Inherited from the typescript options; enables type-aware React rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsconfig_path: Option<String>,
    pub overrides: RuleMap,
}

/// React rules. Depends on the typescript fragment for parsing.
pub struct React {
    react: PluginSlot,
    hooks: PluginSlot,
    refresh: PluginSlot,
}

impl React {
    pub fn new() -> Self {
        Self {
            react: PluginSlot::new("@eslint-react/eslint-plugin"),
            hooks: PluginSlot::new("eslint-plugin-react-hooks"),
            refresh: PluginSlot::new("eslint-plugin-react-refresh"),
        }
    }
}

#[async_trait]
impl FragmentProvider for React {
    fn name(&self) -> &'static str {
        "react"
    }

    fn stage(&self) -> Stage {
        Stage::LanguageExtension
    }

    fn requires(&self) -> &'static [&'static str] {
        &["typescript"]
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        let tsconfig_path = facts
            .typescript()
            .get("tsconfig_path")
            .and_then(Value::as_str)
            .map(str::to_string);
        to_record(&ReactOptions {
            tsconfig_path,
            overrides: RuleMap::new(),
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: ReactOptions = decode(self.name(), options);
        let (react, hooks, refresh) = futures::try_join!(
            self.react.get(cx.loader),
            self.hooks.get(cx.loader),
            self.refresh.get(cx.loader)
        )?;

        let setup = RuleBlock::new(block_name("react", "setup"))
            .plugin("@eslint-react", react.clone())
            .plugin("@eslint-react/dom", react.clone())
            .plugin("@eslint-react/hooks-extra", react.clone())
            .plugin("@eslint-react/naming-convention", react)
            .plugin("react-hooks", hooks)
            .plugin("react-refresh", refresh);

        let mut rules = RuleBlock::new(block_name("react", "rules"))
            .files([GLOB_SRC])
            .language_options(json!({
                "parserOptions": { "ecmaFeatures": { "jsx": true } },
                "sourceType": "module"
            }))
            .rule("@eslint-react/dom/no-dangerously-set-innerhtml", RuleEntry::warn())
            .rule("@eslint-react/dom/no-missing-button-type", RuleEntry::warn())
            .rule("@eslint-react/dom/no-unsafe-target-blank", RuleEntry::warn())
            .rule("@eslint-react/hooks-extra/no-direct-set-state-in-use-effect", RuleEntry::warn())
            .rule("@eslint-react/naming-convention/context-name", RuleEntry::warn())
            .rule("@eslint-react/no-array-index-key", RuleEntry::warn())
            .rule("@eslint-react/no-direct-mutation-state", RuleEntry::error())
            .rule("@eslint-react/no-missing-key", RuleEntry::error())
            .rule("react-hooks/exhaustive-deps", RuleEntry::warn())
            .rule("react-hooks/rules-of-hooks", RuleEntry::error())
            .rule(
                "react-refresh/only-export-components",
                RuleEntry::warn().with(json!({ "allowConstantExport": true })),
            );
        apply_overrides(&mut rules.rules, &options.overrides);

        let mut blocks = vec![setup, rules];
        if options.tsconfig_path.is_some() {
            blocks.push(
                RuleBlock::new(block_name("react", "type-aware-rules"))
                    .files([GLOB_SRC])
                    .rule("@eslint-react/no-leaked-conditional-rendering", RuleEntry::warn()),
            );
        }
        Ok(blocks)
    }
}

/// Indent and quote style read from the shared stylistic options.
fn stylistic_layout(stylistic: &Value) -> Option<(Value, Value)> {
    let map = stylistic.as_object()?;
    let indent = map.get("indent").cloned().unwrap_or(json!(2));
    let quotes = map.get("quotes").cloned().unwrap_or(json!("single"));
    Some((indent, quotes))
}

/// Options of the `svelte` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvelteOptions {
    pub files: Vec<String>,
    /// Parse script blocks with the TypeScript parser.
    pub typescript: bool,
    /// Stylistic options, or `false`.
    pub stylistic: Value,
    pub overrides: RuleMap,
}

impl Default for SvelteOptions {
    fn default() -> Self {
        Self {
            files: vec![GLOB_SVELTE.to_string()],
            typescript: false,
            stylistic: Value::Bool(false),
            overrides: RuleMap::new(),
        }
    }
}

pub struct Svelte {
    plugin: PluginSlot,
}

impl Svelte {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-svelte"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Svelte {
    fn name(&self) -> &'static str {
        "svelte"
    }

    fn stage(&self) -> Stage {
        Stage::LanguageExtension
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&SvelteOptions {
            typescript: facts.is_enabled("typescript"),
            stylistic: facts.stylistic_value(),
            ..Default::default()
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: SvelteOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let parser_options = if options.typescript {
            json!({ "extraFileExtensions": [".svelte"], "parser": "@typescript-eslint/parser" })
        } else {
            json!({ "extraFileExtensions": [".svelte"] })
        };

        let mut rules = RuleBlock::new(block_name("svelte", "rules"))
            .files(options.files)
            .language_options(json!({
                "parser": "svelte-eslint-parser",
                "parserOptions": parser_options,
            }))
            .processor("svelte/svelte")
            .rule("no-undef", RuleEntry::off())
            .rule("svelte/comment-directive", RuleEntry::error())
            .rule("svelte/no-at-debug-tags", RuleEntry::error())
            .rule("svelte/no-at-html-tags", RuleEntry::error())
            .rule("svelte/no-dupe-else-if-blocks", RuleEntry::error())
            .rule("svelte/no-dupe-style-properties", RuleEntry::error())
            .rule("svelte/no-unused-svelte-ignore", RuleEntry::error())
            .rule("svelte/valid-compile", RuleEntry::error());
        if let Some((indent, quotes)) = stylistic_layout(&options.stylistic) {
            rules = rules
                .rule("@stylistic/indent", RuleEntry::off())
                .rule("svelte/html-quotes", RuleEntry::error().with(json!({ "prefer": quotes })))
                .rule("svelte/indent", RuleEntry::error().with(json!({ "alignAttributesVertically": true, "indent": indent })))
                .rule("svelte/spaced-html-comment", RuleEntry::error());
        }
        apply_overrides(&mut rules.rules, &options.overrides);

        Ok(vec![
            RuleBlock::new(block_name("svelte", "setup")).plugin("svelte", plugin),
            rules,
        ])
    }
}

/// Options of the `astro` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AstroOptions {
    pub files: Vec<String>,
    /// Stylistic options, or `false`.
    pub stylistic: Value,
    pub overrides: RuleMap,
}

impl Default for AstroOptions {
    fn default() -> Self {
        Self {
            files: vec![GLOB_ASTRO.to_string()],
            stylistic: Value::Bool(false),
            overrides: RuleMap::new(),
        }
    }
}

pub struct Astro {
    plugin: PluginSlot,
}

impl Astro {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-astro"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Astro {
    fn name(&self) -> &'static str {
        "astro"
    }

    fn stage(&self) -> Stage {
        Stage::LanguageExtension
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&AstroOptions {
            stylistic: facts.stylistic_value(),
            ..Default::default()
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: AstroOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut rules = RuleBlock::new(block_name("astro", "rules"))
            .files(options.files)
            .language_options(json!({
                "parser": "astro-eslint-parser",
                "parserOptions": {
                    "extraFileExtensions": [".astro"],
                    "parser": "@typescript-eslint/parser"
                },
                "sourceType": "module"
            }))
            .processor("astro/client-side-ts")
            .rule("astro/missing-client-only-directive-value", RuleEntry::error())
            .rule("astro/no-conflict-set-directives", RuleEntry::error())
            .rule("astro/no-deprecated-astro-canonicalurl", RuleEntry::error())
            .rule("astro/no-deprecated-astro-fetchcontent", RuleEntry::error())
            .rule("astro/no-deprecated-astro-resolve", RuleEntry::error())
            .rule("astro/no-deprecated-getentrybyslug", RuleEntry::error())
            .rule("astro/no-set-html-directive", RuleEntry::off())
            .rule("astro/no-unused-define-vars-in-style", RuleEntry::error())
            .rule("astro/semi", RuleEntry::off())
            .rule("astro/valid-compile", RuleEntry::error());
        if options.stylistic.is_object() {
            rules = rules
                .rule("@stylistic/indent", RuleEntry::off())
                .rule("@stylistic/jsx-closing-tag-location", RuleEntry::off())
                .rule("@stylistic/jsx-one-expression-per-line", RuleEntry::off())
                .rule("@stylistic/no-multiple-empty-lines", RuleEntry::off());
        }
        apply_overrides(&mut rules.rules, &options.overrides);

        Ok(vec![
            RuleBlock::new(block_name("astro", "setup")).plugin("astro", plugin),
            rules,
        ])
    }
}
