//! Structured-data formats: JSON, YAML, TOML and Markdown.
//!
//! Blocks of these fragments are repeatable: several sub-formats may emit
//! blocks under the same name.

use super::{FragmentProvider, ProduceContext, Stage, apply_overrides, block_name};
use crate::error::ProviderError;
use crate::globs::{
    GLOB_JSON, GLOB_JSON5, GLOB_JSONC, GLOB_MARKDOWN, GLOB_MARKDOWN_CODE,
    GLOB_MARKDOWN_IN_MARKDOWN, GLOB_PACKAGE_JSON, GLOB_TOML, GLOB_TSCONFIG, GLOB_TURBO_JSON,
    GLOB_YAML,
};
use crate::options::{Facts, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, RuleBlock, RuleEntry, RuleMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Indent width and quote style from the shared stylistic options.
///
/// Tab indentation falls back to 2 for formats that cannot use tabs.
#[derive(Debug, Clone, PartialEq)]
struct Layout {
    indent: u64,
    quotes: String,
}

impl Layout {
    fn from_stylistic(stylistic: &Value) -> Option<Self> {
        let map = stylistic.as_object()?;
        Some(Self {
            indent: map.get("indent").and_then(Value::as_u64).unwrap_or(2),
            quotes: map
                .get("quotes")
                .and_then(Value::as_str)
                .unwrap_or("single")
                .to_string(),
        })
    }
}

/// Options shared by the data-format fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataOptions {
    pub files: Vec<String>,
    /// Stylistic options, or `false`.
    pub stylistic: Value,
    pub overrides: RuleMap,
}

impl DataOptions {
    fn new(files: &[&str], facts: &Facts) -> Self {
        Self {
            files: files.iter().map(|s| s.to_string()).collect(),
            stylistic: facts.stylistic_value(),
            overrides: RuleMap::new(),
        }
    }
}

impl Default for DataOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            stylistic: Value::Bool(false),
            overrides: RuleMap::new(),
        }
    }
}

/// Options of the `jsonc` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsoncOptions {
    #[serde(flatten)]
    pub data: DataOptions,
    /// Enforce key order in `package.json`.
    pub sort_package_json: bool,
    /// Enforce key order in `tsconfig.json`.
    pub sort_tsconfig: bool,
    /// Enforce key order in `turbo.json`.
    pub sort_turbo: bool,
}

impl Default for JsoncOptions {
    fn default() -> Self {
        Self {
            data: DataOptions::default(),
            sort_package_json: true,
            sort_tsconfig: true,
            sort_turbo: true,
        }
    }
}

fn key_order(order: &[&str], path: &str) -> Value {
    json!({ "order": order, "pathPattern": path })
}

pub struct Jsonc {
    plugin: PluginSlot,
}

impl Jsonc {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-jsonc"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Jsonc {
    fn name(&self) -> &'static str {
        "jsonc"
    }

    fn stage(&self) -> Stage {
        Stage::DataFormats
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn repeatable(&self) -> bool {
        true
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&JsoncOptions {
            data: DataOptions::new(&[GLOB_JSON, GLOB_JSON5, GLOB_JSONC], facts),
            ..Default::default()
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: JsoncOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;
        let parser = json!({ "parser": "jsonc-eslint-parser" });

        let mut rules = RuleBlock::new(block_name("jsonc", "rules"))
            .files(options.data.files)
            .language_options(parser.clone())
            .rule("jsonc/no-bigint-literals", RuleEntry::error())
            .rule("jsonc/no-dupe-keys", RuleEntry::error())
            .rule("jsonc/no-nan", RuleEntry::error())
            .rule("jsonc/no-octal-escape", RuleEntry::error())
            .rule("jsonc/no-sparse-arrays", RuleEntry::error())
            .rule("jsonc/no-undefined-value", RuleEntry::error())
            .rule("jsonc/valid-json-number", RuleEntry::error());
        if let Some(layout) = Layout::from_stylistic(&options.data.stylistic) {
            rules = rules
                .rule("jsonc/comma-dangle", RuleEntry::error().with("never"))
                .rule("jsonc/indent", RuleEntry::error().with(layout.indent))
                .rule("jsonc/key-spacing", RuleEntry::error().with(json!({ "afterColon": true, "beforeColon": false })))
                .rule("jsonc/quote-props", RuleEntry::error())
                .rule("jsonc/quotes", RuleEntry::error());
        }
        apply_overrides(&mut rules.rules, &options.data.overrides);

        let mut blocks = vec![
            RuleBlock::new(block_name("jsonc", "setup")).plugin("jsonc", plugin),
            rules,
        ];

        if options.sort_package_json {
            blocks.push(
                RuleBlock::new(block_name("jsonc", "sort-package-json"))
                    .files([GLOB_PACKAGE_JSON])
                    .language_options(parser.clone())
                    .rule(
                        "jsonc/sort-array-values",
                        RuleEntry::error().with(json!({ "order": { "type": "asc" }, "pathPattern": "^files$" })),
                    )
                    .rule(
                        "jsonc/sort-keys",
                        RuleEntry::error()
                            .with(key_order(
                                &[
                                    "publisher", "name", "displayName", "type", "version",
                                    "private", "packageManager", "description", "author",
                                    "license", "funding", "homepage", "repository", "bugs",
                                    "keywords", "categories", "sideEffects", "exports", "main",
                                    "module", "types", "bin", "files", "engines", "scripts",
                                    "peerDependencies", "dependencies", "devDependencies",
                                ],
                                "^$",
                            ))
                            .with(json!({ "order": { "type": "asc" }, "pathPattern": "^(?:dev|peer|optional|bundled)?[Dd]ependencies(Meta)?$" })),
                    ),
            );
        }

        if options.sort_tsconfig {
            blocks.push(
                RuleBlock::new(block_name("jsonc", "sort-tsconfig"))
                    .files(GLOB_TSCONFIG.iter().copied())
                    .language_options(parser.clone())
                    .rule(
                        "jsonc/sort-keys",
                        RuleEntry::error().with(key_order(
                            &["extends", "compilerOptions", "references", "files", "include", "exclude"],
                            "^$",
                        )),
                    ),
            );
        }

        if options.sort_turbo {
            blocks.push(
                RuleBlock::new(block_name("jsonc", "sort-turbo"))
                    .files([GLOB_TURBO_JSON])
                    .language_options(parser)
                    .rule(
                        "jsonc/sort-keys",
                        RuleEntry::error()
                            .with(key_order(&["$schema", "extends", "tasks"], "^$"))
                            .with(json!({ "order": { "type": "asc" }, "pathPattern": "^tasks$" })),
                    ),
            );
        }

        Ok(blocks)
    }
}

pub struct Yaml {
    plugin: PluginSlot,
}

impl Yaml {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-yml"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Yaml {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn stage(&self) -> Stage {
        Stage::DataFormats
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn repeatable(&self) -> bool {
        true
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&DataOptions::new(&[GLOB_YAML], facts))
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: DataOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut rules = RuleBlock::new(block_name("yaml", "rules"))
            .files(options.files)
            .language_options(json!({ "parser": "yaml-eslint-parser" }))
            .rule("yml/block-mapping", RuleEntry::error())
            .rule("yml/block-sequence", RuleEntry::error())
            .rule("yml/no-empty-key", RuleEntry::error())
            .rule("yml/no-empty-sequence-entry", RuleEntry::error())
            .rule("yml/no-irregular-whitespace", RuleEntry::error())
            .rule("yml/plain-scalar", RuleEntry::error());
        if let Some(layout) = Layout::from_stylistic(&options.stylistic) {
            let prefer = if layout.quotes == "double" { "double" } else { "single" };
            rules = rules
                .rule("@stylistic/spaced-comment", RuleEntry::off())
                .rule("yml/indent", RuleEntry::error().with(layout.indent))
                .rule("yml/key-spacing", RuleEntry::error())
                .rule("yml/no-multiple-empty-lines", RuleEntry::error())
                .rule("yml/quotes", RuleEntry::error().with(json!({ "avoidEscape": true, "prefer": prefer })))
                .rule("yml/spaced-comment", RuleEntry::error());
        }
        apply_overrides(&mut rules.rules, &options.overrides);

        Ok(vec![
            RuleBlock::new(block_name("yaml", "setup")).plugin("yml", plugin),
            rules,
        ])
    }
}

pub struct Toml {
    plugin: PluginSlot,
}

impl Toml {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-toml"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Toml {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn stage(&self) -> Stage {
        Stage::DataFormats
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn repeatable(&self) -> bool {
        true
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&DataOptions::new(&[GLOB_TOML], facts))
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: DataOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let mut rules = RuleBlock::new(block_name("toml", "rules"))
            .files(options.files)
            .language_options(json!({ "parser": "toml-eslint-parser" }))
            .rule("toml/comma-style", RuleEntry::error())
            .rule("toml/keys-order", RuleEntry::error())
            .rule("toml/no-space-dots", RuleEntry::error())
            .rule("toml/no-unreadable-number-separator", RuleEntry::error())
            .rule("toml/precision-of-fractional-seconds", RuleEntry::error())
            .rule("toml/precision-of-integer", RuleEntry::error())
            .rule("toml/tables-order", RuleEntry::error());
        if let Some(layout) = Layout::from_stylistic(&options.stylistic) {
            rules = rules
                .rule("@stylistic/spaced-comment", RuleEntry::off())
                .rule("toml/array-bracket-newline", RuleEntry::error())
                .rule("toml/array-bracket-spacing", RuleEntry::error())
                .rule("toml/indent", RuleEntry::error().with(layout.indent))
                .rule("toml/key-spacing", RuleEntry::error())
                .rule("toml/spaced-comment", RuleEntry::error());
        }
        apply_overrides(&mut rules.rules, &options.overrides);

        Ok(vec![
            RuleBlock::new(block_name("toml", "setup")).plugin("toml", plugin),
            rules,
        ])
    }
}

/// Options of the `markdown` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    pub files: Vec<String>,
    /// Component extensions whose fenced code blocks are linted too.
    pub component_exts: Vec<String>,
    pub overrides: RuleMap,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            files: vec![GLOB_MARKDOWN.to_string()],
            component_exts: Vec::new(),
            overrides: RuleMap::new(),
        }
    }
}

/// Markdown files and the code blocks embedded in them.
pub struct Markdown {
    plugin: PluginSlot,
}

impl Markdown {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("@eslint/markdown"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Markdown {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn stage(&self) -> Stage {
        Stage::DataFormats
    }

    fn repeatable(&self) -> bool {
        true
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&MarkdownOptions {
            component_exts: facts.component_exts().to_vec(),
            ..Default::default()
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: MarkdownOptions = decode(self.name(), options);
        let plugin = self.plugin.get(cx.loader).await?;

        let code_files = std::iter::once(GLOB_MARKDOWN_CODE.to_string()).chain(
            options
                .component_exts
                .iter()
                .map(|ext| format!("{}/**/*.{}", GLOB_MARKDOWN, ext)),
        );

        let mut disables = RuleBlock::new(block_name("markdown", "disables"))
            .files(code_files)
            .language_options(json!({
                "parserOptions": { "ecmaFeatures": { "impliedStrict": true } }
            }))
            .rule("no-alert", RuleEntry::off())
            .rule("no-console", RuleEntry::off())
            .rule("no-labels", RuleEntry::off())
            .rule("no-undef", RuleEntry::off())
            .rule("no-unused-expressions", RuleEntry::off())
            .rule("no-unused-labels", RuleEntry::off())
            .rule("no-unused-vars", RuleEntry::off())
            .rule("n/prefer-global/process", RuleEntry::off())
            .rule("@stylistic/comma-dangle", RuleEntry::off())
            .rule("@stylistic/eol-last", RuleEntry::off())
            .rule("@typescript-eslint/consistent-type-imports", RuleEntry::off())
            .rule("@typescript-eslint/no-namespace", RuleEntry::off())
            .rule("@typescript-eslint/no-unused-vars", RuleEntry::off())
            .rule("@typescript-eslint/no-use-before-define", RuleEntry::off())
            .rule("unicode-bom", RuleEntry::off());
        apply_overrides(&mut disables.rules, &options.overrides);

        Ok(vec![
            RuleBlock::new(block_name("markdown", "setup")).plugin("markdown", plugin),
            RuleBlock::new(block_name("markdown", "processor"))
                .files(options.files.clone())
                .ignores([GLOB_MARKDOWN_IN_MARKDOWN])
                .processor("markdown/markdown"),
            RuleBlock::new(block_name("markdown", "parser"))
                .files(options.files)
                .language_options(json!({ "parser": "markdown" })),
            disables,
        ])
    }
}
