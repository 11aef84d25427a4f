//! Language extensions: JSX parsing and TypeScript.

use super::{FragmentProvider, ProduceContext, Stage, apply_overrides, block_name};
use crate::error::ProviderError;
use crate::globs::{GLOB_ASTRO_TS, GLOB_JSX, GLOB_MARKDOWN, GLOB_TS, GLOB_TSX, component_globs};
use crate::options::{Facts, ProjectType, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, RuleBlock, RuleEntry, RuleMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// JSX parsing for plain JavaScript files.
pub struct Jsx;

#[async_trait]
impl FragmentProvider for Jsx {
    fn name(&self) -> &'static str {
        "jsx"
    }

    fn stage(&self) -> Stage {
        Stage::LanguageExtension
    }

    async fn produce(
        &self,
        _options: &OptionsRecord,
        _cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        Ok(vec![
            RuleBlock::new(block_name("jsx", "setup"))
                .files([GLOB_JSX, GLOB_TSX])
                .language_options(json!({
                    "parserOptions": { "ecmaFeatures": { "jsx": true } }
                })),
        ])
    }
}

/// Options of the `typescript` fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypescriptOptions {
    /// Extra component extensions parsed as TypeScript.
    pub component_exts: Vec<String>,
    /// Path of the tsconfig used for type-aware rules. Unset disables them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsconfig_path: Option<String>,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    /// Extra parser options merged into the generated ones.
    pub parser_options: OptionsRecord,
    pub overrides: RuleMap,
    pub overrides_type_aware: RuleMap,
}

impl TypescriptOptions {
    fn files(&self) -> Vec<String> {
        let mut files = vec![GLOB_TS.to_string(), GLOB_TSX.to_string()];
        files.extend(component_globs(&self.component_exts));
        files
    }
}

/// TypeScript parser setup and rules, with an optional type-aware layer.
pub struct Typescript {
    plugin: PluginSlot,
    parser: PluginSlot,
}

impl Typescript {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("@typescript-eslint/eslint-plugin"),
            parser: PluginSlot::new("@typescript-eslint/parser"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Typescript {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn stage(&self) -> Stage {
        Stage::LanguageExtension
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&TypescriptOptions {
            component_exts: facts.component_exts().to_vec(),
            project_type: facts.project_type(),
            ..Default::default()
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: TypescriptOptions = decode(self.name(), options);
        let (plugin, parser) =
            futures::try_join!(self.plugin.get(cx.loader), self.parser.get(cx.loader))?;
        let files = options.files();

        let extra_exts: Vec<Value> = options
            .component_exts
            .iter()
            .map(|ext| Value::String(format!(".{}", ext)))
            .collect();
        let mut parser_options = json!({
            "extraFileExtensions": extra_exts,
            "sourceType": "module",
        });
        if let Value::Object(map) = &mut parser_options {
            map.extend(options.parser_options.clone());
        }

        let mut blocks = vec![
            RuleBlock::new(block_name("typescript", "setup")).plugin("@typescript-eslint", plugin),
            RuleBlock::new(block_name("typescript", "parser"))
                .files(files.clone())
                .language_options(json!({
                    "parser": parser.id(),
                    "parserOptions": parser_options,
                })),
        ];

        if let Some(tsconfig) = &options.tsconfig_path {
            blocks.push(
                RuleBlock::new(block_name("typescript", "type-aware-parser"))
                    .files(files.clone())
                    .ignores([GLOB_MARKDOWN, GLOB_ASTRO_TS])
                    .language_options(json!({
                        "parserOptions": {
                            "project": tsconfig,
                            "tsconfigRootDir": cx.root.to_string_lossy(),
                        }
                    })),
            );
        }

        let mut rules = RuleBlock::new(block_name("typescript", "rules"))
            .files(files.clone())
            .rule("no-redeclare", RuleEntry::off())
            .rule("no-unused-vars", RuleEntry::off())
            .rule("no-use-before-define", RuleEntry::off())
            .rule(
                "@typescript-eslint/consistent-type-definitions",
                RuleEntry::error().with("interface"),
            )
            .rule(
                "@typescript-eslint/consistent-type-imports",
                RuleEntry::error().with(json!({
                    "disallowTypeAnnotations": false,
                    "fixStyle": "separate-type-imports",
                    "prefer": "type-imports"
                })),
            )
            .rule("@typescript-eslint/no-dupe-class-members", RuleEntry::error())
            .rule("@typescript-eslint/no-import-type-side-effects", RuleEntry::error())
            .rule("@typescript-eslint/no-non-null-assertion", RuleEntry::off())
            .rule(
                "@typescript-eslint/no-redeclare",
                RuleEntry::error().with(json!({ "builtinGlobals": false })),
            )
            .rule(
                "@typescript-eslint/no-unused-vars",
                RuleEntry::error().with(json!({ "args": "none", "ignoreRestSiblings": true })),
            )
            .rule(
                "@typescript-eslint/no-use-before-define",
                RuleEntry::error().with(json!({ "classes": false, "functions": false, "variables": true })),
            );
        if options.project_type == ProjectType::Lib {
            rules = rules.rule(
                "@typescript-eslint/explicit-function-return-type",
                RuleEntry::error().with(json!({
                    "allowExpressions": true,
                    "allowHigherOrderFunctions": true,
                    "allowIIFEs": true
                })),
            );
        }
        apply_overrides(&mut rules.rules, &options.overrides);
        blocks.push(rules);

        if options.tsconfig_path.is_some() {
            let mut type_aware = RuleBlock::new(block_name("typescript", "rules-type-aware"))
                .files(files)
                .ignores([GLOB_MARKDOWN, GLOB_ASTRO_TS])
                .rule("dot-notation", RuleEntry::off())
                .rule("no-implied-eval", RuleEntry::off())
                .rule("@typescript-eslint/await-thenable", RuleEntry::error())
                .rule(
                    "@typescript-eslint/dot-notation",
                    RuleEntry::error().with(json!({ "allowKeywords": true })),
                )
                .rule("@typescript-eslint/no-floating-promises", RuleEntry::error())
                .rule("@typescript-eslint/no-misused-promises", RuleEntry::error())
                .rule("@typescript-eslint/no-unsafe-assignment", RuleEntry::error())
                .rule("@typescript-eslint/promise-function-async", RuleEntry::error())
                .rule("@typescript-eslint/restrict-template-expressions", RuleEntry::error())
                .rule("@typescript-eslint/switch-exhaustiveness-check", RuleEntry::error());
            apply_overrides(&mut type_aware.rules, &options.overrides_type_aware);
            blocks.push(type_aware);
        }

        Ok(blocks)
    }
}
