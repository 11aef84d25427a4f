//! Delegation of non-script languages to external formatters.

use super::{FragmentProvider, ProduceContext, Stage, block_name};
use crate::error::ProviderError;
use crate::globs::{
    GLOB_ASTRO, GLOB_CSS, GLOB_GRAPHQL, GLOB_HTML, GLOB_LESS, GLOB_MARKDOWN, GLOB_POSTCSS,
    GLOB_SCSS, GLOB_SVG, GLOB_XML,
};
use crate::options::{Facts, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, Plugin, RuleBlock, RuleEntry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Which external formatter handles a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Prettier,
    Dprint,
}

impl Engine {
    /// `true` and `"prettier"` pick prettier, `"dprint"` picks dprint, anything else is off.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(true) => Some(Engine::Prettier),
            Value::String(s) if s == "prettier" => Some(Engine::Prettier),
            Value::String(s) if s == "dprint" => Some(Engine::Dprint),
            _ => None,
        }
    }
}

/// Options of the `formatters` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattersOptions {
    /// CSS, PostCSS, Less and SCSS: `true`, `"prettier"` or `false`.
    pub css: Value,
    pub html: bool,
    pub xml: bool,
    pub svg: bool,
    /// `true`, `"prettier"`, `"dprint"` or `false`.
    pub markdown: Value,
    pub graphql: bool,
    pub astro: bool,
    /// Merged over the options derived from the stylistic settings.
    pub prettier_options: OptionsRecord,
    pub dprint_options: OptionsRecord,
    /// Stylistic options, or `false`.
    pub stylistic: Value,
}

impl Default for FormattersOptions {
    fn default() -> Self {
        Self {
            css: Value::Bool(true),
            html: true,
            xml: false,
            svg: false,
            markdown: Value::Bool(true),
            graphql: true,
            astro: false,
            prettier_options: OptionsRecord::new(),
            dprint_options: OptionsRecord::new(),
            stylistic: Value::Bool(false),
        }
    }
}

impl FormattersOptions {
    fn prettier(&self) -> OptionsRecord {
        let stylistic = self.stylistic.as_object();
        let get = |key: &str| stylistic.and_then(|s| s.get(key));
        let indent = get("indent");

        let mut options = to_record(&json!({
            "endOfLine": "auto",
            "printWidth": 120,
            "semi": get("semi").and_then(Value::as_bool).unwrap_or(false),
            "singleQuote": get("quotes").and_then(Value::as_str).unwrap_or("single") == "single",
            "tabWidth": indent.and_then(Value::as_u64).unwrap_or(2),
            "trailingComma": "all",
            "useTabs": indent.and_then(Value::as_str) == Some("tab"),
        }));
        options.extend(self.prettier_options.clone());
        options
    }

    fn dprint(&self) -> OptionsRecord {
        let indent = self
            .stylistic
            .get("indent")
            .cloned()
            .unwrap_or(json!(2));
        let mut options = to_record(&json!({
            "indentWidth": if indent.is_u64() { indent.clone() } else { json!(2) },
            "quoteStyle": "preferSingle",
            "useTabs": indent == json!("tab"),
        }));
        options.extend(self.dprint_options.clone());
        options
    }
}

/// Runs external formatters through lint rules.
pub struct Formatters {
    plugin: PluginSlot,
}

impl Formatters {
    pub fn new() -> Self {
        Self {
            plugin: PluginSlot::new("eslint-plugin-format"),
        }
    }
}

fn format_block(
    part: &str,
    files: &[&str],
    rule: &str,
    mut options: OptionsRecord,
    extra: Value,
) -> RuleBlock {
    if let Value::Object(extra) = extra {
        options.extend(extra);
    }
    RuleBlock::new(block_name("formatters", part))
        .files(files.iter().copied())
        .language_options(json!({ "parser": "format/plain" }))
        .rule(format!("format/{}", rule), RuleEntry::error().with(Value::Object(options)))
}

#[async_trait]
impl FragmentProvider for Formatters {
    fn name(&self) -> &'static str {
        "formatters"
    }

    fn stage(&self) -> Stage {
        Stage::Formatters
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&FormattersOptions {
            stylistic: facts.stylistic_value(),
            ..Default::default()
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: FormattersOptions = decode(self.name(), options);
        let plugin: Plugin = self.plugin.get(cx.loader).await?;
        let prettier = options.prettier();

        let mut blocks =
            vec![RuleBlock::new(block_name("formatters", "setup")).plugin("format", plugin)];

        if Engine::from_value(&options.css).is_some() {
            blocks.push(format_block(
                "css",
                &[GLOB_CSS, GLOB_POSTCSS],
                "prettier",
                prettier.clone(),
                json!({ "parser": "css" }),
            ));
            blocks.push(format_block(
                "scss",
                &[GLOB_SCSS],
                "prettier",
                prettier.clone(),
                json!({ "parser": "scss" }),
            ));
            blocks.push(format_block(
                "less",
                &[GLOB_LESS],
                "prettier",
                prettier.clone(),
                json!({ "parser": "less" }),
            ));
        }

        if options.html {
            blocks.push(format_block(
                "html",
                &[GLOB_HTML],
                "prettier",
                prettier.clone(),
                json!({ "parser": "html" }),
            ));
        }

        if options.xml {
            blocks.push(format_block(
                "xml",
                &[GLOB_XML],
                "prettier",
                prettier.clone(),
                json!({ "parser": "xml", "plugins": ["@prettier/plugin-xml"], "xmlWhitespaceSensitivity": "ignore" }),
            ));
        }

        if options.svg {
            blocks.push(format_block(
                "svg",
                &[GLOB_SVG],
                "prettier",
                prettier.clone(),
                json!({ "parser": "xml", "plugins": ["@prettier/plugin-xml"], "xmlWhitespaceSensitivity": "ignore" }),
            ));
        }

        match Engine::from_value(&options.markdown) {
            Some(Engine::Prettier) => blocks.push(format_block(
                "markdown",
                &[GLOB_MARKDOWN],
                "prettier",
                prettier.clone(),
                json!({ "embeddedLanguageFormatting": "off", "parser": "markdown" }),
            )),
            Some(Engine::Dprint) => blocks.push(format_block(
                "markdown",
                &[GLOB_MARKDOWN],
                "dprint",
                options.dprint(),
                json!({ "language": "markdown", "languageOptions": { "lineWidth": 120 } }),
            )),
            None => {}
        }

        if options.graphql {
            blocks.push(format_block(
                "graphql",
                &[GLOB_GRAPHQL],
                "prettier",
                prettier.clone(),
                json!({ "parser": "graphql" }),
            ));
        }

        if options.astro {
            blocks.push(
                format_block(
                    "astro",
                    &[GLOB_ASTRO],
                    "prettier",
                    prettier,
                    json!({ "parser": "astro", "plugins": ["prettier-plugin-astro"] }),
                )
                .rule("@stylistic/arrow-parens", RuleEntry::off())
                .rule("@stylistic/quotes", RuleEntry::off())
                .rule("@stylistic/semi", RuleEntry::off()),
            );
        }

        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::BuiltinLoader;
    use std::path::Path;

    async fn produce(options: &OptionsRecord) -> Vec<RuleBlock> {
        let loader = BuiltinLoader::new();
        let cx = ProduceContext {
            loader: &loader,
            root: Path::new("."),
        };
        Formatters::new().produce(options, &cx).await.unwrap()
    }

    #[test]
    fn test_engine_from_value() {
        assert_eq!(Engine::from_value(&json!(true)), Some(Engine::Prettier));
        assert_eq!(Engine::from_value(&json!("dprint")), Some(Engine::Dprint));
        assert_eq!(Engine::from_value(&json!(false)), None);
        assert_eq!(Engine::from_value(&json!("biome")), None);
    }

    #[test]
    fn test_prettier_options_follow_stylistic() {
        let options = FormattersOptions {
            stylistic: json!({"indent": 4, "quotes": "double", "semi": true}),
            prettier_options: to_record(&json!({"printWidth": 80})),
            ..Default::default()
        };
        let prettier = options.prettier();
        assert_eq!(prettier["tabWidth"], 4);
        assert_eq!(prettier["singleQuote"], false);
        assert_eq!(prettier["semi"], true);
        assert_eq!(prettier["printWidth"], 80);
    }

    #[tokio::test]
    async fn test_default_languages() {
        let blocks = produce(&Formatters::new().defaults(&Facts::default())).await;
        let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "rulestack/formatters/setup",
                "rulestack/formatters/css",
                "rulestack/formatters/scss",
                "rulestack/formatters/less",
                "rulestack/formatters/html",
                "rulestack/formatters/markdown",
                "rulestack/formatters/graphql"
            ]
        );
        assert_eq!(
            blocks[1].rules["format/prettier"].options[0]["parser"],
            "css"
        );
    }

    #[tokio::test]
    async fn test_markdown_with_dprint() {
        let mut options = Formatters::new().defaults(&Facts::default());
        options.insert("markdown".into(), json!("dprint"));
        options.insert("css".into(), json!(false));
        let blocks = produce(&options).await;
        let markdown = blocks
            .iter()
            .find(|b| b.name == "rulestack/formatters/markdown")
            .unwrap();
        assert_eq!(markdown.rules["format/dprint"].options[0]["language"], "markdown");
        assert!(blocks.iter().all(|b| b.name != "rulestack/formatters/css"));
    }
}
