//! Code style rules.
//!
//! The resolved options of this fragment are also shared with other
//! fragments through [`Facts::stylistic`], so that e.g. the data-format
//! fragments indent the same way.

use super::{FragmentProvider, ProduceContext, Stage, apply_overrides, block_name};
use crate::error::ProviderError;
use crate::options::{Facts, decode, to_record};
use crate::plugins::PluginSlot;
use crate::types::{OptionsRecord, RuleBlock, RuleEntry, RuleMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Options of the `stylistic` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylisticOptions {
    /// Spaces per level, or `"tab"`.
    pub indent: Value,
    /// `single` or `double`.
    pub quotes: String,
    pub semi: bool,
    /// Add JSX layout rules.
    pub jsx: bool,
    pub comma_dangle: String,
    pub overrides: RuleMap,
}

impl Default for StylisticOptions {
    fn default() -> Self {
        Self {
            indent: json!(2),
            quotes: "single".to_string(),
            semi: true,
            jsx: false,
            comma_dangle: "always-multiline".to_string(),
            overrides: RuleMap::new(),
        }
    }
}

pub struct Stylistic {
    stylistic: PluginSlot,
    antfu: PluginSlot,
}

impl Stylistic {
    pub fn new() -> Self {
        Self {
            stylistic: PluginSlot::new("@stylistic/eslint-plugin"),
            antfu: PluginSlot::new("eslint-plugin-antfu"),
        }
    }
}

#[async_trait]
impl FragmentProvider for Stylistic {
    fn name(&self) -> &'static str {
        "stylistic"
    }

    fn stage(&self) -> Stage {
        Stage::Stylistic
    }

    fn defaults(&self, facts: &Facts) -> OptionsRecord {
        to_record(&StylisticOptions {
            jsx: facts.is_enabled("jsx"),
            ..Default::default()
        })
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: StylisticOptions = decode(self.name(), options);
        let (stylistic, antfu) =
            futures::try_join!(self.stylistic.get(cx.loader), self.antfu.get(cx.loader))?;

        let semi = if options.semi { "always" } else { "never" };
        let mut block = RuleBlock::new(block_name("stylistic", "rules"))
            .plugin("antfu", antfu)
            .plugin("@stylistic", stylistic)
            .rule("antfu/consistent-chaining", RuleEntry::error())
            .rule("antfu/consistent-list-newline", RuleEntry::error())
            .rule("antfu/if-newline", RuleEntry::error())
            .rule("antfu/top-level-function", RuleEntry::error())
            .rule("@stylistic/arrow-parens", RuleEntry::error().with("always"))
            .rule(
                "@stylistic/brace-style",
                RuleEntry::error().with("1tbs").with(json!({ "allowSingleLine": true })),
            )
            .rule("@stylistic/comma-dangle", RuleEntry::error().with(options.comma_dangle.as_str()))
            .rule(
                "@stylistic/generator-star-spacing",
                RuleEntry::error().with(json!({ "after": true, "before": false })),
            )
            .rule("@stylistic/indent", RuleEntry::error().with(options.indent.clone()))
            .rule("@stylistic/member-delimiter-style", RuleEntry::error())
            .rule("@stylistic/quote-props", RuleEntry::error().with("as-needed"))
            .rule(
                "@stylistic/quotes",
                RuleEntry::error()
                    .with(options.quotes.as_str())
                    .with(json!({ "allowTemplateLiterals": "always", "avoidEscape": true })),
            )
            .rule("@stylistic/semi", RuleEntry::error().with(semi))
            .rule(
                "@stylistic/yield-star-spacing",
                RuleEntry::error().with(json!({ "after": true, "before": false })),
            );

        if options.jsx {
            let jsx_quotes = if options.quotes == "double" {
                "prefer-double"
            } else {
                "prefer-single"
            };
            block = block
                .rule("@stylistic/jsx-closing-bracket-location", RuleEntry::error())
                .rule("@stylistic/jsx-curly-newline", RuleEntry::error())
                .rule("@stylistic/jsx-indent-props", RuleEntry::error().with(options.indent.clone()))
                .rule("@stylistic/jsx-one-expression-per-line", RuleEntry::error())
                .rule("@stylistic/jsx-quotes", RuleEntry::error().with(jsx_quotes))
                .rule("@stylistic/jsx-self-closing-comp", RuleEntry::error());
        }

        apply_overrides(&mut block.rules, &options.overrides);
        Ok(vec![block])
    }
}
