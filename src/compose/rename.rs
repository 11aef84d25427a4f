//! Plugin identifier renaming.
//!
//! Plugins publish rules under their "natural" identifier (`@typescript-eslint`,
//! `n`, ...). The artifact exposes short aliases instead (`ts`, `node`). The
//! renamer rewrites plugin-map keys, rule-id prefixes and processor references;
//! it never touches severities or rule options.

use crate::error::{ComposeError, ComposeResult};
use crate::types::{PluginMap, RuleBlock, RuleMap};
use indexmap::IndexMap;

/// Aliases applied when plugin renaming is on.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("@eslint-react", "react"),
    ("@eslint-react/dom", "react-dom"),
    ("@eslint-react/hooks-extra", "react-hooks-extra"),
    ("@eslint-react/naming-convention", "react-naming-convention"),
    ("@stylistic", "style"),
    ("@typescript-eslint", "ts"),
    ("import-lite", "import"),
    ("n", "node"),
    ("perfectionist", "sort"),
    ("vitest", "test"),
    ("yml", "yaml"),
];

/// Immutable mapping from natural plugin identifiers to aliases.
///
/// Construction rejects tables where an alias would itself be renamed again,
/// or where a renamed identifier could only appear after another rename, so
/// applying a table twice gives the same result as applying it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    entries: IndexMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

/// Whether `id` is `prefix` or lives under `prefix/`.
fn is_under(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

impl AliasTable {
    /// Build a validated table.
    pub fn new<I, K, V>(entries: I) -> ComposeResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries: IndexMap<String, String> = entries
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .collect();

        for (from, to) in &entries {
            if from.is_empty() || to.is_empty() {
                return Err(ComposeError::InvalidAliasTable {
                    reason: "identifiers and aliases must not be empty".to_string(),
                });
            }
            if let Some(source) = entries.keys().find(|source| is_under(to, source)) {
                return Err(ComposeError::InvalidAliasTable {
                    reason: format!(
                        "alias \"{}\" of \"{}\" would be renamed again by \"{}\"",
                        to, from, source
                    ),
                });
            }
            if let Some(alias) = entries.values().find(|alias| is_under(from, alias)) {
                return Err(ComposeError::InvalidAliasTable {
                    reason: format!(
                        "\"{}\" lies under the alias \"{}\" and would rename its output",
                        from, alias
                    ),
                });
            }
        }

        Ok(Self { entries })
    }

    /// A table that renames nothing.
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rename an identifier through the longest matching entry.
    ///
    /// `@eslint-react/dom/no-x` becomes `react-dom/no-x`, not `react/dom/no-x`.
    pub fn rename_id(&self, id: &str) -> String {
        let best = self
            .entries
            .iter()
            .filter(|(from, _)| is_under(id, from))
            .max_by_key(|(from, _)| from.len());
        match best {
            Some((from, to)) => format!("{}{}", to, &id[from.len()..]),
            None => id.to_string(),
        }
    }
}

fn rename_plugins(block: &RuleBlock, table: &AliasTable) -> ComposeResult<PluginMap> {
    let mut plugins = PluginMap::with_capacity(block.plugins.len());
    for (key, plugin) in &block.plugins {
        let alias = table.rename_id(key);
        match plugins.get(&alias) {
            Some(existing) if existing != plugin => {
                return Err(ComposeError::PluginAliasConflict {
                    block: block.name.clone(),
                    alias,
                    first: existing.id().to_string(),
                    second: plugin.id().to_string(),
                });
            }
            Some(_) => {}
            None => {
                plugins.insert(alias, plugin.clone());
            }
        }
    }
    Ok(plugins)
}

fn rename_rules(rules: &RuleMap, table: &AliasTable) -> RuleMap {
    rules
        .iter()
        .map(|(id, entry)| (table.rename_id(id), entry.clone()))
        .collect()
}

/// Rename one block.
pub fn rename_block(block: &RuleBlock, table: &AliasTable) -> ComposeResult<RuleBlock> {
    Ok(RuleBlock {
        plugins: rename_plugins(block, table)?,
        rules: rename_rules(&block.rules, table),
        processor: block.processor.as_deref().map(|p| table.rename_id(p)),
        ..block.clone()
    })
}

/// Rename every block of a sequence.
pub fn rename(blocks: Vec<RuleBlock>, table: &AliasTable) -> ComposeResult<Vec<RuleBlock>> {
    if table.is_empty() {
        return Ok(blocks);
    }
    blocks.iter().map(|block| rename_block(block, table)).collect()
}
