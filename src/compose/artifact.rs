//! The composed artifact and its derivation API.

use super::merger::{CallerFragment, name_caller_blocks, resolve_fragments};
use super::rename::{AliasTable, rename};
use super::validate::check_unique_names;
use crate::error::{ComposeError, ComposeResult};
use crate::fragments::BLOCK_PREFIX;
use crate::types::{RuleBlock, RuleMap};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Ordered, renamed and validated rule blocks.
///
/// Immutable: every extension returns a new handle and leaves this one as is.
#[derive(Debug, Clone)]
pub struct Artifact {
    blocks: Arc<Vec<RuleBlock>>,
    /// Table applied to blocks added later; `None` when renaming is off.
    aliases: Option<Arc<AliasTable>>,
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Artifact {
    pub(crate) fn new(blocks: Vec<RuleBlock>, aliases: Option<Arc<AliasTable>>) -> Self {
        Self {
            blocks: Arc::new(blocks),
            aliases,
        }
    }

    pub fn blocks(&self) -> &[RuleBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<RuleBlock> {
        Arc::try_unwrap(self.blocks).unwrap_or_else(|shared| shared.as_ref().clone())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.name.as_str()).collect()
    }

    /// Every distinct rule id, sorted.
    pub fn rule_ids(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .flat_map(|b| b.rules.keys().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First block with this name.
    pub fn find(&self, name: &str) -> Option<&RuleBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.blocks.as_ref()).unwrap_or(Value::Null)
    }

    fn position(&self, name: &str) -> ComposeResult<usize> {
        self.blocks
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| ComposeError::unknown_block(name))
    }

    fn prepare(&self, blocks: Vec<RuleBlock>) -> ComposeResult<Vec<RuleBlock>> {
        match &self.aliases {
            Some(table) => rename(blocks, table),
            None => Ok(blocks),
        }
    }

    fn derive(&self, blocks: Vec<RuleBlock>) -> ComposeResult<Artifact> {
        check_unique_names(&blocks)?;
        Ok(Artifact::new(blocks, self.aliases.clone()))
    }

    /// One past the highest `rulestack/user/<n>` index in use.
    fn next_user_index(&self) -> usize {
        let prefix = format!("{}/user/", BLOCK_PREFIX);
        self.blocks
            .iter()
            .filter_map(|b| b.name.strip_prefix(&prefix)?.parse::<usize>().ok())
            .map(|n| n + 1)
            .max()
            .unwrap_or(0)
    }

    /// Append more caller fragments after every existing block.
    pub async fn append(&self, fragments: Vec<CallerFragment>) -> ComposeResult<Artifact> {
        let mut extra = resolve_fragments(fragments).await?;
        name_caller_blocks(&mut extra, self.next_user_index());
        let extra = self.prepare(extra)?;

        let mut blocks = self.blocks.as_ref().clone();
        blocks.extend(extra);
        self.derive(blocks)
    }

    /// Re-run plugin renaming with a custom table.
    pub fn rename_plugins(&self, table: &AliasTable) -> ComposeResult<Artifact> {
        let blocks = rename(self.blocks.as_ref().clone(), table)?;
        check_unique_names(&blocks)?;
        Ok(Artifact::new(blocks, Some(Arc::new(table.clone()))))
    }

    /// Insert blocks right after the first block named `name`.
    pub fn insert_after(&self, name: &str, blocks: Vec<RuleBlock>) -> ComposeResult<Artifact> {
        let at = self.position(name)? + 1;
        let inserted = self.prepare(blocks)?;

        let mut all = self.blocks.as_ref().clone();
        let tail = all.split_off(at);
        all.extend(inserted);
        all.extend(tail);
        self.derive(all)
    }

    /// Set rules on the first block named `name`, replacing same-id entries.
    pub fn override_rules(&self, name: &str, rules: RuleMap) -> ComposeResult<Artifact> {
        let at = self.position(name)?;
        let patch = self.prepare(vec![RuleBlock {
            rules,
            ..Default::default()
        }])?;

        let mut all = self.blocks.as_ref().clone();
        for block in patch {
            all[at].rules.extend(block.rules);
        }
        self.derive(all)
    }

    /// Drop every block named `name`.
    pub fn remove(&self, name: &str) -> ComposeResult<Artifact> {
        self.position(name)?;
        let kept = self
            .blocks
            .iter()
            .filter(|b| b.name != name)
            .cloned()
            .collect();
        self.derive(kept)
    }
}

impl Serialize for Artifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.blocks.as_ref().serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Artifact {
    type Item = &'a RuleBlock;
    type IntoIter = std::slice::Iter<'a, RuleBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{Plugin, RuleEntry};

    fn artifact() -> Artifact {
        Artifact::new(
            vec![
                RuleBlock::new("rulestack/a")
                    .plugin("node", Plugin::opaque("eslint-plugin-n"))
                    .rule("node/no-new-require", RuleEntry::error()),
                RuleBlock::new("rulestack/b").rule("no-var", RuleEntry::error()),
            ],
            Some(Arc::new(AliasTable::default())),
        )
    }

    #[test]
    fn test_accessors() {
        let artifact = artifact();
        assert_eq!(artifact.len(), 2);
        assert_eq!(artifact.names(), vec!["rulestack/a", "rulestack/b"]);
        assert_eq!(artifact.rule_ids(), vec!["no-var", "node/no-new-require"]);
        assert!(artifact.find("rulestack/b").is_some());
        assert_eq!(artifact.to_json()[1]["rules"]["no-var"], "error");
    }

    #[tokio::test]
    async fn test_append_is_derived_and_renamed() {
        let base = artifact();
        let extended = base
            .append(vec![RuleBlock::new("").rule("n/no-path-concat", RuleEntry::off()).into()])
            .await
            .unwrap();
        assert_eq!(base.len(), 2);
        assert_eq!(extended.len(), 3);
        let last = &extended.blocks()[2];
        assert_eq!(last.name, "rulestack/user/0");
        assert!(last.rules.contains_key("node/no-path-concat"));
    }

    #[tokio::test]
    async fn test_append_numbers_past_highest_user_block() {
        let base = Artifact::new(
            vec![
                RuleBlock::new("mine"),
                RuleBlock::new("rulestack/user/1"),
                RuleBlock::new("rulestack/user/latest"),
            ],
            None,
        );
        let extended = base
            .append(vec![RuleBlock::new("").into(), RuleBlock::new("").into()])
            .await
            .unwrap();
        assert_eq!(
            &extended.names()[3..],
            &["rulestack/user/2", "rulestack/user/3"]
        );
    }

    #[tokio::test]
    async fn test_append_rejects_duplicate_name() {
        let err = artifact()
            .append(vec![RuleBlock::new("rulestack/a").into()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateBlockName);
    }

    #[test]
    fn test_insert_after_and_remove() {
        let artifact = artifact();
        let inserted = artifact
            .insert_after("rulestack/a", vec![RuleBlock::new("mid")])
            .unwrap();
        assert_eq!(inserted.names(), vec!["rulestack/a", "mid", "rulestack/b"]);

        let removed = inserted.remove("rulestack/a").unwrap();
        assert_eq!(removed.names(), vec!["mid", "rulestack/b"]);

        let err = removed.remove("rulestack/a").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownBlock);
    }

    #[test]
    fn test_override_rules_renames_ids() {
        let mut rules = RuleMap::new();
        rules.insert("n/no-new-require".to_string(), RuleEntry::off());
        let patched = artifact().override_rules("rulestack/a", rules).unwrap();
        let block = patched.find("rulestack/a").unwrap();
        assert_eq!(block.rules.len(), 1);
        assert!(!block.rules["node/no-new-require"].is_enabled());
    }

    #[test]
    fn test_rename_plugins_with_custom_table() {
        let table = AliasTable::new([("node", "nd")]).unwrap();
        let renamed = artifact().rename_plugins(&table).unwrap();
        let block = renamed.find("rulestack/a").unwrap();
        assert!(block.plugins.contains_key("nd"));
        assert!(block.rules.contains_key("nd/no-new-require"));
        assert_eq!(renamed.rename_plugins(&table).unwrap(), renamed);
    }
}
