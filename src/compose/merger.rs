//! Concatenation of built-in output, caller fragments and the top-level block.

use super::artifact::Artifact;
use super::validate::check_top_level;
use crate::error::{ComposeError, ComposeResult, ProviderError};
use crate::fragments::BLOCK_PREFIX;
use crate::types::RuleBlock;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;

/// Name given to the top-level block when the caller did not name it.
pub const TOP_LEVEL_NAME: &str = "rulestack/top-level";

/// Name of the `n`th unnamed caller block.
pub fn user_block_name(n: usize) -> String {
    format!("{}/user/{}", BLOCK_PREFIX, n)
}

/// A fragment supplied by the caller, appended after every built-in block.
pub enum CallerFragment {
    Block(RuleBlock),
    Blocks(Vec<RuleBlock>),
    /// The blocks of an already composed artifact.
    Artifact(Artifact),
    /// Blocks that are still being produced. Awaited after the built-in stages.
    Deferred(BoxFuture<'static, Result<Vec<RuleBlock>, ProviderError>>),
}

impl CallerFragment {
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Vec<RuleBlock>, ProviderError>> + Send + 'static,
    {
        CallerFragment::Deferred(Box::pin(future))
    }

    async fn resolve(self, index: usize) -> ComposeResult<Vec<RuleBlock>> {
        match self {
            CallerFragment::Block(block) => Ok(vec![block]),
            CallerFragment::Blocks(blocks) => Ok(blocks),
            CallerFragment::Artifact(artifact) => Ok(artifact.into_blocks()),
            CallerFragment::Deferred(future) => future
                .await
                .map_err(|source| ComposeError::Caller { index, source }),
        }
    }
}

impl fmt::Debug for CallerFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerFragment::Block(block) => f.debug_tuple("Block").field(&block.name).finish(),
            CallerFragment::Blocks(blocks) => f.debug_tuple("Blocks").field(&blocks.len()).finish(),
            CallerFragment::Artifact(artifact) => {
                f.debug_tuple("Artifact").field(&artifact.len()).finish()
            }
            CallerFragment::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

impl From<RuleBlock> for CallerFragment {
    fn from(block: RuleBlock) -> Self {
        CallerFragment::Block(block)
    }
}

impl From<Vec<RuleBlock>> for CallerFragment {
    fn from(blocks: Vec<RuleBlock>) -> Self {
        CallerFragment::Blocks(blocks)
    }
}

impl From<Artifact> for CallerFragment {
    fn from(artifact: Artifact) -> Self {
        CallerFragment::Artifact(artifact)
    }
}

/// The caller's single top-level rules/settings block. Never file-scoped.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelBlock(RuleBlock);

impl TopLevelBlock {
    /// Fails if the block declares `files`.
    pub fn new(mut block: RuleBlock) -> ComposeResult<Self> {
        check_top_level(&block)?;
        if block.name.is_empty() {
            block.name = TOP_LEVEL_NAME.to_string();
        }
        Ok(Self(block))
    }

    pub fn block(&self) -> &RuleBlock {
        &self.0
    }

    pub fn into_block(self) -> RuleBlock {
        self.0
    }
}

/// Resolve caller fragments one after another, in argument order.
pub async fn resolve_fragments(fragments: Vec<CallerFragment>) -> ComposeResult<Vec<RuleBlock>> {
    let mut blocks = Vec::new();
    for (index, fragment) in fragments.into_iter().enumerate() {
        blocks.extend(fragment.resolve(index).await?);
    }
    Ok(blocks)
}

/// Name unnamed caller blocks `rulestack/user/<n>`, counting from `start`.
pub fn name_caller_blocks(blocks: &mut [RuleBlock], start: usize) {
    for (offset, block) in blocks.iter_mut().enumerate() {
        if block.name.is_empty() {
            block.name = user_block_name(start + offset);
        }
    }
}

/// Strict append: built-in blocks, then caller blocks, then the top-level block.
pub fn merge(
    built_in: Vec<RuleBlock>,
    mut caller: Vec<RuleBlock>,
    top_level: Option<TopLevelBlock>,
) -> Vec<RuleBlock> {
    name_caller_blocks(&mut caller, 0);
    let mut blocks = built_in;
    blocks.reserve(caller.len() + 1);
    blocks.extend(caller);
    blocks.extend(top_level.map(TopLevelBlock::into_block));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::RuleEntry;

    #[test]
    fn test_top_level_block() {
        let block = TopLevelBlock::new(RuleBlock::new("").rule("no-console", RuleEntry::warn())).unwrap();
        assert_eq!(block.block().name, TOP_LEVEL_NAME);

        let err = TopLevelBlock::new(RuleBlock::new("x").files(["src/**"])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReservedKey);
    }

    #[test]
    fn test_merge_order_and_naming() {
        let built_in = vec![RuleBlock::new("rulestack/a"), RuleBlock::new("rulestack/b")];
        let caller = vec![RuleBlock::new(""), RuleBlock::new("mine"), RuleBlock::new("")];
        let top = TopLevelBlock::new(RuleBlock::new("")).unwrap();

        let merged = merge(built_in, caller, Some(top));
        let names: Vec<&str> = merged.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "rulestack/a",
                "rulestack/b",
                "rulestack/user/0",
                "mine",
                "rulestack/user/2",
                TOP_LEVEL_NAME
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_fragments_in_order() {
        let fragments = vec![
            CallerFragment::deferred(async { Ok(vec![RuleBlock::new("late")]) }),
            RuleBlock::new("single").into(),
            vec![RuleBlock::new("x"), RuleBlock::new("y")].into(),
        ];
        let blocks = resolve_fragments(fragments).await.unwrap();
        let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["late", "single", "x", "y"]);
    }

    #[tokio::test]
    async fn test_deferred_failure_names_index() {
        let fragments = vec![
            RuleBlock::new("ok").into(),
            CallerFragment::deferred(async { Err(ProviderError::other("boom")) }),
        ];
        let err = resolve_fragments(fragments).await.unwrap_err();
        assert!(matches!(err, ComposeError::Caller { index: 1, .. }));
        assert_eq!(err.code(), ErrorCode::CallerFragmentFailed);
    }
}
