//! Structural checks. Each fails fast on the first violation.

use crate::error::{ComposeError, ComposeResult};
use crate::fragments::Registry;
use crate::options::{Facts, GlobalOptions};
use crate::types::RuleBlock;
use indexmap::IndexMap;

/// The top-level block must not carry a file matcher.
pub fn check_top_level(block: &RuleBlock) -> ComposeResult<()> {
    if block.files.is_some() {
        return Err(ComposeError::reserved_key("files"));
    }
    Ok(())
}

/// No reserved key may be present in the global options, whatever its value.
pub fn check_global(global: &GlobalOptions) -> ComposeResult<()> {
    if let Some(key) = global.reserved_keys.first() {
        return Err(ComposeError::reserved_key(key));
    }
    global.top_level.as_ref().map_or(Ok(()), check_top_level)
}

/// Every enabled fragment's hard dependencies must be enabled too.
pub fn check_dependencies(registry: &Registry, facts: &Facts) -> ComposeResult<()> {
    for provider in registry.iter() {
        if !facts.is_enabled(provider.name()) {
            continue;
        }
        if let Some(missing) = provider
            .requires()
            .iter()
            .find(|required| !facts.is_enabled(required))
        {
            return Err(ComposeError::unmet_dependency(provider.name(), missing));
        }
    }
    Ok(())
}

/// No two blocks share a name unless every block carrying it is repeatable.
pub fn check_unique_names(blocks: &[RuleBlock]) -> ComposeResult<()> {
    // name -> (occurrences, all repeatable)
    let mut seen: IndexMap<&str, (usize, bool)> = IndexMap::new();
    for block in blocks {
        let entry = seen.entry(block.name.as_str()).or_insert((0, true));
        entry.0 += 1;
        entry.1 &= block.repeatable;
    }

    let names: Vec<String> = seen
        .into_iter()
        .filter(|(_, (count, repeatable))| *count > 1 && !repeatable)
        .map(|(name, _)| name.to_string())
        .collect();
    if names.is_empty() {
        Ok(())
    } else {
        Err(ComposeError::DuplicateBlockName { names })
    }
}
