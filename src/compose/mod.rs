//! The composition engine.
//!
//! A composition runs in a fixed sequence:
//! 1. **Resolve** - global options become per-fragment descriptors
//! 2. **Linearize** - enabled fragments are grouped into the nine stages and
//!    hard dependencies are checked
//! 3. **Execute** - stages run in order; providers within a stage run concurrently
//! 4. **Merge** - caller fragments, then the top-level block, are appended
//! 5. **Rename** - plugin identifiers go through the alias table
//! 6. **Validate** - block names must be unique unless repeatable

mod artifact;
mod composer;
mod linearize;
mod merger;
mod rename;
mod validate;

pub use artifact::Artifact;
pub use composer::{Composer, PendingComposition, compose};
pub use linearize::{Plan, PlannedFragment, StagePlan, execute, linearize};
pub use merger::{
    CallerFragment, TOP_LEVEL_NAME, TopLevelBlock, merge, resolve_fragments, user_block_name,
};
pub use rename::{AliasTable, DEFAULT_ALIASES, rename, rename_block};
pub use validate::{check_dependencies, check_global, check_top_level, check_unique_names};
