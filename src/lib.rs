//! rulestack: layered lint configuration composition.
//!
//! Independently switchable fragments (JavaScript base rules, TypeScript,
//! stylistic rules, data formats, formatters, ...) produce ordered rule
//! blocks. The composer runs them in a fixed stage order, appends the
//! caller's own blocks, rewrites plugin identifiers to short aliases and
//! validates the result.
//!
//! ```no_run
//! use rulestack::{GlobalOptions, RuleBlock, RuleEntry};
//!
//! # async fn run() -> rulestack::ComposeResult<()> {
//! let options = GlobalOptions::new()
//!     .enable("react")
//!     .configure("stylistic", serde_json::json!({ "semi": true }));
//! let artifact = rulestack::compose(
//!     options,
//!     vec![RuleBlock::new("app/overrides")
//!         .rule("no-console", RuleEntry::warn())
//!         .into()],
//! )?
//! .await?;
//! println!("{}", artifact.to_json());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod compose;
pub mod error;
pub mod format;
pub mod fragments;
pub mod globs;
pub mod logging;
pub mod options;
pub mod plugins;
pub mod types;

pub use compose::{AliasTable, Artifact, CallerFragment, Composer, PendingComposition, compose};
pub use error::{ComposeError, ComposeResult, ErrorCode, LoadError, ProviderError};
pub use fragments::{FragmentProvider, ProduceContext, Registry, Stage};
pub use options::{GlobalOptions, ProjectType, Toggle};
pub use plugins::{BuiltinLoader, PluginLoader};
pub use types::{Plugin, RuleBlock, RuleEntry, Severity};
