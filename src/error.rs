//! Structured error types for composition.

use crate::fragments::Stage;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authoring errors
    ReservedKey,
    InvalidAliasTable,
    InvalidConfig,

    // Dependency errors
    UnmetDependency,

    // Load errors
    LoadFailed,
    ProviderFailed,
    CallerFragmentFailed,

    // Merge conflicts
    DuplicateBlockName,
    PluginAliasConflict,

    // Handle misuse
    UnknownBlock,
}

/// Failure to materialize a plugin through a [`crate::plugins::PluginLoader`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("plugin \"{id}\" is not installed")]
    NotInstalled { id: String },

    #[error("failed to load plugin \"{id}\": {reason}")]
    Failed { id: String, reason: String },
}

impl LoadError {
    /// The plugin identifier that failed to load.
    pub fn plugin_id(&self) -> &str {
        match self {
            LoadError::NotInstalled { id } | LoadError::Failed { id, .. } => id,
        }
    }
}

/// Failure raised by a fragment provider while producing its blocks.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn other(msg: impl Into<String>) -> Self {
        ProviderError::Other(msg.into())
    }
}

/// Every way a composition can fail. All of them abort the whole composition.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(
        "the \"{key}\" key is not allowed in the global options because they apply to every fragment; \
         place it in a caller-supplied fragment instead"
    )]
    ReservedKey { key: String },

    #[error("invalid alias table: {reason}")]
    InvalidAliasTable { reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("fragment \"{fragment}\" requires fragment \"{requires}\" to be enabled")]
    UnmetDependency { fragment: String, requires: String },

    #[error("fragment \"{fragment}\" failed in stage {stage}: {source}")]
    Provider {
        fragment: String,
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    #[error("caller fragment #{index} failed: {source}")]
    Caller {
        index: usize,
        #[source]
        source: ProviderError,
    },

    #[error("duplicate rule block names: {}", names.join(", "))]
    DuplicateBlockName { names: Vec<String> },

    #[error(
        "plugins \"{first}\" and \"{second}\" in block \"{block}\" both rename to \"{alias}\""
    )]
    PluginAliasConflict {
        block: String,
        alias: String,
        first: String,
        second: String,
    },

    #[error("no rule block named \"{name}\"")]
    UnknownBlock { name: String },
}

impl ComposeError {
    /// Stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ComposeError::ReservedKey { .. } => ErrorCode::ReservedKey,
            ComposeError::InvalidAliasTable { .. } => ErrorCode::InvalidAliasTable,
            ComposeError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            ComposeError::UnmetDependency { .. } => ErrorCode::UnmetDependency,
            ComposeError::Provider {
                source: ProviderError::Load(_),
                ..
            } => ErrorCode::LoadFailed,
            ComposeError::Provider { .. } => ErrorCode::ProviderFailed,
            ComposeError::Caller { .. } => ErrorCode::CallerFragmentFailed,
            ComposeError::DuplicateBlockName { .. } => ErrorCode::DuplicateBlockName,
            ComposeError::PluginAliasConflict { .. } => ErrorCode::PluginAliasConflict,
            ComposeError::UnknownBlock { .. } => ErrorCode::UnknownBlock,
        }
    }

    pub fn reserved_key(key: &str) -> Self {
        ComposeError::ReservedKey {
            key: key.to_string(),
        }
    }

    pub fn unmet_dependency(fragment: &str, requires: &str) -> Self {
        ComposeError::UnmetDependency {
            fragment: fragment.to_string(),
            requires: requires.to_string(),
        }
    }

    pub fn unknown_block(name: &str) -> Self {
        ComposeError::UnknownBlock {
            name: name.to_string(),
        }
    }
}

/// Result type for composition operations.
pub type ComposeResult<T> = std::result::Result<T, ComposeError>;
