//! Global options loader with tier-based merging.
//!
//! Loads the global options object from config files and merges the tiers
//! field by field.

use super::global::{GlobalOptions, is_fragment_key};
use super::merge::deep_merge_all;
use super::toggle::Toggle;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the project-level config.
pub const PROJECT_CONFIG_FILE: &str = "rulestack.yaml";

/// File name of the user-level config.
pub const USER_CONFIG_FILE: &str = "config.yaml";

/// Config file tier, lowest priority first. `RULESTACK_*` variables apply on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Project-level config ($CWD/rulestack.yaml)
    Project,
    /// User-level config (~/.rulestack/config.yaml)
    User,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
        }
    }
}

/// Directories searched for each tier.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: RULESTACK_USER_DIR or ~/.rulestack
        let user_dir = std::env::var("RULESTACK_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".rulestack")));

        // Project dir: RULESTACK_PROJECT_DIR or $CWD
        let project_dir = std::env::var("RULESTACK_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(".")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn project_file(&self) -> Option<PathBuf> {
        self.project_dir
            .as_ref()
            .map(|dir| dir.join(PROJECT_CONFIG_FILE))
    }

    pub fn user_file(&self) -> Option<PathBuf> {
        self.user_dir.as_ref().map(|dir| dir.join(USER_CONFIG_FILE))
    }
}

/// Loader that merges the config tiers into one [`GlobalOptions`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Merged options
    options: GlobalOptions,
    /// Config files that contributed, lowest tier first
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load options from all tiers.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load options with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        // Explicit config path replaces the tiers
        if let Ok(explicit_path) = std::env::var("RULESTACK_CONFIG_PATH") {
            return Self::load_file(PathBuf::from(explicit_path), paths);
        }

        let mut values: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        let tiers = [
            (ConfigTier::Project, paths.project_file()),
            (ConfigTier::User, paths.user_file()),
        ];
        for (tier, file) in tiers {
            let Some(file) = file else { continue };
            if !file.exists() {
                continue;
            }
            match read_config_value(&file) {
                Ok(value) => {
                    debug!(tier = %tier, path = %file.display(), "Loaded config tier");
                    values.push(disable_null_fragments(value));
                    sources.push((tier, file));
                }
                Err(e) => {
                    warn!(tier = %tier, path = %file.display(), "Skipping config tier: {:#}", e);
                }
            }
        }

        let merged = deep_merge_all(values);
        let mut options = GlobalOptions::from_value(merged)?;
        apply_env_overrides(&mut options, |key| std::env::var(key).ok());

        Ok(Self {
            paths,
            options,
            sources,
        })
    }

    /// Load options from one explicit file, ignoring the tiers.
    pub fn load_file(path: PathBuf, paths: ConfigPaths) -> Result<Self> {
        let value = read_config_value(&path)?;
        let mut options = GlobalOptions::from_value(value)
            .with_context(|| format!("invalid options in {}", path.display()))?;
        apply_env_overrides(&mut options, |key| std::env::var(key).ok());
        Ok(Self {
            paths,
            options,
            sources: vec![(ConfigTier::Project, path)],
        })
    }

    /// Get the loaded options.
    pub fn options(&self) -> &GlobalOptions {
        &self.options
    }

    /// Consume the loader and return the options.
    pub fn into_options(self) -> GlobalOptions {
        self.options
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read one YAML (or JSON) config file into a value.
fn read_config_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

/// A fragment set to `null` in a tier reads as `false`.
///
/// Deep merging keeps the lower tier's value under a `null` overlay, while a
/// lone `null` toggle means disabled; this keeps both readings the same.
fn disable_null_fragments(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            for (key, slot) in map.iter_mut() {
                if slot.is_null() && is_fragment_key(key) {
                    *slot = Value::Bool(false);
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn env_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}

/// Apply environment variable overrides, looked up through `lookup`.
pub fn apply_env_overrides(options: &mut GlobalOptions, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(raw) = lookup("RULESTACK_AUTO_RENAME") {
        options.auto_rename_plugins = env_flag(&raw);
    }

    if let Some(raw) = lookup("RULESTACK_GITIGNORE") {
        if env_flag(&raw) {
            // Keep explicit gitignore options, only flip the switch on
            if !options
                .toggle_for("gitignore")
                .is_some_and(Toggle::is_enabled)
            {
                options
                    .fragments
                    .insert("gitignore".to_string(), Toggle::EnabledDefault);
            }
        } else {
            options
                .fragments
                .insert("gitignore".to_string(), Toggle::Disabled);
        }
    }
}
