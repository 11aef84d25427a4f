//! Plugin loading and per-fragment memoization.
//!
//! Fragments name the plugin packages they need; a [`PluginLoader`] turns a
//! package name into an opaque [`Plugin`]. Each fragment keeps its loaded
//! plugins in [`PluginSlot`]s, so only the first composition pays the load.

use crate::error::LoadError;
use crate::types::Plugin;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

/// Source of plugin objects.
#[async_trait]
pub trait PluginLoader: Send + Sync {
    /// Load the plugin published as `package`.
    async fn load(&self, package: &str) -> Result<Plugin, LoadError>;
}

/// Payload of plugins served by [`BuiltinLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
    pub package: String,
}

/// Plugin packages the built-in fragments depend on.
pub const KNOWN_PACKAGES: &[&str] = &[
    "@eslint-react/eslint-plugin",
    "@stylistic/eslint-plugin",
    "@typescript-eslint/eslint-plugin",
    "@typescript-eslint/parser",
    "@vitest/eslint-plugin",
    "eslint-plugin-antfu",
    "eslint-plugin-astro",
    "eslint-plugin-better-tailwindcss",
    "eslint-plugin-format",
    "eslint-plugin-import-lite",
    "eslint-plugin-jsdoc",
    "eslint-plugin-jsonc",
    "eslint-plugin-n",
    "eslint-plugin-perfectionist",
    "eslint-plugin-pnpm",
    "eslint-plugin-react-hooks",
    "eslint-plugin-react-refresh",
    "eslint-plugin-regexp",
    "eslint-plugin-svelte",
    "eslint-plugin-toml",
    "eslint-plugin-unicorn",
    "eslint-plugin-yml",
    "@eslint/markdown",
];

/// Loader backed by the static catalog of [`KNOWN_PACKAGES`].
#[derive(Debug, Clone, Default)]
pub struct BuiltinLoader {
    extra: Vec<String>,
}

impl BuiltinLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also serve `packages` beyond the built-in catalog.
    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra.extend(packages.into_iter().map(Into::into));
        self
    }

    pub fn is_known(&self, package: &str) -> bool {
        KNOWN_PACKAGES.contains(&package) || self.extra.iter().any(|p| p == package)
    }
}

#[async_trait]
impl PluginLoader for BuiltinLoader {
    async fn load(&self, package: &str) -> Result<Plugin, LoadError> {
        if !self.is_known(package) {
            return Err(LoadError::NotInstalled {
                id: package.to_string(),
            });
        }
        Ok(Plugin::new(
            package,
            PluginManifest {
                package: package.to_string(),
            },
        ))
    }
}

/// Write-once cache for one plugin a fragment depends on.
#[derive(Debug)]
pub struct PluginSlot {
    package: &'static str,
    cell: OnceCell<Plugin>,
}

impl PluginSlot {
    pub fn new(package: &'static str) -> Self {
        Self {
            package,
            cell: OnceCell::new(),
        }
    }

    pub fn package(&self) -> &'static str {
        self.package
    }

    /// Get the plugin, loading it on first use.
    ///
    /// A failed load leaves the slot empty; nothing is retried within the call.
    pub async fn get(&self, loader: &dyn PluginLoader) -> Result<Plugin, LoadError> {
        self.cell
            .get_or_try_init(|| async {
                debug!(package = self.package, "Loading plugin");
                loader.load(self.package).await
            })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PluginLoader for CountingLoader {
        async fn load(&self, package: &str) -> Result<Plugin, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Plugin::opaque(package))
        }
    }

    #[tokio::test]
    async fn test_builtin_loader_known_and_unknown() {
        let loader = BuiltinLoader::new();
        let plugin = loader.load("eslint-plugin-n").await.unwrap();
        assert_eq!(plugin.id(), "eslint-plugin-n");
        assert_eq!(
            plugin.payload::<PluginManifest>().unwrap().package,
            "eslint-plugin-n"
        );

        let err = loader.load("eslint-plugin-nope").await.unwrap_err();
        assert_eq!(err.plugin_id(), "eslint-plugin-nope");
    }

    #[tokio::test]
    async fn test_builtin_loader_extra_packages() {
        let loader = BuiltinLoader::new().with_packages(["eslint-plugin-custom"]);
        assert!(loader.load("eslint-plugin-custom").await.is_ok());
    }

    #[tokio::test]
    async fn test_slot_loads_once() {
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
        };
        let slot = PluginSlot::new("eslint-plugin-x");
        assert!(!slot.is_loaded());

        let first = slot.get(&loader).await.unwrap();
        let second = slot.get(&loader).await.unwrap();
        assert_eq!(first, second);
        assert!(slot.is_loaded());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slot_failure_is_not_cached() {
        let slot = PluginSlot::new("eslint-plugin-missing");
        assert!(slot.get(&BuiltinLoader::new()).await.is_err());
        assert!(!slot.is_loaded());
        let loader = BuiltinLoader::new().with_packages(["eslint-plugin-missing"]);
        assert!(slot.get(&loader).await.is_ok());
    }
}
