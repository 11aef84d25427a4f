//! Composer facade.

use super::artifact::Artifact;
use super::linearize::{Plan, execute, linearize};
use super::merger::{CallerFragment, TopLevelBlock, merge, resolve_fragments};
use super::rename::{AliasTable, rename};
use super::validate::{check_global, check_unique_names};
use crate::error::ComposeResult;
use crate::fragments::{ProduceContext, Registry, builtin_registry};
use crate::options::GlobalOptions;
use crate::plugins::{BuiltinLoader, PluginLoader};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::IntoFuture;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{Instrument, info, info_span};

/// Wires resolution, staged execution, merge, rename and validation together.
///
/// Cloning is cheap and clones share provider memoization slots.
#[derive(Clone)]
pub struct Composer {
    registry: Arc<Registry>,
    loader: Arc<dyn PluginLoader>,
    aliases: Arc<AliasTable>,
    root: PathBuf,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("registry", &self.registry)
            .field("aliases", &self.aliases)
            .field("root", &self.root)
            .finish()
    }
}

impl Composer {
    /// Built-in fragments, the built-in plugin catalog and the default alias table.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(builtin_registry()),
            loader: Arc::new(BuiltinLoader::new()),
            aliases: Arc::new(AliasTable::default()),
            root: PathBuf::from("."),
        }
    }

    /// Process-wide composer, so plugin loads are paid once per process.
    pub fn shared() -> &'static Composer {
        static SHARED: OnceLock<Composer> = OnceLock::new();
        SHARED.get_or_init(Composer::new)
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_loader(mut self, loader: impl PluginLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = Arc::new(aliases);
        self
    }

    /// Directory fragments discover files in (e.g. `.gitignore`).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The invocation plan for `global`, without running any provider.
    pub fn plan(&self, global: &GlobalOptions) -> ComposeResult<Plan> {
        check_global(global)?;
        linearize(global, &self.registry).map(|(_, plan)| plan)
    }

    /// Start a composition.
    ///
    /// Authoring errors (a reserved top-level key) are returned here,
    /// before anything runs. Everything else surfaces when the returned
    /// [`PendingComposition`] is awaited.
    pub fn compose(
        &self,
        global: GlobalOptions,
        fragments: Vec<CallerFragment>,
    ) -> ComposeResult<PendingComposition> {
        check_global(&global)?;
        let top_level = global.top_level.clone().map(TopLevelBlock::new).transpose()?;

        let composer = self.clone();
        let span = info_span!("compose", fragments = fragments.len());
        let future = async move { composer.run(global, fragments, top_level).await }
            .instrument(span)
            .boxed();
        Ok(PendingComposition { future })
    }

    async fn run(
        &self,
        global: GlobalOptions,
        fragments: Vec<CallerFragment>,
        top_level: Option<TopLevelBlock>,
    ) -> ComposeResult<Artifact> {
        let (_, plan) = linearize(&global, &self.registry)?;

        let cx = ProduceContext {
            loader: self.loader.as_ref(),
            root: &self.root,
        };
        let built_in = execute(&plan, &cx).await?;
        let caller = resolve_fragments(fragments).await?;
        let merged = merge(built_in, caller, top_level);

        let (blocks, aliases) = if global.auto_rename_plugins {
            (rename(merged, &self.aliases)?, Some(Arc::clone(&self.aliases)))
        } else {
            (merged, None)
        };
        check_unique_names(&blocks)?;

        info!(
            fragments = plan.fragment_names().len(),
            blocks = blocks.len(),
            "Composition complete"
        );
        Ok(Artifact::new(blocks, aliases))
    }
}

/// A composition that passed the authoring checks. Await it for the artifact.
pub struct PendingComposition {
    future: BoxFuture<'static, ComposeResult<Artifact>>,
}

impl fmt::Debug for PendingComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingComposition")
    }
}

impl IntoFuture for PendingComposition {
    type Output = ComposeResult<Artifact>;
    type IntoFuture = BoxFuture<'static, ComposeResult<Artifact>>;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

/// Compose with the shared default composer.
pub fn compose(
    global: GlobalOptions,
    fragments: Vec<CallerFragment>,
) -> ComposeResult<PendingComposition> {
    Composer::shared().compose(global, fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::RuleBlock;
    use serde_json::json;
    use tempfile::TempDir;

    fn composer() -> (TempDir, Composer) {
        let temp = TempDir::new().unwrap();
        let composer = Composer::new().with_root(temp.path());
        (temp, composer)
    }

    #[tokio::test]
    async fn test_default_composition_is_renamed() {
        let (_temp, composer) = composer();
        let artifact = composer
            .compose(GlobalOptions::default(), Vec::new())
            .unwrap()
            .await
            .unwrap();

        assert!(artifact.find("rulestack/ignores").is_some());
        assert!(artifact.find("rulestack/gitignore").is_none());
        let ids = artifact.rule_ids();
        assert!(ids.contains(&"ts/no-unused-vars"));
        assert!(!ids.iter().any(|id| id.starts_with("@typescript-eslint/")));
        assert!(!ids.iter().any(|id| id.starts_with("style/")));
    }

    #[tokio::test]
    async fn test_rename_can_be_turned_off() {
        let (_temp, composer) = composer();
        let global = GlobalOptions::default()
            .enable("stylistic")
            .auto_rename_plugins(false);
        let artifact = composer.compose(global, Vec::new()).unwrap().await.unwrap();
        assert!(artifact.rule_ids().contains(&"@stylistic/semi"));
    }

    #[test]
    fn test_top_level_files_rejected_synchronously() {
        for files in [json!(["src/**"]), json!(null), json!("src/**")] {
            let global = GlobalOptions::from_value(json!({"files": files})).unwrap();
            let err = Composer::new().compose(global.clone(), Vec::new()).unwrap_err();
            assert_eq!(err.code(), ErrorCode::ReservedKey);
            let err = Composer::new().plan(&global).unwrap_err();
            assert_eq!(err.code(), ErrorCode::ReservedKey);
        }
    }

    #[tokio::test]
    async fn test_top_level_block_is_last() {
        let (_temp, composer) = composer();
        let global = GlobalOptions::from_value(json!({
            "rules": {"no-console": "warn"}
        }))
        .unwrap();
        let artifact = composer
            .compose(global, vec![RuleBlock::new("mine").into()])
            .unwrap()
            .await
            .unwrap();
        let names = artifact.names();
        assert_eq!(names[names.len() - 2], "mine");
        assert_eq!(names[names.len() - 1], "rulestack/top-level");
    }

    #[test]
    fn test_plan_without_running() {
        let plan = Composer::new()
            .plan(&GlobalOptions::default().enable("test"))
            .unwrap();
        assert!(plan.fragment_names().contains(&"test"));
    }
}
