//! End-to-end composition tests.

use async_trait::async_trait;
use rulestack::compose::{CallerFragment, TOP_LEVEL_NAME};
use rulestack::error::{ComposeError, ErrorCode, LoadError, ProviderError};
use rulestack::fragments::{FragmentProvider, ProduceContext, Registry, Stage, builtin_registry};
use rulestack::options::{Facts, GlobalOptions, Toggle, resolve_all, to_record};
use rulestack::plugins::{BuiltinLoader, PluginLoader};
use rulestack::types::{OptionsRecord, Plugin, RuleBlock, RuleEntry};
use rulestack::{Artifact, Composer};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Composer rooted in an empty temp dir, so no real `.gitignore` leaks in.
fn composer() -> (TempDir, Composer) {
    let temp = TempDir::new().unwrap();
    let composer = Composer::new().with_root(temp.path());
    (temp, composer)
}

async fn compose_with(composer: &Composer, global: GlobalOptions) -> Artifact {
    composer.compose(global, Vec::new()).unwrap().await.unwrap()
}

fn owned_by(block: &str, fragment: &str) -> bool {
    let own = format!("rulestack/{}", fragment);
    block == own || block.starts_with(&format!("{}/", own))
}

/// Loader that counts loads and refuses the packages in `missing`.
struct CountingLoader {
    calls: Arc<AtomicUsize>,
    missing: Vec<&'static str>,
}

impl CountingLoader {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            missing: Vec::new(),
        }
    }

    fn without(mut self, package: &'static str) -> Self {
        self.missing.push(package);
        self
    }
}

#[async_trait]
impl PluginLoader for CountingLoader {
    async fn load(&self, package: &str) -> Result<Plugin, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.missing.contains(&package) {
            return Err(LoadError::NotInstalled {
                id: package.to_string(),
            });
        }
        BuiltinLoader::new().with_packages([package]).load(package).await
    }
}

/// Minimal provider used to build custom registries.
struct Simple {
    name: &'static str,
    stage: Stage,
    requires: &'static [&'static str],
    invocations: Arc<AtomicUsize>,
}

impl Simple {
    fn new(name: &'static str, stage: Stage, invocations: &Arc<AtomicUsize>) -> Self {
        Self {
            name,
            stage,
            requires: &[],
            invocations: Arc::clone(invocations),
        }
    }

    fn requires(mut self, requires: &'static [&'static str]) -> Self {
        self.requires = requires;
        self
    }
}

#[async_trait]
impl FragmentProvider for Simple {
    fn name(&self) -> &'static str {
        self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn requires(&self) -> &'static [&'static str] {
        self.requires
    }

    async fn produce(
        &self,
        _options: &OptionsRecord,
        _cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            RuleBlock::new(self.name).rule("no-debugger", RuleEntry::error()),
        ])
    }
}

/// A stylistic-like provider with a single `semi` switch.
struct Style {
    invocations: Arc<AtomicUsize>,
}

#[async_trait]
impl FragmentProvider for Style {
    fn name(&self) -> &'static str {
        "style"
    }

    fn stage(&self) -> Stage {
        Stage::Stylistic
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&json!({ "semi": true }))
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        _cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let semi = options.get("semi").and_then(|v| v.as_bool()).unwrap_or(true);
        let mode = if semi { "always" } else { "never" };
        Ok(vec![
            RuleBlock::new("style")
                .plugin("@stylistic", Plugin::opaque("@stylistic/eslint-plugin"))
                .rule("@stylistic/semi", RuleEntry::error().with(mode)),
        ])
    }
}

fn rich_options() -> GlobalOptions {
    GlobalOptions::new()
        .enable("react")
        .enable("test")
        .enable("markdown")
        .enable("pnpm")
        .configure("typescript", json!({ "tsconfig_path": "tsconfig.json" }))
        .configure("formatters", json!({ "css": true, "markdown": "prettier" }))
        .configure("stylistic", json!({ "indent": 4, "semi": true }))
}

#[tokio::test]
async fn composition_is_deterministic() {
    let (_temp, composer) = composer();
    let caller = || -> Vec<CallerFragment> {
        vec![
            RuleBlock::new("app/rules")
                .rule("no-console", RuleEntry::warn())
                .into(),
            CallerFragment::deferred(async {
                Ok(vec![RuleBlock::new("").rule("no-alert", RuleEntry::error())])
            }),
        ]
    };

    let first = composer.compose(rich_options(), caller()).unwrap().await.unwrap();
    let second = composer.compose(rich_options(), caller()).unwrap().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn default_composition_follows_stage_order() {
    let (_temp, composer) = composer();
    let artifact = compose_with(&composer, GlobalOptions::default().enable("stylistic")).await;
    let names = artifact.names();

    let first_of = |fragment: &str| names.iter().position(|n| owned_by(n, fragment)).unwrap();
    assert!(first_of("ignores") < first_of("javascript"));
    assert!(first_of("javascript") < first_of("imports"));
    assert!(first_of("imports") < first_of("typescript"));
    assert!(first_of("typescript") < first_of("sort"));
    assert!(first_of("sort") < first_of("stylistic"));
    assert!(first_of("stylistic") < first_of("regexp"));
    assert!(first_of("regexp") < first_of("jsonc"));
}

#[test]
fn true_and_empty_object_resolve_to_defaults() {
    let registry = builtin_registry();
    for fragment in ["typescript", "stylistic", "jsonc", "formatters", "test", "sort"] {
        let with_true = GlobalOptions::new().toggle(fragment, Toggle::EnabledDefault);
        let with_empty = GlobalOptions::new().configure(fragment, json!({}));

        let (facts, resolved_true) = resolve_all(&with_true, &registry);
        let (_, resolved_empty) = resolve_all(&with_empty, &registry);

        let index = registry.names().iter().position(|n| *n == fragment).unwrap();
        let defaults = registry.get(fragment).unwrap().defaults(&facts);
        assert!(resolved_true[index].enabled, "{} should be enabled", fragment);
        assert_eq!(resolved_true[index].options, defaults, "{}: true", fragment);
        assert_eq!(resolved_empty[index].options, defaults, "{}: {{}}", fragment);
    }
}

#[tokio::test]
async fn disabled_fragment_contributes_no_blocks() {
    let (_temp, composer) = composer();
    let everything = rich_options().enable("jsx").enable("tailwind");
    let full = compose_with(&composer, everything.clone()).await;

    for fragment in [
        "ignores",
        "node",
        "jsdoc",
        "unicorn",
        "imports",
        "sort",
        "stylistic",
        "regexp",
        "test",
        "pnpm",
        "jsonc",
        "yaml",
        "toml",
        "markdown",
        "formatters",
        "tailwind",
        "jsx",
    ] {
        assert!(
            full.names().iter().any(|n| owned_by(n, fragment)),
            "{} should produce blocks when enabled",
            fragment
        );
        let artifact = compose_with(&composer, everything.clone().disable(fragment)).await;
        assert!(
            !artifact.names().iter().any(|n| owned_by(n, fragment)),
            "{} still has blocks after being disabled",
            fragment
        );
    }
}

#[tokio::test]
async fn required_fragment_cannot_be_disabled() {
    let (_temp, composer) = composer();
    let artifact = compose_with(&composer, GlobalOptions::new().disable("javascript")).await;
    assert!(artifact.names().iter().any(|n| owned_by(n, "javascript")));
}

#[tokio::test]
async fn caller_blocks_come_after_every_built_in_block() {
    let (_temp, composer) = composer();
    let built_in = compose_with(&composer, rich_options()).await;

    let global = rich_options().top_level(RuleBlock::new("").rule("no-console", RuleEntry::off()));
    let artifact = composer
        .compose(
            global,
            vec![
                RuleBlock::new("app/first").into(),
                vec![RuleBlock::new(""), RuleBlock::new("app/second")].into(),
            ],
        )
        .unwrap()
        .await
        .unwrap();

    let names = artifact.names();
    let built_in_count = built_in.len();
    assert_eq!(&names[..built_in_count], built_in.names().as_slice());
    assert_eq!(
        &names[built_in_count..],
        &["app/first", "rulestack/user/1", "app/second", TOP_LEVEL_NAME]
    );
}

#[tokio::test]
async fn reserved_key_rejected_before_any_provider_runs() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let loads = Arc::new(AtomicUsize::new(0));
    let composer = Composer::new()
        .with_registry(Registry::new().register(Simple::new("base", Stage::Base, &invocations)))
        .with_loader(CountingLoader::new(Arc::clone(&loads)));

    let global = GlobalOptions::from_value(json!({
        "base": true,
        "files": ["**/*.ts"],
        "rules": {"no-console": "warn"}
    }))
    .unwrap();

    let err = composer.compose(global, Vec::new()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ReservedKey);
    assert!(matches!(err, ComposeError::ReservedKey { ref key } if key == "files"));
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert_eq!(loads.load(Ordering::SeqCst), 0);

    let err = composer.plan(&GlobalOptions::from_value(json!({"files": ["a"]})).unwrap());
    assert_eq!(err.unwrap_err().code(), ErrorCode::ReservedKey);
}

#[tokio::test]
async fn reserved_key_rejected_whatever_its_value() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let composer = Composer::new()
        .with_registry(Registry::new().register(Simple::new("base", Stage::Base, &invocations)));

    for files in [json!(null), json!("src/**"), json!({"glob": "src/**"})] {
        let global = GlobalOptions::from_value(json!({"base": true, "files": files})).unwrap();
        let err = composer.compose(global, Vec::new()).unwrap_err();
        assert!(
            matches!(err, ComposeError::ReservedKey { ref key } if key == "files"),
            "unexpected error: {}",
            err
        );
    }
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn base_and_style_scenario() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let registry = Registry::new()
        .register(Simple::new("base", Stage::Base, &invocations))
        .register(Style {
            invocations: Arc::clone(&invocations),
        })
        .register(Simple::new("extra", Stage::AddOns, &invocations));
    let composer = Composer::new().with_registry(registry);

    let global = GlobalOptions::from_value(json!({
        "base": true,
        "style": {"semi": false}
    }))
    .unwrap();
    let artifact = compose_with(&composer, global).await;

    assert_eq!(artifact.names(), vec!["base", "style"]);
    let style = artifact.find("style").unwrap();
    let semi = &style.rules["style/semi"];
    assert_eq!(semi.options, vec![json!("never")]);
    assert!(style.plugins.contains_key("style"));
    assert_eq!(invocations.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn framework_without_language_extension_is_rejected() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let registry = Registry::new()
        .register(Simple::new("languageExtension", Stage::LanguageExtension, &invocations))
        .register(
            Simple::new("framework", Stage::LanguageExtension, &invocations)
                .requires(&["languageExtension"]),
        );
    let composer = Composer::new().with_registry(registry);

    let global = GlobalOptions::new().enable("framework");
    let err = composer.compose(global, Vec::new()).unwrap().await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::UnmetDependency);
    match &err {
        ComposeError::UnmetDependency { fragment, requires } => {
            assert_eq!(fragment, "framework");
            assert_eq!(requires, "languageExtension");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(invocations.load(Ordering::SeqCst), 0);

    let ok = GlobalOptions::new().enable("framework").enable("languageExtension");
    let artifact = compose_with(&composer, ok).await;
    assert_eq!(artifact.names(), vec!["languageExtension", "framework"]);
}

#[tokio::test]
async fn react_requires_typescript() {
    let (_temp, composer) = composer();
    let global = GlobalOptions::new().enable("react").disable("typescript");
    let err = composer.compose(global, Vec::new()).unwrap().await.unwrap_err();
    let msg = err.to_string();
    assert_eq!(err.code(), ErrorCode::UnmetDependency);
    assert!(msg.contains("react"));
    assert!(msg.contains("typescript"));
}

#[tokio::test]
async fn missing_plugin_aborts_with_fragment_and_stage() {
    let temp = TempDir::new().unwrap();
    let loads = Arc::new(AtomicUsize::new(0));
    let composer = Composer::new()
        .with_root(temp.path())
        .with_loader(CountingLoader::new(Arc::clone(&loads)).without("@vitest/eslint-plugin"));

    let err = composer
        .compose(GlobalOptions::new().enable("test"), Vec::new())
        .unwrap()
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::LoadFailed);
    match &err {
        ComposeError::Provider {
            fragment,
            stage,
            source: ProviderError::Load(load),
        } => {
            assert_eq!(fragment, "test");
            assert_eq!(*stage, Stage::AddOns);
            assert_eq!(load.plugin_id(), "@vitest/eslint-plugin");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn failed_caller_fragment_aborts_composition() {
    let (_temp, composer) = composer();
    let err = composer
        .compose(
            GlobalOptions::default(),
            vec![CallerFragment::deferred(async {
                Err(ProviderError::other("could not build"))
            })],
        )
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CallerFragmentFailed);
}

#[tokio::test]
async fn plugins_load_once_per_composer() {
    let temp = TempDir::new().unwrap();
    let loads = Arc::new(AtomicUsize::new(0));
    let composer = Composer::new()
        .with_root(temp.path())
        .with_loader(CountingLoader::new(Arc::clone(&loads)));

    compose_with(&composer, rich_options()).await;
    let after_first = loads.load(Ordering::SeqCst);
    assert!(after_first > 0);

    compose_with(&composer, rich_options()).await;
    compose_with(&composer.clone(), rich_options()).await;
    assert_eq!(loads.load(Ordering::SeqCst), after_first);
}

#[tokio::test]
async fn duplicate_caller_block_name_is_rejected() {
    let (_temp, composer) = composer();
    let err = composer
        .compose(
            GlobalOptions::default(),
            vec![RuleBlock::new("rulestack/ignores").into()],
        )
        .unwrap()
        .await
        .unwrap_err();
    match err {
        ComposeError::DuplicateBlockName { names } => {
            assert_eq!(names, vec!["rulestack/ignores".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn gitignore_patterns_become_global_ignores() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(".gitignore"),
        "# build output\nnode_modules\n/dist\ncoverage/\n!keep.log\n",
    )
    .unwrap();
    let composer = Composer::new().with_root(temp.path());

    let artifact = compose_with(&composer, GlobalOptions::default()).await;
    assert_eq!(artifact.names()[0], "rulestack/gitignore");

    let block = artifact.find("rulestack/gitignore").unwrap();
    assert!(block.files.is_none());
    assert_eq!(
        block.ignores.as_deref().unwrap(),
        &["**/node_modules", "dist", "**/coverage/", "!**/keep.log"]
    );

    let artifact = compose_with(&composer, GlobalOptions::new().disable("gitignore")).await;
    assert!(artifact.find("rulestack/gitignore").is_none());
}

#[tokio::test]
async fn strict_gitignore_fails_on_missing_file() {
    let (_temp, composer) = composer();
    let global = GlobalOptions::new().configure("gitignore", json!({ "strict": true }));
    let err = composer.compose(global, Vec::new()).unwrap().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProviderFailed);
    assert!(matches!(
        err,
        ComposeError::Provider {
            stage: Stage::Ignores,
            source: ProviderError::Io { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn shared_composer_is_reused() {
    let first = rulestack::compose(GlobalOptions::new().disable("gitignore"), Vec::new())
        .unwrap()
        .await
        .unwrap();
    let second = rulestack::compose(GlobalOptions::new().disable("gitignore"), Vec::new())
        .unwrap()
        .await
        .unwrap();
    assert_eq!(first, second);
    assert!(std::ptr::eq(Composer::shared(), Composer::shared()));
}
