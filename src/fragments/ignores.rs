//! Global ignore blocks: built-in exclusions and `.gitignore` discovery.

use super::{BLOCK_PREFIX, FragmentProvider, ProduceContext, Stage};
use crate::error::ProviderError;
use crate::globs::GLOB_EXCLUDE;
use crate::options::{Facts, decode, to_record};
use crate::types::{OptionsRecord, RuleBlock};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Options of the `gitignore` fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitignoreOptions {
    /// Directory the ignore files are looked up in, relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Ignore files to read, relative to `root`.
    pub files: Vec<String>,
    /// Fail when an ignore file is missing.
    pub strict: bool,
}

impl Default for GitignoreOptions {
    fn default() -> Self {
        Self {
            root: None,
            files: vec![".gitignore".to_string()],
            strict: false,
        }
    }
}

/// Reads `.gitignore` files and turns their patterns into ignore globs.
pub struct Gitignore;

#[async_trait]
impl FragmentProvider for Gitignore {
    fn name(&self) -> &'static str {
        "gitignore"
    }

    fn stage(&self) -> Stage {
        Stage::Ignores
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&GitignoreOptions::default())
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: GitignoreOptions = decode(self.name(), options);
        let base = match &options.root {
            Some(root) => cx.root.join(root),
            None => cx.root.to_path_buf(),
        };

        let mut globs = Vec::new();
        for file in &options.files {
            let path = base.join(file);
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if !options.strict => {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        debug!(path = %path.display(), "No ignore file");
                    } else {
                        warn!(path = %path.display(), "Skipping unreadable ignore file: {}", e);
                    }
                    continue;
                }
                Err(source) => return Err(ProviderError::Io { path, source }),
            };

            let prefix = Path::new(file)
                .parent()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            globs.extend(
                content
                    .lines()
                    .filter_map(|line| convert_pattern(line, &prefix)),
            );
        }

        if globs.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![
            RuleBlock::new(format!("{}/gitignore", BLOCK_PREFIX)).ignores(globs),
        ])
    }
}

/// Convert one `.gitignore` line into a glob.
///
/// `prefix` is the directory of the ignore file relative to the root (may be empty).
fn convert_pattern(line: &str, prefix: &str) -> Option<String> {
    let line = line.trim_end();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (negated, body) = match line.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let body = body.strip_prefix('\\').unwrap_or(body);
    if body.is_empty() {
        return None;
    }

    // A slash anywhere but the end anchors the pattern to the ignore file's directory
    let anchored = body.starts_with('/') || body.trim_end_matches('/').contains('/');
    let body = body.trim_start_matches('/');
    let mut glob = if anchored {
        body.to_string()
    } else {
        format!("**/{}", body)
    };
    if !prefix.is_empty() {
        glob = format!("{}/{}", prefix.trim_end_matches('/'), glob);
    }

    Some(if negated { format!("!{}", glob) } else { glob })
}

/// Options of the `ignores` fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoresOptions {
    /// Extra globs excluded on top of the built-in list.
    pub globs: Vec<String>,
}

/// Built-in exclusions plus user globs.
pub struct Ignores;

#[async_trait]
impl FragmentProvider for Ignores {
    fn name(&self) -> &'static str {
        "ignores"
    }

    fn stage(&self) -> Stage {
        Stage::Ignores
    }

    fn default_enabled(&self) -> bool {
        true
    }

    fn defaults(&self, _facts: &Facts) -> OptionsRecord {
        to_record(&IgnoresOptions::default())
    }

    async fn produce(
        &self,
        options: &OptionsRecord,
        _cx: &ProduceContext<'_>,
    ) -> Result<Vec<RuleBlock>, ProviderError> {
        let options: IgnoresOptions = decode(self.name(), options);
        let globs = GLOB_EXCLUDE
            .iter()
            .map(|g| g.to_string())
            .chain(options.globs);
        Ok(vec![
            RuleBlock::new(format!("{}/ignores", BLOCK_PREFIX)).ignores(globs),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::BuiltinLoader;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_convert_pattern() {
        assert_eq!(convert_pattern("node_modules", ""), Some("**/node_modules".into()));
        assert_eq!(convert_pattern("dist/", ""), Some("**/dist/".into()));
        assert_eq!(convert_pattern("/build", ""), Some("build".into()));
        assert_eq!(convert_pattern("docs/out", ""), Some("docs/out".into()));
        assert_eq!(convert_pattern("!keep.log", ""), Some("!**/keep.log".into()));
        assert_eq!(convert_pattern("\\#hash", ""), Some("**/#hash".into()));
        assert_eq!(convert_pattern("# comment", ""), None);
        assert_eq!(convert_pattern("   ", ""), None);
        assert_eq!(convert_pattern("*.log", "pkg"), Some("pkg/**/*.log".into()));
    }

    #[tokio::test]
    async fn test_gitignore_reads_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".gitignore"), "target/\n# c\n/coverage\n").unwrap();
        let loader = BuiltinLoader::new();
        let cx = ProduceContext {
            loader: &loader,
            root: temp.path(),
        };

        let options = Gitignore.defaults(&Facts::default());
        let blocks = Gitignore.produce(&options, &cx).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "rulestack/gitignore");
        assert_eq!(
            blocks[0].ignores,
            Some(vec!["**/target/".to_string(), "coverage".to_string()])
        );
    }

    #[tokio::test]
    async fn test_gitignore_missing_file() {
        let temp = TempDir::new().unwrap();
        let loader = BuiltinLoader::new();
        let cx = ProduceContext {
            loader: &loader,
            root: temp.path(),
        };

        let lenient = Gitignore.defaults(&Facts::default());
        assert!(Gitignore.produce(&lenient, &cx).await.unwrap().is_empty());

        let mut strict = lenient.clone();
        strict.insert("strict".into(), json!(true));
        let err = Gitignore.produce(&strict, &cx).await.unwrap_err();
        assert!(matches!(err, ProviderError::Io { .. }));
    }

    #[tokio::test]
    async fn test_ignores_appends_user_globs() {
        let loader = BuiltinLoader::new();
        let cx = ProduceContext {
            loader: &loader,
            root: Path::new("."),
        };
        let mut options = Ignores.defaults(&Facts::default());
        options.insert("globs".into(), json!(["fixtures/**"]));

        let blocks = Ignores.produce(&options, &cx).await.unwrap();
        let ignores = blocks[0].ignores.as_ref().unwrap();
        assert_eq!(ignores.len(), GLOB_EXCLUDE.len() + 1);
        assert_eq!(ignores.last().unwrap(), "fixtures/**");
    }
}
