//! rulestack
//!
//! Composes layered lint configuration from the project's options and
//! prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use rulestack::cli::compose::ComposeArgs;
use rulestack::cli::{Cli, Command};
use rulestack::format::{format_artifact, format_lines, format_plan};
use rulestack::logging::{self, LogTarget};
use rulestack::options::{ConfigLoader, ConfigPaths, GlobalOptions};
use rulestack::{Artifact, Composer};
use std::io::Write;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let loader = match &cli.config {
        Some(path) => ConfigLoader::load_file(path.clone(), ConfigPaths::discover())?,
        None => ConfigLoader::load()?,
    };
    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "Using config");
    }
    let options = loader.into_options();

    let mut composer = Composer::new();
    if let Some(root) = &cli.root {
        composer = composer.with_root(root);
    }

    match cli.command {
        Some(Command::Compose(args)) => run_compose(&composer, options, args).await?,
        None => run_compose(&composer, options, ComposeArgs::default()).await?,
        Some(Command::Names) => {
            let artifact = compose(&composer, options).await?;
            print(&format_lines(artifact.names()))?;
        }
        Some(Command::Rules) => {
            let artifact = compose(&composer, options).await?;
            print(&format_lines(artifact.rule_ids()))?;
        }
        Some(Command::Plan) => {
            let plan = composer.plan(&options)?;
            print(&format_plan(&plan))?;
        }
    }

    Ok(())
}

async fn compose(composer: &Composer, options: GlobalOptions) -> Result<Artifact> {
    let artifact = composer.compose(options, Vec::new())?.await?;
    Ok(artifact)
}

async fn run_compose(composer: &Composer, options: GlobalOptions, args: ComposeArgs) -> Result<()> {
    let options = if args.no_rename {
        options.auto_rename_plugins(false)
    } else {
        options
    };
    let artifact = compose(composer, options).await?;
    let rendered = format_artifact(&artifact, args.output_format())?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(
                path = %path.display(),
                blocks = artifact.len(),
                "Wrote artifact"
            );
        }
        None => print(&rendered)?,
    }
    Ok(())
}

fn print(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
