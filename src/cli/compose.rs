//! Compose subcommand for rulestack CLI
//!
//! Composes the configured fragments and writes the artifact as JSON or YAML.

use crate::format::OutputFormat;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the compose subcommand
#[derive(Args, Debug, Default)]
pub struct ComposeArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (default: from the output extension, else json)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Keep natural plugin identifiers instead of the short aliases
    #[arg(long)]
    pub no_rename: bool,
}

impl ComposeArgs {
    /// Explicit `--format`, then the output file extension, then JSON.
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .or_else(|| self.output.as_deref().and_then(OutputFormat::from_path))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_resolution() {
        let args = ComposeArgs::default();
        assert_eq!(args.output_format(), OutputFormat::Json);

        let args = ComposeArgs {
            output: Some(PathBuf::from("eslint.yml")),
            ..Default::default()
        };
        assert_eq!(args.output_format(), OutputFormat::Yaml);

        let args = ComposeArgs {
            output: Some(PathBuf::from("eslint.yml")),
            format: Some(OutputFormat::Json),
            ..Default::default()
        };
        assert_eq!(args.output_format(), OutputFormat::Json);
    }
}
