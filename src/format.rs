//! Output formatting for artifacts and plans.

use crate::compose::{Artifact, Plan};
use anyhow::Result;

/// Serialization format for a composed artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    /// Guess the format from an output file extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_str)
    }
}

/// Render the artifact as a list of blocks.
pub fn format_artifact(artifact: &Artifact, format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(artifact)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml::to_string(artifact)?,
    };
    Ok(out)
}

/// One line per item, with a trailing newline.
pub fn format_lines<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(item);
        out.push('\n');
    }
    out
}

/// Stages and their fragments, in invocation order.
pub fn format_plan(plan: &Plan) -> String {
    if plan.is_empty() {
        return "(no fragments enabled)\n".to_string();
    }

    let mut out = String::new();
    for stage in plan.stages() {
        out.push_str(&format!("{}:\n", stage.stage));
        for fragment in &stage.fragments {
            out.push_str(&format!("  - {}", fragment.name()));
            if !fragment.options.is_empty() {
                let keys: Vec<&str> = fragment.options.keys().map(String::as_str).collect();
                out.push_str(&format!(" ({})", keys.join(", ")));
            }
            out.push('\n');
        }
    }
    out
}
