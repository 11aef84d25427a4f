//! CLI command definitions for rulestack
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod compose;

use clap::{Parser, Subcommand};
use compose::ComposeArgs;
use std::path::PathBuf;

/// Compose layered lint configuration from fragments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (skips project/user discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root fragments discover files in (default: current directory)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose and print the artifact (default if no subcommand given)
    Compose(ComposeArgs),

    /// Print the name of every block, one per line
    Names,

    /// Print every distinct rule id, sorted
    Rules,

    /// Print the stages and fragments that would run, without running them
    Plan,
}
