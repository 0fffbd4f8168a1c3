//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

/// Stitch - assemble one Cargo workspace from several git repositories
#[derive(Parser)]
#[command(name = "stitch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress status output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble a new workspace from git repositories
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Git repository URLs to include
    #[arg(short, long, required = true, num_args = 1..)]
    pub repos: Vec<String>,

    /// Git branch to track
    #[arg(short, long, default_value = "main")]
    pub branch: String,

    /// Folder to create the workspace in (defaults to a timestamped name)
    #[arg(short, long)]
    pub folder: Option<PathBuf>,

    /// Select only matching projects (name, path glob, or path substring)
    #[arg(long = "filter", value_name = "PATTERN")]
    pub filters: Vec<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}
