//! Stitch CLI - assemble one Cargo workspace from several git repositories

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use stitch::util::shell::{ColorChoice, Shell};

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Arc<Shell>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("stitch=debug")
    } else {
        EnvFilter::new("stitch=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let global_opts = GlobalOptions {
        shell: Arc::new(Shell::from_flags(cli.quiet, cli.verbose, color)),
    };

    match cli.command {
        Commands::Init(args) => commands::init::execute(args, &global_opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
