//! Posture CLI
//!
//! Runs the registered cloud posture checks and ships their findings.

mod commands;
mod replay;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// posture - cloud security posture evaluator
#[derive(Parser)]
#[command(name = "posture")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long, global = true, env = "POSTURE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every registered plugin and deliver the findings
    Run(commands::run::RunArgs),

    /// List registered plugins
    Plugins(commands::plugins::PluginsArgs),

    /// Show the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.config.as_deref()),
        Commands::Plugins(args) => commands::plugins::run(args, cli.config.as_deref()),
        Commands::Config => commands::config::run(cli.config.as_deref()),
    }
}
