//! Plugin listing command

use crate::replay;
use anyhow::Context;
use clap::Args;
use posture_core::Config;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct PluginsArgs {
    /// Findings files to replay as plugins
    #[arg(long = "findings", value_name = "FILE")]
    findings: Vec<PathBuf>,
}

pub fn run(args: PluginsArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let registry = replay::registry(&args.findings, &config.region);

    println!("Registered plugins ({})", registry.len());
    println!("======================\n");
    for (index, name) in registry.names().iter().enumerate() {
        println!("{:>3}. {}", index + 1, name);
    }

    Ok(())
}
