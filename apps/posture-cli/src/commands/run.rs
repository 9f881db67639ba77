//! Full posture run command

use crate::replay;
use anyhow::Context;
use clap::Args;
use posture_core::Config;
use posture_delivery::DeliveryChannel;
use posture_engine::{format_json, format_text, PostureRunnerBuilder};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args)]
pub struct RunArgs {
    /// Findings files to replay as plugins
    #[arg(long = "findings", value_name = "FILE")]
    findings: Vec<PathBuf>,

    /// Report format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Log batches instead of sending them
    #[arg(long)]
    dry_run: bool,
}

pub fn run(args: RunArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    if args.dry_run {
        config.validate_credentials()?;
    } else {
        config.validate()?;
    }

    let runner = PostureRunnerBuilder::new()
        .registry(replay::registry(&args.findings, &config.region))
        .batch_size(config.batch_size)
        .build();

    let channel = if args.dry_run {
        info!("Dry run: batches are logged, not sent");
        DeliveryChannel::dry_run()?
    } else {
        DeliveryChannel::from_config(&config)?
    };

    let report = runner.run(&channel)?;

    match args.format.as_str() {
        "json" => println!("{}", format_json(&report, true)?),
        _ => println!("{}", format_text(&report)),
    }

    Ok(())
}
