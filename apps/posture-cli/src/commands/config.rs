//! Effective configuration display

use anyhow::Context;
use posture_core::Config;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;

    println!("{}", serde_yaml::to_string(&config.redacted())?);

    if let Err(e) = config.validate() {
        println!("WARNING: {}", e);
    }

    Ok(())
}
