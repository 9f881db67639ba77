//! CLI command implementations

pub mod config;
pub mod plugins;
pub mod run;
