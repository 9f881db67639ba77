//! Evaluation engine for the posture evaluator
//!
//! Runs every registered plugin, validates and enriches its findings, and
//! hands fixed-size batches to the delivery channel.

mod batcher;
mod classify;
mod enricher;
mod output;
mod registry;
mod runner;
mod validator;

pub use batcher::*;
pub use classify::*;
pub use enricher::*;
pub use output::*;
pub use registry::*;
pub use runner::*;
pub use validator::*;
