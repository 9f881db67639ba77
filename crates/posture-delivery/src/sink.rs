//! The sink abstraction

use async_trait::async_trait;
use posture_core::{Batch, Result};
use tracing::{debug, info};

/// A destination for batches
#[async_trait]
pub trait Sink: Send + Sync {
    /// Name used in logs and delivery reports
    fn name(&self) -> &'static str;

    /// Send one batch in a single attempt
    async fn send(&self, batch: &Batch) -> Result<()>;
}

/// Writes batches to the log instead of the network
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

#[async_trait]
impl Sink for LoggingSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, batch: &Batch) -> Result<()> {
        info!(
            "Dry run: batch {} with {} events",
            batch.execution_id,
            batch.len()
        );
        for event in &batch.events {
            debug!("{}", serde_json::to_string(event)?);
        }
        Ok(())
    }
}
