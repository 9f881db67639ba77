//! Dual-sink delivery channel

use crate::ingestion::IngestionSink;
use crate::logs::LogsSink;
use crate::sink::{LoggingSink, Sink};
use posture_core::{Batch, Config, Deliver, DeliveryReport, PostureError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Sends every batch to the structured sink and, if enabled, the logs sink
pub struct DeliveryChannel {
    runtime: Runtime,
    structured: Arc<dyn Sink>,
    logs: Option<Arc<dyn Sink>>,
}

impl DeliveryChannel {
    /// Create a channel over arbitrary sinks
    pub fn new(structured: Arc<dyn Sink>, logs: Option<Arc<dyn Sink>>) -> Result<Self> {
        Ok(Self {
            runtime: build_runtime()?,
            structured,
            logs,
        })
    }

    /// Create the production channel described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let runtime = build_runtime()?;
        let structured: Arc<dyn Sink> = {
            let _guard = runtime.enter();
            Arc::new(IngestionSink::connect(config)?)
        };
        let logs: Option<Arc<dyn Sink>> = if config.logs.enabled {
            Some(Arc::new(LogsSink::new(config)?))
        } else {
            None
        };

        Ok(Self {
            runtime,
            structured,
            logs,
        })
    }

    /// A channel that only logs what it would send
    pub fn dry_run() -> Result<Self> {
        Self::new(Arc::new(LoggingSink), None)
    }
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(PostureError::from)
}

impl Deliver for DeliveryChannel {
    fn deliver(&self, batch: Batch) -> DeliveryReport {
        let batch_size = batch.len();
        let started = Instant::now();
        info!("Sending requests {}", batch_size);

        let (structured, logs) = self.runtime.block_on(async {
            let structured = self.structured.send(&batch);
            let logs = async {
                match &self.logs {
                    Some(sink) => Some(sink.send(&batch).await),
                    None => None,
                }
            };
            tokio::join!(structured, logs)
        });

        let elapsed_ms = started.elapsed().as_millis();
        if let Err(e) = &structured {
            warn!(
                "Sending {} events to {} failed after {}ms: {}",
                batch_size,
                self.structured.name(),
                elapsed_ms,
                e
            );
        }
        if let (Some(Err(e)), Some(sink)) = (&logs, &self.logs) {
            warn!(
                "Failed to send {} events to {} after {}ms: {}",
                batch_size,
                sink.name(),
                elapsed_ms,
                e
            );
        }

        DeliveryReport {
            batch_size,
            elapsed_ms,
            structured: structured.into(),
            logs: logs.map(Into::into),
        }
    }
}
