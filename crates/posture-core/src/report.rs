//! Report types for plugin executions and batch deliveries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to one plugin during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PluginStatus {
    /// Plugin ran and its findings were validated
    Completed { findings: usize },
    /// Plugin returned no output for this context
    Declined,
    /// Regional gate said the plugin does not apply
    NotApplicable { reason: String },
    /// Plugin failed while being constructed or run; its findings were discarded
    Faulted { message: String },
}

/// Execution record for one plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Registration name
    pub name: String,

    /// Declared provider (empty when construction failed)
    pub provider: String,

    /// Declared service (empty when construction failed)
    pub service: String,

    pub status: PluginStatus,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

/// Outcome of one sink for one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SinkOutcome {
    Delivered,
    Failed { cause: String },
}

impl SinkOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SinkOutcome::Delivered)
    }
}

impl<E: std::fmt::Display> From<std::result::Result<(), E>> for SinkOutcome {
    fn from(result: std::result::Result<(), E>) -> Self {
        match result {
            Ok(()) => SinkOutcome::Delivered,
            Err(e) => SinkOutcome::Failed {
                cause: e.to_string(),
            },
        }
    }
}

/// Outcome of sending one batch to both sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Number of events in the batch
    pub batch_size: usize,

    /// Wall time spent delivering, in milliseconds
    pub elapsed_ms: u128,

    /// Structured ingestion sink
    pub structured: SinkOutcome,

    /// HTTP log sink; `None` when the sink is disabled
    pub logs: Option<SinkOutcome>,
}

impl DeliveryReport {
    /// Number of sinks that failed for this batch
    pub fn failures(&self) -> usize {
        let structured = usize::from(!self.structured.is_delivered());
        let logs = self
            .logs
            .as_ref()
            .map(|o| usize::from(!o.is_delivered()))
            .unwrap_or(0);
        structured + logs
    }
}

/// Summary statistics for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Plugins in the registry
    pub total_plugins: usize,

    /// Plugins whose findings were accepted
    pub plugins_completed: usize,

    /// Plugins that declined or were gated out
    pub plugins_skipped: usize,

    /// Plugins that faulted
    pub plugins_faulted: usize,

    /// Events produced
    pub events: usize,

    /// Batches handed to the delivery channel
    pub batches: usize,

    /// Sink failures across all batches
    pub sink_failures: usize,
}

/// Complete record of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub test_id: String,

    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    pub summary: RunSummary,

    pub plugins: Vec<PluginRecord>,

    pub deliveries: Vec<DeliveryReport>,
}

impl RunReport {
    pub fn new(test_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            test_id: test_id.into(),
            started_at,
            completed_at: started_at,
            summary: RunSummary::default(),
            plugins: Vec::new(),
            deliveries: Vec::new(),
        }
    }

    /// Record a plugin execution
    pub fn add_plugin(&mut self, record: PluginRecord) {
        match &record.status {
            PluginStatus::Completed { findings } => {
                self.summary.plugins_completed += 1;
                self.summary.events += findings;
            }
            PluginStatus::Declined | PluginStatus::NotApplicable { .. } => {
                self.summary.plugins_skipped += 1
            }
            PluginStatus::Faulted { .. } => self.summary.plugins_faulted += 1,
        }
        self.plugins.push(record);
    }

    /// Record a batch delivery
    pub fn add_delivery(&mut self, report: DeliveryReport) {
        self.summary.batches += 1;
        self.summary.sink_failures += report.failures();
        self.deliveries.push(report);
    }

    /// Mark run as completed
    pub fn complete(&mut self) {
        self.completed_at = Utc::now();
    }

    pub fn faulted_plugins(&self) -> Vec<&PluginRecord> {
        self.plugins
            .iter()
            .filter(|p| matches!(p.status, PluginStatus::Faulted { .. }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: PluginStatus) -> PluginRecord {
        let now = Utc::now();
        PluginRecord {
            name: "gcp_kms".to_string(),
            provider: "gcp".to_string(),
            service: "kms".to_string(),
            status,
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_summary_counts_plugins() {
        let mut report = RunReport::new("id", Utc::now());
        report.add_plugin(record(PluginStatus::Completed { findings: 4 }));
        report.add_plugin(record(PluginStatus::Declined));
        report.add_plugin(record(PluginStatus::NotApplicable {
            reason: "global".to_string(),
        }));
        report.add_plugin(record(PluginStatus::Faulted {
            message: "boom".to_string(),
        }));

        assert_eq!(report.summary.plugins_completed, 1);
        assert_eq!(report.summary.plugins_skipped, 2);
        assert_eq!(report.summary.plugins_faulted, 1);
        assert_eq!(report.summary.events, 4);
        assert_eq!(report.faulted_plugins().len(), 1);
    }

    #[test]
    fn test_delivery_failures_are_additive() {
        let mut report = RunReport::new("id", Utc::now());
        report.add_delivery(DeliveryReport {
            batch_size: 10,
            elapsed_ms: 3,
            structured: SinkOutcome::Failed {
                cause: "unavailable".to_string(),
            },
            logs: Some(SinkOutcome::Delivered),
        });
        report.add_delivery(DeliveryReport {
            batch_size: 2,
            elapsed_ms: 1,
            structured: SinkOutcome::Failed {
                cause: "unavailable".to_string(),
            },
            logs: Some(SinkOutcome::Failed {
                cause: "500".to_string(),
            }),
        });

        assert_eq!(report.summary.batches, 2);
        assert_eq!(report.summary.sink_failures, 3);
    }

    #[test]
    fn test_sink_outcome_from_result() {
        let ok: std::result::Result<(), String> = Ok(());
        assert!(SinkOutcome::from(ok).is_delivered());
        let err: std::result::Result<(), String> = Err("refused".to_string());
        assert_eq!(
            SinkOutcome::from(err),
            SinkOutcome::Failed {
                cause: "refused".to_string()
            }
        );
    }
}
