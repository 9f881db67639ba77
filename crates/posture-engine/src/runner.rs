//! Run orchestration: execute, validate, enrich, batch, deliver

use crate::batcher::Batcher;
use crate::classify::Classifier;
use crate::enricher::EventEnricher;
use crate::registry::{PluginRegistration, PluginRegistry};
use crate::validator::validate_output;
use chrono::{DateTime, Utc};
use posture_core::{
    Applicability, Deliver, PluginIdentity, PluginOutput, PluginRecord, PluginStatus,
    PostureError, Result, RunContext, RunReport,
};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one isolated plugin execution
enum Execution {
    Ran {
        identity: PluginIdentity,
        output: Option<PluginOutput>,
        finished_at: DateTime<Utc>,
    },
    NotApplicable {
        identity: PluginIdentity,
        reason: String,
    },
}

/// A plugin that failed to construct, gate, or run
struct PluginFault {
    identity: Option<PluginIdentity>,
    error: PostureError,
}

/// Drives every registered plugin through the pipeline, one at a time
pub struct PostureRunner {
    registry: PluginRegistry,
    enricher: EventEnricher,
    batch_size: usize,
}

impl PostureRunner {
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Run all plugins and deliver their events through `channel`.
    ///
    /// Plugin faults are logged and skipped. A contract violation aborts the
    /// run immediately; events still buffered at that point are not delivered.
    pub fn run(&self, channel: &dyn Deliver) -> Result<RunReport> {
        let run = RunContext::new();
        let mut report = RunReport::new(&run.test_id, run.started_at);
        report.summary.total_plugins = self.registry.len();
        let mut batcher = Batcher::new(self.batch_size, &run.execution_id, channel);

        info!(
            "Starting posture run {} with {} plugins",
            run.test_id,
            self.registry.len()
        );

        for registration in self.registry.registrations() {
            let started_at = Utc::now();
            debug!("Running plugin: {}", registration.name());

            let status = match execute(registration) {
                Ok(Execution::Ran {
                    identity,
                    output: Some(output),
                    finished_at,
                }) => {
                    let findings = validate_output(&identity.service, output)?;
                    let ctx = run.for_plugin(started_at, finished_at);
                    for finding in &findings {
                        let event = self.enricher.enrich(finding, &identity, &ctx);
                        if let Some(delivery) = batcher.push(event) {
                            report.add_delivery(delivery);
                        }
                    }
                    debug!("Plugin {} produced {} findings", identity, findings.len());
                    (
                        identity,
                        PluginStatus::Completed {
                            findings: findings.len(),
                        },
                    )
                }
                Ok(Execution::Ran {
                    identity,
                    output: None,
                    ..
                }) => {
                    info!("Plugin {} declined to run in this context", identity);
                    (identity, PluginStatus::Declined)
                }
                Ok(Execution::NotApplicable { identity, reason }) => {
                    info!("Plugin {} is not applicable: {}", identity, reason);
                    (identity, PluginStatus::NotApplicable { reason })
                }
                Err(PluginFault { identity, error }) => {
                    let label = identity
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| registration.name().to_string());
                    warn!(
                        "The plugin {} has crashed and was skipped: {}",
                        label, error
                    );
                    (
                        identity.unwrap_or_else(|| PluginIdentity {
                            provider: String::new(),
                            service: String::new(),
                        }),
                        PluginStatus::Faulted {
                            message: error.to_string(),
                        },
                    )
                }
            };

            let (identity, status) = status;
            report.add_plugin(PluginRecord {
                name: registration.name().to_string(),
                provider: identity.provider,
                service: identity.service,
                status,
                started_at,
                finished_at: Utc::now(),
            });
        }

        if let Some(delivery) = batcher.flush() {
            report.add_delivery(delivery);
        }

        report.complete();
        info!(
            "Posture run completed: {} events in {} batches, {} plugins faulted, {} sink failures",
            report.summary.events,
            report.summary.batches,
            report.summary.plugins_faulted,
            report.summary.sink_failures
        );

        Ok(report)
    }
}

/// Construct, gate and run one plugin inside a fault boundary
fn execute(registration: &PluginRegistration) -> std::result::Result<Execution, PluginFault> {
    let name = registration.name();

    let mut plugin = guarded(name, || registration.instantiate()).map_err(|error| PluginFault {
        identity: None,
        error,
    })?;
    let identity = PluginIdentity::of(plugin.as_ref());

    let applicability = guarded(name, || plugin.applicability()).map_err(|error| PluginFault {
        identity: Some(identity.clone()),
        error,
    })?;
    if let Applicability::NotApplicable(reason) = applicability {
        return Ok(Execution::NotApplicable { identity, reason });
    }

    let output = guarded(name, || plugin.run()).map_err(|error| PluginFault {
        identity: Some(identity.clone()),
        error,
    })?;

    Ok(Execution::Ran {
        identity,
        output,
        finished_at: Utc::now(),
    })
}

/// Call into plugin code, turning a panic into a plugin error
fn guarded<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(PostureError::plugin(name, panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Builder for creating configured posture runners
pub struct PostureRunnerBuilder {
    registry: PluginRegistry,
    enricher: EventEnricher,
    batch_size: usize,
}

impl PostureRunnerBuilder {
    pub fn new() -> Self {
        Self {
            registry: PluginRegistry::new(),
            enricher: EventEnricher::default(),
            batch_size: 10,
        }
    }

    /// Use an existing registry
    pub fn registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add a plugin
    pub fn plugin(mut self, registration: PluginRegistration) -> Self {
        self.registry.register(registration);
        self
    }

    /// Events per batch; fixed for the whole run
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Replace the compliance classification function
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.enricher = EventEnricher::new(classifier);
        self
    }

    pub fn build(self) -> PostureRunner {
        PostureRunner {
            registry: self.registry,
            enricher: self.enricher,
            batch_size: self.batch_size,
        }
    }
}

impl Default for PostureRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
