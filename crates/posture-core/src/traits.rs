//! Core traits that define the plugin contract and the delivery seam.
//!
//! Every posture check implements [`Plugin`]; the engine never looks past it.

use crate::error::Result;
use crate::event::Batch;
use crate::finding::PluginOutput;
use crate::report::DeliveryReport;

/// Whether a plugin should run in the current execution context
#[derive(Debug, Clone, PartialEq)]
pub enum Applicability {
    /// Plugin should be run
    Applicable,
    /// Plugin does not apply here (with reason)
    NotApplicable(String),
}

impl Applicability {
    pub fn is_applicable(&self) -> bool {
        matches!(self, Applicability::Applicable)
    }
}

/// A posture check for one (provider, service) pair
pub trait Plugin: Send {
    /// Cloud provider code (e.g. "gcp"), used for event tagging
    fn provider(&self) -> &str;

    /// Resource category this plugin audits
    fn service(&self) -> &str;

    /// Regional gate, consulted before `run` does any work
    fn applicability(&self) -> Result<Applicability> {
        Ok(Applicability::Applicable)
    }

    /// Execute the checks.
    ///
    /// `Ok(None)` means the plugin declines to run here and produces no events.
    fn run(&mut self) -> Result<Option<PluginOutput>>;
}

/// Creates a fresh plugin instance for each run
pub type PluginFactory = Box<dyn Fn() -> Result<Box<dyn Plugin>> + Send + Sync>;

/// Identity of a plugin as attached to its events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginIdentity {
    pub provider: String,
    pub service: String,
}

impl PluginIdentity {
    pub fn of(plugin: &dyn Plugin) -> Self {
        Self {
            provider: plugin.provider().to_string(),
            service: plugin.service().to_string(),
        }
    }
}

impl std::fmt::Display for PluginIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.service)
    }
}

/// Hands finished batches to the sinks
pub trait Deliver: Send + Sync {
    /// Deliver one batch. Sink failures are reported, never returned.
    fn deliver(&self, batch: Batch) -> DeliveryReport;
}
