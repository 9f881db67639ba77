//! Replay plugin: feeds recorded findings through the pipeline.
//!
//! A findings file looks like
//!
//! ```json
//! {
//!   "provider": "gcp",
//!   "service": "cloudstorage",
//!   "global_only": false,
//!   "regions": ["us-east1"],
//!   "findings": [ { "timestamp": 1700000000.5, "item": "bucket-1", ... } ]
//! }
//! ```
//!
//! `findings` is passed to the engine untouched, so it is validated exactly
//! like the output of any other plugin. A missing or null `findings` makes the
//! plugin decline. When `regions` is present the plugin is gated on the
//! configured target region.

use posture_core::{
    Applicability, Plugin, PluginOutput, PostureError, RegionScope, Result, StaticRegionDirectory,
};
use posture_engine::{PluginRegistration, PluginRegistry};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
struct ReplayDocument {
    provider: String,
    service: String,
    #[serde(default)]
    global_only: bool,
    #[serde(default)]
    regions: Option<Vec<String>>,
    #[serde(default)]
    findings: Value,
}

/// Plugin that returns the findings stored in a file
pub struct ReplayPlugin {
    document: ReplayDocument,
    scope: RegionScope,
}

impl ReplayPlugin {
    /// Load a findings file into a registration
    pub fn registration(path: &Path, region: &str) -> Result<PluginRegistration> {
        let content = std::fs::read_to_string(path)?;
        let document: ReplayDocument =
            serde_json::from_str(&content).map_err(|e| PostureError::Parse {
                context: path.display().to_string(),
                message: e.to_string(),
            })?;
        if document.provider.is_empty() || document.service.is_empty() {
            return Err(PostureError::plugin(
                path.display().to_string(),
                "provider and service must be non-empty",
            ));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.service.clone());
        let scope = RegionScope::new(region, document.global_only);

        Ok(PluginRegistration::new(name, move || {
            Ok(Box::new(ReplayPlugin {
                document: document.clone(),
                scope: scope.clone(),
            }) as Box<dyn Plugin>)
        }))
    }
}

impl Plugin for ReplayPlugin {
    fn provider(&self) -> &str {
        &self.document.provider
    }

    fn service(&self) -> &str {
        &self.document.service
    }

    fn applicability(&self) -> Result<Applicability> {
        match &self.document.regions {
            Some(regions) => self
                .scope
                .check(&StaticRegionDirectory::new(regions.iter().cloned())),
            None => Ok(Applicability::Applicable),
        }
    }

    fn run(&mut self) -> Result<Option<PluginOutput>> {
        match &self.document.findings {
            Value::Null => Ok(None),
            findings => Ok(Some(PluginOutput::from_value(findings.clone()))),
        }
    }
}

/// Build the registry for this process
pub fn registry(findings: &[PathBuf], region: &str) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register_candidates(
        findings
            .iter()
            .map(|path| ReplayPlugin::registration(path, region)),
    );
    registry
}
