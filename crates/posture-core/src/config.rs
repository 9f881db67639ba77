//! Configuration structures for the posture evaluator

use crate::error::{PostureError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Main configuration, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Credential for the ingestion backend (required)
    #[serde(default)]
    pub private_key: Option<String>,

    /// API key for the structured ingestion service
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_application_name")]
    pub application_name: String,

    #[serde(default = "default_subsystem_name")]
    pub subsystem_name: String,

    /// Originating-host label attached to every report
    #[serde(default = "default_computer_name")]
    pub computer_name: String,

    /// Events per delivered batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Target region handed to region gates
    #[serde(default = "default_region")]
    pub region: String,

    /// Structured ingestion sink
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// HTTP log sink
    #[serde(default)]
    pub logs: LogsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            private_key: None,
            api_key: None,
            application_name: default_application_name(),
            subsystem_name: default_subsystem_name(),
            computer_name: default_computer_name(),
            batch_size: default_batch_size(),
            region: default_region(),
            ingestion: IngestionConfig::default(),
            logs: LogsConfig::default(),
        }
    }
}

/// Structured ingestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Endpoint host (required)
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub tls: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            tls: true,
        }
    }
}

/// HTTP log ingestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Whether batches are also posted to the logs endpoint
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_logs_host")]
    pub host: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_logs_host(),
        }
    }
}

fn default_application_name() -> String {
    "NO_APP_NAME".to_string()
}

fn default_subsystem_name() -> String {
    "NO_SUB_NAME".to_string()
}

fn default_computer_name() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string())
}

fn default_batch_size() -> usize {
    10
}

fn default_region() -> String {
    crate::region::GLOBAL_REGION.to_string()
}

fn default_port() -> u16 {
    443
}

fn default_logs_host() -> String {
    "api.coralogix.com".to_string()
}

fn default_true() -> bool {
    true
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&content).map_err(|e| PostureError::Parse {
                context: path.display().to_string(),
                message: e.to_string(),
            })
        } else {
            // Assume YAML for other extensions
            serde_yaml::from_str(&content).map_err(|e| PostureError::Parse {
                context: path.display().to_string(),
                message: e.to_string(),
            })
        }
    }

    /// Defaults, then the optional file, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Overlay values from environment-style variables
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PRIVATE_KEY").and_then(non_empty) {
            self.private_key = Some(v);
        }
        if let Some(v) = lookup("API_KEY").and_then(non_empty) {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("APPLICATION_NAME").and_then(non_empty) {
            self.application_name = v;
        }
        if let Some(v) = lookup("SUBSYSTEM_NAME").and_then(non_empty) {
            self.subsystem_name = v;
        }
        if let Some(v) = lookup("REGION").and_then(non_empty) {
            self.region = v;
        }
        if let Some(v) = lookup("BATCH_SIZE").and_then(non_empty) {
            self.batch_size = v.trim().parse().map_err(|_| {
                PostureError::Config(format!("BATCH_SIZE must be a positive integer, got {:?}", v))
            })?;
        }
        if let Some(v) = lookup("CORALOGIX_ENDPOINT_HOST").and_then(non_empty) {
            self.ingestion.host = Some(v);
        }
        if let Some(v) = lookup("CORALOGIX_ENDPOINT_PORT").and_then(non_empty) {
            self.ingestion.port = v.trim().parse().map_err(|_| {
                PostureError::Config(format!("CORALOGIX_ENDPOINT_PORT is not a port: {:?}", v))
            })?;
        }
        if let Some(v) = lookup("CORALOGIX_LOG_URL").and_then(non_empty) {
            self.logs.host = v;
        }
        if let Some(v) = lookup("SEND_TO_CORALOGIX") {
            self.logs.enabled = parse_bool(&v);
        }
        Ok(self)
    }

    /// Reject configurations the evaluator cannot start with
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        if self.ingestion.host.as_deref().map_or(true, |h| h.trim().is_empty()) {
            return Err(PostureError::Config(
                "Missing the ingestion endpoint host (CORALOGIX_ENDPOINT_HOST)".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks that hold even when nothing is sent: credential and batch size
    pub fn validate_credentials(&self) -> Result<()> {
        if self.private_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(PostureError::Config(
                "Missing the PRIVATE_KEY setting. CANNOT CONTINUE".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(PostureError::Config(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy with credentials masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        Self {
            private_key: mask(&self.private_key),
            api_key: mask(&self.api_key),
            ..self.clone()
        }
    }
}
