//! Enriched events and the run-scoped context they are stamped with

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Constant `event_type` of every event the evaluator emits
pub const EVENT_TYPE: &str = "auto_posture_evaluator";

/// Compliance framework name to tag
pub type Classifications = BTreeMap<String, String>;

/// Identifiers shared by every plugin of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Run-scoped unique identifier
    pub test_id: String,
    /// Identifier sent to the structured ingestion service
    pub execution_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        let started_at = Utc::now();
        let test_id = uuid::Uuid::new_v4().to_string();
        Self {
            execution_id: format!("{}_{}", started_at.date_naive(), test_id),
            test_id,
            started_at,
        }
    }

    /// Context for one plugin invocation
    pub fn for_plugin(&self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> ExecutionContext {
        ExecutionContext {
            test_id: self.test_id.clone(),
            start_time,
            end_time,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamps captured around one plugin's `run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub test_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// A finding in its wire shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedEvent {
    pub event_type: &'static str,
    pub service: String,
    pub provider: String,
    pub test_id: String,
    #[serde(with = "iso_micros")]
    pub test_start_time: DateTime<Utc>,
    #[serde(with = "iso_micros")]
    pub test_end_time: DateTime<Utc>,
    /// Milliseconds since the epoch
    pub timestamp: f64,
    pub item: String,
    pub item_type: String,
    pub test_name: String,
    pub test_result: String,
    pub classifications: Classifications,
    pub additional_data: Map<String, Value>,
}

impl EnrichedEvent {
    pub fn passed(&self) -> bool {
        crate::finding::TestOutcome::from_result(&self.test_result).is_pass()
    }
}

/// Events handed to the delivery channel together
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub execution_id: String,
    pub events: Vec<EnrichedEvent>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

mod iso_micros {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_context_ids() {
        let run = RunContext::new();
        assert_eq!(run.test_id.len(), 36);
        assert!(run.execution_id.ends_with(&run.test_id));
        assert!(run
            .execution_id
            .starts_with(&run.started_at.date_naive().to_string()));
    }

    #[test]
    fn test_plugin_context_shares_test_id() {
        let run = RunContext::new();
        let now = Utc::now();
        let a = run.for_plugin(now, now);
        let b = run.for_plugin(now, now);
        assert_eq!(a.test_id, b.test_id);
    }

    #[test]
    fn test_event_times_serialize_with_microseconds() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let event = EnrichedEvent {
            event_type: EVENT_TYPE,
            service: "gke".to_string(),
            provider: "gcp".to_string(),
            test_id: "t".to_string(),
            test_start_time: start,
            test_end_time: start,
            timestamp: 1_700_000_000_500.0,
            item: "cluster-1".to_string(),
            item_type: "gke_cluster".to_string(),
            test_name: "legacy_abac".to_string(),
            test_result: "issue_found".to_string(),
            classifications: Classifications::new(),
            additional_data: Map::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["test_start_time"], "2024-03-01T12:30:00.000000");
        assert_eq!(json["event_type"], EVENT_TYPE);
        assert_eq!(json["timestamp"].as_f64(), Some(1_700_000_000_500.0));
    }
}
