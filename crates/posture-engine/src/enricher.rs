//! Conversion of validated findings into wire-shaped events

use crate::classify::{Classifier, LengthBandClassifier};
use posture_core::{EnrichedEvent, ExecutionContext, PluginIdentity, ValidatedFinding, EVENT_TYPE};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Keys of the fixed event schema; finding fields with these names never reach `additional_data`
const FIXED_SCHEMA: [&str; 13] = [
    "event_type",
    "service",
    "provider",
    "test_id",
    "test_start_time",
    "test_end_time",
    "timestamp",
    "item",
    "item_type",
    "test_name",
    "test_result",
    "classifications",
    "additional_data",
];

/// Builds [`EnrichedEvent`]s with an injectable classification function
#[derive(Clone)]
pub struct EventEnricher {
    classifier: Arc<dyn Classifier>,
}

impl EventEnricher {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Map one finding to one event. Pure: the same inputs give the same event.
    pub fn enrich(
        &self,
        finding: &ValidatedFinding,
        plugin: &PluginIdentity,
        ctx: &ExecutionContext,
    ) -> EnrichedEvent {
        let additional_data: Map<String, Value> = finding
            .extra
            .iter()
            .filter(|(key, value)| !FIXED_SCHEMA.contains(&key.as_str()) && is_truthy(value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        EnrichedEvent {
            event_type: EVENT_TYPE,
            service: plugin.service.clone(),
            provider: plugin.provider.clone(),
            test_id: ctx.test_id.clone(),
            test_start_time: ctx.start_time,
            test_end_time: ctx.end_time,
            timestamp: finding.timestamp * 1000.0,
            item: finding.item.clone(),
            item_type: finding.item_type.clone(),
            test_name: finding.test_name.clone(),
            test_result: finding.test_result.clone(),
            classifications: self.classifier.classify(&finding.test_name),
            additional_data,
        }
    }
}

impl Default for EventEnricher {
    fn default() -> Self {
        Self::new(Arc::new(LengthBandClassifier))
    }
}

/// Empty strings, zero, false, null and empty collections carry no context
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
