//! Finding types exchanged across the plugin boundary

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Field names every finding record must carry
pub const REQUIRED_FIELDS: [&str; 5] = ["timestamp", "item", "item_type", "test_name", "test_result"];

/// Outcome of a single test against a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    /// The resource violates the checked rule
    IssueFound,
    /// The resource satisfies the checked rule
    NoIssueFound,
}

impl TestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestOutcome::IssueFound => "issue_found",
            TestOutcome::NoIssueFound => "no_issue_found",
        }
    }

    /// Interpret a raw `test_result` string. Only `no_issue_found` passes.
    pub fn from_result(result: &str) -> Self {
        if result == TestOutcome::NoIssueFound.as_str() {
            TestOutcome::NoIssueFound
        } else {
            TestOutcome::IssueFound
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, TestOutcome::NoIssueFound)
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finding as a plugin builds it.
///
/// Plugins hand their findings to the engine as untrusted records (see
/// [`PluginOutput`]); this builder produces records that pass validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFinding {
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// Identifier of the scanned resource
    pub item: String,
    /// Resource category
    pub item_type: String,
    /// Name of the test that produced this finding
    pub test_name: String,
    /// Pass/fail outcome
    pub test_result: TestOutcome,
    /// Supplemental context carried through as additional data
    pub extra: Map<String, Value>,
}

impl RawFinding {
    /// Create a finding stamped with the current time
    pub fn new(
        item: impl Into<String>,
        item_type: impl Into<String>,
        test_name: impl Into<String>,
        test_result: TestOutcome,
    ) -> Self {
        Self {
            timestamp: now_seconds(),
            item: item.into(),
            item_type: item_type.into(),
            test_name: test_name.into(),
            test_result,
            extra: Map::new(),
        }
    }

    /// Override the timestamp (seconds since the epoch)
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach supplemental context. Keys that collide with the fixed fields are ignored.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !REQUIRED_FIELDS.contains(&key.as_str()) {
            self.extra.insert(key, value.into());
        }
        self
    }

    /// Render as the loosely typed record that crosses the plugin boundary
    pub fn into_value(self) -> Value {
        let mut record = self.extra;
        record.insert(
            "timestamp".to_string(),
            Number::from_f64(self.timestamp)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        );
        record.insert("item".to_string(), Value::String(self.item));
        record.insert("item_type".to_string(), Value::String(self.item_type));
        record.insert("test_name".to_string(), Value::String(self.test_name));
        record.insert(
            "test_result".to_string(),
            Value::String(self.test_result.as_str().to_string()),
        );
        Value::Object(record)
    }
}

/// Current time as fractional seconds since the epoch
pub fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Untrusted output of one plugin run.
///
/// Holds whatever the plugin produced; the engine validates its shape before
/// anything downstream looks at it.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginOutput(Value);

impl PluginOutput {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Vec<RawFinding>> for PluginOutput {
    fn from(findings: Vec<RawFinding>) -> Self {
        Self(Value::Array(
            findings.into_iter().map(RawFinding::into_value).collect(),
        ))
    }
}

/// A finding whose shape has been checked at the plugin boundary
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFinding {
    pub timestamp: f64,
    pub item: String,
    pub item_type: String,
    pub test_name: String,
    pub test_result: String,
    /// Every field of the record outside the fixed schema
    pub extra: Map<String, Value>,
}

impl ValidatedFinding {
    pub fn outcome(&self) -> TestOutcome {
        TestOutcome::from_result(&self.test_result)
    }
}
