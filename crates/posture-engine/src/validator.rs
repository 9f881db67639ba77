//! Contract enforcement on plugin output.
//!
//! Plugins are untrusted: a single malformed record aborts the whole run
//! rather than letting a broken plugin feed the pipeline.

use posture_core::{ContractViolation, PluginOutput, PostureError, Result, ValidatedFinding};
use serde_json::{Map, Value};

/// Smallest and largest epoch seconds whose integer part has ten digits
const TEN_DIGIT_SECONDS: std::ops::RangeInclusive<i64> = 1_000_000_000..=9_999_999_999;

/// Check a plugin's output and convert it into typed findings.
///
/// `service` names the offending plugin in the error.
pub fn validate_output(service: &str, output: PluginOutput) -> Result<Vec<ValidatedFinding>> {
    let violation = |violation| PostureError::ContractViolation {
        service: service.to_string(),
        violation,
    };

    let records = match output.into_value() {
        Value::Array(records) => records,
        _ => return Err(violation(ContractViolation::NotArray)),
    };

    records
        .into_iter()
        .map(|record| validate_record(record).map_err(violation))
        .collect()
}

fn validate_record(record: Value) -> std::result::Result<ValidatedFinding, ContractViolation> {
    let mut fields = match record {
        Value::Object(fields) => fields,
        _ => return Err(ContractViolation::FieldsMissing("timestamp")),
    };

    for field in ["timestamp", "item", "item_type", "test_result", "test_name"] {
        if !fields.contains_key(field) {
            return Err(ContractViolation::FieldsMissing(field));
        }
    }

    let item = match fields.remove("item") {
        Some(Value::Null) | None => return Err(ContractViolation::ItemIsNone),
        Some(Value::String(item)) => item,
        Some(_) => return Err(ContractViolation::FieldNotString("item")),
    };

    let timestamp = match fields.remove("timestamp") {
        Some(Value::Number(n)) if n.is_f64() => n.as_f64().unwrap_or(f64::NAN),
        _ => return Err(ContractViolation::TimestampNotFloat),
    };
    let seconds = timestamp.trunc() as i64;
    if !TEN_DIGIT_SECONDS.contains(&seconds) {
        return Err(ContractViolation::TimestampNotTenDigits(timestamp.to_string()));
    }

    let item_type = take_string(&mut fields, "item_type")?;
    let test_name = take_string(&mut fields, "test_name")?;
    let test_result = take_string(&mut fields, "test_result")?;

    Ok(ValidatedFinding {
        timestamp,
        item,
        item_type,
        test_name,
        test_result,
        extra: fields,
    })
}

fn take_string(
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> std::result::Result<String, ContractViolation> {
    match fields.remove(field) {
        Some(Value::String(value)) => Ok(value),
        _ => Err(ContractViolation::FieldNotString(field)),
    }
}
