//! Output formatting for run reports

use posture_core::{PluginStatus, Result, RunReport, SinkOutcome};

/// Format a run report as text
pub fn format_text(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Posture Evaluation Report\n{}\n\n", "=".repeat(25)));
    output.push_str(&format!("Run: {}\n", report.test_id));
    output.push_str(&format!("Started: {}\n", report.started_at.to_rfc3339()));
    output.push_str(&format!(
        "Duration: {}ms\n\n",
        (report.completed_at - report.started_at).num_milliseconds()
    ));

    output.push_str("Summary\n-------\n");
    output.push_str(&format!("Plugins: {}\n", report.summary.total_plugins));
    output.push_str(&format!("Completed: {}\n", report.summary.plugins_completed));
    output.push_str(&format!("Skipped: {}\n", report.summary.plugins_skipped));
    output.push_str(&format!("Faulted: {}\n", report.summary.plugins_faulted));
    output.push_str(&format!("Events: {}\n", report.summary.events));
    output.push_str(&format!("Batches: {}\n", report.summary.batches));
    output.push_str(&format!("Sink failures: {}\n\n", report.summary.sink_failures));

    if !report.plugins.is_empty() {
        output.push_str("Plugins\n-------\n");
        for plugin in &report.plugins {
            let status = match &plugin.status {
                PluginStatus::Completed { findings } => format!("{} findings", findings),
                PluginStatus::Declined => "declined".to_string(),
                PluginStatus::NotApplicable { reason } => format!("not applicable ({})", reason),
                PluginStatus::Faulted { message } => format!("FAULTED: {}", message),
            };
            if plugin.service.is_empty() {
                output.push_str(&format!("{}: {}\n", plugin.name, status));
            } else {
                output.push_str(&format!(
                    "{} [{}/{}]: {}\n",
                    plugin.name, plugin.provider, plugin.service, status
                ));
            }
        }
        output.push('\n');
    }

    let failed: Vec<_> = report
        .deliveries
        .iter()
        .enumerate()
        .filter(|(_, d)| d.failures() > 0)
        .collect();
    if !failed.is_empty() {
        output.push_str("Delivery failures\n-----------------\n");
        for (index, delivery) in failed {
            if let SinkOutcome::Failed { cause } = &delivery.structured {
                output.push_str(&format!(
                    "batch {} ({} events) ingestion: {}\n",
                    index + 1,
                    delivery.batch_size,
                    cause
                ));
            }
            if let Some(SinkOutcome::Failed { cause }) = &delivery.logs {
                output.push_str(&format!(
                    "batch {} ({} events) logs: {}\n",
                    index + 1,
                    delivery.batch_size,
                    cause
                ));
            }
        }
    }

    output
}

/// Format a run report as JSON
pub fn format_json(report: &RunReport, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(report).map_err(Into::into)
    } else {
        serde_json::to_string(report).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use posture_core::{DeliveryReport, PluginRecord};

    fn report() -> RunReport {
        let now = Utc::now();
        let mut report = RunReport::new("run-1", now);
        report.summary.total_plugins = 2;
        report.add_plugin(PluginRecord {
            name: "gcp_dns".to_string(),
            provider: "gcp".to_string(),
            service: "dns".to_string(),
            status: PluginStatus::Completed { findings: 3 },
            started_at: now,
            finished_at: now,
        });
        report.add_plugin(PluginRecord {
            name: "gcp_iam".to_string(),
            provider: String::new(),
            service: String::new(),
            status: PluginStatus::Faulted {
                message: "no credentials".to_string(),
            },
            started_at: now,
            finished_at: now,
        });
        report.add_delivery(DeliveryReport {
            batch_size: 3,
            elapsed_ms: 12,
            structured: SinkOutcome::Failed {
                cause: "unavailable".to_string(),
            },
            logs: Some(SinkOutcome::Delivered),
        });
        report.complete();
        report
    }

    #[test]
    fn test_text_report() {
        let text = format_text(&report());
        assert!(text.contains("Run: run-1"));
        assert!(text.contains("gcp_dns [gcp/dns]: 3 findings"));
        assert!(text.contains("gcp_iam: FAULTED: no credentials"));
        assert!(text.contains("batch 1 (3 events) ingestion: unavailable"));
        assert!(!text.contains("logs:"));
    }

    #[test]
    fn test_json_report() {
        let json = format_json(&report(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["test_id"], "run-1");
        assert_eq!(value["summary"]["events"], 3);
        assert_eq!(value["plugins"][1]["status"]["status"], "faulted");
        assert_eq!(value["deliveries"][0]["logs"]["outcome"], "delivered");
    }
}
