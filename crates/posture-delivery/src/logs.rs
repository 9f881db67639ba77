//! HTTP log-ingestion sink

use crate::sink::Sink;
use async_trait::async_trait;
use posture_core::{Batch, Config, EnrichedEvent, PostureError, Result};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::debug;

const SINK_NAME: &str = "logs";

/// Severity attached to every log entry
const LOG_SEVERITY: u8 = 1;

/// Body of one POST to the logs endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsPayload<'a> {
    pub private_key: &'a str,
    pub application_name: &'a str,
    pub subsystem_name: &'a str,
    pub computer_name: &'a str,
    pub log_entries: Vec<LogEntry>,
}

#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub timestamp: f64,
    /// JSON document `{"security": <event>}`
    pub text: String,
    pub severity: u8,
}

#[derive(Serialize)]
struct SecurityEnvelope<'a> {
    security: &'a EnrichedEvent,
}

impl LogEntry {
    pub fn from_event(event: &EnrichedEvent) -> Result<Self> {
        Ok(Self {
            timestamp: event.timestamp,
            text: serde_json::to_string(&SecurityEnvelope { security: event })?,
            severity: LOG_SEVERITY,
        })
    }
}

/// Posts each batch as one JSON document to `https://<host>/api/v1/logs`
pub struct LogsSink {
    client: reqwest::Client,
    url: String,
    private_key: String,
    application_name: String,
    subsystem_name: String,
    computer_name: String,
}

impl LogsSink {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PostureError::Config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self::with_client(config, client, logs_url(&config.logs.host)))
    }

    /// Sink posting to an explicit URL with a prepared client
    pub fn with_client(config: &Config, client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            private_key: config.private_key.clone().unwrap_or_default(),
            application_name: config.application_name.clone(),
            subsystem_name: config.subsystem_name.clone(),
            computer_name: config.computer_name.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build the document posted for one batch
    pub fn payload<'a>(&'a self, batch: &Batch) -> Result<LogsPayload<'a>> {
        Ok(LogsPayload {
            private_key: &self.private_key,
            application_name: &self.application_name,
            subsystem_name: &self.subsystem_name,
            computer_name: &self.computer_name,
            log_entries: batch
                .events
                .iter()
                .map(LogEntry::from_event)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

/// Endpoint URL for a logs host
pub fn logs_url(host: &str) -> String {
    format!("https://{}/api/v1/logs", host)
}

#[async_trait]
impl Sink for LogsSink {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    async fn send(&self, batch: &Batch) -> Result<()> {
        let body = serde_json::to_vec(&self.payload(batch)?)?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| PostureError::delivery(SINK_NAME, e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        debug!(
            "Sent {} events. Response status is {}, Response text: {}",
            batch.len(),
            status,
            text
        );

        if !status.is_success() {
            return Err(PostureError::delivery(
                SINK_NAME,
                format!("HTTP {}: {}", status, text),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use posture_core::{Classifications, SinkOutcome, EVENT_TYPE};
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one HTTP request, answer it with `status_line` and return the raw request head
    async fn answer_once(listener: TcpListener, status_line: &'static str) -> String {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let head_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before the request head");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + body_len {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let reply = "ingestion unavailable";
        let response = format!(
            "{}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            reply.len(),
            reply
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        head
    }

    fn local_sink(addr: std::net::SocketAddr) -> LogsSink {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        LogsSink::with_client(&config(), client, format!("http://{}/api/v1/logs", addr))
    }

    fn batch() -> Batch {
        Batch {
            execution_id: "exec".to_string(),
            events: vec![event("key-1")],
        }
    }

    fn event(item: &str) -> EnrichedEvent {
        let now = Utc::now();
        EnrichedEvent {
            event_type: EVENT_TYPE,
            service: "kms".to_string(),
            provider: "gcp".to_string(),
            test_id: "run".to_string(),
            test_start_time: now,
            test_end_time: now,
            timestamp: 1_700_000_000_500.0,
            item: item.to_string(),
            item_type: "kms_key".to_string(),
            test_name: "rotation".to_string(),
            test_result: "issue_found".to_string(),
            classifications: Classifications::new(),
            additional_data: json!({"region": "us-east1"}).as_object().cloned().unwrap(),
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.private_key = Some("secret".to_string());
        config.application_name = "posture".to_string();
        config.subsystem_name = "gcp".to_string();
        config.computer_name = "runner-1".to_string();
        config.logs.host = "logs.example.com".to_string();
        config
    }

    #[test]
    fn test_url() {
        let sink = LogsSink::new(&config()).unwrap();
        assert_eq!(sink.url(), "https://logs.example.com/api/v1/logs");
    }

    #[test]
    fn test_payload_shape() {
        let sink = LogsSink::new(&config()).unwrap();
        let batch = Batch {
            execution_id: "exec".to_string(),
            events: vec![event("key-1"), event("key-2")],
        };

        let payload = serde_json::to_value(sink.payload(&batch).unwrap()).unwrap();
        assert_eq!(payload["privateKey"], "secret");
        assert_eq!(payload["applicationName"], "posture");
        assert_eq!(payload["subsystemName"], "gcp");
        assert_eq!(payload["computerName"], "runner-1");

        let entries = payload["logEntries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["severity"], 1);
        assert_eq!(entries[0]["timestamp"].as_f64(), Some(1_700_000_000_500.0));

        let text: Value = serde_json::from_str(entries[1]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["security"]["item"], "key-2");
        assert_eq!(text["security"]["event_type"], EVENT_TYPE);
        assert_eq!(text["security"]["additional_data"]["region"], "us-east1");
    }

    #[tokio::test]
    async fn test_error_status_is_a_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(answer_once(listener, "HTTP/1.1 500 Internal Server Error"));

        let result = local_sink(addr).send(&batch()).await;
        let head = server.await.unwrap();

        assert!(head.starts_with("post /api/v1/logs http/1.1"));
        assert!(head.contains("content-type: application/json"));
        match &result {
            Err(PostureError::Delivery { sink, message }) => {
                assert_eq!(sink, "logs");
                assert!(message.contains("500"));
                assert!(message.contains("ingestion unavailable"));
            }
            other => panic!("expected a delivery error, got {:?}", other),
        }
        assert!(matches!(SinkOutcome::from(result), SinkOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_success_status_is_delivered() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(answer_once(listener, "HTTP/1.1 200 OK"));

        let result = local_sink(addr).send(&batch()).await;
        server.await.unwrap();

        assert!(result.is_ok());
    }
}
