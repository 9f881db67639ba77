//! Structured security-report ingestion sink (gRPC)

use crate::proto::{
    PostSecurityReportRequest, PostSecurityReportResponse, SecurityReport,
    SecurityReportContext, SecurityReportTestResult, TestResult, POST_SECURITY_REPORT_PATH,
};
use crate::sink::Sink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use posture_core::{Batch, Config, EnrichedEvent, PostureError, Result};
use serde_json::{Map, Value};
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, ClientTlsConfig};
use tracing::info;

const SINK_NAME: &str = "ingestion";

/// Sends each batch as one `PostSecurityReport` call
pub struct IngestionSink {
    client: tonic::client::Grpc<Channel>,
    api_key: String,
    context: SecurityReportContext,
}

impl IngestionSink {
    /// Set up a lazily connected channel to the configured endpoint.
    ///
    /// Must be called from within a tokio runtime context.
    pub fn connect(config: &Config) -> Result<Self> {
        let host = config
            .ingestion
            .host
            .as_deref()
            .ok_or_else(|| PostureError::Config("Missing the ingestion endpoint host".to_string()))?;
        let scheme = if config.ingestion.tls { "https" } else { "http" };
        let uri = format!("{}://{}:{}", scheme, host, config.ingestion.port);

        let mut endpoint = Channel::from_shared(uri.clone())
            .map_err(|e| PostureError::Config(format!("Invalid ingestion endpoint {}: {}", uri, e)))?;
        if config.ingestion.tls {
            endpoint = endpoint
                .tls_config(
                    ClientTlsConfig::new()
                        .domain_name(host)
                        .with_webpki_roots(),
                )
                .map_err(|e| PostureError::Config(format!("Invalid TLS setup for {}: {}", uri, e)))?;
        }
        info!("Structured ingestion endpoint: {}", uri);

        Ok(Self {
            client: tonic::client::Grpc::new(endpoint.connect_lazy()),
            api_key: config.api_key.clone().unwrap_or_default(),
            context: report_context(config),
        })
    }

    /// Build the request for one batch
    pub fn request(&self, batch: &Batch) -> PostSecurityReportRequest {
        PostSecurityReportRequest {
            api_key: self.api_key.clone(),
            security_report: Some(SecurityReport {
                context: Some(self.context.clone()),
                test_results: batch
                    .events
                    .iter()
                    .map(|event| to_test_result(event, &batch.execution_id))
                    .collect(),
            }),
        }
    }
}

#[async_trait]
impl Sink for IngestionSink {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    async fn send(&self, batch: &Batch) -> Result<()> {
        let request = self.request(batch);
        let mut client = self.client.clone();

        client
            .ready()
            .await
            .map_err(|e| PostureError::delivery(SINK_NAME, e.to_string()))?;

        let codec: ProstCodec<PostSecurityReportRequest, PostSecurityReportResponse> =
            ProstCodec::default();
        client
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(POST_SECURITY_REPORT_PATH),
                codec,
            )
            .await
            .map_err(|status| {
                PostureError::delivery(
                    SINK_NAME,
                    format!("{:?}: {}", status.code(), status.message()),
                )
            })?;
        Ok(())
    }
}

/// Report context shared by every request of this process
pub fn report_context(config: &Config) -> SecurityReportContext {
    SecurityReportContext {
        private_key: config.private_key.clone().unwrap_or_default(),
        application_name: config.application_name.clone(),
        subsystem_name: config.subsystem_name.clone(),
        computer_name: config.computer_name.clone(),
    }
}

/// Convert one event into its security-report record
pub fn to_test_result(event: &EnrichedEvent, execution_id: &str) -> SecurityReportTestResult {
    let result = if event.passed() {
        TestResult::TestPassed
    } else {
        TestResult::TestFailed
    };

    SecurityReportTestResult {
        provider: event.provider.clone(),
        service: event.service.clone(),
        name: event.test_name.clone(),
        start_time: Some(timestamp(&event.test_start_time)),
        end_time: Some(timestamp(&event.test_end_time)),
        item: event.item.clone(),
        item_type: event.item_type.clone(),
        result: result as i32,
        execution_id: execution_id.to_string(),
        additional_data: Some(to_struct(&event.additional_data)),
    }
}

fn timestamp(time: &DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: time.timestamp(),
        nanos: time.timestamp_subsec_nanos() as i32,
    }
}

fn to_struct(map: &Map<String, Value>) -> prost_types::Struct {
    prost_types::Struct {
        fields: map
            .iter()
            .map(|(key, value)| (key.clone(), to_value(value)))
            .collect(),
    }
}

fn to_value(value: &Value) -> prost_types::Value {
    use prost_types::value::Kind;

    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => Kind::ListValue(prost_types::ListValue {
            values: items.iter().map(to_value).collect(),
        }),
        Value::Object(map) => Kind::StructValue(to_struct(map)),
    };
    prost_types::Value { kind: Some(kind) }
}
