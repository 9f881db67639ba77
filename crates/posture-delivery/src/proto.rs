//! Wire messages of the security-report ingestion service

/// gRPC method that accepts one report per batch
pub const POST_SECURITY_REPORT_PATH: &str =
    "/com.coralogix.xdr.v1.SecurityReportIngestionService/PostSecurityReport";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SecurityReportContext {
    #[prost(string, tag = "1")]
    pub private_key: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub application_name: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub subsystem_name: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub computer_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SecurityReportTestResult {
    #[prost(string, tag = "1")]
    pub provider: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub service: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "4")]
    pub start_time: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "5")]
    pub end_time: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(string, tag = "6")]
    pub item: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub item_type: ::prost::alloc::string::String,
    #[prost(enumeration = "TestResult", tag = "8")]
    pub result: i32,
    #[prost(string, tag = "9")]
    pub execution_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "10")]
    pub additional_data: ::core::option::Option<::prost_types::Struct>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TestResult {
    Unspecified = 0,
    TestPassed = 1,
    TestFailed = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SecurityReport {
    #[prost(message, optional, tag = "1")]
    pub context: ::core::option::Option<SecurityReportContext>,
    #[prost(message, repeated, tag = "2")]
    pub test_results: ::prost::alloc::vec::Vec<SecurityReportTestResult>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PostSecurityReportRequest {
    #[prost(string, tag = "1")]
    pub api_key: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub security_report: ::core::option::Option<SecurityReport>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PostSecurityReportResponse {}
