//! Error types for the posture evaluator

use thiserror::Error;

/// Main error type for posture evaluator operations
#[derive(Error, Debug)]
pub enum PostureError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error with context
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Startup configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A plugin failed while being constructed or run
    #[error("Plugin {plugin} failed: {message}")]
    Plugin { plugin: String, message: String },

    /// A plugin returned output that breaks the finding contract
    #[error("The result object from the tester {service} does not match the required standard ({violation}). CANNOT CONTINUE.")]
    ContractViolation {
        service: String,
        violation: ContractViolation,
    },

    /// A sink failed to deliver a batch
    #[error("Delivery to {sink} failed: {message}")]
    Delivery { sink: String, message: String },

    /// The region directory could not be queried
    #[error("Region lookup failed: {0}")]
    Region(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PostureError {
    /// Build a plugin fault
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        PostureError::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Build a delivery failure
    pub fn delivery(sink: impl Into<String>, message: impl Into<String>) -> Self {
        PostureError::Delivery {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Whether this error must terminate the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PostureError::ContractViolation { .. } | PostureError::Config(_)
        )
    }
}

impl From<serde_json::Error> for PostureError {
    fn from(err: serde_json::Error) -> Self {
        PostureError::Serialization(err.to_string())
    }
}

/// The specific rule a plugin's output broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// Output is not a sequence
    NotArray,
    /// A required field is absent
    FieldsMissing(&'static str),
    /// `item` is present but null
    ItemIsNone,
    /// A textual field holds something other than a string
    FieldNotString(&'static str),
    /// `timestamp` is not a floating point number
    TimestampNotFloat,
    /// The integer part of `timestamp` is not ten digits long
    TimestampNotTenDigits(String),
}

impl std::fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractViolation::NotArray => write!(f, "NotArray"),
            ContractViolation::FieldsMissing(field) => write!(f, "FieldsMissing: {}", field),
            ContractViolation::ItemIsNone => write!(f, "ItemIsNone"),
            ContractViolation::FieldNotString(field) => write!(f, "FieldNotString: {}", field),
            ContractViolation::TimestampNotFloat => write!(f, "ItemDateIsNotFloat"),
            ContractViolation::TimestampNotTenDigits(value) => {
                write!(f, "ItemDateIsNotTenDigitsIntPart: {}", value)
            }
        }
    }
}

/// Result type alias for posture evaluator operations
pub type Result<T> = std::result::Result<T, PostureError>;
