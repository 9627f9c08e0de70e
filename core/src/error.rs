use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Structured error response returned by every failing request.
/// The detail always names the offending field or document path when one exists.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "not_found", "schema_mismatch")
    pub error: String,
    /// Human-readable description of what went wrong
    pub detail: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const UPSTREAM_FORMAT_ERROR: &str = "upstream_format_error";
    pub const SCHEMA_MISMATCH: &str = "schema_mismatch";
    pub const UPSTREAM_FAILURE: &str = "upstream_failure";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Failure classes of the advice pipeline.
///
/// Each variant maps to exactly one HTTP status at the API boundary; nothing
/// in the pipeline retries or downgrades them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Client-correctable request or document data problem.
    #[error("{message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
    },

    /// The referenced document does not exist.
    #[error("document '{path}' does not exist")]
    NotFound { path: String },

    /// The AI reply could not be reduced to a JSON object.
    #[error("UpstreamFormatError: {message}")]
    UpstreamFormat { message: String, raw: String },

    /// The reply parsed but a required field is missing or mistyped.
    #[error("SchemaMismatch: field '{field}': {message}")]
    SchemaMismatch {
        field: String,
        message: String,
        received: serde_json::Value,
    },

    /// Any other failure raised by the AI capability itself.
    #[error("UnclassifiedUpstreamFailure: {0}")]
    UpstreamFailure(String),
}

impl PipelineError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        PipelineError::InvalidInput {
            message: message.into(),
            field: None,
            received: None,
        }
    }
}
