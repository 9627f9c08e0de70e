use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plant_advisor_core::error::{self, ApiError, PipelineError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
    },
    /// Document missing from the store (404)
    NotFound { resource: String },
    /// AI reply could not be parsed into an object (500)
    UpstreamFormat { detail: String },
    /// AI reply parsed but required fields are missing or mistyped (500)
    SchemaMismatch {
        detail: String,
        field: String,
        received: serde_json::Value,
    },
    /// The AI call itself failed (500)
    Upstream(String),
    /// Internal error, e.g. the document store failed (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    detail: message,
                    field,
                    received,
                    request_id,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    detail: format!("The document '{resource}' does not exist."),
                    field: Some("document_path".to_string()),
                    received: Some(serde_json::Value::String(resource)),
                    request_id,
                },
            ),
            AppError::UpstreamFormat { detail } => {
                tracing::warn!(request_id = %request_id, "Unparsable AI reply: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::UPSTREAM_FORMAT_ERROR.to_string(),
                        detail,
                        field: None,
                        received: None,
                        request_id,
                    },
                )
            }
            AppError::SchemaMismatch {
                detail,
                field,
                received,
            } => {
                tracing::warn!(request_id = %request_id, field = %field, "AI reply schema mismatch");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::SCHEMA_MISMATCH.to_string(),
                        detail,
                        field: Some(field),
                        received: Some(received),
                        request_id,
                    },
                )
            }
            AppError::Upstream(detail) => {
                tracing::warn!(request_id = %request_id, "AI call failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::UPSTREAM_FAILURE.to_string(),
                        detail,
                        field: None,
                        received: None,
                        request_id,
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = %request_id, "Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        detail: msg,
                        field: None,
                        received: None,
                        request_id,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let detail = err.to_string();
        match err {
            PipelineError::InvalidInput {
                message,
                field,
                received,
            } => AppError::Validation {
                message,
                field,
                received,
            },
            PipelineError::NotFound { path } => AppError::NotFound { resource: path },
            PipelineError::UpstreamFormat { .. } => AppError::UpstreamFormat { detail },
            PipelineError::SchemaMismatch {
                field, received, ..
            } => AppError::SchemaMismatch {
                detail,
                field,
                received,
            },
            PipelineError::UpstreamFailure(_) => AppError::Upstream(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        (status, serde_json::from_slice(&bytes).expect("body is json"))
    }

    #[tokio::test]
    async fn each_class_maps_to_its_status() {
        let cases = [
            (
                AppError::from(PipelineError::invalid_input("bad path")),
                StatusCode::BAD_REQUEST,
                "validation_failed",
            ),
            (
                AppError::from(PipelineError::NotFound {
                    path: "garden/plantA".to_string(),
                }),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                AppError::from(PipelineError::UpstreamFormat {
                    message: "expected value".to_string(),
                    raw: "x".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_format_error",
            ),
            (
                AppError::from(PipelineError::SchemaMismatch {
                    field: "comment".to_string(),
                    message: "field is missing".to_string(),
                    received: json!({}),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
                "schema_mismatch",
            ),
            (
                AppError::from(PipelineError::UpstreamFailure("timeout".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_failure",
            ),
            (
                AppError::Internal("store down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (err, expected_status, expected_code) in cases {
            let (status, body) = render(err).await;
            assert_eq!(status, expected_status);
            assert_eq!(body["error"], expected_code);
            assert!(body["request_id"].as_str().is_some_and(|id| !id.is_empty()));
        }
    }

    #[tokio::test]
    async fn not_found_detail_names_document() {
        let (_, body) = render(AppError::NotFound {
            resource: "garden/plantA".to_string(),
        })
        .await;
        assert_eq!(body["detail"], "The document 'garden/plantA' does not exist.");
    }

    #[tokio::test]
    async fn upstream_detail_keeps_classification_and_diagnostic() {
        let (_, body) = render(AppError::from(PipelineError::UpstreamFailure(
            "connection reset".to_string(),
        )))
        .await;
        assert_eq!(
            body["detail"],
            "UnclassifiedUpstreamFailure: connection reset"
        );

        let (_, body) = render(AppError::from(PipelineError::SchemaMismatch {
            field: "needs_soil".to_string(),
            message: "expected a boolean, got \"x\"".to_string(),
            received: json!({"needs_soil": "x"}),
        }))
        .await;
        assert_eq!(body["field"], "needs_soil");
        assert_eq!(body["received"], json!({"needs_soil": "x"}));
        assert!(body["detail"].as_str().unwrap().starts_with("SchemaMismatch: "));
    }
}
