//! Custom extractors that convert axum rejections to structured AppError responses.
//!
//! Use `AppJson<T>` as a drop-in replacement for `axum::Json<T>` in handler signatures.
//! Unlike the standard extractor, deserialization failures produce a JSON 400
//! instead of axum's default plain-text 422 response.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

/// JSON extractor that converts deserialization errors to structured `AppError` responses.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Convert a `JsonRejection` to a structured `AppError::Validation`.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field_hint = extract_field_from_serde_message(&body_text);

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field_hint.unwrap_or("body".to_string())),
        received: None,
    }
}

/// Try to extract a field name from serde's error messages.
/// Request bodies ignore unknown keys, so only missing fields are named.
fn extract_field_from_serde_message(msg: &str) -> Option<String> {
    // "missing field `document_path`" → "document_path"
    const PATTERN: &str = "missing field `";
    let start = msg.find(PATTERN)?;
    let after = &msg[start + PATTERN.len()..];
    let end = after.find('`')?;
    Some(after[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_missing_field_name() {
        let msg = "Failed to deserialize the JSON body into the target type: missing field `document_path` at line 1 column 2";
        assert_eq!(
            extract_field_from_serde_message(msg),
            Some("document_path".to_string())
        );
    }

    #[test]
    fn unterminated_field_name_is_ignored() {
        let msg = "missing field `document_path";
        assert_eq!(extract_field_from_serde_message(msg), None);
    }

    #[test]
    fn returns_none_for_generic_error() {
        let msg = "invalid type: integer `3`, expected a string";
        assert_eq!(extract_field_from_serde_message(msg), None);
    }
}
