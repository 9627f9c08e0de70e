//! Reduction of untyped AI replies to a validated [`StructuredAdvice`].
//!
//! The AI capability is not contractually typed and wraps its answer in
//! different ways. Replies are first classified into an [`AdviceShape`],
//! each shape yields an [`AdviceCandidate`], and the candidate is then
//! checked against the three required fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::PipelineError;

pub const NEEDS_WATERING: &str = "needs_watering";
pub const NEEDS_SOIL: &str = "needs_soil";
pub const COMMENT: &str = "comment";
pub const MESSAGE: &str = "message";

const REQUIRED_FIELDS: [&str; 3] = [NEEDS_WATERING, NEEDS_SOIL, COMMENT];

/// String-keyed mapping produced by normalization. No keys are guaranteed.
pub type AdviceCandidate = Map<String, Value>;

/// Validated care recommendation returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StructuredAdvice {
    pub needs_watering: bool,
    pub needs_soil: bool,
    pub comment: String,
}

/// What the AI capability handed back, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAdviceReply {
    Object(Map<String, Value>),
    Text(String),
}

impl From<Value> for RawAdviceReply {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawAdviceReply::Object(map),
            Value::String(text) => RawAdviceReply::Text(text),
            other => RawAdviceReply::Text(other.to_string()),
        }
    }
}

impl From<String> for RawAdviceReply {
    fn from(text: String) -> Self {
        RawAdviceReply::Text(text)
    }
}

impl From<&str> for RawAdviceReply {
    fn from(text: &str) -> Self {
        RawAdviceReply::Text(text.to_string())
    }
}

/// Accepted reply shapes, in the order they are tried.
#[derive(Debug, Clone, PartialEq)]
pub enum AdviceShape {
    /// Mapping that already carries every required key.
    Complete(Map<String, Value>),
    /// Mapping whose `message` field holds the JSON answer.
    Wrapped(Value),
    /// Bare JSON text.
    Bare(String),
}

impl AdviceShape {
    pub fn classify(raw: RawAdviceReply) -> Result<Self, PipelineError> {
        match raw {
            RawAdviceReply::Object(map) => {
                if REQUIRED_FIELDS.iter().all(|key| map.contains_key(*key)) {
                    Ok(AdviceShape::Complete(map))
                } else if let Some(message) = map.get(MESSAGE) {
                    Ok(AdviceShape::Wrapped(message.clone()))
                } else {
                    let raw = Value::Object(map).to_string();
                    Err(PipelineError::UpstreamFormat {
                        message: format!("unknown reply structure: {raw}"),
                        raw,
                    })
                }
            }
            RawAdviceReply::Text(text) => Ok(AdviceShape::Bare(text)),
        }
    }

    pub fn into_candidate(self) -> Result<AdviceCandidate, PipelineError> {
        match self {
            AdviceShape::Complete(map) => Ok(map),
            AdviceShape::Wrapped(Value::String(text)) => parse_object(&text),
            AdviceShape::Wrapped(other) => {
                let raw = other.to_string();
                Err(PipelineError::UpstreamFormat {
                    message: format!("field '{MESSAGE}' is not a JSON string: {raw}"),
                    raw,
                })
            }
            AdviceShape::Bare(text) => parse_object(&text),
        }
    }
}

/// Reduce a raw reply to a single candidate mapping.
pub fn normalize(raw: impl Into<RawAdviceReply>) -> Result<AdviceCandidate, PipelineError> {
    AdviceShape::classify(raw.into())?.into_candidate()
}

fn parse_object(text: &str) -> Result<AdviceCandidate, PipelineError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PipelineError::UpstreamFormat {
            message: format!("reply is not a JSON object: {other}"),
            raw: text.to_string(),
        }),
        Err(err) => Err(PipelineError::UpstreamFormat {
            message: format!("{err} in reply text: {text:?}"),
            raw: text.to_string(),
        }),
    }
}

/// Check the three required fields. Extra keys such as `needs_light` are ignored.
pub fn validate(candidate: &AdviceCandidate) -> Result<StructuredAdvice, PipelineError> {
    let needs_watering = require(candidate, NEEDS_WATERING, coerce_bool, "a boolean")?;
    let needs_soil = require(candidate, NEEDS_SOIL, coerce_bool, "a boolean")?;
    let comment = require(
        candidate,
        COMMENT,
        |v| v.as_str().map(str::to_string),
        "a string",
    )?;

    Ok(StructuredAdvice {
        needs_watering,
        needs_soil,
        comment,
    })
}

fn require<T>(
    candidate: &AdviceCandidate,
    field: &str,
    coerce: impl Fn(&Value) -> Option<T>,
    expected: &str,
) -> Result<T, PipelineError> {
    let mismatch = |message: String| PipelineError::SchemaMismatch {
        field: field.to_string(),
        message,
        received: Value::Object(candidate.clone()),
    };

    let value = candidate
        .get(field)
        .ok_or_else(|| mismatch(format!("field is missing in {}", summarize(candidate))))?;
    coerce(value).ok_or_else(|| mismatch(format!("expected {expected}, got {value}")))
}

/// Booleans, 0/1, and the usual yes/no spellings.
fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(false),
            Some(x) if x == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn summarize(candidate: &AdviceCandidate) -> String {
    let keys: Vec<&str> = candidate.keys().map(String::as_str).collect();
    format!("object with keys [{}]", keys.join(", "))
}
