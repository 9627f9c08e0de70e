//! Document path normalization and humidity/temperature extraction.
//!
//! The document store itself is not touched here: callers fetch the raw
//! field mapping and hand it to [`extract_measurement`].

use std::fmt;

use serde_json::{Map, Value};

use crate::error::PipelineError;

pub const DEFAULT_HUMIDITY_FIELD: &str = "humedad";
pub const DEFAULT_TEMPERATURE_FIELD: &str = "temperatura";

const PATH_SEPARATOR: char = '/';

/// Normalized path of a document in the store: an even, non-zero number of
/// non-empty `collection/document` segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Trim surrounding whitespace, then leading/trailing separators.
    /// An empty result, an empty inner segment, or an odd segment count
    /// (a collection rather than a document) is a client error.
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let invalid = |message: String| PipelineError::InvalidInput {
            message,
            field: Some("document_path".to_string()),
            received: Some(Value::String(raw.to_string())),
        };

        let normalized = raw.trim().trim_matches(PATH_SEPARATOR);
        if normalized.is_empty() {
            return Err(invalid(
                "The field 'document_path' must not be empty.".to_string(),
            ));
        }

        let segments: Vec<&str> = normalized.split(PATH_SEPARATOR).collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(invalid(format!(
                "The document path '{normalized}' contains an empty segment."
            )));
        }
        if segments.len() % 2 != 0 {
            return Err(invalid(format!(
                "The path '{normalized}' names a collection, not a document. \
                 Expected collection/document pairs."
            )));
        }

        Ok(Self(normalized.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names of the two document fields holding the readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementFields {
    pub humidity: String,
    pub temperature: String,
}

impl Default for MeasurementFields {
    fn default() -> Self {
        Self {
            humidity: DEFAULT_HUMIDITY_FIELD.to_string(),
            temperature: DEFAULT_TEMPERATURE_FIELD.to_string(),
        }
    }
}

/// Humidity (%) and temperature (°C) read for one plant. Both values are finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    humidity: f64,
    temperature: f64,
}

impl Measurement {
    pub fn new(humidity: f64, temperature: f64) -> Option<Self> {
        (humidity.is_finite() && temperature.is_finite()).then_some(Self {
            humidity,
            temperature,
        })
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

/// Read both readings out of a fetched document.
///
/// Presence of both fields is checked before either is coerced, humidity
/// first, so a missing field is always reported by name.
pub fn extract_measurement(
    path: &DocumentPath,
    data: &Map<String, Value>,
    fields: &MeasurementFields,
) -> Result<Measurement, PipelineError> {
    let humidity = require_field(path, data, fields, &fields.humidity)?;
    let temperature = require_field(path, data, fields, &fields.temperature)?;

    let non_numeric = |field: &str| PipelineError::InvalidInput {
        message: format!(
            "The fields '{}' and '{}' must be numeric. Received data: {}",
            fields.humidity,
            fields.temperature,
            Value::Object(data.clone())
        ),
        field: Some(field.to_string()),
        received: Some(Value::Object(data.clone())),
    };

    let humidity = coerce_f64(humidity).ok_or_else(|| non_numeric(&fields.humidity))?;
    let temperature = coerce_f64(temperature).ok_or_else(|| non_numeric(&fields.temperature))?;

    Measurement::new(humidity, temperature).ok_or_else(|| non_numeric(&fields.humidity))
}

fn require_field<'a>(
    path: &DocumentPath,
    data: &'a Map<String, Value>,
    fields: &MeasurementFields,
    name: &str,
) -> Result<&'a Value, PipelineError> {
    data.get(name).ok_or_else(|| PipelineError::InvalidInput {
        message: format!(
            "The document '{path}' must contain the fields '{}' and '{}'. Missing: {name}",
            fields.humidity, fields.temperature
        ),
        field: Some(name.to_string()),
        received: None,
    })
}

/// Numbers pass through; strings are trimmed and parsed. Anything else,
/// including booleans and non-finite results, is non-numeric.
fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn path(raw: &str) -> DocumentPath {
        DocumentPath::parse(raw).expect("path should parse")
    }

    #[test]
    fn path_strips_whitespace_and_separators() {
        assert_eq!(path("  /garden/plantA/ ").as_str(), "garden/plantA");
        assert_eq!(path("garden/plantA").as_str(), "garden/plantA");
        assert_eq!(
            path("//jardin/jardin/Maycol/Rositas//")
                .segments()
                .collect::<Vec<_>>(),
            vec!["jardin", "jardin", "Maycol", "Rositas"]
        );
    }

    #[test]
    fn empty_path_after_trim_is_invalid_input() {
        for raw in ["", "   ", "/", " /// "] {
            match DocumentPath::parse(raw) {
                Err(PipelineError::InvalidInput { field, .. }) => {
                    assert_eq!(field.as_deref(), Some("document_path"));
                }
                other => panic!("unexpected result for {raw:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn collection_paths_are_invalid_input() {
        for raw in ["garden", "/garden/", "garden/plantA/readings", "a/b/c/d/e"] {
            match DocumentPath::parse(raw) {
                Err(PipelineError::InvalidInput {
                    message,
                    field,
                    received,
                }) => {
                    assert!(message.contains("collection"), "{message}");
                    assert_eq!(field.as_deref(), Some("document_path"));
                    assert_eq!(received, Some(json!(raw)));
                }
                other => panic!("unexpected result for {raw:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn empty_inner_segments_are_invalid_input() {
        for raw in ["garden//plantA", "garden/ /plantA/x", "a//b/c"] {
            match DocumentPath::parse(raw) {
                Err(PipelineError::InvalidInput { message, field, .. }) => {
                    assert!(message.contains("empty segment"), "{message}");
                    assert_eq!(field.as_deref(), Some("document_path"));
                }
                other => panic!("unexpected result for {raw:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn string_and_number_readings_are_coerced() {
        let data = doc(json!({"humedad": "42", "temperatura": 23.5}));
        let measurement = extract_measurement(
            &path("garden/plantA"),
            &data,
            &MeasurementFields::default(),
        )
        .expect("measurement");
        assert_eq!(measurement, Measurement::new(42.0, 23.5).unwrap());
    }

    #[test]
    fn padded_numeric_strings_and_integers_are_accepted() {
        let data = doc(json!({"humedad": " 55.25 ", "temperatura": 18, "extra": true}));
        let measurement =
            extract_measurement(&path("plants/p"), &data, &MeasurementFields::default()).unwrap();
        assert_eq!(measurement.humidity(), 55.25);
        assert_eq!(measurement.temperature(), 18.0);
    }

    #[test]
    fn missing_temperature_is_named() {
        let data = doc(json!({"humedad": 40}));
        let err = extract_measurement(&path("garden/plantA"), &data, &MeasurementFields::default())
            .expect_err("missing field must fail");
        match err {
            PipelineError::InvalidInput { message, field, .. } => {
                assert_eq!(field.as_deref(), Some("temperatura"));
                assert!(message.contains("temperatura"));
                assert!(message.contains("garden/plantA"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_humidity_is_reported_before_temperature() {
        let data = doc(json!({}));
        let err = extract_measurement(&path("plants/p"), &data, &MeasurementFields::default())
            .expect_err("missing fields must fail");
        match err {
            PipelineError::InvalidInput { field, .. } => {
                assert_eq!(field.as_deref(), Some("humedad"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_reading_includes_raw_data() {
        let data = doc(json!({"humedad": "mojado", "temperatura": 20}));
        let err = extract_measurement(&path("plants/p"), &data, &MeasurementFields::default())
            .expect_err("non-numeric must fail");
        match err {
            PipelineError::InvalidInput {
                message,
                field,
                received,
            } => {
                assert_eq!(field.as_deref(), Some("humedad"));
                assert!(message.contains("mojado"));
                assert_eq!(received, Some(Value::Object(data)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn booleans_nulls_and_non_finite_values_are_rejected() {
        for bad in [json!(true), Value::Null, json!("NaN"), json!("inf"), json!([1])] {
            let data = doc(json!({"humedad": 10, "temperatura": bad}));
            let err = extract_measurement(&path("plants/p"), &data, &MeasurementFields::default())
                .expect_err("must fail");
            assert!(matches!(
                err,
                PipelineError::InvalidInput { field: Some(ref f), .. } if f == "temperatura"
            ));
        }
    }

    #[test]
    fn custom_field_names_are_honoured() {
        let fields = MeasurementFields {
            humidity: "humidity".to_string(),
            temperature: "temperature".to_string(),
        };
        let data = doc(json!({"humidity": 61, "temperature": "19.0"}));
        let measurement = extract_measurement(&path("plants/p"), &data, &fields).unwrap();
        assert_eq!(measurement, Measurement::new(61.0, 19.0).unwrap());
    }
}
