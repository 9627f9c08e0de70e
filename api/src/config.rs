use std::path::PathBuf;

use plant_advisor_core::measurement::MeasurementFields;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE: &str = "(default)";
const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where and how to reach the Firestore REST API.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    /// `host:port` of a local emulator; replaces the production endpoint.
    pub emulator_host: Option<String>,
    pub access_token: Option<String>,
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// Unofficial prompt relay returning whatever shape the upstream produced.
    Relay { url: String },
    /// OpenAI-compatible chat completions endpoint.
    ChatCompletions {
        base_url: String,
        model: String,
        api_key: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub firestore: FirestoreConfig,
    pub fields: MeasurementFields,
    pub provider: ProviderConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|err| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
                reason: err.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let firestore = FirestoreConfig {
            project_id: get("FIRESTORE_PROJECT_ID")
                .ok_or(ConfigError::Missing("FIRESTORE_PROJECT_ID"))?,
            database: get("FIRESTORE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            emulator_host: get("FIRESTORE_EMULATOR_HOST"),
            access_token: get("FIRESTORE_ACCESS_TOKEN"),
            token_file: get("FIRESTORE_TOKEN_FILE").map(PathBuf::from),
        };

        let defaults = MeasurementFields::default();
        let fields = MeasurementFields {
            humidity: get("PLANT_HUMIDITY_FIELD").unwrap_or(defaults.humidity),
            temperature: get("PLANT_TEMPERATURE_FIELD").unwrap_or(defaults.temperature),
        };

        let provider = match get("AI_PROVIDER")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "" | "relay" => ProviderConfig::Relay {
                url: get("AI_RELAY_URL").ok_or(ConfigError::Missing("AI_RELAY_URL"))?,
            },
            "openai" => ProviderConfig::ChatCompletions {
                base_url: get("AI_BASE_URL").unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
                model: get("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
                api_key: get("AI_API_KEY"),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "AI_PROVIDER",
                    value: other.to_string(),
                    reason: "expected 'relay' or 'openai'".to_string(),
                });
            }
        };

        Ok(Self {
            port,
            firestore,
            fields,
            provider,
        })
    }
}
