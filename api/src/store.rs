//! Document store access: the `DocumentStore` seam and its Firestore REST implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use url::Url;

use plant_advisor_core::measurement::DocumentPath;

use crate::config::FirestoreConfig;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store connection failed: {0}")]
    Connection(String),
    #[error("document store credentials unusable: {0}")]
    Credentials(String),
    #[error("document store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("document store returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("document store returned an unreadable document: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the field mapping of a document, `None` when it does not exist.
    async fn get_document(
        &self,
        path: &DocumentPath,
    ) -> Result<Option<Map<String, Value>>, StoreError>;
}

/// Where the bearer token for each request comes from.
#[derive(Debug)]
enum TokenSource {
    Anonymous,
    Static(String),
    /// Re-read on every request, so a token rotated on disk by an external
    /// refresher is picked up without a restart.
    File(PathBuf),
}

impl TokenSource {
    fn from_config(config: &FirestoreConfig) -> Result<Self, StoreError> {
        Ok(match (&config.access_token, &config.token_file) {
            (Some(token), _) => TokenSource::Static(token.clone()),
            (None, Some(file)) => TokenSource::File(resolve_token_path(file)?),
            (None, None) => TokenSource::Anonymous,
        })
    }

    async fn bearer(&self) -> Result<Option<String>, StoreError> {
        match self {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::File(path) => read_token_file(path).await.map(Some),
        }
    }
}

/// Opened once per process and shared by every request.
#[derive(Debug)]
struct FirestoreConnection {
    client: reqwest::Client,
    documents_url: Url,
    token: TokenSource,
}

impl FirestoreConnection {
    async fn open(config: &FirestoreConfig) -> Result<Self, StoreError> {
        let token = TokenSource::from_config(config)?;
        // An unusable token file fails the open instead of the first lookup.
        let authenticated = token.bearer().await?.is_some();

        let documents_url = documents_url(config)?;
        let mut builder = reqwest::Client::builder();
        if config.emulator_host.is_some() {
            // The emulator runs next to the service, never behind a proxy.
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|err| StoreError::Connection(format!("client build failed: {err}")))?;

        tracing::info!(
            documents_url = %documents_url,
            authenticated,
            "Opened Firestore connection"
        );

        Ok(Self {
            client,
            documents_url,
            token,
        })
    }

    fn document_url(&self, path: &DocumentPath) -> Result<Url, StoreError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Connection("documents URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(path.segments());
        Ok(url)
    }
}

fn documents_url(config: &FirestoreConfig) -> Result<Url, StoreError> {
    let base = match &config.emulator_host {
        Some(host) => format!("http://{host}/"),
        None => FIRESTORE_BASE_URL.to_string(),
    };
    Url::parse(&base)
        .and_then(|base| {
            base.join(&format!(
                "v1/projects/{}/databases/{}/documents/",
                config.project_id, config.database
            ))
        })
        .map_err(|err| StoreError::Connection(format!("invalid Firestore URL: {err}")))
}

/// Relative paths resolve against the working directory at open time.
fn resolve_token_path(file: &Path) -> Result<PathBuf, StoreError> {
    if file.is_absolute() {
        return Ok(file.to_path_buf());
    }
    std::env::current_dir()
        .map(|dir| dir.join(file))
        .map_err(|err| StoreError::Connection(format!("cannot resolve working directory: {err}")))
}

/// The file holds a bare OAuth access token. A file that does not exist is an
/// error, never a silent fallback to anonymous access. Service account key
/// files are rejected by name since they cannot be sent as a bearer token.
async fn read_token_file(path: &Path) -> Result<String, StoreError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(StoreError::Credentials(format!(
            "the credentials file configured in FIRESTORE_TOKEN_FILE does not exist: {}",
            path.display()
        )));
    }

    let contents = tokio::fs::read_to_string(path).await.map_err(|err| {
        StoreError::Credentials(format!("cannot read {}: {err}", path.display()))
    })?;
    let token = contents.trim();

    if token.is_empty() {
        return Err(StoreError::Credentials(format!(
            "the credentials file {} is empty",
            path.display()
        )));
    }
    if token.starts_with('{') {
        return Err(StoreError::Credentials(format!(
            "{} looks like a service account key; FIRESTORE_TOKEN_FILE must hold an access token",
            path.display()
        )));
    }
    Ok(token.to_string())
}

pub struct FirestoreStore {
    config: FirestoreConfig,
    connection: OnceCell<FirestoreConnection>,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            config,
            connection: OnceCell::new(),
        }
    }

    /// Concurrent first callers wait on a single initialization. A failed
    /// initialization is not cached.
    async fn connection(&self) -> Result<&FirestoreConnection, StoreError> {
        self.connection
            .get_or_try_init(|| FirestoreConnection::open(&self.config))
            .await
    }
}

/// A single document resource. Every document carries its resource `name`;
/// collection listings and other bodies without one are not documents.
#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

fn parse_document(body: Value) -> Result<Map<String, Value>, StoreError> {
    let document = serde_json::from_value::<FirestoreDocument>(body)
        .map_err(|err| StoreError::Decode(format!("response is not a single document: {err}")))?;
    tracing::debug!(name = %document.name, "Decoding Firestore document");
    decode_fields(&document.fields)
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_document(
        &self,
        path: &DocumentPath,
    ) -> Result<Option<Map<String, Value>>, StoreError> {
        let connection = self.connection().await?;
        let url = connection.document_url(path)?;

        let mut request = connection.client.get(url);
        if let Some(token) = connection.token.bearer().await? {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(path = %path, "Document not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = crate::upstream::error_body(response).await;
            return Err(StoreError::Status { status, body });
        }

        parse_document(response.json::<Value>().await?).map(Some)
    }
}

/// Flatten Firestore's typed value encoding into plain JSON.
fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}

fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let unreadable = || StoreError::Decode(format!("unsupported value encoding: {value}"));
    let Some(object) = value.as_object() else {
        return Err(unreadable());
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Err(unreadable());
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" | "geoPointValue" | "stringValue" | "timestampValue"
        | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "integerValue" => match inner {
            Value::String(raw) => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|err| StoreError::Decode(format!("integerValue '{raw}': {err}"))),
            Value::Number(_) => Ok(inner.clone()),
            _ => Err(unreadable()),
        },
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            decode_fields(&fields).map(Value::Object)
        }
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(Value::Array),
        _ => Err(unreadable()),
    }
}
