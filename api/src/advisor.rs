//! AI capability: send a prompt, get back an untrusted reply.
//!
//! Neither provider retries or sets a request timeout; a hung upstream holds
//! the request until the hosting transport gives up.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::ProviderConfig;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("AI provider misconfigured: {0}")]
    Config(String),
    #[error("AI request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI provider returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("AI provider returned no answer: {0}")]
    EmptyReply(String),
}

#[async_trait]
pub trait AdviceProvider: Send + Sync {
    /// Single call, no retry. The reply carries no schema guarantee.
    async fn send_prompt(&self, text: &str) -> Result<Value, ProviderError>;
}

pub fn from_config(config: &ProviderConfig) -> Result<Box<dyn AdviceProvider>, ProviderError> {
    match config {
        ProviderConfig::Relay { url } => Ok(Box::new(RelayProvider::new(url)?)),
        ProviderConfig::ChatCompletions {
            base_url,
            model,
            api_key,
        } => Ok(Box::new(ChatCompletionsProvider::new(
            base_url,
            model,
            api_key.as_deref(),
        )?)),
    }
}

/// Posts `{"message": <prompt>}` to a prompt relay. JSON bodies come back
/// parsed; anything else comes back as a JSON string.
pub struct RelayProvider {
    client: reqwest::Client,
    url: Url,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    message: &'a str,
}

impl RelayProvider {
    pub fn new(url: &str) -> Result<Self, ProviderError> {
        let url = Url::parse(url)
            .map_err(|err| ProviderError::Config(format!("relay url '{url}': {err}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }
}

#[async_trait]
impl AdviceProvider for RelayProvider {
    async fn send_prompt(&self, text: &str) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&RelayRequest { message: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = crate::upstream::error_body(response).await;
            return Err(ProviderError::Status { status, body });
        }

        Ok(relay_reply(response.text().await?))
    }
}

fn relay_reply(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

/// OpenAI-compatible chat completions. The first choice's content is
/// returned verbatim as a JSON string.
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    chat_url: Url,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<&str>) -> Result<Self, ProviderError> {
        let mut base = Url::parse(base_url)
            .map_err(|err| ProviderError::Config(format!("base url '{base_url}': {err}")))?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path().trim_end_matches('/')));
        }
        let chat_url = base
            .join(CHAT_COMPLETIONS_PATH)
            .map_err(|err| ProviderError::Config(format!("chat url join failed: {err}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|err| ProviderError::Config(format!("invalid api key: {err}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| ProviderError::Config(format!("client build failed: {err}")))?;

        Ok(Self {
            client,
            chat_url,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl AdviceProvider for ChatCompletionsProvider {
    async fn send_prompt(&self, text: &str) -> Result<Value, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: text,
            }],
        };

        let response = self
            .client
            .post(self.chat_url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = crate::upstream::error_body(response).await;
            return Err(ProviderError::Status { status, body });
        }

        let parsed = response.json::<ChatResponse>().await?;
        first_choice_content(parsed).map(Value::String)
    }
}

fn first_choice_content(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::EmptyReply("no choices with content".to_string()))
}
