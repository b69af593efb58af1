use crate::error::RemoteError;
use crate::models::{Role, Settings};
use crate::text::clip;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

const STATUS_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

/// A chat-completion backend. Returns the assistant message text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        settings: &Settings,
        request: &CompletionRequest,
    ) -> Result<String, RemoteError>;
}

/// Client for any endpoint speaking the OpenAI `chat/completions` shape.
#[derive(Debug, Clone, Default)]
pub struct OpenAiCompatibleClient {
    client: Client,
}

impl OpenAiCompatibleClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

pub fn completions_url(base_url: &str) -> Result<Url, RemoteError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    Ok(Url::parse(&format!("{trimmed}/chat/completions"))?)
}

/// Pulls `choices[0].message.content`; anything else is malformed.
pub fn extract_message_content(body: &Value) -> Result<String, RemoteError> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if content.is_empty() {
        return Err(RemoteError::MalformedResponse(
            "missing or empty choices[0].message.content".to_string(),
        ));
    }

    Ok(content.to_string())
}

#[async_trait]
impl ChatCompletion for OpenAiCompatibleClient {
    async fn complete(
        &self,
        settings: &Settings,
        request: &CompletionRequest,
    ) -> Result<String, RemoteError> {
        let url = completions_url(&settings.base_url)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(settings.api_key.trim())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: clip(&body, STATUS_BODY_CHARS),
            });
        }

        let parsed: Value = serde_json::from_str(&body)
            .map_err(|error| RemoteError::MalformedResponse(error.to_string()))?;
        extract_message_content(&parsed)
    }
}
