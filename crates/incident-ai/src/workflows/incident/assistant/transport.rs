use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ApiError, ApiFailure};
use crate::config::ModelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// One piece of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: ChatRole::User,
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonObject,
}

/// Provider-independent request; the transport supplies the model identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub response_format: Option<ResponseFormat>,
    pub max_tokens: Option<u32>,
}

/// Seam to the hosted chat-completion endpoint. Returns the first choice's text, which may be
/// empty when the provider sends no content.
#[async_trait]
pub trait ChatCompletions: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ApiError>;
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// reqwest-backed client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiChatClient {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiChatClient {
    pub fn new(config: ModelConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                ApiError::with_cause(
                    "failed to build the model HTTP client",
                    ApiFailure::Transport(err),
                )
            })?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[async_trait]
impl ChatCompletions for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ApiError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(ApiError::missing_credential());
        };

        let body = CompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            response_format: request.response_format,
            max_tokens: request.max_tokens,
        };

        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            json_mode = request.response_format.is_some(),
            max_tokens = ?request.max_tokens,
            "sending chat completion request"
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::from_transport)?;

        if !status.is_success() {
            return Err(ApiError::with_cause(
                format!("AI service request failed with status {}", status.as_u16()),
                ApiFailure::Status {
                    status: status.as_u16(),
                    body: text,
                },
            ));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text).map_err(|err| {
            ApiError::with_cause(
                "AI service response was not valid JSON",
                ApiFailure::MalformedBody(err),
            )
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
