//! LLM Client: the single point of entry for all Claude API calls in Learn2Prompt.
//!
//! ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
//! Everything that talks to a model goes through the `ChatRelay` trait, which
//! this client implements for the in-process path.
//!
//! Model: claude-3-5-sonnet-20241022 (hardcoded, not configurable)

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::chat::ChatRequest;

pub mod prompts;
pub mod sse;
pub mod structured;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in Learn2Prompt.
pub const MODEL: &str = "claude-3-5-sonnet-20241022";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Stream read failed: {0}")]
    Stream(String),

    #[error("Upstream reported an error mid-stream: {0}")]
    Upstream(String),

    #[error("Stream ended before the upstream signalled completion")]
    Truncated,
}

/// Ordered, finite, non-restartable text fragments. Consumed exactly once.
pub type ChatStream = BoxStream<'static, Result<String, LlmError>>;

/// Anything that turns a `ChatRequest` into a stream of text fragments:
/// the upstream provider itself, or the relay endpoint over HTTP.
#[async_trait]
pub trait ChatRelay: Send + Sync {
    async fn stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError>;

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let stream = self.stream(request).await?;
        collect_text(stream).await
    }
}

/// Drains the stream into one string. Any failed read aborts the whole
/// accumulation; a partial text is never returned.
pub async fn collect_text(mut stream: ChatStream) -> Result<String, LlmError> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic streaming Messages API.
///
/// Stateless across requests: each call opens its own upstream stream. There is
/// no retry; a failed call surfaces to the caller, who decides what the user sees.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        // Only the connect phase is bounded; a long generation must not be cut
        // off by a whole-request timeout.
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}{}", self.base_url, MESSAGES_PATH)
    }

    /// Opens a streaming completion. Returns only once the upstream has
    /// accepted the request, so every setup failure is reported here and
    /// never through the stream.
    pub async fn open_stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        let system = request.effective_system();
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: request.effective_max_tokens(),
            system: &system,
            messages: request
                .messages
                .iter()
                .map(|m| AnthropicMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: true,
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(
            "LLM stream opened: messages={}, max_tokens={}",
            request_body.messages.len(),
            request_body.max_tokens
        );

        Ok(sse::text_fragments(response.bytes_stream().eventsource()))
    }
}

#[async_trait]
impl ChatRelay for LlmClient {
    async fn stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        self.open_stream(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{Language, FRENCH_INSTRUCTION};
    use crate::test_support::{spawn_mock_upstream, UpstreamScript};

    #[tokio::test]
    async fn test_complete_concatenates_fragments_in_order() {
        let upstream =
            spawn_mock_upstream(UpstreamScript::fragments(&["Dear ", "Manager", ",\n", "Thanks"]))
                .await;
        let llm = LlmClient::new("test-key".to_string(), &upstream.base_url).unwrap();

        let text = llm
            .complete(&ChatRequest::single_user("Write an email", 100))
            .await
            .unwrap();
        assert_eq!(text, "Dear Manager,\nThanks");
    }

    #[tokio::test]
    async fn test_request_carries_model_system_and_stream_flag() {
        let upstream = spawn_mock_upstream(UpstreamScript::fragments(&["ok"])).await;
        let llm = LlmClient::new("test-key".to_string(), &upstream.base_url).unwrap();

        let request =
            ChatRequest::single_user("Bonjour", 321).with_language(Some(Language::Fr));
        llm.complete(&request).await.unwrap();

        let captured = upstream.requests().await;
        assert_eq!(captured.len(), 1);
        let body = &captured[0];
        assert_eq!(body["model"], MODEL);
        assert_eq!(body["max_tokens"], 321);
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body["system"]
            .as_str()
            .unwrap()
            .ends_with(FRENCH_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_rejected_request_fails_before_streaming() {
        let upstream = spawn_mock_upstream(UpstreamScript::Reject {
            status: 401,
            message: "invalid x-api-key".to_string(),
        })
        .await;
        let llm = LlmClient::new("bad-key".to_string(), &upstream.base_url).unwrap();

        match llm.open_stream(&ChatRequest::single_user("hi", 10)).await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid x-api-key");
            }
            Err(other) => panic!("expected API error, got {other:?}"),
            Ok(_) => panic!("expected API error, got a stream"),
        }
    }

    #[tokio::test]
    async fn test_truncated_upstream_fails_accumulation() {
        let upstream =
            spawn_mock_upstream(UpstreamScript::Truncated(vec!["partial ".to_string()])).await;
        let llm = LlmClient::new("test-key".to_string(), &upstream.base_url).unwrap();

        let result = llm.complete(&ChatRequest::single_user("hi", 10)).await;
        assert!(matches!(result, Err(LlmError::Truncated)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_http_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let llm = LlmClient::new("k".to_string(), "http://127.0.0.1:9").unwrap();
        let result = llm.open_stream(&ChatRequest::single_user("hi", 10)).await;
        assert!(matches!(result, Err(LlmError::Http(_))));
    }
}
