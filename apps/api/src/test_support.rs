//! Test doubles shared across module tests: a mock Anthropic upstream served
//! over real HTTP, and a scripted in-memory `ChatRelay`.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, Notify};

use crate::config::Config;
use crate::llm_client::{ChatRelay, ChatStream, LlmClient, LlmError};
use crate::models::chat::ChatRequest;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Mock upstream
// ────────────────────────────────────────────────────────────────────────────

pub enum UpstreamScript {
    /// Complete stream terminated by `message_stop`.
    Fragments(Vec<String>),
    /// Deltas, then the connection closes without `message_stop`.
    Truncated(Vec<String>),
    /// Non-2xx before any streaming.
    Reject { status: u16, message: String },
    /// First fragment immediately, the rest only after `gate` is notified.
    Gated {
        first: String,
        rest: Vec<String>,
        gate: Arc<Notify>,
    },
}

impl UpstreamScript {
    pub fn fragments(parts: &[&str]) -> Self {
        UpstreamScript::Fragments(parts.iter().map(|p| p.to_string()).collect())
    }
}

#[derive(Clone)]
struct MockState {
    script: Arc<UpstreamScript>,
    captured: Arc<Mutex<Vec<Value>>>,
}

pub struct MockUpstream {
    pub base_url: String,
    captured: Arc<Mutex<Vec<Value>>>,
}

impl MockUpstream {
    /// Request bodies received so far, in arrival order.
    pub async fn requests(&self) -> Vec<Value> {
        self.captured.lock().await.clone()
    }
}

pub fn sse_frame(event: &str, data: &Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

pub fn text_delta_frame(text: &str) -> String {
    sse_frame(
        "content_block_delta",
        &json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": text}
        }),
    )
}

fn message_start_frame() -> String {
    sse_frame(
        "message_start",
        &json!({"type": "message_start", "message": {"usage": {"input_tokens": 5}}}),
    )
}

fn message_stop_frame() -> String {
    sse_frame("message_stop", &json!({"type": "message_stop"}))
}

fn event_stream(body: Body) -> Response {
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn mock_messages(State(mock): State<MockState>, Json(body): Json<Value>) -> Response {
    mock.captured.lock().await.push(body);

    match mock.script.as_ref() {
        UpstreamScript::Reject { status, message } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": message}
            })),
        )
            .into_response(),
        UpstreamScript::Fragments(parts) => {
            let mut frames = vec![message_start_frame()];
            frames.extend(parts.iter().map(|p| text_delta_frame(p)));
            frames.push(message_stop_frame());
            let chunks = frames
                .into_iter()
                .map(|f| Ok::<_, Infallible>(Bytes::from(f)));
            event_stream(Body::from_stream(stream::iter(chunks)))
        }
        UpstreamScript::Truncated(parts) => {
            let mut frames = vec![message_start_frame()];
            frames.extend(parts.iter().map(|p| text_delta_frame(p)));
            let chunks = frames
                .into_iter()
                .map(|f| Ok::<_, Infallible>(Bytes::from(f)));
            event_stream(Body::from_stream(stream::iter(chunks)))
        }
        UpstreamScript::Gated { first, rest, gate } => {
            let head = format!("{}{}", message_start_frame(), text_delta_frame(first));
            let mut tail: String = rest.iter().map(|p| text_delta_frame(p)).collect();
            tail.push_str(&message_stop_frame());
            let gate = gate.clone();
            let chunks = stream::once(async move { Ok::<_, Infallible>(Bytes::from(head)) })
                .chain(stream::once(async move {
                    gate.notified().await;
                    Ok::<_, Infallible>(Bytes::from(tail))
                }));
            event_stream(Body::from_stream(chunks))
        }
    }
}

/// Binds `router` to an ephemeral localhost port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub async fn spawn_mock_upstream(script: UpstreamScript) -> MockUpstream {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        script: Arc::new(script),
        captured: captured.clone(),
    };
    let router = Router::new()
        .route("/v1/messages", post(mock_messages))
        .with_state(state);
    MockUpstream {
        base_url: serve(router).await,
        captured,
    }
}

/// App state wired to a mock upstream.
pub fn app_state(upstream_base_url: &str) -> AppState {
    let config = Config {
        anthropic_api_key: "test-key".to_string(),
        anthropic_base_url: upstream_base_url.to_string(),
        port: 0,
        rust_log: "debug".to_string(),
    };
    AppState::new(&config).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted relay
// ────────────────────────────────────────────────────────────────────────────

pub enum Reply {
    Text(String),
    Fragments(Vec<String>),
    /// Rejected before streaming.
    Fail,
    /// Some fragments, then a read error.
    FailMidStream(Vec<String>),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

/// In-memory `ChatRelay` that answers calls from a queue and records every
/// request it was given.
pub struct ScriptedRelay {
    replies: StdMutex<VecDeque<Reply>>,
    seen: StdMutex<Vec<ChatRequest>>,
}

impl ScriptedRelay {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: StdMutex::new(replies.into()),
            seen: StdMutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatRelay for ScriptedRelay {
    async fn stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        self.seen.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Text(text)) => Ok(stream::iter(vec![Ok(text)]).boxed()),
            Some(Reply::Fragments(parts)) => Ok(stream::iter(parts.into_iter().map(Ok)).boxed()),
            Some(Reply::FailMidStream(parts)) => {
                let mut items: Vec<Result<String, LlmError>> =
                    parts.into_iter().map(Ok).collect();
                items.push(Err(LlmError::Stream("connection reset".to_string())));
                Ok(stream::iter(items).boxed())
            }
            Some(Reply::Fail) | None => Err(LlmError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

/// Real client pointed at the mock upstream.
pub fn llm_for(upstream: &MockUpstream) -> LlmClient {
    LlmClient::new("test-key".to_string(), &upstream.base_url).unwrap()
}
