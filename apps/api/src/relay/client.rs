//! HTTP client for the relay endpoint: what a front-end does with `fetch`,
//! expressed as a `ChatRelay` so the exercise runner can sit on either side
//! of the wire.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;

use crate::llm_client::{ChatRelay, ChatStream, LlmError};
use crate::models::chat::ChatRequest;

const MESSAGES_PATH: &str = "/api/messages";

#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    error: String,
}

/// Not mounted by the server; used to exercise the relay over real HTTP.
#[allow(dead_code)]
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    endpoint: String,
}

#[allow(dead_code)]
impl RelayClient {
    pub fn new(base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), MESSAGES_PATH),
        })
    }
}

#[async_trait]
impl ChatRelay for RelayClient {
    async fn stream(&self, request: &ChatRequest) -> Result<ChatStream, LlmError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RelayErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chunks = response.bytes_stream().boxed();
        let decoded = stream::unfold(
            Some((chunks, Utf8Decoder::default())),
            |state| async move {
                let (mut chunks, mut decoder) = state?;
                loop {
                    match chunks.next().await {
                        Some(Ok(bytes)) => {
                            let text = decoder.push(&bytes);
                            if text.is_empty() {
                                continue;
                            }
                            return Some((Ok(text), Some((chunks, decoder))));
                        }
                        // An incomplete chunked body lands here.
                        Some(Err(e)) => return Some((Err(LlmError::Stream(e.to_string())), None)),
                        None => {
                            let tail = decoder.finish();
                            return (!tail.is_empty()).then(|| (Ok(tail), None));
                        }
                    }
                }
            },
        );

        Ok(decoded.boxed())
    }
}

/// Incremental UTF-8 decoder. A character split across chunk boundaries is
/// held back until its remaining bytes arrive; invalid sequences become
/// U+FFFD.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

#[allow(dead_code)]
impl Utf8Decoder {
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut consumed = 0;

        loop {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_up_to = consumed + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(
                        &self.pending[consumed..valid_up_to],
                    ));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid_up_to + len;
                        }
                        None => {
                            consumed = valid_up_to;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        out
    }

    /// Flushes whatever is left at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        char::REPLACEMENT_CHARACTER.to_string()
    }
}
