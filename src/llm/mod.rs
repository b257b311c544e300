//! Chat-completions client.
//!
//! One request is in flight at a time and every call blocks the caller until the stream ends.
//! Response text is produced incrementally by [`DeltaStream`] and assembled by
//! [`LlmClient::request`], which also forwards each delta to an optional output callback.

pub mod parse;
mod sse;
pub mod transport;

use crate::config::Configuration;
use log::error;
use serde::Serialize;
use std::time::Duration;

pub use sse::DeltaStream;
pub use transport::{Body, HttpTransport, ScriptedTransport, Transport, TransportError};

/// Bound for a single streaming (generation) call.
pub const STREAM_TIMEOUT: Duration = Duration::from_secs(60);
/// Bound for simple one-shot calls.
pub const ONE_SHOT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    stream: bool,
}

pub struct LlmClient {
    config: Configuration,
    transport: Box<dyn Transport>,
}

impl LlmClient {
    pub fn new(config: Configuration, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    /// Open a streaming request with `prompt` as a single user message.
    pub fn stream(&self, prompt: &str) -> Result<DeltaStream<Body>, TransportError> {
        let payload = ChatRequest {
            model: &self.config.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            stream: true,
        };
        let payload = serde_json::to_string(&payload)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        let authorization = format!("Bearer {}", self.config.api_key);
        let headers = [
            ("Authorization", authorization.as_str()),
            ("Content-Type", "application/json"),
        ];

        let body = self.transport.post(
            &self.config.endpoint_url,
            &headers,
            &payload,
            STREAM_TIMEOUT,
        )?;
        Ok(DeltaStream::new(body))
    }

    /// Send `prompt` and return the whole (trimmed) answer.
    ///
    /// Every content delta is passed to `on_chunk` as soon as it arrives. On failure the partial
    /// answer is dropped, the error is reported into the error log and, if `on_chunk` is present,
    /// into the stream itself.
    ///
    /// # Arguments
    ///
    /// * `prompt`: user message
    /// * `on_chunk`: incremental output callback
    pub fn request(
        &self,
        prompt: &str,
        mut on_chunk: Option<&mut dyn FnMut(&str)>,
    ) -> Result<String, TransportError> {
        match self.collect(prompt, &mut on_chunk) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(err) => {
                error!(target: "dbgchat", "{err}");
                if let Some(cb) = on_chunk {
                    cb(&format!("\nLLM API Error: {err}\n"));
                }
                Err(err)
            }
        }
    }

    fn collect(
        &self,
        prompt: &str,
        on_chunk: &mut Option<&mut dyn FnMut(&str)>,
    ) -> Result<String, TransportError> {
        let mut text = String::new();
        for delta in self.stream(prompt)? {
            let delta = delta?;
            if let Some(cb) = on_chunk.as_mut() {
                cb(&delta);
            }
            text.push_str(&delta);
        }
        Ok(text)
    }
}
