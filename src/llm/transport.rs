//! Blocking HTTP transport for chat-completions requests.
//!
//! [`HttpTransport`] is the real implementation (ureq, one blocking request at a time),
//! [`ScriptedTransport`] replays prepared server-sent-event bodies and records every request.
//! The latter is used by tests and by anything that needs a deterministic model.

use serde_json::json;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Cursor};
use std::rc::Rc;
use std::time::Duration;

/// Network, protocol-status and timeout failures. A failed request never yields partial content.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP Error: {status} {reason}")]
    Http { status: u16, reason: String },
    #[error("URL Error: {0}")]
    Network(String),
    #[error("LLM Request timed out")]
    Timeout,
    #[error("stream read error: {0}")]
    Io(io::Error),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout,
            _ => TransportError::Io(e),
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, response) => TransportError::Http {
                status,
                reason: response.status_text().to_string(),
            },
            ureq::Error::Transport(transport) => {
                let timed_out = std::error::Error::source(&transport)
                    .and_then(|src| src.downcast_ref::<io::Error>())
                    .map(|io_err| {
                        matches!(
                            io_err.kind(),
                            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                        )
                    })
                    .unwrap_or(false);
                if timed_out {
                    TransportError::Timeout
                } else {
                    TransportError::Network(transport.to_string())
                }
            }
        }
    }
}

pub type Body = Box<dyn BufRead>;

/// A synchronous HTTP client able to stream a response body.
pub trait Transport {
    /// Send a POST request, return a reader over the response body.
    ///
    /// # Arguments
    ///
    /// * `url`: request url
    /// * `headers`: request headers
    /// * `body`: serialized request body
    /// * `timeout`: bound for connecting and for every single read from the body
    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        timeout: Duration,
    ) -> Result<Body, TransportError>;

    /// Send a GET request and return a whole response body. `timeout` bounds the entire call.
    fn get(&self, url: &str, timeout: Duration) -> Result<String, TransportError>;
}

#[derive(Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(timeout: Duration) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .user_agent(concat!("dbgchat/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}

impl Transport for HttpTransport {
    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        timeout: Duration,
    ) -> Result<Body, TransportError> {
        let mut request = Self::agent(timeout).post(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let response = request.send_string(body)?;
        Ok(Box::new(BufReader::new(response.into_reader())))
    }

    fn get(&self, url: &str, timeout: Duration) -> Result<String, TransportError> {
        let response = Self::agent(timeout).get(url).timeout(timeout).call()?;
        Ok(response.into_string()?)
    }
}

/// Request captured by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// Return a prompt (content of the first message) of a chat-completions request.
    pub fn prompt(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value["messages"][0]["content"].as_str().map(ToOwned::to_owned)
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, TransportError>>,
    requests: Vec<RecordedRequest>,
}

/// Transport that replays prepared replies in order. Clones share the same script,
/// so a test can keep one handle and give another to a client.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response body.
    pub fn reply_raw(self, body: impl Into<String>) -> Self {
        self.script.borrow_mut().replies.push_back(Ok(body.into()));
        self
    }

    /// Queue a model answer, delivered as a stream of word-sized chunks.
    pub fn reply(self, text: &str) -> Self {
        let chunks: Vec<&str> = text.split_inclusive(' ').collect();
        self.reply_raw(sse_body(&chunks))
    }

    /// Queue a failed request.
    pub fn fail(self, err: TransportError) -> Self {
        self.script.borrow_mut().replies.push_back(Err(err));
        self
    }

    /// Return all requests made so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.borrow().requests.clone()
    }

    /// Return the amount of replies not consumed yet.
    pub fn pending(&self) -> usize {
        self.script.borrow().replies.len()
    }

    fn next_reply(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, TransportError> {
        let mut script = self.script.borrow_mut();
        script.requests.push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        });
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted reply left".to_string())))
    }
}

impl Transport for ScriptedTransport {
    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        _timeout: Duration,
    ) -> Result<Body, TransportError> {
        let reply = self.next_reply(url, headers, body)?;
        Ok(Box::new(Cursor::new(reply.into_bytes())))
    }

    fn get(&self, url: &str, _timeout: Duration) -> Result<String, TransportError> {
        self.next_reply(url, &[], "")
    }
}

/// Build a chat-completions event stream carrying `chunks` as content deltas,
/// terminated by the `[DONE]` sentinel.
pub fn sse_body(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        let frame = json!({"choices": [{"index": 0, "delta": {"content": chunk}}]});
        body.push_str(&format!("data: {frame}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}
