use crate::llm::TransportError;
use crate::weak_error;
use serde::Deserialize;
use std::io::BufRead;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Deserialize)]
struct Frame {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

impl Frame {
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
    }
}

/// Iterator over content deltas of a chat-completions event stream.
///
/// Reads the body line by line, only `data: ` lines are considered. Reading stops at the
/// `[DONE]` sentinel or at the end of the body. A line that is not UTF-8 or a data line with
/// an undecodable payload is logged and skipped, a read error is yielded once and ends the iteration.
pub struct DeltaStream<R> {
    reader: R,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: BufRead> DeltaStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for DeltaStream<R> {
    type Item = Result<String, TransportError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.finished = true,
                Ok(_) => {
                    let Some(line) = weak_error!(
                        std::str::from_utf8(&self.buf),
                        "undecodable stream frame skipped:"
                    ) else {
                        continue;
                    };
                    let Some(payload) = line.trim().strip_prefix(DATA_PREFIX) else {
                        continue;
                    };
                    if payload == DONE_SENTINEL {
                        self.finished = true;
                        break;
                    }

                    let frame = weak_error!(
                        serde_json::from_str::<Frame>(payload),
                        "malformed stream frame skipped:"
                    );
                    if let Some(content) = frame.and_then(Frame::into_content) {
                        return Some(Ok(content));
                    }
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}
