//! Extraction of structured data from raw model answers.

pub const HYPOTHESIS_MARKER: &str = "HYPOTHESIS:";
pub const DONE_MARKER: &str = "DONE:";
pub const SINGLE_LINE_SUMMARY: &str = "N/A (LLM provided only one line)";

fn non_blank_lines(text: &str) -> impl DoubleEndedIterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Result of a command class request. The model is asked for a summary line followed by
/// a class line, the last line always wins, earlier lines (reasoning) are ignored.
#[derive(Debug, PartialEq)]
pub enum Classification<'a> {
    Classified { class: &'a str, summary: &'a str },
    /// Only one line in the answer, it is used as a class.
    SingleLine { class: &'a str },
    Empty,
}

impl<'a> Classification<'a> {
    pub fn class(&self) -> Option<&'a str> {
        match self {
            Classification::Classified { class, .. } | Classification::SingleLine { class } => {
                Some(*class)
            }
            Classification::Empty => None,
        }
    }

    pub fn summary(&self) -> Option<&'a str> {
        match self {
            Classification::Classified { summary, .. } => Some(*summary),
            Classification::SingleLine { .. } => Some(SINGLE_LINE_SUMMARY),
            Classification::Empty => None,
        }
    }

    /// Return a diagnostic message. If [`Classification::class`] is `None` this message is fatal
    /// for classification, otherwise it is a warning.
    pub fn diagnostic(&self) -> Option<&'static str> {
        match self {
            Classification::Classified { .. } => None,
            Classification::SingleLine { .. } => Some(
                "LLM returned only one line, expected summary and class, using the line as class",
            ),
            Classification::Empty => Some("LLM returned too few lines or empty response"),
        }
    }
}

pub fn parse_classification(text: &str) -> Classification {
    let mut lines = non_blank_lines(text).rev();
    match (lines.next(), lines.next()) {
        (Some(class), Some(summary)) => Classification::Classified { class, summary },
        (Some(class), None) => Classification::SingleLine { class },
        _ => Classification::Empty,
    }
}

/// Return the last non-blank line (trimmed) or an empty string.
pub fn last_non_blank_line(text: &str) -> &str {
    non_blank_lines(text).next_back().unwrap_or_default()
}

pub fn is_terminal_hypothesis(text: &str) -> bool {
    text.starts_with(HYPOTHESIS_MARKER)
}

pub fn is_terminal_done(text: &str) -> bool {
    text.starts_with(DONE_MARKER)
}

/// Next step proposed by a model during exploration.
#[derive(Debug, PartialEq)]
pub enum Suggestion<'a> {
    Blank,
    Hypothesis(&'a str),
    Done(&'a str),
    Command(&'a str),
}

impl<'a> Suggestion<'a> {
    pub fn parse(text: &'a str) -> Self {
        if is_terminal_hypothesis(text) {
            Suggestion::Hypothesis(text[HYPOTHESIS_MARKER.len()..].trim())
        } else if is_terminal_done(text) {
            Suggestion::Done(text[DONE_MARKER.len()..].trim())
        } else if text.trim().is_empty() {
            Suggestion::Blank
        } else {
            Suggestion::Command(text.trim())
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Suggestion::Hypothesis(_) | Suggestion::Done(_))
    }
}

/// Remove one pair of surrounding double quotes, then one pair of single quotes.
pub fn strip_quotes(text: &str) -> &str {
    fn strip<'a>(s: &'a str, quote: char) -> &'a str {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            &s[1..s.len() - 1]
        } else {
            s
        }
    }
    strip(strip(text, '"'), '\'').trim()
}
