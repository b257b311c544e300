//! GDB machine interface (MI2) output records.

use once_cell::sync::Lazy;
use regex::Regex;

/// Class of a result record (`^class,...`).
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ResultClass {
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

#[derive(Debug, PartialEq)]
pub enum Record<'a> {
    /// `~"text"`, console output of a command.
    Console(String),
    /// `@"text"`, output of a remote target.
    Target(String),
    /// `&"text"`, internal debugger log (usually an echo of the command).
    Log(String),
    Result {
        class: ResultClass,
        rest: &'a str,
    },
    /// `*class,...` or `=class,...`.
    Async {
        class: &'a str,
        rest: &'a str,
    },
    /// `(gdb)` line, the debugger waits for the next command.
    Prompt,
    /// Anything else, typically a debuggee output sharing the debugger terminal.
    Other(&'a str),
}

fn split_class(record: &str) -> (&str, &str) {
    match record.split_once(',') {
        None => (record, ""),
        Some((class, rest)) => (class, rest),
    }
}

fn stream_text(body: &str) -> String {
    let body = body.trim_end();
    let body = body
        .strip_prefix('"')
        .and_then(|b| b.strip_suffix('"'))
        .unwrap_or(body);
    unescape(body)
}

/// Parse a single line of MI output.
pub fn parse_line(line: &str) -> Record {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim_end() == "(gdb)" {
        return Record::Prompt;
    }

    // result and async records may start with a numeric token
    let record = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    let Some(kind) = record.chars().next() else {
        return Record::Other(trimmed);
    };
    let body = &record[kind.len_utf8()..];

    match kind {
        '~' => Record::Console(stream_text(body)),
        '@' => Record::Target(stream_text(body)),
        '&' => Record::Log(stream_text(body)),
        '^' => {
            let (class, rest) = split_class(body);
            let class = match class {
                "done" => ResultClass::Done,
                "running" => ResultClass::Running,
                "connected" => ResultClass::Connected,
                "error" => ResultClass::Error,
                "exit" => ResultClass::Exit,
                _ => return Record::Other(trimmed),
            };
            Record::Result { class, rest }
        }
        '*' | '=' => {
            let (class, rest) = split_class(body);
            Record::Async { class, rest }
        }
        _ => Record::Other(trimmed),
    }
}

static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([a-zA-Z_-]+)="((?:[^"\\]|\\.)*)""#).expect("must compile"));

/// Return the value of the first `name="value"` field of a record, nested tuples included.
pub fn field(rest: &str, name: &str) -> Option<String> {
    FIELD_RE
        .captures_iter(rest)
        .find(|caps| &caps[1] == name)
        .map(|caps| unescape(&caps[2]))
}

/// Decode the body of a C string literal (without quotes).
pub fn unescape(body: &str) -> String {
    let mut bytes = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('r') => bytes.push(b'\r'),
            Some('e') => bytes.push(0x1b),
            Some(d @ '0'..='7') => {
                let mut digits = String::from(d);
                while digits.len() < 3 {
                    match chars.next_if(|c| c.is_digit(8)) {
                        Some(next) => digits.push(next),
                        None => break,
                    }
                }
                match u8::from_str_radix(&digits, 8) {
                    Ok(code) => bytes.push(code),
                    // above \377, keep as is
                    Err(_) => {
                        bytes.push(b'\\');
                        bytes.extend_from_slice(digits.as_bytes());
                    }
                }
            }
            Some(other) => {
                let mut buf = [0; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Encode a string as a C string literal (with quotes).
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
