//! Console commands.
//!
//! A line typed by the user is either an assistant command (`chat`, `explain`, ...),
//! a console control command (`help`, `quit`) or anything else, which goes to the debugger as is.

pub mod parser;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parsing(String),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Commands recognized by the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Natural language request for a debugger command.
    Chat(String),
    /// Explain the previous command or answer a question.
    Explain(String),
    SetMode(String),
    Explore(String),
    Help {
        command: Option<String>,
        reason: Option<String>,
    },
    Quit,
    /// Raw debugger command.
    Passthrough(String),
    SkipInput,
}
