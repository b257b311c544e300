//! Multi-stage translation of a natural language request into a single debugger command.
//!
//! Stages are strictly sequential:
//! 1. classify the request into one of the debugger command classes (model)
//! 2. fetch the class reference from the debugger help and filter it
//! 3. select a command from the reference (model)
//! 4. fetch detailed help of the selected command
//! 5. synthesize the final command line (model)
//!
//! Any failed stage aborts the whole resolution, a partially resolved command is never returned.

use crate::assistant::prompt::{PromptError, StagePromptSet};
use crate::host::{DebuggerHost, HostError};
use crate::llm::parse::{last_non_blank_line, parse_classification};
use crate::llm::{LlmClient, TransportError};
use log::debug;
use strum_macros::Display;

/// Command classes of GDB help system.
pub const SUPPORTED_COMMAND_CLASSES: [&str; 12] = [
    "breakpoints",
    "data",
    "files",
    "internals",
    "obscure",
    "running",
    "stack",
    "status",
    "support",
    "text-user-interface",
    "tracepoints",
    "user-defined",
];

/// Model answer meaning that the request can't be expressed with the selected command.
pub const NO_VALID_COMMAND: &str = "# No valid command";

const COMMANDS_MARKER: &str = "List of commands:";
const REFERENCE_SNIPPET_LEN: usize = 200;
const HELP_SNIPPET_LEN: usize = 300;

/// Stages that involve a model request.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum Stage {
    #[strum(serialize = "stage 1 (classify)")]
    Classify,
    #[strum(serialize = "stage 3 (select)")]
    Select,
    #[strum(serialize = "stage 5 (synthesize)")]
    Synthesize,
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Prompts(#[from] PromptError),
    #[error("error in {stage} LLM call: {source}")]
    Llm { stage: Stage, source: TransportError },
    #[error("stage 1: {reason}, raw response: '{raw}'")]
    Unclassified { reason: &'static str, raw: String },
    #[error(
        "stage 1: LLM provided an invalid command class: '{class}', expected one of: {}",
        SUPPORTED_COMMAND_CLASSES.join(", ")
    )]
    UnsupportedClass { class: String },
    #[error("stage 2: failed to get help for class '{class}': {source}")]
    ClassHelp { class: String, source: HostError },
    #[error("stage 2: could not find start-of-commands marker in help output for '{class}'")]
    MarkerNotFound { class: String },
    #[error("stage 2: no commands found for class '{class}' after filtering")]
    EmptyReference { class: String },
    #[error("stage 3: LLM did not select a command from class '{class}', raw response: '{raw}'")]
    NoSelection { class: String, raw: String },
    #[error("stage 4: failed to get detailed help for command '{command}': {source}")]
    CommandHelp { command: String, source: HostError },
    #[error("stage 5: LLM returned an empty response for the final command")]
    EmptyCommand,
}

/// Successful resolution outcome.
#[derive(Debug, PartialEq)]
pub enum Resolution {
    Command(String),
    /// Model explicitly answered that no command fits the request.
    NoCommand,
}

/// Cut the command list out of a class help text.
///
/// The list starts after the `List of commands:` marker (or after the
/// `Command class "<class>" contains the following commands:` marker of some debugger versions).
/// Settings commands (`set ...`) are dropped.
pub fn filter_command_reference(help: &str, class: &str) -> Result<String, StageError> {
    let alt_marker = format!("Command class \"{class}\" contains the following commands:");
    let list = [COMMANDS_MARKER, alt_marker.as_str()]
        .into_iter()
        .find_map(|marker| help.find(marker).map(|pos| &help[pos + marker.len()..]))
        .ok_or_else(|| StageError::MarkerNotFound {
            class: class.to_string(),
        })?;

    let filtered = list
        .split('\n')
        .filter(|line| !line.trim().starts_with("set "))
        .collect::<Vec<_>>()
        .join("\n");
    let filtered = filtered.trim();

    if filtered.is_empty() {
        return Err(StageError::EmptyReference {
            class: class.to_string(),
        });
    }
    Ok(filtered.to_string())
}

fn snippet(text: &str, len: usize) -> String {
    match text.char_indices().nth(len) {
        Some((pos, _)) => format!("{}...", &text[..pos]),
        None => text.to_string(),
    }
}

/// Resolver of a single request. Model answers and progress messages are streamed into the
/// debugger output as they arrive.
pub struct CommandResolver<'a> {
    client: &'a LlmClient,
    prompts: &'a StagePromptSet,
    host: &'a mut dyn DebuggerHost,
}

impl<'a> CommandResolver<'a> {
    pub fn new(
        client: &'a LlmClient,
        prompts: &'a StagePromptSet,
        host: &'a mut dyn DebuggerHost,
    ) -> Self {
        Self {
            client,
            prompts,
            host,
        }
    }

    pub fn resolve(&mut self, query: &str) -> Result<Resolution, StageError> {
        let class = self.classify(query)?;
        let reference = self.class_reference(&class)?;
        let command = self.select(&class, &reference, query)?;
        let help = self.command_help(&command)?;
        self.synthesize(&command, &help, query)
    }

    fn ask(&mut self, stage: Stage, prompt: &str) -> Result<String, StageError> {
        debug!(target: "dbgchat", "{stage}: send request");
        let host = &mut *self.host;
        let mut sink = |chunk: &str| host.write(chunk);
        let answer = self.client.request(prompt, Some(&mut sink));
        self.host.write("\n");
        answer.map_err(|source| StageError::Llm { stage, source })
    }

    fn help(&mut self, topic: &str) -> Result<String, HostError> {
        let command = format!("help {topic}");
        let line = format!("Executing {} command: {command}\n", self.host.name());
        self.host.write(&line);
        self.host.execute(&command)
    }

    fn classify(&mut self, query: &str) -> Result<String, StageError> {
        self.host.write("--- Stage 1: Classifying user intent ---\n");
        let prompt = format!("{}{query}", self.prompts.classify);
        let answer = self.ask(Stage::Classify, &prompt)?;

        let classification = parse_classification(&answer);
        let Some(class) = classification.class() else {
            return Err(StageError::Unclassified {
                reason: classification.diagnostic().unwrap_or_default(),
                raw: answer.clone(),
            });
        };
        if let Some(warn) = classification.diagnostic() {
            self.host.write(&format!("Stage 1 Info: {warn}\n"));
        }

        if !SUPPORTED_COMMAND_CLASSES.contains(&class) {
            return Err(StageError::UnsupportedClass {
                class: class.to_string(),
            });
        }

        let summary = classification.summary().unwrap_or_default();
        self.host.write(&format!(
            "Stage 1 Summary: '{summary}'\nStage 1 Result: command class '{class}'\n"
        ));
        Ok(class.to_string())
    }

    fn class_reference(&mut self, class: &str) -> Result<String, StageError> {
        let line = format!(
            "--- Stage 2: Getting {} help for class '{class}' ---\n",
            self.host.name()
        );
        self.host.write(&line);

        let help = self
            .help(class)
            .map_err(|source| StageError::ClassHelp {
                class: class.to_string(),
                source,
            })?;
        let reference = filter_command_reference(&help, class)?;

        self.host.write(&format!(
            "Stage 2 Result: filtered help for '{class}':\n{}\n",
            snippet(&reference, REFERENCE_SNIPPET_LEN)
        ));
        Ok(reference)
    }

    fn select(&mut self, class: &str, reference: &str, query: &str) -> Result<String, StageError> {
        self.host.write(&format!(
            "--- Stage 3: Selecting specific command from class '{class}' ---\n"
        ));
        let prompt = format!("{}{reference}\nUser Query: {query}", self.prompts.select);
        let answer = self.ask(Stage::Select, &prompt)?;

        let command = last_non_blank_line(&answer);
        if command.is_empty() {
            return Err(StageError::NoSelection {
                class: class.to_string(),
                raw: answer.clone(),
            });
        }

        self.host
            .write(&format!("Stage 3 Result: selected command '{command}'\n"));
        Ok(command.to_string())
    }

    fn command_help(&mut self, command: &str) -> Result<String, StageError> {
        let line = format!(
            "--- Stage 4: Getting detailed {} help for command '{command}' ---\n",
            self.host.name()
        );
        self.host.write(&line);

        let help = self
            .help(command)
            .map_err(|source| StageError::CommandHelp {
                command: command.to_string(),
                source,
            })?;

        if help.trim().is_empty() {
            self.host.write(&format!(
                "Stage 4 Warning: empty detailed help for command '{command}', proceeding anyway\n"
            ));
        } else {
            self.host.write(&format!(
                "Stage 4 Result: detailed help for '{command}':\n{}\n",
                snippet(&help, HELP_SNIPPET_LEN)
            ));
        }
        Ok(help)
    }

    fn synthesize(
        &mut self,
        command: &str,
        help: &str,
        query: &str,
    ) -> Result<Resolution, StageError> {
        let line = format!(
            "--- Stage 5: Generating final {} command based on help for '{command}' ---\n",
            self.host.name()
        );
        self.host.write(&line);
        let prompt = format!("{}{help}\nUser Query: {query}", self.prompts.synthesize);
        let answer = self.ask(Stage::Synthesize, &prompt)?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(StageError::EmptyCommand);
        }
        if answer == NO_VALID_COMMAND {
            self.host.write(
                "Stage 5 Info: LLM determined that no valid command fits the request\n",
            );
            return Ok(Resolution::NoCommand);
        }

        self.host
            .write(&format!("Stage 5 Result: final command:\n{answer}\n"));
        Ok(Resolution::Command(answer.to_string()))
    }
}
