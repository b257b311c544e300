//! Natural language assistance on top of a debugger.
//!
//! [`Session`] holds the whole conversation state: the previously generated command,
//! the confirmation mode and the loaded stage prompts. It lives for the debugger session
//! lifetime and is mutated only by the command dispatch loop, one command at a time.

pub mod explore;
pub mod gate;
pub mod prompt;
pub mod resolver;

use crate::error::Error;
use crate::host::DebuggerHost;
use crate::llm::{LlmClient, TransportError};
use explore::{ExplorationReport, Explorer, DEFAULT_MAX_ITERATIONS};
use gate::{run_gated, Gated};
use log::debug;
use prompt::PromptSource;
use resolver::{CommandResolver, Resolution};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

pub use gate::Mode;
pub use resolver::StageError;

pub const CHAT_HELP: &str = "\
dbgchat adds natural language commands to the debugger. \
Before use, set up an api key with `dbgchat config --key <KEY>`. The commands are as follows:

chat <query>: generate a debugger command from plain English and execute it. \
For example, 'chat stop my code at line 7' will generate the command 'break 7'.

explain [query]: with no arguments explain the previous generated command, \
with a query ask a question about the debugger.

chat-set-mode ask|agent: in ask mode every generated command is confirmed before execution, \
in agent mode it is executed immediately.

chat-explore <query>: let the model investigate the program state, \
it runs up to a few commands and ends with a hypothesis or a conclusion.
";

/// The way `chat` turns a request into a command.
#[derive(Debug, Clone, Copy, PartialEq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Strategy {
    /// Single request with a generic prompt.
    #[default]
    Direct,
    /// Multi-stage resolution guided by the debugger help system.
    Staged,
}

fn command_prompt(dbg: &str) -> String {
    format!(
        "Based on the user's query, provide a single, precise {dbg} command. \
         Consider the typical use cases and syntax for {dbg} commands. \
         Ensure the command is directly executable. \
         Do NOT include any explanation or surrounding text. \
         User query: "
    )
}

fn explanation_prompt(dbg: &str) -> String {
    format!("Give me an explanation for this {dbg} command: ")
}

fn stop_prompt(context: &str) -> String {
    format!(
        "The debugger has stopped. Here's the current context:\n{context}\n\
         What are 1-2 brief, general suggestions or common next debugging steps a developer might take based on this? \
         Focus on actionable debugger commands or areas to investigate. \
         Example: 'Consider `step` / `next`. Examine variable X if its value seems off.'"
    )
}

pub struct Session {
    client: LlmClient,
    prompts: PromptSource,
    previous_command: String,
    mode: Mode,
    strategy: Strategy,
    explore_iterations: usize,
    stop_hints: bool,
}

impl Session {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            prompts: PromptSource::builtin(),
            previous_command: String::new(),
            mode: Mode::default(),
            strategy: Strategy::default(),
            explore_iterations: DEFAULT_MAX_ITERATIONS,
            stop_hints: false,
        }
    }

    pub fn with_prompts(self, prompts: PromptSource) -> Self {
        Self { prompts, ..self }
    }

    pub fn with_mode(self, mode: Mode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_strategy(self, strategy: Strategy) -> Self {
        Self { strategy, ..self }
    }

    pub fn with_explore_iterations(self, explore_iterations: usize) -> Self {
        Self {
            explore_iterations,
            ..self
        }
    }

    pub fn with_stop_hints(self, stop_hints: bool) -> Self {
        Self { stop_hints, ..self }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn previous_command(&self) -> &str {
        &self.previous_command
    }

    /// Send a prompt, stream the answer into the debugger output.
    fn stream_into(
        client: &LlmClient,
        host: &mut dyn DebuggerHost,
        prompt: &str,
    ) -> Result<String, TransportError> {
        let answer = {
            let mut sink = |chunk: &str| host.write(chunk);
            client.request(prompt, Some(&mut sink))
        };
        host.write("\n");
        answer
    }

    /// Generate a command from a natural language query and execute it according to the mode.
    pub fn chat(&mut self, host: &mut dyn DebuggerHost, query: &str) -> Result<(), Error> {
        if query.trim() == "help" {
            host.write(CHAT_HELP);
            return Ok(());
        }

        debug!(target: "dbgchat", "chat ({}): {query}", self.strategy);
        let command = match self.strategy {
            Strategy::Direct => {
                let prompt = format!("{}{query}", command_prompt(host.name()));
                match Self::stream_into(&self.client, host, &prompt) {
                    Ok(command) => Some(command),
                    // already reported into the output
                    Err(_) => return Ok(()),
                }
            }
            Strategy::Staged => {
                let prompts = match self.prompts.get() {
                    Ok(prompts) => prompts,
                    Err(e) => {
                        host.write("Could not load system prompts, multi-stage processing aborted.\n");
                        return Err(StageError::from(e).into());
                    }
                };
                match CommandResolver::new(&self.client, prompts, host).resolve(query) {
                    Ok(Resolution::Command(command)) => Some(command),
                    Ok(Resolution::NoCommand) => None,
                    Err(StageError::Llm { .. }) => return Ok(()),
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let Some(command) = command else {
            return Ok(());
        };
        if command.trim().is_empty() {
            host.write("Received an empty command. Nothing to execute.\n");
            return Ok(());
        }

        self.previous_command = command.clone();
        if let Gated::Executed(output) = run_gated(self.mode, host, &command)? {
            host.write(&output);
        }
        Ok(())
    }

    /// Explain the previous command, or answer `question` if it is not empty.
    pub fn explain(&mut self, host: &mut dyn DebuggerHost, question: &str) -> Result<(), Error> {
        let prompt = if question.trim().is_empty() {
            if self.previous_command.is_empty() {
                host.write("No previous command to explain, use `chat` first.\n");
                return Ok(());
            }
            format!(
                "{}{}",
                explanation_prompt(host.name()),
                self.previous_command
            )
        } else {
            question.to_string()
        };

        // transport errors are reported into the output by the client
        let _ = Self::stream_into(&self.client, host, &prompt);
        Ok(())
    }

    pub fn set_mode(&mut self, host: &mut dyn DebuggerHost, arg: &str) {
        match Mode::from_str(arg.trim()) {
            Ok(mode) => {
                self.mode = mode;
                let name = match mode {
                    Mode::Ask => "Ask",
                    Mode::Agent => "Agent",
                };
                host.write(&format!("Mode set to: {name}\n"));
            }
            Err(_) => host.write("Usage: chat-set-mode [ask|agent]\n"),
        }
    }

    pub fn explore(
        &mut self,
        host: &mut dyn DebuggerHost,
        query: &str,
    ) -> Option<ExplorationReport> {
        let query = query.trim();
        if query.is_empty() {
            host.write("Usage: chat-explore <your query or initial variable/command to explore>\n");
            return None;
        }

        let report = Explorer::new(&self.client, host)
            .with_max_iterations(self.explore_iterations)
            .explore(query);
        debug!(target: "dbgchat", "exploration finished: {:?}", report.outcome);
        Some(report)
    }

    /// Print next step suggestions if the debuggee stopped since the last call.
    /// Nothing inside this block is propagated to the caller.
    pub fn on_stop(&mut self, host: &mut dyn DebuggerHost) {
        if !host.take_stop_event() || !self.stop_hints {
            return;
        }

        host.write("\n--- Contextual Assistance ---\n");
        match host.frame_summary() {
            Ok(context) => {
                host.write(&context);
                match self.client.request(&stop_prompt(&context), None) {
                    Ok(suggestion) => host.write(&format!("Suggestion: {suggestion}\n")),
                    Err(e) => host.write(&format!("Error in contextual assistance: {e}\n")),
                }
            }
            Err(e) => host.write(&format!("Error in contextual assistance: {e}\n")),
        }
        host.write("--- End Contextual Assistance ---\n");
    }
}
