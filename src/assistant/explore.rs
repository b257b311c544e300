//! Bounded, model-driven exploration of a program state.

use crate::host::DebuggerHost;
use crate::llm::parse::{strip_quotes, Suggestion};
use crate::llm::LlmClient;
use itertools::Itertools;
use log::debug;

pub const DEFAULT_MAX_ITERATIONS: usize = 3;
const NO_OUTPUT: &str = "<no output>";

/// Single executed command and its output (or error description).
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub command: String,
    pub output: String,
}

/// Reason why exploration ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Debugger failed to execute a command.
    HostError,
    /// Model suggested nothing.
    EmptySuggestion,
    Hypothesis(String),
    Done(String),
    MaxIterations,
    /// Model request failed.
    LlmFailure,
}

#[derive(Debug, PartialEq)]
pub struct ExplorationReport {
    pub steps: Vec<Step>,
    pub outcome: Outcome,
}

pub struct Explorer<'a> {
    client: &'a LlmClient,
    host: &'a mut dyn DebuggerHost,
    max_iterations: usize,
}

impl<'a> Explorer<'a> {
    pub fn new(client: &'a LlmClient, host: &'a mut dyn DebuggerHost) -> Self {
        Self {
            client,
            host,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    fn initial_prompt(&self, query: &str) -> String {
        let dbg = self.host.name();
        format!(
            "The user wants to start a debugging exploration related to the query: '{query}'. \
             Based on this query, what single, directly executable {dbg} command is the best first step to investigate? \
             Respond with ONLY the {dbg} command itself, without any explanation, preceding text, or surrounding quotes/markdown."
        )
    }

    fn next_step_prompt(&self, query: &str, steps: &[Step]) -> String {
        let dbg = self.host.name();
        let last = steps.last().map(|s| s.command.as_str()).unwrap_or_default();
        let history = steps
            .iter()
            .map(|s| format!("Cmd: {}\nOut: {}", s.command, s.output))
            .join("\n");
        format!(
            "User's initial debug query: '{query}'.\n\
             Debugging history so far (last executed command was '{last}'):\n{history}\n\n\
             Based on this history and the initial query, what is the single BEST next {dbg} command to execute to investigate further? \
             Or, if you have a strong hypothesis, state it prefixed with 'HYPOTHESIS: '. \
             If no more useful commands can be run or the issue is likely found, state 'DONE: ' followed by a summary. \
             If suggesting a {dbg} command, provide ONLY the command itself, without any additional explanation or formatting. \
             If the previous command resulted in an error, consider what might have caused it \
             (e.g., invalid syntax, non-existent variable) and suggest a corrected command or a different approach."
        )
    }

    /// Run the exploration loop. Progress is written into the debugger output.
    pub fn explore(&mut self, query: &str) -> ExplorationReport {
        self.host
            .write(&format!("Starting exploration for: {query}\n"));
        let mut steps = vec![];
        let outcome = self.run(query, &mut steps);
        self.host.write("--- Exploration Finished ---\n");
        ExplorationReport { steps, outcome }
    }

    fn run(&mut self, query: &str, steps: &mut Vec<Step>) -> Outcome {
        let prompt = self.initial_prompt(query);
        let mut command = match self.client.request(&prompt, None) {
            Ok(answer) => strip_quotes(&answer).to_string(),
            Err(e) => {
                self.host.write(&format!("LLM API Error: {e}\n"));
                return Outcome::LlmFailure;
            }
        };

        for i in 0..self.max_iterations {
            self.host.write(&format!(
                "--- Exploration Step {}/{} ---\n",
                i + 1,
                self.max_iterations
            ));

            match Suggestion::parse(&command) {
                Suggestion::Blank => {
                    self.host.write(
                        "LLM did not suggest a command in the previous step. Ending exploration.\n",
                    );
                    return Outcome::EmptySuggestion;
                }
                s if s.is_terminal() => {
                    self.host.write(
                        "Previous LLM response was a terminal state. Ending exploration.\n",
                    );
                    return Outcome::EmptySuggestion;
                }
                _ => {}
            }

            self.host.write(&format!("Executing: {command}\n"));
            match self.host.execute(&command) {
                Ok(output) => {
                    let output = output.trim_end_matches('\n');
                    let output = if output.is_empty() { NO_OUTPUT } else { output };
                    self.host.write(&format!("Output:\n{output}\n"));
                    steps.push(Step {
                        command: command.clone(),
                        output: output.to_string(),
                    });
                }
                Err(e) => {
                    let output = format!("Error executing command '{command}': {e}");
                    self.host.write(&format!("{output}\n"));
                    steps.push(Step { command, output });
                    self.host.write(
                        "Error encountered during command execution. Ending exploration.\n",
                    );
                    return Outcome::HostError;
                }
            }

            let prompt = self.next_step_prompt(query, steps);
            let suggestion = match self.client.request(&prompt, None) {
                Ok(answer) => answer,
                Err(e) => {
                    self.host.write(&format!("LLM API Error: {e}\n"));
                    return Outcome::LlmFailure;
                }
            };
            debug!(target: "dbgchat", "exploration step {}: {suggestion}", i + 1);
            self.host
                .write(&format!("LLM Suggestion (raw):\n{suggestion}\n"));

            match Suggestion::parse(suggestion.trim()) {
                Suggestion::Hypothesis(text) => {
                    self.host.write(&format!("LLM Hypothesis: {text}\n"));
                    return Outcome::Hypothesis(text.to_string());
                }
                Suggestion::Done(text) => {
                    self.host.write(&format!("LLM Conclusion: {text}\n"));
                    return Outcome::Done(text.to_string());
                }
                Suggestion::Blank => {
                    self.host
                        .write("LLM returned an empty suggestion. Ending exploration.\n");
                    return Outcome::EmptySuggestion;
                }
                Suggestion::Command(next) => command = next.to_string(),
            }
        }

        self.host
            .write("Max iterations reached. Ending exploration.\n");
        Outcome::MaxIterations
    }
}
