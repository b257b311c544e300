use dbgchat::config::Configuration;
use dbgchat::host::{DebuggerHost, HostError};
use dbgchat::llm::{LlmClient, ScriptedTransport};
use std::collections::{HashMap, VecDeque};

pub const BREAKPOINTS_HELP: &str = "Making program stop at certain points.

List of commands:

break, brea, bre, br, b -- Set breakpoint at specified location.
set breakpoint pending -- Set debugger's behavior regarding pending breakpoints.
tbreak -- Set a temporary breakpoint.
watch -- Set a watchpoint for EXPRESSION.
";

pub const BREAK_HELP: &str = "break, brea, bre, br, b
Set breakpoint at specified location.
break [PROBE_MODIFIER] [LOCATION] [thread THREADNUM] [if CONDITION]
";

/// Debugger with prepared command outputs and user answers.
#[derive(Default)]
pub struct TestHost {
    pub outputs: HashMap<String, Result<String, String>>,
    pub answers: VecDeque<String>,
    pub frame: Option<Result<String, String>>,
    pub stopped: bool,
    pub executed: Vec<String>,
    pub out: String,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs
            .insert(command.to_string(), Ok(output.to_string()));
        self
    }

    pub fn with_error(mut self, command: &str, msg: &str) -> Self {
        self.outputs.insert(command.to_string(), Err(msg.to_string()));
        self
    }

    pub fn with_answer(mut self, answer: &str) -> Self {
        self.answers.push_back(answer.to_string());
        self
    }

    /// Executed commands without help requests.
    pub fn executed_commands(&self) -> Vec<&str> {
        self.executed
            .iter()
            .map(String::as_str)
            .filter(|cmd| !cmd.starts_with("help "))
            .collect()
    }
}

impl DebuggerHost for TestHost {
    fn name(&self) -> &str {
        "GDB"
    }

    fn execute(&mut self, command: &str) -> Result<String, HostError> {
        self.executed.push(command.to_string());
        match self.outputs.get(command) {
            Some(Ok(out)) => Ok(out.clone()),
            Some(Err(msg)) => Err(HostError::Rejected(msg.clone())),
            None => Ok(String::new()),
        }
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, HostError> {
        self.out.push_str(prompt);
        self.answers
            .pop_front()
            .ok_or_else(|| HostError::Input("end of input".to_string()))
    }

    fn frame_summary(&mut self) -> Result<String, HostError> {
        match self.frame.clone() {
            Some(Ok(summary)) => Ok(summary),
            Some(Err(msg)) => Err(HostError::Rejected(msg)),
            None => Err(HostError::Rejected("No frame selected.".to_string())),
        }
    }

    fn take_stop_event(&mut self) -> bool {
        std::mem::take(&mut self.stopped)
    }
}

pub fn client(transport: &ScriptedTransport) -> LlmClient {
    LlmClient::new(
        Configuration {
            api_key: "sk-test".to_string(),
            model: "gpt-test".to_string(),
            endpoint_url: "http://localhost:8080/v1/chat/completions".to_string(),
        },
        transport.clone(),
    )
}
