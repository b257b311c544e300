use crate::host::{DebuggerHost, HostError};
use strum_macros::{Display, EnumString};

/// Confirmation policy for generated commands.
#[derive(Debug, Clone, Copy, PartialEq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    /// Ask the user before execution.
    #[strum(serialize = "ask")]
    Ask,
    /// Execute immediately.
    #[default]
    #[strum(serialize = "agent")]
    Agent,
}

/// What happened to a gated command.
#[derive(Debug, PartialEq)]
pub enum Gated {
    Executed(String),
    Declined,
}

fn is_confirmation(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase().replace(['"', '\''], "");
    matches!(answer.trim(), "y" | "yes")
}

/// Execute `command` according to the mode. In ask mode only an explicit "y"/"yes"
/// answer leads to execution. A failed confirmation read declines the command.
pub fn run_gated(
    mode: Mode,
    host: &mut dyn DebuggerHost,
    command: &str,
) -> Result<Gated, HostError> {
    if mode == Mode::Ask {
        host.write(&format!("Suggested command: {command}\n"));
        match host.read_line("Execute? (y/n): ") {
            Ok(answer) if is_confirmation(&answer) => {}
            Ok(_) => {
                host.write("Command not executed.\n");
                return Ok(Gated::Declined);
            }
            Err(e) => {
                host.write(&format!("Error during confirmation: {e}\n"));
                host.write("Command not executed due to error.\n");
                return Ok(Gated::Declined);
            }
        }
    }

    host.execute(command).map(Gated::Executed)
}
