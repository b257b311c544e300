//! Narrow interface to the debugger the assistant works on top of.

pub mod gdb;
mod mi;

pub use gdb::GdbSession;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Debugger refused a command (invalid syntax, unknown symbol, etc.).
    #[error("{0}")]
    Rejected(String),
    #[error("input error: {0}")]
    Input(String),
    #[error("debugger process terminated")]
    Terminated,
    #[error("debugger i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    /// Return true if the debugger can't serve any further command.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HostError::Terminated | HostError::Io(_))
    }
}

/// Debugger capabilities used by the assistant.
pub trait DebuggerHost {
    /// Debugger name used inside prompts ("GDB").
    fn name(&self) -> &str;

    /// Execute a console command and return everything it printed.
    fn execute(&mut self, command: &str) -> Result<String, HostError>;

    /// Print text into the debugger output channel as is.
    fn write(&mut self, text: &str);

    /// Ask the user for a line of input, return it trimmed.
    fn read_line(&mut self, prompt: &str) -> Result<String, HostError>;

    /// Describe the selected frame: location, arguments and locals.
    fn frame_summary(&mut self) -> Result<String, HostError>;

    /// Return true (once) if the debuggee stopped since the last call.
    fn take_stop_event(&mut self) -> bool {
        false
    }
}

/// Format the frame summary text shared by host implementations.
///
/// # Arguments
///
/// * `location`: `(name, value)` pairs describing the current position (function, pc, file, line)
/// * `args`: output of `info args` command or an error
/// * `locals`: output of `info locals` command or an error
pub fn format_frame_summary(
    location: &[(&str, String)],
    args: Result<String, HostError>,
    locals: Result<String, HostError>,
) -> String {
    let location = if location.is_empty() {
        "Source/line info not available.".to_string()
    } else {
        location
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let section = |title: &str, empty_marker: &str, res: Result<String, HostError>| match res {
        Ok(out) if !out.trim().is_empty() && !out.contains(empty_marker) => {
            format!("{title}:\n{}\n", out.trim())
        }
        Ok(_) => format!("{title}: none\n"),
        Err(e) => format!("Error fetching {}: {e}\n", title.to_lowercase()),
    };

    format!(
        "Stopped at: {location}\n{}{}",
        section("Arguments", "No arguments.", args),
        section("Locals", "No locals.", locals)
    )
}
