//! GDB child process driven through the MI2 interpreter.

use crate::host::mi::{self, Record, ResultClass};
use crate::host::{format_frame_summary, HostError};
use crate::muted_error;
use log::debug;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// Request/response exchange with an MI interpreter.
pub struct MiChannel<R, W> {
    reader: R,
    writer: W,
    stop_event: bool,
}

/// Collected answer of the interpreter for a single command.
struct Reply {
    console: String,
    rest: String,
}

impl<R: BufRead, W: Write> MiChannel<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            stop_event: false,
        }
    }

    /// Skip everything up to the first prompt (startup banner, notifications).
    pub fn wait_prompt(&mut self) -> Result<(), HostError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(HostError::Terminated);
            }
            if parse_is_prompt(&line) {
                return Ok(());
            }
        }
    }

    /// Execute a console (CLI) command, return its console output.
    pub fn console(&mut self, command: &str) -> Result<String, HostError> {
        let request = format!("-interpreter-exec console {}", mi::quote(command));
        self.exchange(&request).map(|reply| reply.console)
    }

    /// Execute an MI command, return the payload of its result record.
    pub fn mi(&mut self, command: &str) -> Result<String, HostError> {
        self.exchange(command).map(|reply| reply.rest)
    }

    /// Return true if the debuggee stopped since the last call.
    pub fn take_stop_event(&mut self) -> bool {
        std::mem::take(&mut self.stop_event)
    }

    fn exchange(&mut self, request: &str) -> Result<Reply, HostError> {
        debug!(target: "dbgchat", "mi request: {request}");
        writeln!(self.writer, "{request}")?;
        self.writer.flush()?;

        let mut reply = Reply {
            console: String::new(),
            rest: String::new(),
        };
        let mut error = None;
        let mut finished = false;
        let mut await_stop = false;

        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(HostError::Terminated);
            }

            match mi::parse_line(&line) {
                Record::Console(text) | Record::Target(text) => reply.console.push_str(&text),
                Record::Log(_) => {}
                Record::Result { class, rest } => match class {
                    ResultClass::Done | ResultClass::Connected => {
                        reply.rest = rest.to_string();
                        finished = true;
                    }
                    ResultClass::Running => {
                        await_stop = true;
                        finished = true;
                    }
                    ResultClass::Error => {
                        let msg = mi::field(rest, "msg").unwrap_or_else(|| rest.to_string());
                        error = Some(HostError::Rejected(msg));
                        finished = true;
                    }
                    ResultClass::Exit => return Err(HostError::Terminated),
                },
                Record::Async { class: "stopped", rest } => {
                    await_stop = false;
                    let exited = mi::field(rest, "reason")
                        .map(|reason| reason.starts_with("exited"))
                        .unwrap_or(false);
                    self.stop_event = !exited;
                }
                Record::Async { .. } => {}
                Record::Prompt => {
                    if finished && !await_stop {
                        break;
                    }
                }
                Record::Other(text) => {
                    reply.console.push_str(text);
                    reply.console.push('\n');
                }
            }
        }

        match error {
            Some(err) => Err(err),
            None => Ok(reply),
        }
    }
}

fn parse_is_prompt(line: &str) -> bool {
    matches!(mi::parse_line(line), Record::Prompt)
}

/// Return `(name, value)` pairs describing a frame from a `-stack-info-frame` result.
fn frame_location(rest: &str) -> Vec<(&'static str, String)> {
    [
        ("Function", "func"),
        ("PC", "addr"),
        ("File", "file"),
        ("Line", "line"),
    ]
    .into_iter()
    .filter_map(|(title, name)| mi::field(rest, name).map(|value| (title, value)))
    .collect()
}

/// Running GDB process.
pub struct GdbSession {
    child: Child,
    channel: MiChannel<BufReader<ChildStdout>, ChildStdin>,
}

impl GdbSession {
    /// Start GDB, optionally with a program loaded.
    ///
    /// # Arguments
    ///
    /// * `gdb`: path to GDB executable, if `None` GDB is searched in `PATH`
    /// * `program`: debuggee
    pub fn start(gdb: Option<&Path>, program: Option<&Path>) -> Result<Self, HostError> {
        let gdb = match gdb {
            Some(path) => path.to_path_buf(),
            None => locate_gdb()?,
        };
        debug!(target: "dbgchat", "start {}", gdb.display());

        let mut cmd = Command::new(gdb);
        cmd.args(["--interpreter=mi2", "--quiet"]);
        if let Some(program) = program {
            cmd.arg(program);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(HostError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "gdb standard streams not captured",
            )));
        };

        let mut channel = MiChannel::new(BufReader::new(stdout), stdin);
        channel.wait_prompt()?;
        Ok(Self { child, channel })
    }

    pub fn execute(&mut self, command: &str) -> Result<String, HostError> {
        self.channel.console(command)
    }

    pub fn frame_summary(&mut self) -> Result<String, HostError> {
        frame_summary(&mut self.channel)
    }

    pub fn take_stop_event(&mut self) -> bool {
        self.channel.take_stop_event()
    }
}

impl Drop for GdbSession {
    fn drop(&mut self) {
        muted_error!(self.channel.mi("-gdb-exit"));
        muted_error!(self.child.wait());
    }
}

fn locate_gdb() -> Result<PathBuf, HostError> {
    which::which("gdb").map_err(|e| {
        HostError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("gdb executable not found: {e}"),
        ))
    })
}

fn frame_summary<R: BufRead, W: Write>(
    channel: &mut MiChannel<R, W>,
) -> Result<String, HostError> {
    let frame = channel.mi("-stack-info-frame")?;
    let location = frame_location(&frame);
    let args = channel.console("info args");
    let locals = channel.console("info locals");
    Ok(format_frame_summary(&location, args, locals))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn channel(output: &str) -> MiChannel<Cursor<Vec<u8>>, Vec<u8>> {
        MiChannel::new(Cursor::new(output.as_bytes().to_vec()), vec![])
    }

    #[test]
    fn test_console_command_output() {
        let mut ch = channel(
            r#"&"help running\n"
~"Running the program.\n"
~"\n"
~"List of commands:\n"
~"\n"
~"advance -- Continue the program up to the given location.\n"
^done
(gdb)
"#,
        );

        let out = ch.console("help running").unwrap();
        assert_eq!(
            out,
            "Running the program.\n\nList of commands:\n\nadvance -- Continue the program up to the given location.\n"
        );
        assert_eq!(
            String::from_utf8(ch.writer.clone()).unwrap(),
            "-interpreter-exec console \"help running\"\n"
        );
        assert!(!ch.take_stop_event());
    }

    #[test]
    fn test_rejected_command() {
        let mut ch = channel(
            r#"&"print nope\n"
&"No symbol \"nope\" in current context.\n"
^error,msg="No symbol \"nope\" in current context."
(gdb)
"#,
        );

        let err = ch.console("print nope").unwrap_err();
        assert!(
            matches!(err, HostError::Rejected(ref msg) if msg == "No symbol \"nope\" in current context.")
        );
    }

    #[test]
    fn test_running_waits_for_stop() {
        let mut ch = channel(
            r#"&"continue\n"
~"Continuing.\n"
^running
*running,thread-id="all"
(gdb)
~"\n"
~"Breakpoint 1, main () at a.c:7\n"
*stopped,reason="breakpoint-hit",disp="keep",bkptno="1",frame={func="main"}
(gdb)
"#,
        );

        let out = ch.console("continue").unwrap();
        assert_eq!(
            out,
            "Continuing.\n\nBreakpoint 1, main () at a.c:7\n"
        );
        assert!(ch.take_stop_event());
        assert!(!ch.take_stop_event());
    }

    #[test]
    fn test_exit_is_not_stop_event() {
        let mut ch = channel(
            r#"^running
(gdb)
hello
*stopped,reason="exited-normally"
(gdb)
"#,
        );
        assert_eq!(ch.console("run").unwrap(), "hello\n");
        assert!(!ch.take_stop_event());
    }

    #[test]
    fn test_terminated() {
        let mut ch = channel("^exit\n");
        assert!(matches!(ch.console("quit"), Err(HostError::Terminated)));

        let mut ch = channel("~\"partial\"\n");
        assert!(matches!(ch.console("bt"), Err(HostError::Terminated)));
    }

    #[test]
    fn test_wait_prompt() {
        let mut ch = channel("=thread-group-added,id=\"i1\"\n~\"banner\\n\"\n(gdb) \n");
        ch.wait_prompt().unwrap();
        assert!(matches!(ch.wait_prompt(), Err(HostError::Terminated)));
    }

    #[test]
    fn test_frame_summary() {
        let mut ch = channel(
            r#"^done,frame={level="0",addr="0x0000555555555139",func="main",file="a.c",fullname="/tmp/a.c",line="7"}
(gdb)
~"argc = 1\n"
^done
(gdb)
~"No locals.\n"
^done
(gdb)
"#,
        );

        let summary = frame_summary(&mut ch).unwrap();
        assert_eq!(
            summary,
            "Stopped at: Function: main, PC: 0x0000555555555139, File: a.c, Line: 7\n\
             Arguments:\nargc = 1\n\
             Locals: none\n"
        );
    }
}
