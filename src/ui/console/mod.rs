//! Interactive terminal on top of the debugger.

use crate::assistant::Session;
use crate::error::Error;
use crate::host::{DebuggerHost, GdbSession, HostError};
use crate::ui::command::Command;
use crate::ui::console::editor::{create_editor, RLHelper};
use crate::ui::console::help::help_for_command;
use crate::ui::console::print::style::{ErrorView, KeywordView};
use crate::weak_error;
use rustyline::error::ReadlineError;
use rustyline::history::MemHistory;
use rustyline::Editor;
use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Once;

mod editor;
pub mod help;
pub mod print;

const WELCOME_TEXT: &str = r#"
dbgchat greets
"#;
const PROMT: &str = "(dbgchat) ";

type DbgEditor = Editor<RLHelper, MemHistory>;

/// Debugger host used by the terminal: commands go to GDB, text goes to stdout,
/// user input goes through the same line editor as the console commands.
pub struct ConsoleHost {
    gdb: GdbSession,
    editor: DbgEditor,
}

impl DebuggerHost for ConsoleHost {
    fn name(&self) -> &str {
        "GDB"
    }

    fn execute(&mut self, command: &str) -> Result<String, HostError> {
        self.gdb.execute(command)
    }

    fn write(&mut self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        weak_error!(stdout.write_all(text.as_bytes()), "write to stdout:");
        weak_error!(stdout.flush(), "flush stdout:");
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, HostError> {
        self.editor
            .readline(prompt)
            .map(|line| line.trim().to_string())
            .map_err(|e| HostError::Input(e.to_string()))
    }

    fn frame_summary(&mut self) -> Result<String, HostError> {
        self.gdb.frame_summary()
    }

    fn take_stop_event(&mut self) -> bool {
        self.gdb.take_stop_event()
    }
}

pub struct AppBuilder {
    session: Session,
}

impl AppBuilder {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn build(self, gdb: GdbSession) -> anyhow::Result<TerminalApplication> {
        let editor = create_editor(PROMT)?;
        Ok(TerminalApplication {
            session: self.session,
            host: ConsoleHost { gdb, editor },
        })
    }
}

pub struct TerminalApplication {
    session: Session,
    host: ConsoleHost,
}

pub static LOGGER_ONCE: Once = Once::new();

impl TerminalApplication {
    pub fn run(mut self) -> anyhow::Result<()> {
        LOGGER_ONCE.call_once(|| {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
                .init();
        });

        println!("{WELCOME_TEXT}");
        println!(
            "assistant mode: {}, type {} for list of commands",
            KeywordView::from(self.session.mode()),
            KeywordView::from("help")
        );

        loop {
            let input = match self.host.editor.readline(PROMT) {
                Ok(input) => input,
                // drop the current line only
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("error: {:#}", err);
                    break;
                }
            };
            _ = self.host.editor.add_history_entry(&input);

            match self.handle_command(&input) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break,
                Err(e) if e.is_fatal() => {
                    println!("{}", ErrorView::from("shutdown debugger"));
                    println!("{}", ErrorView::from(format!("fatal {e:#}")));
                    break;
                }
                Err(e) => println!("{}", ErrorView::from(e)),
            }

            self.session.on_stop(&mut self.host);
        }

        Ok(())
    }

    fn handle_command(&mut self, input: &str) -> Result<ControlFlow<()>, Error> {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", ErrorView::from(e));
                return Ok(ControlFlow::Continue(()));
            }
        };

        match command {
            Command::Chat(query) => self.session.chat(&mut self.host, &query)?,
            Command::Explain(question) => self.session.explain(&mut self.host, &question)?,
            Command::SetMode(mode) => self.session.set_mode(&mut self.host, &mode),
            Command::Explore(query) => {
                self.session.explore(&mut self.host, &query);
            }
            Command::Help { command, reason } => {
                if let Some(reason) = reason {
                    println!("{}", ErrorView::from(reason));
                }
                println!("{}", help_for_command(command.as_deref()));
            }
            Command::Quit => return Ok(ControlFlow::Break(())),
            Command::Passthrough(command) => {
                let output = self.host.execute(&command)?;
                self.host.write(&output);
            }
            Command::SkipInput => {}
        }

        Ok(ControlFlow::Continue(()))
    }
}
