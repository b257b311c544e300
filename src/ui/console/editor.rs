use crate::ui::command::parser::{
    CHAT_COMMAND, EXPLAIN_COMMAND, EXPLORE_COMMAND, HELP_COMMAND, HELP_COMMAND_SHORT,
    QUIT_COMMAND, QUIT_COMMAND_SHORT, SET_MODE_AGENT_SUBCOMMAND, SET_MODE_ASK_SUBCOMMAND,
    SET_MODE_COMMAND,
};
use chumsky::prelude::any;
use chumsky::text::whitespace;
use chumsky::{extra, Parser};
use crossterm::style::{Color, Stylize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::history::MemHistory;
use rustyline::{CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::borrow::Cow::{Borrowed, Owned};
use std::collections::HashMap;

struct CommandHint {
    short: Option<String>,
    long: String,
    subcommands: Vec<String>,
}

impl CommandHint {
    fn long(&self) -> String {
        self.long.clone()
    }

    fn display_with_short(&self) -> String {
        if let Some(ref short) = self.short {
            if self.long.starts_with(short) {
                format!(
                    "{}{}",
                    short.clone().bold().underlined(),
                    &self.long[short.len()..]
                )
            } else {
                format!("{}|{}", &self.long, short.clone().bold().underlined())
            }
        } else {
            self.long()
        }
    }
}

impl From<&str> for CommandHint {
    fn from(value: &str) -> Self {
        CommandHint {
            short: None,
            long: value.to_string(),
            subcommands: vec![],
        }
    }
}

impl From<(&str, &str)> for CommandHint {
    fn from((short, long): (&str, &str)) -> Self {
        CommandHint {
            short: Some(short.to_string()),
            long: long.to_string(),
            subcommands: vec![],
        }
    }
}

pub struct CommandCompleter {
    commands: Vec<CommandHint>,
    subcommand_hints: HashMap<String, Vec<String>>,
}

impl CommandCompleter {
    fn new(commands: impl IntoIterator<Item = CommandHint>) -> Self {
        let commands: Vec<CommandHint> = commands.into_iter().collect();
        let subcommand_hints = commands
            .iter()
            .flat_map(|cmd| {
                let mut hints = vec![(cmd.long.clone(), cmd.subcommands.clone())];
                if let Some(ref short) = cmd.short {
                    hints.push((short.clone(), cmd.subcommands.clone()));
                }
                hints
            })
            .collect::<HashMap<String, Vec<String>>>();

        Self {
            commands,
            subcommand_hints,
        }
    }

    /// Split a line into a command and an unfinished subcommand.
    /// Return `None` if the command itself is not finished yet.
    fn recognize(line: &str) -> Option<(&str, Option<&str>)> {
        let word = || {
            any::<_, extra::Default>()
                .filter(|c: &char| !c.is_whitespace())
                .repeated()
                .at_least(1)
                .to_slice()
        };

        whitespace()
            .ignore_then(word())
            .then_ignore(whitespace().at_least(1))
            .then(word().or_not())
            .parse(line)
            .into_result()
            .ok()
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        if let Some((cmd, mb_subcmd_part)) = Self::recognize(line) {
            let Some(subcommands) = self.subcommand_hints.get(cmd) else {
                return Ok((0, vec![]));
            };

            let subcmd_part = mb_subcmd_part.unwrap_or_default();
            let pos = line.len() - subcmd_part.len();
            let subcommands = subcommands
                .iter()
                .filter(|&subcmd| subcmd.starts_with(subcmd_part))
                .map(|subcmd| Pair {
                    display: subcmd.to_string(),
                    replacement: subcmd.to_string(),
                })
                .collect();
            return Ok((pos, subcommands));
        }

        let pairs = self
            .commands
            .iter()
            .filter(|&cmd| cmd.long.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.display_with_short(),
                replacement: cmd.long(),
            })
            .collect();
        Ok((0, pairs))
    }
}

#[derive(Helper, Hinter, Validator)]
pub struct RLHelper {
    completer: CommandCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    colored_prompt: String,
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Highlighter for RLHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(format!("{}", hint.with(Color::Grey)))
    }
}

fn console_commands() -> Vec<CommandHint> {
    let help_topics = [
        CHAT_COMMAND,
        EXPLAIN_COMMAND,
        SET_MODE_COMMAND,
        EXPLORE_COMMAND,
        QUIT_COMMAND,
    ];

    vec![
        CommandHint {
            short: None,
            long: CHAT_COMMAND.to_string(),
            subcommands: vec![HELP_COMMAND.to_string()],
        },
        EXPLAIN_COMMAND.into(),
        CommandHint {
            short: None,
            long: SET_MODE_COMMAND.to_string(),
            subcommands: vec![
                SET_MODE_ASK_SUBCOMMAND.to_string(),
                SET_MODE_AGENT_SUBCOMMAND.to_string(),
            ],
        },
        EXPLORE_COMMAND.into(),
        CommandHint {
            short: Some(HELP_COMMAND_SHORT.to_string()),
            long: HELP_COMMAND.to_string(),
            subcommands: help_topics.iter().map(ToString::to_string).collect(),
        },
        (QUIT_COMMAND_SHORT, QUIT_COMMAND).into(),
    ]
}

pub fn create_editor(promt: &str) -> anyhow::Result<Editor<RLHelper, MemHistory>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let h = RLHelper {
        completer: CommandCompleter::new(console_commands()),
        hinter: HistoryHinter {},
        colored_prompt: format!("{}", promt.with(Color::DarkGreen)),
    };

    let mut editor = Editor::with_history(config, MemHistory::new())?;
    editor.set_helper(Some(h));
    Ok(editor)
}
