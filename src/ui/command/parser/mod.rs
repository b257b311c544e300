use super::{Command, CommandError, CommandResult};
use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, Boxed, Parser};
use itertools::Itertools;

pub const CHAT_COMMAND: &str = "chat";
pub const EXPLAIN_COMMAND: &str = "explain";
pub const SET_MODE_COMMAND: &str = "chat-set-mode";
pub const SET_MODE_ASK_SUBCOMMAND: &str = "ask";
pub const SET_MODE_AGENT_SUBCOMMAND: &str = "agent";
pub const EXPLORE_COMMAND: &str = "chat-explore";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";
pub const QUIT_COMMAND: &str = "quit";
pub const QUIT_COMMAND_SHORT: &str = "q";

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Match a command keyword followed by a whitespace or end of input.
fn keyword<'a>(sym: &'static str) -> impl Parser<'a, &'a str, (), Err<'a>> + Clone {
    text::whitespace()
        .ignore_then(just(sym))
        .then_ignore(text::whitespace().at_least(1).or(end()))
        .ignored()
}

/// Rest of the line without surrounding whitespaces.
fn rest<'a>() -> impl Parser<'a, &'a str, String, Err<'a>> + Clone {
    any()
        .repeated()
        .to_slice()
        .map(|s: &str| s.trim().to_string())
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

/// Return true if there is a console help text for the topic,
/// otherwise help request belongs to the debugger.
fn console_help_topic(topic: &str) -> bool {
    [
        CHAT_COMMAND,
        EXPLAIN_COMMAND,
        SET_MODE_COMMAND,
        EXPLORE_COMMAND,
        HELP_COMMAND,
        HELP_COMMAND_SHORT,
        QUIT_COMMAND,
        QUIT_COMMAND_SHORT,
    ]
    .contains(&topic)
}

impl Command {
    /// Parse input string into command.
    pub fn parse(input: &str) -> CommandResult<Command> {
        Self::parser()
            .parse(input)
            .into_result()
            .map_err(|errors| CommandError::Parsing(errors.iter().join("; ")))
    }

    fn parser<'a>() -> impl Parser<'a, &'a str, Command, Err<'a>> {
        let keyword2 = |full, short| keyword(full).or(keyword(short));

        let chat = keyword(CHAT_COMMAND)
            .ignore_then(rest())
            .map(|query| {
                if query.is_empty() {
                    Command::Help {
                        command: Some(CHAT_COMMAND.to_string()),
                        reason: Some("query is required".to_string()),
                    }
                } else {
                    Command::Chat(query)
                }
            })
            .boxed();

        let explain = keyword(EXPLAIN_COMMAND)
            .ignore_then(rest())
            .map(Command::Explain)
            .boxed();

        let set_mode = keyword(SET_MODE_COMMAND)
            .ignore_then(rest())
            .map(Command::SetMode)
            .boxed();

        let explore = keyword(EXPLORE_COMMAND)
            .ignore_then(rest())
            .map(Command::Explore)
            .boxed();

        let help = keyword2(HELP_COMMAND, HELP_COMMAND_SHORT)
            .ignore_then(rest())
            .map(|topic| {
                if topic.is_empty() {
                    Command::Help {
                        command: None,
                        reason: None,
                    }
                } else if console_help_topic(&topic) {
                    Command::Help {
                        command: Some(topic),
                        reason: None,
                    }
                } else {
                    Command::Passthrough(format!("{HELP_COMMAND} {topic}"))
                }
            })
            .boxed();

        let quit = keyword2(QUIT_COMMAND, QUIT_COMMAND_SHORT)
            .then_ignore(text::whitespace())
            .to(Command::Quit)
            .boxed();

        let passthrough = any()
            .repeated()
            .to_slice()
            .map(|line: &str| {
                let line = line.trim();
                if line.is_empty() {
                    Command::SkipInput
                } else {
                    Command::Passthrough(line.to_string())
                }
            })
            .boxed();

        choice((
            command(CHAT_COMMAND, chat),
            command(EXPLAIN_COMMAND, explain),
            command(SET_MODE_COMMAND, set_mode),
            command(EXPLORE_COMMAND, explore),
            command(HELP_COMMAND, help),
            command(QUIT_COMMAND, quit),
            command("debugger command", passthrough),
        ))
    }
}

#[test]
fn test_keyword_parser() {
    struct TestCase {
        string: &'static str,
        result: Result<(), ()>,
    }
    let cases = vec![
        TestCase {
            string: "chat",
            result: Ok(()),
        },
        TestCase {
            string: "  chat ",
            result: Ok(()),
        },
        TestCase {
            string: "chatter",
            result: Err(()),
        },
        TestCase {
            string: "chat-explore",
            result: Err(()),
        },
    ];

    for tc in cases {
        let expr = keyword(CHAT_COMMAND)
            .then_ignore(end())
            .parse(tc.string)
            .into_result();
        assert_eq!(expr.map_err(|_| ()), tc.result, "input: {:?}", tc.string);
    }
}

#[test]
fn test_parser() {
    struct TestCase {
        inputs: Vec<&'static str>,
        command_matcher: fn(result: Result<Command, CommandError>),
    }
    let cases = vec![
        TestCase {
            inputs: vec!["chat stop at line 7", "  chat   stop at line 7  "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Chat("stop at line 7".to_string())
                );
            },
        },
        TestCase {
            inputs: vec!["chat", "chat   "],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Help {
                        command: Some(cmd),
                        reason: Some(_),
                    } if cmd == CHAT_COMMAND
                ));
            },
        },
        TestCase {
            inputs: vec!["chat help"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Chat("help".to_string()));
            },
        },
        TestCase {
            inputs: vec!["explain"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Explain(String::new()));
            },
        },
        TestCase {
            inputs: vec!["explain what does x/4x mean"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Explain("what does x/4x mean".to_string())
                );
            },
        },
        TestCase {
            inputs: vec!["chat-set-mode ask", "chat-set-mode   ask"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::SetMode("ask".to_string()));
            },
        },
        TestCase {
            inputs: vec!["chat-set-mode"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::SetMode(String::new()));
            },
        },
        TestCase {
            inputs: vec!["chat-explore why is x zero"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Explore("why is x zero".to_string())
                );
            },
        },
        TestCase {
            inputs: vec!["help", "h", " help "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Help {
                        command: None,
                        reason: None
                    }
                );
            },
        },
        TestCase {
            inputs: vec!["help chat-explore", "h chat-explore"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Help {
                        command: Some(EXPLORE_COMMAND.to_string()),
                        reason: None
                    }
                );
            },
        },
        TestCase {
            inputs: vec!["help breakpoints"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Passthrough("help breakpoints".to_string())
                );
            },
        },
        TestCase {
            inputs: vec!["q", "quit", "quit  "],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Quit);
            },
        },
        TestCase {
            inputs: vec!["break main", " break main "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Passthrough("break main".to_string())
                );
            },
        },
        TestCase {
            inputs: vec!["chatter 1", "quit 1", "hbreak main.c:7", "explainer"],
            command_matcher: |result| {
                assert!(matches!(result.unwrap(), Command::Passthrough(_)));
            },
        },
        TestCase {
            inputs: vec!["", "   ", "\t"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::SkipInput);
            },
        },
    ];

    for case in cases {
        for input in case.inputs {
            let result = Command::parse(input);
            (case.command_matcher)(result);
        }
    }
}
