use crate::common::{client, TestHost, BREAKPOINTS_HELP, BREAK_HELP};
use dbgchat::assistant::prompt::PromptSource;
use dbgchat::assistant::{Mode, Session, StageError, Strategy};
use dbgchat::error::Error;
use dbgchat::host::HostError;
use dbgchat::llm::{ScriptedTransport, TransportError};

#[test]
fn test_direct_chat() {
    let transport = ScriptedTransport::new().reply("break 7");
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new().with_output("break 7", "Breakpoint 1 at 0x1149: file main.c, line 7.\n");

    session.chat(&mut host, "stop my code at line 7").unwrap();

    assert_eq!(host.executed, vec!["break 7"]);
    assert_eq!(session.previous_command(), "break 7");
    assert_eq!(
        host.out,
        "break 7\nBreakpoint 1 at 0x1149: file main.c, line 7.\n"
    );

    let prompt = transport.requests()[0].prompt().unwrap();
    assert!(prompt.contains("provide a single, precise GDB command"));
    assert!(prompt.ends_with("User query: stop my code at line 7"));
}

#[test]
fn test_direct_chat_transport_error() {
    let transport = ScriptedTransport::new().fail(TransportError::Timeout);
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new();

    session.chat(&mut host, "where am i").unwrap();

    assert!(host.executed.is_empty());
    assert_eq!(session.previous_command(), "");
    assert!(host.out.contains("LLM API Error: LLM Request timed out"));
}

#[test]
fn test_direct_chat_empty_command() {
    let transport = ScriptedTransport::new().reply("  ");
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new();

    session.chat(&mut host, "do nothing").unwrap();

    assert!(host.executed.is_empty());
    assert!(host
        .out
        .ends_with("Received an empty command. Nothing to execute.\n"));
}

#[test]
fn test_rejected_command() {
    let transport = ScriptedTransport::new().reply("print y");
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new().with_error("print y", "No symbol \"y\" in current context.");

    let err = session.chat(&mut host, "show y").unwrap_err();
    assert!(matches!(err, Error::Host(HostError::Rejected(_))));
    assert!(!err.is_fatal());
    assert_eq!(session.previous_command(), "print y");
}

#[test]
fn test_ask_mode() {
    let transport = ScriptedTransport::new().reply("bt").reply("bt");
    let mut session = Session::new(client(&transport)).with_mode(Mode::Ask);
    let mut host = TestHost::new().with_answer("n").with_answer("Y");

    session.chat(&mut host, "show the stack").unwrap();
    assert!(host.executed.is_empty());
    assert!(host
        .out
        .ends_with("Suggested command: bt\nExecute? (y/n): Command not executed.\n"));

    host.out.clear();
    session.chat(&mut host, "show the stack").unwrap();
    assert_eq!(host.executed, vec!["bt"]);
    assert!(!host.out.contains("Command not executed"));
}

#[test]
fn test_ask_mode_without_input() {
    let transport = ScriptedTransport::new().reply("kill");
    let mut session = Session::new(client(&transport)).with_mode(Mode::Ask);
    let mut host = TestHost::new();

    session.chat(&mut host, "stop the program").unwrap();
    assert!(host.executed.is_empty());
    assert!(host.out.ends_with("Command not executed due to error.\n"));
}

fn staged_session(transport: &ScriptedTransport) -> Session {
    Session::new(client(transport)).with_strategy(Strategy::Staged)
}

#[test]
fn test_staged_chat() {
    let transport = ScriptedTransport::new()
        .reply("User wants to stop at a line.\nbreakpoints")
        .reply("Breakpoints are set with break.\nbreak")
        .reply("break 7");
    let mut session = staged_session(&transport);
    let mut host = TestHost::new()
        .with_output("help breakpoints", BREAKPOINTS_HELP)
        .with_output("help break", BREAK_HELP)
        .with_output("break 7", "Breakpoint 1 at 0x1149: file main.c, line 7.\n");

    session.chat(&mut host, "stop my code at line 7").unwrap();

    assert_eq!(
        host.executed,
        vec!["help breakpoints", "help break", "break 7"]
    );
    assert_eq!(session.previous_command(), "break 7");
    assert_eq!(transport.pending(), 0);

    let requests = transport.requests();
    let select = requests[1].prompt().unwrap();
    assert!(select.contains("tbreak -- Set a temporary breakpoint."));
    assert!(!select.contains("set breakpoint pending"));
    assert!(select.ends_with("User Query: stop my code at line 7"));
    let synthesize = requests[2].prompt().unwrap();
    assert!(synthesize.contains("break [PROBE_MODIFIER] [LOCATION]"));

    for marker in [
        "--- Stage 1: Classifying user intent ---",
        "Stage 1 Result: command class 'breakpoints'",
        "Executing GDB command: help breakpoints",
        "Stage 3 Result: selected command 'break'",
        "Stage 5 Result: final command:\nbreak 7\n",
    ] {
        assert!(host.out.contains(marker), "{marker}");
    }
}

#[test]
fn test_staged_chat_no_valid_command() {
    let transport = ScriptedTransport::new()
        .reply("User wants to stop at a line.\nbreakpoints")
        .reply("break")
        .reply("# No valid command");
    let mut session = staged_session(&transport);
    let mut host = TestHost::new()
        .with_output("help breakpoints", BREAKPOINTS_HELP)
        .with_output("help break", BREAK_HELP);

    session.chat(&mut host, "make it faster").unwrap();

    assert!(host.executed_commands().is_empty());
    assert_eq!(session.previous_command(), "");
}

#[test]
fn test_staged_chat_unsupported_class() {
    let transport = ScriptedTransport::new().reply("Summary.\nmagic");
    let mut session = staged_session(&transport);
    let mut host = TestHost::new();

    let err = session.chat(&mut host, "do magic").unwrap_err();
    assert!(matches!(
        err,
        Error::Stage(StageError::UnsupportedClass { ref class }) if class == "magic"
    ));
    assert!(host.executed.is_empty());
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_staged_chat_llm_failure() {
    let transport = ScriptedTransport::new()
        .reply("Summary.\nbreakpoints")
        .fail(TransportError::Http {
            status: 500,
            reason: "Internal Server Error".to_string(),
        });
    let mut session = staged_session(&transport);
    let mut host = TestHost::new().with_output("help breakpoints", BREAKPOINTS_HELP);

    session.chat(&mut host, "stop at main").unwrap();
    assert_eq!(host.executed, vec!["help breakpoints"]);
    assert!(host.out.contains("LLM API Error: HTTP Error: 500"));
}

#[test]
fn test_staged_chat_broken_prompts() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let mut session =
        staged_session(&transport).with_prompts(PromptSource::from_dir(dir.path()));
    let mut host = TestHost::new();

    let err = session.chat(&mut host, "stop at main").unwrap_err();
    assert!(matches!(err, Error::Stage(StageError::Prompts(_))));
    assert!(host
        .out
        .contains("Could not load system prompts, multi-stage processing aborted."));
    assert!(transport.requests().is_empty());
}
