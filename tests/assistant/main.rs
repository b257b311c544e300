mod common;

mod chat;
mod explore;
mod stop;

use crate::common::{client, TestHost};
use dbgchat::assistant::{Mode, Session, CHAT_HELP};
use dbgchat::llm::ScriptedTransport;

#[test]
fn test_chat_help() {
    let transport = ScriptedTransport::new();
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new();

    session.chat(&mut host, " help ").unwrap();
    assert_eq!(host.out, CHAT_HELP);
    assert!(transport.requests().is_empty());
}

#[test]
fn test_set_mode() {
    struct TestCase {
        arg: &'static str,
        expected_mode: Mode,
        expected_out: &'static str,
    }
    let cases = [
        TestCase {
            arg: "ask",
            expected_mode: Mode::Ask,
            expected_out: "Mode set to: Ask\n",
        },
        TestCase {
            arg: " AGENT ",
            expected_mode: Mode::Agent,
            expected_out: "Mode set to: Agent\n",
        },
        TestCase {
            arg: "Ask",
            expected_mode: Mode::Ask,
            expected_out: "Mode set to: Ask\n",
        },
        TestCase {
            arg: "auto",
            expected_mode: Mode::Ask,
            expected_out: "Usage: chat-set-mode [ask|agent]\n",
        },
        TestCase {
            arg: "",
            expected_mode: Mode::Ask,
            expected_out: "Usage: chat-set-mode [ask|agent]\n",
        },
    ];

    let transport = ScriptedTransport::new();
    let mut session = Session::new(client(&transport));
    assert_eq!(session.mode(), Mode::Agent);

    for tc in cases {
        let mut host = TestHost::new();
        session.set_mode(&mut host, tc.arg);
        assert_eq!(session.mode(), tc.expected_mode, "arg: {:?}", tc.arg);
        assert_eq!(host.out, tc.expected_out, "arg: {:?}", tc.arg);
    }
}

#[test]
fn test_explain_without_previous_command() {
    let transport = ScriptedTransport::new();
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new();

    session.explain(&mut host, "").unwrap();
    assert_eq!(host.out, "No previous command to explain, use `chat` first.\n");
    assert!(transport.requests().is_empty());
}

#[test]
fn test_explain_previous_command() {
    let transport = ScriptedTransport::new()
        .reply("bt")
        .reply("bt prints a backtrace of all stack frames.");
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new();

    session.chat(&mut host, "show the call stack").unwrap();
    session.explain(&mut host, "  ").unwrap();

    let prompt = transport.requests()[1].prompt().unwrap();
    assert_eq!(prompt, "Give me an explanation for this GDB command: bt");
    assert!(host
        .out
        .ends_with("bt prints a backtrace of all stack frames.\n"));
}

#[test]
fn test_explain_question() {
    let transport = ScriptedTransport::new().reply("It steps into functions.");
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new();

    session
        .explain(&mut host, "what does step do?")
        .unwrap();
    assert_eq!(
        transport.requests()[0].prompt().unwrap(),
        "what does step do?"
    );
    assert_eq!(host.out, "It steps into functions.\n");
    assert!(host.executed.is_empty());
}
