use crate::common::{client, TestHost};
use dbgchat::assistant::explore::{Outcome, Step};
use dbgchat::assistant::{Mode, Session};
use dbgchat::llm::ScriptedTransport;

#[test]
fn test_explore_max_iterations() {
    let transport = ScriptedTransport::new()
        .reply("\"bt\"")
        .reply("frame 1")
        .reply("info locals");
    let mut session = Session::new(client(&transport)).with_explore_iterations(2);
    let mut host = TestHost::new()
        .with_output("bt", "#0  main () at main.c:7\n")
        .with_output("frame 1", "");

    let report = session.explore(&mut host, "why does it crash").unwrap();

    assert_eq!(report.outcome, Outcome::MaxIterations);
    assert_eq!(
        report.steps,
        vec![
            Step {
                command: "bt".to_string(),
                output: "#0  main () at main.c:7".to_string(),
            },
            Step {
                command: "frame 1".to_string(),
                output: "<no output>".to_string(),
            },
        ]
    );
    assert_eq!(host.executed, vec!["bt", "frame 1"]);
    assert_eq!(transport.pending(), 0);
    assert!(host.out.starts_with("Starting exploration for: why does it crash\n"));
    assert!(host.out.ends_with("--- Exploration Finished ---\n"));
}

#[test]
fn test_explore_ignores_ask_mode() {
    let transport = ScriptedTransport::new()
        .reply("info locals")
        .reply("HYPOTHESIS: counter overflows");
    let mut session = Session::new(client(&transport)).with_mode(Mode::Ask);
    let mut host = TestHost::new().with_output("info locals", "counter = -2147483648\n");

    let report = session.explore(&mut host, "counter is negative").unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Hypothesis("counter overflows".to_string())
    );
    assert_eq!(host.executed, vec!["info locals"]);
    assert!(!host.out.contains("Execute? (y/n)"));

    let history = transport.requests()[1].prompt().unwrap();
    assert!(history.contains("Cmd: info locals\nOut: counter = -2147483648"));
}

#[test]
fn test_explore_stops_on_debugger_error() {
    let transport = ScriptedTransport::new().reply("print y").reply("print x");
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new().with_error("print y", "No symbol \"y\" in current context.");

    let report = session.explore(&mut host, "y").unwrap();

    assert_eq!(report.outcome, Outcome::HostError);
    assert_eq!(transport.requests().len(), 1);
    assert!(host
        .out
        .contains("Error encountered during command execution. Ending exploration.\n"));
}

#[test]
fn test_explore_without_query() {
    let transport = ScriptedTransport::new();
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new();

    assert!(session.explore(&mut host, "   ").is_none());
    assert_eq!(
        host.out,
        "Usage: chat-explore <your query or initial variable/command to explore>\n"
    );
    assert!(transport.requests().is_empty());
}

#[test]
fn test_explore_keeps_previous_command() {
    let transport = ScriptedTransport::new()
        .reply("bt")
        .reply("up")
        .reply("DONE: nothing suspicious");
    let mut session = Session::new(client(&transport));
    let mut host = TestHost::new();

    session.chat(&mut host, "show the stack").unwrap();
    let report = session.explore(&mut host, "look around").unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Done("nothing suspicious".to_string())
    );
    assert_eq!(session.previous_command(), "bt");
}
