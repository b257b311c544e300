use crate::common::{client, TestHost};
use dbgchat::assistant::Session;
use dbgchat::llm::{ScriptedTransport, TransportError};

const FRAME: &str = "Stopped at: Function: main, PC: 0x401136, File: main.c, Line: 7
Arguments: none
Locals:
x = 0
";

#[test]
fn test_stop_hints() {
    let transport = ScriptedTransport::new().reply("Consider `next`. Examine `x`.");
    let mut session = Session::new(client(&transport)).with_stop_hints(true);
    let mut host = TestHost {
        frame: Some(Ok(FRAME.to_string())),
        stopped: true,
        ..TestHost::new()
    };

    session.on_stop(&mut host);
    assert_eq!(
        host.out,
        format!(
            "\n--- Contextual Assistance ---\n{FRAME}Suggestion: Consider `next`. Examine `x`.\n\
             --- End Contextual Assistance ---\n"
        )
    );
    let prompt = transport.requests()[0].prompt().unwrap();
    assert!(prompt.starts_with("The debugger has stopped. Here's the current context:\n"));
    assert!(prompt.contains("Locals:\nx = 0"));

    // stop event is consumed
    host.out.clear();
    session.on_stop(&mut host);
    assert!(host.out.is_empty());
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_stop_hints_disabled() {
    let transport = ScriptedTransport::new();
    let mut session = Session::new(client(&transport));
    let mut host = TestHost {
        frame: Some(Ok(FRAME.to_string())),
        stopped: true,
        ..TestHost::new()
    };

    session.on_stop(&mut host);
    assert!(host.out.is_empty());
    assert!(!host.stopped);
    assert!(transport.requests().is_empty());
}

#[test]
fn test_stop_hints_errors_are_reported() {
    struct TestCase {
        frame: Result<&'static str, &'static str>,
        transport: ScriptedTransport,
        expected: &'static str,
    }
    let cases = vec![
        TestCase {
            frame: Err("No stack."),
            transport: ScriptedTransport::new(),
            expected: "Error in contextual assistance: No stack.\n",
        },
        TestCase {
            frame: Ok(FRAME),
            transport: ScriptedTransport::new().fail(TransportError::Timeout),
            expected: "Error in contextual assistance: LLM Request timed out\n",
        },
    ];

    for tc in cases {
        let mut session = Session::new(client(&tc.transport)).with_stop_hints(true);
        let mut host = TestHost {
            frame: Some(tc.frame.map(ToString::to_string).map_err(ToString::to_string)),
            stopped: true,
            ..TestHost::new()
        };

        session.on_stop(&mut host);
        assert!(host.out.contains(tc.expected), "{}", host.out);
        assert!(host.out.ends_with("--- End Contextual Assistance ---\n"));
    }
}
