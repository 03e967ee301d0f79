//! Integration tests for the execution bridge's request/response contract

#[path = "../test_utils/mock_repl.rs"]
mod mock_repl;

use mock_repl::{scripted_session, session_factory, Reply};
use std::time::Duration;
use wasmrepl::{BridgeState, ExecutionBridge, ExecutionResult, Session};

const STARTUP: Duration = Duration::from_secs(5);
const COMMAND: Option<Duration> = Some(Duration::from_secs(5));

async fn bridge_over(sessions: Vec<Session>) -> ExecutionBridge {
    ExecutionBridge::with_session_factory(session_factory(sessions), STARTUP, COMMAND)
        .await
        .expect("bridge construction")
}

#[tokio::test]
async fn test_execute_ok() {
    let (session, mock) = scripted_session("> ", vec![Reply::Send("module $empty :\n> ")]);
    let mut bridge = bridge_over(vec![session]).await;

    assert_eq!(bridge.state(), BridgeState::Idle);
    let result = bridge.execute("(module $empty)").await;
    assert_eq!(result, ExecutionResult::Ok("module $empty :".to_string()));
    assert_eq!(mock.received(), vec!["(module $empty)"]);
    assert_eq!(bridge.state(), BridgeState::Idle);
}

#[tokio::test]
async fn test_execute_trailing_newline_normalized() {
    // trailing whitespace is trimmed before the driver sees the cell, so
    // no extra blank line is submitted
    let (session, mock) = scripted_session("> ", vec![Reply::Send("module $empty :\n> ")]);
    let mut bridge = bridge_over(vec![session]).await;

    let result = bridge.execute("(module $empty)\n").await;
    assert_eq!(result, ExecutionResult::Ok("module $empty :".to_string()));
    assert_eq!(mock.received(), vec!["(module $empty)"]);
}

#[tokio::test]
async fn test_execute_structured_error() {
    let (session, _mock) = scripted_session(
        "> ",
        vec![Reply::Send("stdin:1.1-1.2: syntax error: unexpected token\n> ")],
    );
    let mut bridge = bridge_over(vec![session]).await;

    match bridge.execute("1 + 1").await {
        ExecutionResult::Error(err) => {
            assert_eq!(err.location.as_deref(), Some("stdin:1.1-1.2"));
            assert_eq!(err.kind, "syntax error");
            assert_eq!(err.detail, "unexpected token");
            assert_eq!(err.raw, "stdin:1.1-1.2: syntax error: unexpected token");
        }
        other => panic!("expected an error result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_execute_error_embedded_in_output() {
    // the structured error line can sit anywhere in the response; the raw
    // text is preserved alongside the parsed fields
    let raw = "module $m :\n  export func \"f\" : [] -> [i32]\n\
               Result: 4 : i32\nExpect: 3 : i32\n\
               stdin:2.1-2.65: assertion failure: wrong return values";
    let (session, _mock) = scripted_session(
        "> ",
        vec![
            Reply::Send("module $m :\n  export func \"f\" : [] -> [i32]\n> "),
            Reply::Send(
                "Result: 4 : i32\nExpect: 3 : i32\nstdin:2.1-2.65: assertion failure: wrong return values\n> ",
            ),
        ],
    );
    let mut bridge = bridge_over(vec![session]).await;

    match bridge
        .execute(
            "(module $m (func $f (export \"f\") (result i32) (i32.const 4)))\n(assert_return (invoke $m \"f\") (i32.const 3))\n",
        )
        .await
    {
        ExecutionResult::Error(err) => {
            assert_eq!(err.location.as_deref(), Some("stdin:2.1-2.65"));
            assert_eq!(err.kind, "assertion failure");
            assert_eq!(err.detail, "wrong return values");
            assert_eq!(err.raw, raw);
        }
        other => panic!("expected an error result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_cell_is_a_no_op() {
    let (session, mock) = scripted_session("> ", vec![]);
    let mut bridge = bridge_over(vec![session]).await;

    assert_eq!(bridge.execute("").await, ExecutionResult::Ok(String::new()));
    assert_eq!(
        bridge.execute("\n").await,
        ExecutionResult::Ok(String::new())
    );
    assert_eq!(
        bridge.execute("   \n").await,
        ExecutionResult::Ok(String::new())
    );
    // no-op cells never reach the interpreter
    assert!(mock.received().is_empty());
}

#[tokio::test]
async fn test_sequential_requests_share_the_session() {
    let (session, mock) = scripted_session(
        "> ",
        vec![
            Reply::Send("module $a :\n> "),
            Reply::Send("module $b :\n> "),
        ],
    );
    let mut bridge = bridge_over(vec![session]).await;

    assert_eq!(
        bridge.execute("(module $a)").await,
        ExecutionResult::Ok("module $a :".to_string())
    );
    assert_eq!(
        bridge.execute("(module $b)").await,
        ExecutionResult::Ok("module $b :".to_string())
    );
    assert_eq!(mock.received(), vec!["(module $a)", "(module $b)"]);
}
