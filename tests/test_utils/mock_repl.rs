//! Scripted mock of the Wasm reference interpreter REPL
//!
//! Backs a detached [`Session`] with a task that answers received input
//! lines from a fixed script, so driver and bridge behaviour can be tested
//! without a real interpreter.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::unbounded_channel;
use wasmrepl::repl::ReplStreams;
use wasmrepl::{Error, Session, SessionFactory};

/// What the mock does after receiving one full input line
#[derive(Debug, Clone)]
pub enum Reply {
    /// Write this text to the output stream
    Send(&'static str),
    /// Write this text, then close the output stream (process death)
    SendAndClose(&'static str),
    /// Write nothing; the driver is left waiting
    Silence,
}

/// Handle onto a scripted REPL's observed input
pub struct MockRepl {
    received: Arc<Mutex<Vec<String>>>,
}

impl MockRepl {
    /// Input lines the mock has received so far (line terminators stripped)
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

/// Spawn a scripted REPL behind a detached [`Session`].
///
/// `greeting` is written immediately (banner plus first prompt). Each
/// entry in `replies` answers one received input line, in order; once the
/// script runs out the mock stays silent.
pub fn scripted_session(greeting: &'static str, replies: Vec<Reply>) -> (Session, MockRepl) {
    let (out_tx, out_rx) = unbounded_channel::<Vec<u8>>();
    let (in_tx, mut in_rx) = unbounded_channel::<Vec<u8>>();
    let received = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::clone(&received);

    out_tx.send(greeting.as_bytes().to_vec()).ok();

    tokio::spawn(async move {
        let mut pending = String::new();
        let mut replies = replies.into_iter();
        while let Some(bytes) = in_rx.recv().await {
            pending.push_str(&String::from_utf8_lossy(&bytes));
            while let Some(newline) = pending.find('\n') {
                let line = pending[..newline].to_string();
                pending.drain(..=newline);
                observed.lock().unwrap().push(line);
                match replies.next() {
                    Some(Reply::Send(text)) => {
                        if out_tx.send(text.as_bytes().to_vec()).is_err() {
                            return;
                        }
                    }
                    Some(Reply::SendAndClose(text)) => {
                        out_tx.send(text.as_bytes().to_vec()).ok();
                        return;
                    }
                    Some(Reply::Silence) | None => {}
                }
            }
        }
    });

    (
        Session::detached(ReplStreams::from_channels(out_rx, in_tx)),
        MockRepl { received },
    )
}

/// A [`SessionFactory`] that hands out pre-built sessions in order and
/// fails once they run out.
pub fn session_factory(sessions: Vec<Session>) -> SessionFactory {
    let mut sessions = sessions.into_iter();
    Box::new(move || {
        sessions
            .next()
            .ok_or_else(|| Error::Other("mock session factory exhausted".to_string()))
    })
}
