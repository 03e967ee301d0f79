//! REPL driver
//!
//! Turns "send text, wait for a matching delimiter in an asynchronously
//! arriving stream" into one call per command. The driver feeds a command
//! into the interpreter line by line, waiting for a prompt before each
//! line after the first, and only treats the primary prompt as completion:
//! the continuation marker is identical to the indentation used for
//! ordinary results, so resting on it would misread output as a prompt.
//!
//! After every successful [`ReplDriver::run_command`] the stream position
//! is exactly at a freshly consumed primary prompt; the next call can
//! assume a clean starting state.

use std::time::Duration;
use tokio::time::Instant;

use super::prompt::{PromptKind, PromptPattern};
use super::session::Session;
use crate::error::{Error, Result};

/// Drives one interpreter session through its prompt/response protocol
pub struct ReplDriver {
    session: Session,
    pattern: PromptPattern,
    /// Unconsumed stream text; everything before it has been matched away
    buffer: String,
}

impl ReplDriver {
    /// Take ownership of a session and synchronize to its first primary
    /// prompt, consuming and discarding the interpreter banner.
    pub async fn start(
        session: Session,
        pattern: PromptPattern,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut driver = Self {
            session,
            pattern,
            buffer: String::new(),
        };
        let (_, banner) = driver.expect_prompt(false, deadline_from(timeout)).await?;
        if !banner.is_empty() {
            debug!("discarded {} bytes of interpreter banner", banner.len());
        }
        Ok(driver)
    }

    /// Send a command to the interpreter, wait for and return its output.
    ///
    /// The command is split into logical lines. The first is sent
    /// immediately; each further line waits for a primary or continuation
    /// prompt first. After the last line, only a primary prompt completes
    /// the command. Intermediate output fragments and the final pre-prompt
    /// text are joined with an explicit line break, since the primary
    /// matcher swallows the break that precedes it.
    ///
    /// A command whose final line still leaves the interpreter expecting
    /// more input never produces a primary prompt and waits out `timeout`
    /// (or indefinitely when `None`). That is a property of the protocol:
    /// the trailing continuation marker cannot be told apart from output.
    // TODO: probe with a trailing blank line so a deliberately incomplete
    // command can be reported as an error instead of a timeout.
    pub async fn run_command(
        &mut self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let lines = split_command(command);
        if lines.is_empty() {
            return Err(Error::EmptyCommand);
        }

        let deadline = deadline_from(timeout);
        let mut fragments: Vec<String> = Vec::new();

        self.send_line(&lines[0])?;
        for line in &lines[1..] {
            let before = match self.expect_prompt(true, deadline).await {
                Ok((_, before)) => before,
                Err(err) => return Err(attach_fragments(err, fragments)),
            };
            if !before.is_empty() {
                fragments.push(before);
            }
            self.send_line(line)?;
        }

        match self.expect_prompt(false, deadline).await {
            Ok((_, before)) => {
                fragments.push(before);
                Ok(fragments.join("\n"))
            }
            Err(err) => Err(attach_fragments(err, fragments)),
        }
    }

    /// The prompt pair is fixed for the lifetime of a session
    pub fn set_prompt(&mut self, _primary: &str, _continuation: &str) -> Result<()> {
        Err(Error::PromptChangeUnsupported)
    }

    /// The session being driven
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Kill the session's interpreter and consume the driver
    pub async fn shutdown(mut self) {
        self.session.terminate().await;
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.session.streams_mut().write(&data)
    }

    /// Read until a prompt appears in the buffer; returns its kind and the
    /// text that preceded it. The matched delimiter itself is consumed.
    async fn expect_prompt(
        &mut self,
        allow_continuation: bool,
        deadline: Option<Instant>,
    ) -> Result<(PromptKind, String)> {
        loop {
            if let Some(found) = self.pattern.find(&self.buffer, allow_continuation) {
                let before = self.buffer[..found.start].to_string();
                let rest = self.buffer.split_off(found.end);
                self.buffer = rest;
                return Ok((found.kind, before));
            }

            let chunk = match deadline {
                None => self.session.streams_mut().read().await,
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.session.streams_mut().read())
                        .await
                    {
                        Ok(chunk) => chunk,
                        Err(_) => {
                            return Err(Error::CommandTimeout {
                                partial: std::mem::take(&mut self.buffer),
                            })
                        }
                    }
                }
            };

            match chunk {
                Some(bytes) => self.buffer.push_str(&String::from_utf8_lossy(&bytes)),
                None => {
                    return Err(Error::ProcessTerminated {
                        partial: std::mem::take(&mut self.buffer),
                    })
                }
            }
        }
    }
}

/// Split a command into the logical lines fed to the interpreter one at a
/// time. A trailing line break submits one final blank line, which ends a
/// pending block in the interpreter's grammar.
pub fn split_command(command: &str) -> Vec<String> {
    let mut lines: Vec<String> = command.lines().map(str::to_string).collect();
    if command.ends_with('\n') {
        lines.push(String::new());
    }
    lines
}

fn deadline_from(timeout: Option<Duration>) -> Option<Instant> {
    timeout.map(|t| Instant::now() + t)
}

/// Fold already-captured fragments into a failure's partial output so
/// nothing the interpreter produced is silently dropped.
fn attach_fragments(err: Error, mut fragments: Vec<String>) -> Error {
    if fragments.is_empty() {
        return err;
    }
    match err {
        Error::ProcessTerminated { partial } => {
            fragments.push(partial);
            Error::ProcessTerminated {
                partial: fragments.join("\n"),
            }
        }
        Error::CommandTimeout { partial } => {
            fragments.push(partial);
            Error::CommandTimeout {
                partial: fragments.join("\n"),
            }
        }
        other => other,
    }
}
