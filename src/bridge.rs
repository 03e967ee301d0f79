//! Execution bridge
//!
//! Adapts one host-engine execution request to the REPL driver: classifies
//! interpreter output into the host-visible result shape and recovers from
//! process-lifecycle failures by restarting the session, so the next
//! request always starts from a freshly synchronized prompt. Expected
//! failures never cross this boundary as errors; they become one of the
//! three [`ExecutionResult`] variants.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::repl::driver::ReplDriver;
use crate::repl::prompt::PromptPattern;
use crate::repl::session::Session;

/// Appended to the partial output of a command whose interpreter died
/// mid-flight, so the caller sees what was lost.
pub const RESTART_NOTICE: &str = "Restarting Wasm";

// 1=location, 2=kind, 3=detail
static ERROR_PAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(stdin:\d+\.\d+-\d+\.\d+): (.+?): (.+)").unwrap());

/// Outcome of one execution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The interpreter produced ordinary output (possibly empty)
    Ok(String),
    /// The interpreter reported an error, or the bridge hit an internal
    /// fault it could only downgrade to a diagnostic
    Error(InterpreterError),
    /// The request was cancelled from outside; the session was discarded
    Abort,
}

/// A classified interpreter error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterError {
    /// Source span (`stdin:<line>.<col>-<line>.<col>`); absent for
    /// internal faults
    pub location: Option<String>,
    /// Short category word ("syntax error", "assertion failure", or
    /// "unknown" for internal faults)
    pub kind: String,
    /// Free-text detail
    pub detail: String,
    /// The full raw text, preserved for display
    pub raw: String,
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", location, self.kind, self.detail),
            None => write!(f, "{}: {}", self.kind, self.detail),
        }
    }
}

/// Bridge lifecycle state, one cycle per session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Ready for the next request
    Idle,
    /// A request is in flight
    Running,
    /// Re-establishing a freshly synchronized session
    Restarting,
}

/// Produces a fresh [`Session`] for construction and for every restart
pub type SessionFactory = Box<dyn FnMut() -> Result<Session> + Send>;

#[derive(Default)]
struct CancelState {
    flag: AtomicBool,
    notify: Notify,
}

/// Out-of-band cancellation signal for an in-flight execution.
///
/// Clonable and `Send`; `cancel` promptly preempts any prompt wait,
/// bounded or not.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self {
            inner: Arc::new(CancelState::default()),
        }
    }
}

impl CancelHandle {
    /// Cancel the in-flight execution, if any
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    async fn cancelled(&self) {
        loop {
            // register with the Notify before checking the flag, so a
            // cancel landing between the check and the await is not lost
            let mut notified = std::pin::pin!(self.inner.notify.notified());
            notified.as_mut().enable();
            if self.inner.flag.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    fn reset(&self) {
        self.inner.flag.store(false, Ordering::SeqCst);
    }
}

/// Maps host execution requests onto driver calls plus lifecycle recovery
pub struct ExecutionBridge {
    factory: SessionFactory,
    pattern: PromptPattern,
    driver: Option<ReplDriver>,
    state: BridgeState,
    startup_timeout: Duration,
    command_timeout: Option<Duration>,
    cancel: CancelHandle,
}

impl ExecutionBridge {
    /// Spawn the configured interpreter and synchronize to its first prompt
    pub async fn start(config: &Config) -> Result<Self> {
        let repl = config.repl.clone();
        let startup_timeout = repl.startup_timeout();
        let command_timeout = repl.command_timeout();
        let factory: SessionFactory = Box::new(move || Session::spawn(&repl));
        Self::with_session_factory(factory, startup_timeout, command_timeout).await
    }

    /// Build a bridge over an injected session source. The factory is used
    /// for the initial session and for every restart.
    pub async fn with_session_factory(
        mut factory: SessionFactory,
        startup_timeout: Duration,
        command_timeout: Option<Duration>,
    ) -> Result<Self> {
        let pattern = PromptPattern::wasm();
        let session = factory()?;
        let driver = ReplDriver::start(session, pattern.clone(), Some(startup_timeout)).await?;
        Ok(Self {
            factory,
            pattern,
            driver: Some(driver),
            state: BridgeState::Idle,
            startup_timeout,
            command_timeout,
            cancel: CancelHandle::default(),
        })
    }

    /// Handle for cancelling an in-flight `execute` from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Run one cell of code and classify the interpreter's response.
    ///
    /// Trailing whitespace is trimmed first; an empty cell returns
    /// `Ok("")` without touching the interpreter. Must not be called
    /// reentrantly — the `&mut self` receiver enforces the host engine's
    /// one-request-at-a-time model.
    pub async fn execute(&mut self, code: &str) -> ExecutionResult {
        let code = code.trim_end();
        debug!("execute received: ```{}```", code);
        if code.is_empty() {
            return ExecutionResult::Ok(String::new());
        }

        if self.driver.is_none() {
            // a previous restart failed; try again before giving up
            self.state = BridgeState::Restarting;
            if let Err(err) = self.restart(false).await {
                error!("failed to start an interpreter session: {}", err);
                self.state = BridgeState::Idle;
                return fault_result(&err);
            }
        }
        let Some(driver) = self.driver.as_mut() else {
            return fault_result(&Error::Other("no interpreter session".to_string()));
        };

        self.cancel.reset();
        self.state = BridgeState::Running;
        let cancel = self.cancel.clone();
        let timeout = self.command_timeout;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = driver.run_command(code, timeout) => Some(result),
        };

        let result = match outcome {
            None => {
                warn!("execution aborted; restarting the interpreter");
                self.state = BridgeState::Restarting;
                if let Err(err) = self.restart(true).await {
                    error!("failed to restart after abort: {}", err);
                }
                ExecutionResult::Abort
            }
            Some(Ok(output)) => {
                debug!("response from run_command: ```{}```", output);
                classify(output)
            }
            Some(Err(Error::ProcessTerminated { partial }))
            | Some(Err(Error::CommandTimeout { partial })) => {
                debug!("interpreter stream ended mid-command; restarting");
                self.state = BridgeState::Restarting;
                if let Err(err) = self.restart(false).await {
                    error!("failed to restart the interpreter: {}", err);
                }
                ExecutionResult::Ok(format!("{}{}", partial, RESTART_NOTICE))
            }
            Some(Err(err)) => {
                error!("unknown error while driving the interpreter: {}", err);
                self.state = BridgeState::Restarting;
                if let Err(restart_err) = self.restart(true).await {
                    error!("failed to restart the interpreter: {}", restart_err);
                }
                fault_result(&err)
            }
        };

        self.state = BridgeState::Idle;
        result
    }

    /// Kill the current session, if any, and consume the bridge
    pub async fn shutdown(mut self) {
        if let Some(driver) = self.driver.take() {
            driver.shutdown().await;
        }
    }

    /// Tear down the current session (when asked to) and bring up a fresh,
    /// prompt-synchronized one.
    async fn restart(&mut self, kill_existing: bool) -> Result<()> {
        debug!(
            "starting new interpreter session{}",
            if self.driver.is_some() {
                ", one already exists"
            } else {
                ""
            }
        );
        if let Some(driver) = self.driver.take() {
            if kill_existing {
                driver.shutdown().await;
            }
        }
        let session = (self.factory)()?;
        let driver =
            ReplDriver::start(session, self.pattern.clone(), Some(self.startup_timeout)).await?;
        self.driver = Some(driver);
        Ok(())
    }
}

/// Scan output for the interpreter's structured error line
fn classify(output: String) -> ExecutionResult {
    match ERROR_PAT.captures(&output) {
        Some(caps) => {
            let error = InterpreterError {
                location: caps.get(1).map(|m| m.as_str().to_string()),
                kind: caps
                    .get(2)
                    .map(|m| m.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                detail: caps.get(3).map(|m| m.as_str()).unwrap_or("").to_string(),
                raw: output.clone(),
            };
            ExecutionResult::Error(error)
        }
        None => ExecutionResult::Ok(output),
    }
}

/// Downgrade an internal fault to a reportable result
fn fault_result(err: &Error) -> ExecutionResult {
    ExecutionResult::Error(InterpreterError {
        location: None,
        kind: "unknown".to_string(),
        detail: err.to_string(),
        raw: format!("{} due to unknown error: {}", RESTART_NOTICE, err),
    })
}
