//! REPL sessions
//!
//! One live spawned-process + stream pair. Owned exclusively by the driver;
//! destroyed on restart or shutdown.

use chrono::{DateTime, Utc};
use tokio::process::Child;
use uuid::Uuid;

use super::process::spawn_repl_process;
use super::streams::ReplStreams;
use crate::config::ReplConfig;
use crate::error::Result;

/// One spawned interpreter process and its duplex text stream
pub struct Session {
    /// Unique identifier for this session
    id: String,
    /// Child handle; `None` for detached sessions
    child: Option<Child>,
    /// Bridged I/O streams
    streams: ReplStreams,
    /// When the session was created
    start_time: DateTime<Utc>,
}

impl Session {
    /// Spawn a new interpreter process
    pub fn spawn(config: &ReplConfig) -> Result<Self> {
        let (child, streams) = spawn_repl_process(config)?;
        let session = Self {
            id: Uuid::new_v4().to_string(),
            child: Some(child),
            streams,
            start_time: Utc::now(),
        };
        info!(
            "started interpreter session {} (pid {:?})",
            session.id,
            session.pid()
        );
        Ok(session)
    }

    /// Wrap externally provided streams with no owned process.
    ///
    /// Used by tests and by hosts that manage the interpreter process
    /// themselves; `terminate` then only drains the stream.
    pub fn detached(streams: ReplStreams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            child: None,
            streams,
            start_time: Utc::now(),
        }
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Process id of the interpreter, if one is owned and still known
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    /// When the session was created
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Whether the owned process is still running. Detached sessions are
    /// assumed alive as long as their stream is open.
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => true,
        }
    }

    /// Mutable access to the streams (the driver is the only caller)
    pub fn streams_mut(&mut self) -> &mut ReplStreams {
        &mut self.streams
    }

    /// Kill the interpreter and discard any buffered output.
    ///
    /// The whole process group is taken down: the interpreter may have
    /// forked, and a surviving grandchild would keep the output pipe open.
    pub async fn terminate(&mut self) {
        if let Some(child) = &mut self.child {
            #[cfg(unix)]
            if let Some(pid) = child.id() {
                use nix::sys::signal::{killpg, Signal};
                use nix::unistd::Pid;
                if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    debug!("killpg({}) failed: {}", pid, e);
                }
            }
            if let Err(e) = child.kill().await {
                debug!("failed to kill interpreter session {}: {}", self.id, e);
            }
        }
        let drained = self.streams.drain_output();
        if drained > 0 {
            debug!(
                "discarded {} buffered output chunks from session {}",
                drained, self.id
            );
        }
    }
}
