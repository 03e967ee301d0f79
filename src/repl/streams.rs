//! REPL streams
//!
//! Channel-backed duplex text stream to a spawned interpreter. Background
//! tasks own the child's pipes (see `process`); this wrapper is the single
//! reader/writer handle the driver holds.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::{Error, Result};

/// Interpreter I/O streams wrapper
pub struct ReplStreams {
    /// Receiver for output bytes from the interpreter (stdout/stderr)
    output_rx: UnboundedReceiver<Vec<u8>>,
    /// Sender for input bytes to the interpreter (stdin)
    input_tx: UnboundedSender<Vec<u8>>,
}

impl ReplStreams {
    /// Create new streams from channels
    pub fn from_channels(
        output_rx: UnboundedReceiver<Vec<u8>>,
        input_tx: UnboundedSender<Vec<u8>>,
    ) -> Self {
        Self {
            output_rx,
            input_tx,
        }
    }

    /// Write data to the interpreter's stdin
    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.input_tx
            .send(data.to_vec())
            .map_err(|e| Error::InputSendFailed {
                reason: e.to_string(),
            })
    }

    /// Read the next output chunk. Returns `None` once the stream has
    /// closed (interpreter exited and all buffered output was consumed).
    pub async fn read(&mut self) -> Option<Vec<u8>> {
        self.output_rx.recv().await
    }

    /// Try to read without waiting; `None` if nothing is buffered
    pub fn try_read_now(&mut self) -> Option<Vec<u8>> {
        self.output_rx.try_recv().ok()
    }

    /// Drain all pending output chunks (discard them); returns the count
    pub fn drain_output(&mut self) -> usize {
        let mut count = 0;
        while self.output_rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}
