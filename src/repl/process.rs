//! Interpreter process spawning
//!
//! Spawns the Wasm reference interpreter with piped stdio and bridges the
//! pipes to async channels with background tasks. Pipes, not a PTY: a
//! terminal would echo every sent line back into the output stream and the
//! echo would be captured as command output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::streams::ReplStreams;
use crate::config::ReplConfig;
use crate::error::{Error, Result};

static VERSION_PAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"wasm (\d+(\.\d+)+)").unwrap());

/// Resolve the interpreter executable.
///
/// A bare name is searched for in `$PATH`; anything with a path separator
/// is checked as given.
pub fn resolve_interpreter(program: &str) -> Result<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        if candidate.is_file() {
            return Ok(candidate.to_path_buf());
        }
        return Err(Error::InterpreterNotFound {
            program: program.to_string(),
        });
    }

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let full = dir.join(program);
            if full.is_file() {
                return Ok(full);
            }
        }
    }

    Err(Error::InterpreterNotFound {
        program: program.to_string(),
    })
}

/// Spawn the interpreter process and return the child handle together with
/// its bridged I/O streams.
pub fn spawn_repl_process(config: &ReplConfig) -> Result<(Child, ReplStreams)> {
    let path = resolve_interpreter(&config.program)?;
    info!("using wasm interpreter at `{}`", path.display());

    let mut command = Command::new(&path);
    command
        .arg("-w")
        .arg(config.output_width.to_string())
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &config.environment {
        command.env(key, value);
    }
    // The interpreter gets its own process group so interrupt signals reach
    // it independently of whatever the embedding host does with its own
    // signal handling.
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|e| Error::SpawnFailed {
        program: config.program.clone(),
        reason: e.to_string(),
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Other("interpreter stdout was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::Other("interpreter stderr was not captured".to_string()))?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::Other("interpreter stdin was not captured".to_string()))?;

    // Channel: interpreter output -> driver
    let (tx_out, rx_out) = unbounded_channel::<Vec<u8>>();
    // Channel: driver -> interpreter stdin
    let (tx_in, rx_in) = unbounded_channel::<Vec<u8>>();

    // stdout and stderr are merged into one output stream, the way a
    // terminal would present them.
    tokio::spawn(forward_output(stdout, tx_out.clone(), "stdout"));
    tokio::spawn(forward_output(stderr, tx_out, "stderr"));
    tokio::spawn(forward_input(stdin, rx_in));

    Ok((child, ReplStreams::from_channels(rx_out, tx_in)))
}

/// Read one child pipe and forward chunks to the output channel
async fn forward_output<R: AsyncRead + Unpin>(
    mut reader: R,
    tx: UnboundedSender<Vec<u8>>,
    name: &'static str,
) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("interpreter {} closed", name);
                break;
            }
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    debug!("interpreter {}: receiver dropped, stopping forwarder", name);
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("interpreter {} read error: {}", name, e);
                break;
            }
        }
    }
}

/// Forward queued input lines to the child's stdin
async fn forward_input(mut stdin: ChildStdin, mut rx: UnboundedReceiver<Vec<u8>>) {
    while let Some(data) = rx.recv().await {
        if let Err(e) = stdin.write_all(&data).await {
            warn!("failed to write to interpreter stdin: {}", e);
            break;
        }
        if let Err(e) = stdin.flush().await {
            debug!("interpreter stdin flush error: {}", e);
        }
    }
    debug!("interpreter stdin forwarder exiting");
}

/// Run `<interpreter> -v -e ""` and capture its banner text
pub async fn interpreter_banner(config: &ReplConfig) -> Result<String> {
    let path = resolve_interpreter(&config.program)?;
    let output = Command::new(&path)
        .args(["-v", "-e", ""])
        .output()
        .await
        .map_err(|e| Error::SpawnFailed {
            program: config.program.clone(),
            reason: e.to_string(),
        })?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extract the interpreter version from its banner text
pub fn language_version(banner: &str) -> Option<&str> {
    VERSION_PAT
        .captures(banner)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
