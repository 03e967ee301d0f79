//! wasmrepl - drive the WebAssembly reference interpreter's REPL
//!
//! This library lets a notebook-style host execute cells of WebAssembly
//! text against the reference interpreter as if it were a native kernel:
//! one cell in, one classified result out.
//!
//! ## Module Organization
//!
//! - [`bridge`] - Execution bridge: request/response contract, output
//!   classification, crash/cancel recovery
//! - [`repl`] - Interpreter process, streams, sessions, prompt matching,
//!   and the line-by-line REPL driver
//! - [`config`] - Explicit configuration (interpreter, logging), TOML
//!   loading, environment construction
//! - [`logging`] - tracing subscriber setup
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use wasmrepl::{Config, ExecutionBridge, ExecutionResult};
//!
//! # async fn run() -> wasmrepl::Result<()> {
//! let config = Config::from_env();
//! let mut bridge = ExecutionBridge::start(&config).await?;
//!
//! match bridge.execute("(module $empty)").await {
//!     ExecutionResult::Ok(output) => println!("{}", output),
//!     ExecutionResult::Error(err) => eprintln!("{}", err),
//!     ExecutionResult::Abort => eprintln!("aborted"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The interpreter runs as a child process over plain pipes. Two
//! background tasks bridge its stdout/stderr into an async channel and a
//! third forwards queued input lines to its stdin. The driver is the only
//! reader and writer of that channel pair; the bridge serializes requests
//! on top of the driver and replaces the whole session whenever the
//! process dies, a command is cancelled, or an unclassified fault occurs.
//!
//! ## Safety and Reliability
//!
//! - **No panics:** all fallible operations return `Result`
//! - **Recovery:** every lifecycle failure ends in a freshly synchronized
//!   session before the next request runs
//! - **Cancellation:** an out-of-band [`CancelHandle`] preempts any prompt
//!   wait, bounded or not

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod repl;

// Re-exports for core functionality
pub use bridge::{
    BridgeState, CancelHandle, ExecutionBridge, ExecutionResult, InterpreterError,
    SessionFactory, RESTART_NOTICE,
};
pub use config::{Config, LogConfig, ReplConfig};
pub use error::{Error, Result};
pub use repl::{PromptPattern, ReplDriver, Session};
