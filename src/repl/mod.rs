//! REPL process management
//!
//! Everything between the bridge and the spawned interpreter: process
//! spawning and stream bridging (`process`), the channel-backed duplex
//! stream (`streams`), session lifetime (`session`), prompt matching
//! (`prompt`), and the line-by-line command protocol (`driver`).

pub mod driver;
pub mod process;
pub mod prompt;
pub mod session;
pub mod streams;

pub use driver::{split_command, ReplDriver};
pub use process::{interpreter_banner, language_version, resolve_interpreter};
pub use prompt::{PromptKind, PromptMatch, PromptPattern};
pub use session::Session;
pub use streams::ReplStreams;
