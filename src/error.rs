//! Error types and Result aliases for wasmrepl

use std::fmt;
use std::path::PathBuf;

/// Result type alias for wasmrepl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wasmrepl
#[derive(Debug)]
pub enum Error {
    // === Interpreter process errors ===
    /// Failed to spawn the interpreter process
    SpawnFailed {
        program: String,
        reason: String,
    },

    /// Interpreter executable could not be resolved
    InterpreterNotFound {
        program: String,
    },

    /// Failed to send input to the interpreter
    InputSendFailed {
        reason: String,
    },

    /// The interpreter's output stream closed before a prompt was seen.
    /// Carries whatever output had accumulated for the in-flight command.
    ProcessTerminated {
        partial: String,
    },

    /// No prompt appeared within the caller's deadline.
    /// Carries whatever output had accumulated for the in-flight command.
    CommandTimeout {
        partial: String,
    },

    // === Caller errors ===
    /// Empty command
    EmptyCommand,

    /// The prompt pair is fixed for the lifetime of a session
    PromptChangeUnsupported,

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    // === I/O and pattern errors ===
    /// I/O errors
    Io(std::io::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SpawnFailed { program, reason } => {
                write!(f, "Failed to spawn interpreter '{}': {}", program, reason)
            }
            Error::InterpreterNotFound { program } => {
                write!(f, "Unable to find a '{}' executable in $PATH", program)
            }
            Error::InputSendFailed { reason } => {
                write!(f, "Failed to send input to the interpreter: {}", reason)
            }
            Error::ProcessTerminated { partial } => {
                write!(
                    f,
                    "Interpreter process terminated before a prompt was seen ({} bytes of partial output)",
                    partial.len()
                )
            }
            Error::CommandTimeout { partial } => {
                write!(
                    f,
                    "Timed out waiting for an interpreter prompt ({} bytes of partial output)",
                    partial.len()
                )
            }

            Error::EmptyCommand => {
                write!(f, "No command was given")
            }
            Error::PromptChangeUnsupported => {
                write!(f, "The Wasm REPL's prompt can't be changed")
            }

            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }

            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
