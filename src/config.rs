//! Configuration for the interpreter bridge
//!
//! All settings are explicit values handed to the components at
//! construction time. Environment variables are read once, in
//! [`Config::from_env`], and converted into plain configuration; nothing in
//! the core consults the environment afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable naming the interpreter executable
pub const ENV_WASM_INTERPRETER: &str = "WASM_INTERPRETER";
/// Environment variable for the log filter level
pub const ENV_LOG_LEVEL: &str = "WASM_KERNEL_LOG_LEVEL";
/// Environment variable for the log file destination
pub const ENV_LOG_FILE: &str = "WASM_KERNEL_LOG_FILE";

/// Output width passed to the interpreter with `-w`.
///
/// Must be wide enough that the interpreter never pre-wraps an output line
/// (wrapping is the display layer's job). Capped below the OCaml runtime's
/// max int on 32-bit systems, which reserves one bit.
pub const MAX_OUTPUT_WIDTH: u32 = (1 << 30) - 1;

/// Main configuration structure for wasmrepl
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Interpreter process configuration
    pub repl: ReplConfig,

    /// Logging configuration
    pub logging: LogConfig,
}

/// Interpreter-process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Interpreter executable name or path
    pub program: String,

    /// Extra arguments appended after the width flag
    pub args: Vec<String>,

    /// Output width passed with `-w`
    pub output_width: u32,

    /// Extra environment variables for the interpreter process
    pub environment: HashMap<String, String>,

    /// How long to wait for the first prompt after spawning, in milliseconds
    pub startup_timeout_ms: u64,

    /// Per-command prompt wait, in milliseconds. `None` waits indefinitely;
    /// cancellation is then the only bound.
    pub command_timeout_ms: Option<u64>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            program: "wasm".to_string(),
            args: Vec::new(),
            output_width: MAX_OUTPUT_WIDTH,
            environment: HashMap::new(),
            startup_timeout_ms: 30_000,
            command_timeout_ms: None,
        }
    }
}

impl ReplConfig {
    /// Startup prompt-synchronization deadline
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    /// Per-command deadline, if any
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log filter directive (e.g. "warn", "wasmrepl=debug")
    pub level: String,

    /// Log file destination; stderr when unset
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Build a configuration from the process environment.
    ///
    /// Honours `WASM_INTERPRETER`, `WASM_KERNEL_LOG_LEVEL` and
    /// `WASM_KERNEL_LOG_FILE`; everything else keeps its default.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(program) = std::env::var(ENV_WASM_INTERPRETER) {
            if !program.is_empty() {
                config.repl.program = program;
            }
        }
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.is_empty() {
                config.logging.level = level;
            }
        }
        if let Ok(file) = std::env::var(ENV_LOG_FILE) {
            if !file.is_empty() {
                config.logging.file = Some(PathBuf::from(file));
            }
        }
        config
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wasmrepl").join("config.toml"))
    }
}
