//! Logging configuration
//!
//! Deserializable from the `[logging]` table of the agent's TOML config;
//! every field has a default, so an empty table is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the agent's log output is shaped and where it goes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `hostagent_events=debug`
    pub level: String,
    pub console: ConsoleFormat,
    /// Colour the pretty console format
    pub ansi: bool,
    /// Optional JSONL log file
    pub file: Option<LogFileConfig>,
    /// Extra fields on every JSON line, console and file alike
    pub fields: JsonFields,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleFormat::Json,
            ansi: false,
            file: None,
            fields: JsonFields::default(),
        }
    }
}

impl LogConfig {
    /// Human-readable output for someone running the tool at a terminal
    pub fn interactive() -> Self {
        Self {
            level: "debug".to_string(),
            console: ConsoleFormat::Pretty,
            ansi: true,
            ..Self::default()
        }
    }

    /// Long-running agent: JSONL into `log_dir`, nothing on the console
    pub fn service(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            console: ConsoleFormat::Off,
            file: Some(LogFileConfig {
                directory: log_dir.into(),
                keep: Some(30),
                ..LogFileConfig::default()
            }),
            ..Self::default()
        }
    }

    /// Warnings and errors only
    pub fn quiet() -> Self {
        Self {
            level: "warn".to_string(),
            ..Self::default()
        }
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    Off,
    #[default]
    Json,
    Pretty,
}

/// Rotated JSONL log files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFileConfig {
    pub directory: PathBuf,
    /// File name stem; files are `<file_name>.<date>.log` when rotating
    pub file_name: String,
    pub rotation: LogRotation,
    /// Rotated files to keep; `None` keeps all of them
    pub keep: Option<usize>,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/var/log/hostagent"),
            file_name: "hostagent".to_string(),
            rotation: LogRotation::Daily,
            keep: Some(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    /// One file, truncated at startup
    Never,
}

/// Optional fields attached to JSON log lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonFields {
    /// The enclosing span list, e.g. `persist{size=412}`
    pub spans: bool,
    pub thread: bool,
    /// Source file and line of the log statement
    pub source_location: bool,
}

impl Default for JsonFields {
    fn default() -> Self {
        Self {
            spans: true,
            thread: false,
            source_location: true,
        }
    }
}
