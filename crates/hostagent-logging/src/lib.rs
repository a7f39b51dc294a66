//! Logging setup for the host agent
//!
//! Every crate in the workspace logs through `tracing`. This crate installs
//! the global subscriber: a console output (JSON or pretty), an optional
//! rotated JSONL file written through `tracing-appender`, and an
//! `EnvFilter` that honours `RUST_LOG`. Tests use [`LogCapture`] instead.
//!
//! ```ignore
//! use hostagent_logging::{AgentSubscriberBuilder, LogConfig};
//!
//! let _guard = AgentSubscriberBuilder::new()
//!     .with_config(LogConfig::service("/var/log/hostagent"))
//!     .init();
//! ```
//!
//! Keep the returned guard alive: dropping it flushes and stops the
//! background file writer.

pub mod capture;
pub mod config;
pub mod layers;

pub use capture::{CapturedEvent, LogCapture};
pub use config::{ConsoleFormat, JsonFields, LogConfig, LogFileConfig, LogRotation};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::layers::BoxedLayer;

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("failed to prepare log file: {0}")]
    File(#[from] std::io::Error),

    #[error("failed to create rolling log appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    /// Another global subscriber is already installed
    #[error("logging already initialized: {0}")]
    AlreadySet(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the process-wide subscriber described by a [`LogConfig`]
#[derive(Debug, Clone, Default)]
pub struct AgentSubscriberBuilder {
    config: LogConfig,
}

impl AgentSubscriberBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the fallback filter directive
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    pub fn with_console(mut self, format: ConsoleFormat) -> Self {
        self.config.console = format;
        self
    }

    pub fn with_file(mut self, file: LogFileConfig) -> Self {
        self.config.file = Some(file);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber, reporting failures on stderr
    ///
    /// Logging must never stop the agent, so a failure leaves the process
    /// without a subscriber instead of returning an error.
    pub fn init(self) -> Option<WorkerGuard> {
        self.try_init().unwrap_or_else(|e| {
            eprintln!("hostagent: logging disabled: {}", e);
            None
        })
    }

    /// Install the subscriber
    ///
    /// The guard is `Some` only when file output is configured.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LogInitError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.level));

        let mut outputs: Vec<BoxedLayer> = Vec::with_capacity(2);
        outputs.extend(layers::console_layer(
            self.config.console,
            self.config.ansi,
            &self.config.fields,
        ));

        let guard = match &self.config.file {
            Some(file) => {
                let (writer, guard) = open_log_file(file)?;
                outputs.push(layers::json_layer(writer, &self.config.fields));
                Some(guard)
            }
            None => None,
        };

        Registry::default().with(outputs).with(filter).try_init()?;
        Ok(guard)
    }
}

/// Open the background writer for `file`
fn open_log_file(
    file: &LogFileConfig,
) -> Result<(NonBlocking, WorkerGuard), LogInitError> {
    fs::create_dir_all(&file.directory)?;

    let rotation = match file.rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Never => {
            let path = file.directory.join(format!("{}.log", file.file_name));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
    };

    let mut appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&file.file_name)
        .filename_suffix("log");
    if let Some(keep) = file.keep {
        appender = appender.max_log_files(keep);
    }

    Ok(tracing_appender::non_blocking(appender.build(&file.directory)?))
}
