//! Command-line arguments and layered configuration
//!
//! Settings resolve in three layers, lowest priority first: the TOML file,
//! the environment, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hostagent_events::{EventOperation, SpoolConfig};
use hostagent_logging::LogConfig;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured event directory
pub const EVENT_DIR_ENV: &str = "HOSTAGENT_EVENT_DIR";

/// Spool location used when nothing else is configured
pub const DEFAULT_EVENT_DIR: &str = "/var/lib/hostagent/events";

#[derive(Parser, Debug)]
#[command(
    name = "hostagent-eventctl",
    version,
    about = "Report and inspect host agent telemetry events"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "HOSTAGENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Spool directory (overrides the file and HOSTAGENT_EVENT_DIR)
    #[arg(long, global = true)]
    pub event_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Spool an event on behalf of an extension or component
    Add {
        /// Name of the extension or component
        name: String,
        /// Operation performed, e.g. Install or Enable
        #[arg(long, default_value = "")]
        operation: String,
        /// Mark the operation as failed
        #[arg(long)]
        failed: bool,
        /// Duration of the operation in milliseconds
        #[arg(long, default_value_t = 0)]
        duration: i64,
        /// Version to record instead of the agent's own
        #[arg(long)]
        ext_version: Option<String>,
        /// Free-form message
        #[arg(long, default_value = "")]
        message: String,
        /// Extension type
        #[arg(long, default_value = "")]
        event_type: String,
        /// Mark the event as internal
        #[arg(long)]
        internal: bool,
        /// Do not echo a successful event to the log
        #[arg(long)]
        quiet: bool,
    },
    /// Spool an event about the agent itself
    Report {
        /// One of the agent's well-known operations
        operation: EventOperation,
        /// Mark the operation as failed
        #[arg(long)]
        failed: bool,
        /// Free-form message
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Show the spool directory and its pending events
    Status,
}

/// Settings for one run of the tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Directory the spool writes into
    pub event_dir: PathBuf,
    pub spool: SpoolConfig,
    pub logging: LogConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            event_dir: PathBuf::from(DEFAULT_EVENT_DIR),
            spool: SpoolConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Resolve all layers for `cli` against the process environment
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.apply_cli_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file; keys it omits keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides, reading variables through `lookup`
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(EVENT_DIR_ENV)
            && !dir.is_empty()
        {
            self.event_dir = PathBuf::from(dir);
        }
    }

    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.event_dir {
            self.event_dir = dir.clone();
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_dir.as_os_str().is_empty() {
            bail!("event_dir must not be empty");
        }
        self.spool
            .retention
            .validate()
            .context("invalid [spool.retention] settings")?;
        Ok(())
    }
}
