//! # Host Agent Event Control
//!
//! Command-line front end over [`hostagent_events`]: spools events for
//! extensions and for the agent itself, and reports on the spool directory.

pub mod commands;
pub mod config;

pub use config::{AgentConfig, Cli, Command};
