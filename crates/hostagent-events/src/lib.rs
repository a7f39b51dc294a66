//! # Host Agent Events
//!
//! Local telemetry spool for the host agent.
//!
//! Callers report operational events (installs, upgrades, health checks,
//! crashes) through an [`EventReporter`]. Each event is serialized into a
//! fixed eight-parameter schema and written as its own file in a spool
//! directory, where a separate uploader picks it up.
//!
//! ## Features
//!
//! - **TelemetryEvent**: fixed, ordered, typed parameter list with a
//!   deterministic JSON form
//! - **EventSpool**: atomic temp-write + rename, oldest-first eviction under a
//!   [`RetentionPolicy`], one lock per spool
//! - **EventReporter**: best-effort facade; persistence errors are logged,
//!   never returned to the caller
//! - **Crash capture**: panic hook plus an exit guard that reports the crash
//!   as an `UnhandledError` event
//!
//! ## Example
//!
//! ```rust,ignore
//! use hostagent_events::{AgentInfo, EventArgs, EventOperation, EventReporter, SpoolConfig};
//!
//! let agent = AgentInfo::new("HostAgent", "2.2.53");
//! let reporter = EventReporter::new(agent, SpoolConfig::default());
//! reporter.init_event_logger("/var/lib/hostagent/events");
//!
//! reporter.add_event(
//!     EventArgs::new("MyExtension")
//!         .operation(EventOperation::Install)
//!         .message("ok"),
//! );
//! reporter.report_event(EventOperation::HeartBeat, true, "");
//! ```

pub mod agent;
pub mod crash;
pub mod error;
pub mod event;
pub mod fs;
pub mod operation;
pub mod reporter;
pub mod retention;
pub mod spool;

// Re-exports
pub use agent::{AgentInfo, elapsed_milliseconds};
pub use crash::{
    CrashContext, CrashRecorder, UnhandledErrorDump, dump_unhandled_err,
    enable_unhandled_err_dump,
};
pub use error::{ConfigError, EventPersistError};
pub use event::{
    EVENT_SCHEMA_ID, EventArgs, PARAMETER_NAMES, PROVIDER_ID, ParamType, ParamValue,
    TelemetryEvent, TelemetryEventParam,
};
pub use fs::{OsFs, SpoolFs};
pub use operation::{EventOperation, UnknownOperation};
pub use reporter::{EventReporter, discard_persist_result};
pub use retention::{RetentionPolicy, RetentionPolicyBuilder};
pub use spool::{EventSpool, FINAL_EXTENSION, PersistOutcome, SpoolConfig, TEMP_EXTENSION};
