//! Event reporting facade
//!
//! [`EventReporter`] is what the rest of the agent calls. It turns caller
//! fields into a [`TelemetryEvent`], echoes a readable line to the log, and
//! hands the serialized record to the spool. Telemetry never fails the
//! operation it describes: persistence errors end here, in the log.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::agent::AgentInfo;
use crate::error::EventPersistError;
use crate::event::{EventArgs, TelemetryEvent};
use crate::fs::{OsFs, SpoolFs};
use crate::spool::{EventSpool, PersistOutcome, SpoolConfig};

/// Builds telemetry events and funnels them into one spool
pub struct EventReporter<F: SpoolFs = OsFs> {
    spool: Arc<EventSpool<F>>,
    agent: AgentInfo,
}

impl EventReporter<OsFs> {
    /// Create a reporter with its own unbound spool
    pub fn new(agent: AgentInfo, config: SpoolConfig) -> Self {
        Self::with_spool(Arc::new(EventSpool::new(config)), agent)
    }
}

impl<F: SpoolFs> EventReporter<F> {
    /// Create a reporter over an existing spool
    pub fn with_spool(spool: Arc<EventSpool<F>>, agent: AgentInfo) -> Self {
        Self { spool, agent }
    }

    /// Bind the underlying spool to `event_dir`
    pub fn init_event_logger(&self, event_dir: impl Into<PathBuf>) {
        self.spool.initialize(event_dir);
    }

    pub fn spool(&self) -> &Arc<EventSpool<F>> {
        &self.spool
    }

    pub fn agent(&self) -> &AgentInfo {
        &self.agent
    }

    /// Record one event
    ///
    /// Echoes `Event: name=…, op=…, message=…` at info level when
    /// `log_event` is set, and always at error level for failures. Returns
    /// without writing, after a warning, while the spool is unbound.
    pub fn add_event(&self, args: EventArgs) {
        if args.log_event || !args.is_success {
            echo_event(&args);
        }

        if !self.spool.is_initialized() {
            warn!("Event reporter is not initialized.");
            return;
        }

        let event = TelemetryEvent::from_args(&args, self.agent.version());
        discard_persist_result(self.persist_event(&event));
    }

    /// Record an operation of the agent itself, under its own name and version
    pub fn report_event(
        &self,
        operation: impl AsRef<str>,
        is_success: bool,
        message: impl Into<String>,
    ) {
        self.add_event(
            EventArgs::new(self.agent.name())
                .version(self.agent.version())
                .operation(operation)
                .success(is_success)
                .message(message),
        );
    }

    fn persist_event(&self, event: &TelemetryEvent) -> Result<PersistOutcome, EventPersistError> {
        let data = event.to_json()?;
        self.spool.persist(&data)
    }
}

fn echo_event(args: &EventArgs) {
    if args.is_success {
        info!(
            "Event: name={}, op={}, message={}",
            args.name, args.operation, args.message
        );
    } else {
        error!(
            "Event: name={}, op={}, message={}",
            args.name, args.operation, args.message
        );
    }
}

/// Terminate a persist result at the facade boundary
///
/// Errors are logged and dropped; they are never retried or queued.
pub fn discard_persist_result(result: Result<PersistOutcome, EventPersistError>) {
    match result {
        Ok(PersistOutcome::Written(path)) => {
            debug!(path = %path.display(), "Event spooled");
        }
        Ok(PersistOutcome::Skipped) => {}
        Err(e) => {
            error!("{}", e);
        }
    }
}
