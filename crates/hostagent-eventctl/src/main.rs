use std::sync::Arc;

use clap::Parser;
use hostagent_eventctl::commands;
use hostagent_eventctl::config::{AgentConfig, Cli};
use hostagent_events::{AgentInfo, CrashRecorder, EventReporter, enable_unhandled_err_dump};
use hostagent_logging::AgentSubscriberBuilder;
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AgentConfig::resolve(&cli)?;

    // Keep the guard alive so buffered file output is flushed on exit
    let _log_guard = AgentSubscriberBuilder::new()
        .with_config(config.logging.clone())
        .init();

    let reporter = Arc::new(EventReporter::new(AgentInfo::default(), config.spool.clone()));
    reporter.init_event_logger(&config.event_dir);
    debug!(event_dir = %config.event_dir.display(), "Event reporter ready");

    // Declared after the log guard so a crash is reported while logging is up
    let agent_name = reporter.agent().name().to_string();
    let _crash_dump = enable_unhandled_err_dump(
        Arc::clone(&reporter),
        Arc::new(CrashRecorder::new()),
        agent_name,
    );

    commands::run(cli.command, &*reporter, &mut std::io::stdout().lock())
}
