//! Subcommand handlers

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use hostagent_events::{EventArgs, EventReporter, SpoolFs};

use crate::config::Command;

/// Run one subcommand against `reporter`, writing any report to `out`
pub fn run<F: SpoolFs>(
    command: Command,
    reporter: &EventReporter<F>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Add {
            name,
            operation,
            failed,
            duration,
            ext_version,
            message,
            event_type,
            internal,
            quiet,
        } => {
            let mut args = EventArgs::new(name)
                .operation(operation)
                .success(!failed)
                .duration(duration)
                .message(message)
                .event_type(event_type)
                .internal(internal)
                .log_event(!quiet);
            if let Some(version) = ext_version {
                args = args.version(version);
            }
            reporter.add_event(args);
        }

        Command::Report {
            operation,
            failed,
            message,
        } => {
            reporter.report_event(operation, !failed, message);
        }

        Command::Status => print_status(reporter, out)?,
    }

    Ok(())
}

fn print_status<F: SpoolFs>(reporter: &EventReporter<F>, out: &mut impl Write) -> Result<()> {
    let spool = reporter.spool();
    let retention = spool.config().retention;

    match spool.event_dir() {
        Some(dir) => writeln!(out, "Event directory: {}", dir.display())?,
        None => writeln!(out, "Event directory: (not initialized)")?,
    }
    writeln!(
        out,
        "Retention: max {} files, keep {} after eviction",
        retention.max_files(),
        retention.retain_after_evict()
    )?;

    let pending = spool.pending_files()?;
    writeln!(out, "Pending events: {}", pending.len())?;
    if let (Some(oldest), Some(newest)) = (pending.first(), pending.last()) {
        writeln!(out, "Oldest: {}", file_name(oldest))?;
        writeln!(out, "Newest: {}", file_name(newest))?;
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostagent_events::{AgentInfo, ParamValue, SpoolConfig, TelemetryEvent};
    use tempfile::TempDir;

    fn bound_reporter(temp: &TempDir) -> EventReporter {
        let agent = AgentInfo::new("HostAgent", "3.1.0");
        let reporter = EventReporter::new(agent, SpoolConfig::default());
        reporter.init_event_logger(temp.path().join("events"));
        reporter
    }

    fn status_of(reporter: &EventReporter) -> String {
        let mut out = Vec::new();
        run(Command::Status, reporter, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn only_event(reporter: &EventReporter) -> TelemetryEvent {
        let files = reporter.spool().pending_files().unwrap();
        assert_eq!(files.len(), 1);
        TelemetryEvent::from_json(&std::fs::read_to_string(&files[0]).unwrap()).unwrap()
    }

    #[test]
    fn test_add_maps_every_flag() {
        let temp = TempDir::new().unwrap();
        let reporter = bound_reporter(&temp);

        let command = Command::Add {
            name: "MyExt".to_string(),
            operation: "Enable".to_string(),
            failed: true,
            duration: 250,
            ext_version: Some("1.4.2".to_string()),
            message: "exit code 3".to_string(),
            event_type: "VmExtension".to_string(),
            internal: true,
            quiet: true,
        };
        run(command, &reporter, &mut std::io::sink()).unwrap();

        let event = only_event(&reporter);
        assert_eq!(event.param("Name").and_then(ParamValue::as_str), Some("MyExt"));
        assert_eq!(event.param("Version").and_then(ParamValue::as_str), Some("1.4.2"));
        assert_eq!(event.param("IsInternal").and_then(ParamValue::as_bool), Some(true));
        assert_eq!(event.param("Operation").and_then(ParamValue::as_str), Some("Enable"));
        assert_eq!(event.param("OperationSuccess").and_then(ParamValue::as_bool), Some(false));
        assert_eq!(event.param("Message").and_then(ParamValue::as_str), Some("exit code 3"));
        assert_eq!(event.param("Duration").and_then(ParamValue::as_int), Some(250));
        assert_eq!(event.param("ExtensionType").and_then(ParamValue::as_str), Some("VmExtension"));
    }

    #[test]
    fn test_report_uses_agent_identity() {
        let temp = TempDir::new().unwrap();
        let reporter = bound_reporter(&temp);

        let command = Command::Report {
            operation: hostagent_events::EventOperation::Provision,
            failed: false,
            message: "provisioned".to_string(),
        };
        run(command, &reporter, &mut std::io::sink()).unwrap();

        let event = only_event(&reporter);
        assert_eq!(event.param("Name").and_then(ParamValue::as_str), Some("HostAgent"));
        assert_eq!(event.param("Version").and_then(ParamValue::as_str), Some("3.1.0"));
        assert_eq!(event.param("Operation").and_then(ParamValue::as_str), Some("Provision"));
    }

    #[test]
    fn test_status_of_empty_spool() {
        let temp = TempDir::new().unwrap();
        let reporter = bound_reporter(&temp);

        let status = status_of(&reporter);
        assert!(status.contains("Event directory: "));
        assert!(status.contains("Retention: max 1000 files, keep 999 after eviction"));
        assert!(status.contains("Pending events: 0"));
        assert!(!status.contains("Oldest"));
    }

    #[test]
    fn test_status_lists_oldest_and_newest() {
        let temp = TempDir::new().unwrap();
        let reporter = bound_reporter(&temp);
        reporter.report_event("HeartBeat", true, "");
        reporter.report_event("HeartBeat", true, "");

        let files = reporter.spool().pending_files().unwrap();
        let status = status_of(&reporter);
        assert!(status.contains("Pending events: 2"));
        assert!(status.contains(&format!("Oldest: {}", file_name(&files[0]))));
        assert!(status.contains(&format!("Newest: {}", file_name(&files[1]))));
    }

    #[test]
    fn test_status_of_unbound_reporter() {
        let reporter = EventReporter::new(AgentInfo::default(), SpoolConfig::default());
        assert!(status_of(&reporter).contains("(not initialized)"));
    }
}
