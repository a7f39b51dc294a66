//! In-memory log capture for tests
//!
//! [`LogCapture::subscriber`] formats events as flattened JSON into a shared
//! buffer. Scope it with `tracing::subscriber::with_default` and then query
//! what was logged by level and message.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{Level, Subscriber};
use tracing_subscriber::Registry;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

use crate::config::JsonFields;
use crate::layers::json_layer;

/// Shared buffer that a capture subscriber writes into
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

/// One decoded log line
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedEvent {
    pub level: String,
    pub message: String,
    /// The whole JSON object, including structured fields
    pub record: Value,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A subscriber that writes every event at any level into this capture
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        let fields = JsonFields {
            spans: false,
            thread: false,
            source_location: false,
        };
        Registry::default().with(vec![json_layer(self.clone(), &fields)])
    }

    /// Every captured line that parses as JSON, in order
    pub fn records(&self) -> Vec<Value> {
        let buffer = self.buffer.lock();
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.records()
            .into_iter()
            .map(|record| CapturedEvent {
                level: record["level"].as_str().unwrap_or_default().to_string(),
                message: record["message"].as_str().unwrap_or_default().to_string(),
                record,
            })
            .collect()
    }

    /// Messages logged at exactly `level`
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        let level = level.as_str();
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .map(|event| event.message)
            .collect()
    }

    /// Whether some message at `level` contains `needle`
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages_at(level).iter().any(|m| m.contains(needle))
    }

    pub fn reset(&self) {
        self.buffer.lock().clear();
    }
}

/// Per-event writer handed out by [`LogCapture`]
pub struct CaptureSink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureSink;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureSink {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_non_json_lines_are_skipped() {
        let capture = LogCapture::new();
        {
            let mut sink = capture.make_writer();
            writeln!(sink, "plain text").unwrap();
            writeln!(sink, r#"{{"level":"WARN","message":"spool full"}}"#).unwrap();
        }

        let events = capture.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, "WARN");
        assert_eq!(events[0].message, "spool full");
    }

    #[test]
    fn test_subscriber_sorts_by_level() {
        let capture = LogCapture::new();

        tracing::subscriber::with_default(capture.subscriber(), || {
            tracing::info!("event spooled");
            tracing::warn!(path = "/tmp/events", "Event reporter is not initialized.");
            tracing::error!("rename failed");
        });

        assert_eq!(capture.messages_at(Level::INFO), vec!["event spooled".to_string()]);
        assert!(capture.contains(Level::WARN, "not initialized"));
        assert!(capture.contains(Level::ERROR, "rename"));
        assert!(!capture.contains(Level::ERROR, "spooled"));
        assert_eq!(capture.events()[1].record["path"], "/tmp/events");
    }

    #[test]
    fn test_reset() {
        let capture = LogCapture::new();
        tracing::subscriber::with_default(capture.subscriber(), || tracing::debug!("x"));
        assert_eq!(capture.events().len(), 1);

        capture.reset();
        assert!(capture.records().is_empty());
    }
}
