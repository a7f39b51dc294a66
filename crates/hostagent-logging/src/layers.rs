//! Output layers
//!
//! Every output is boxed over the bare [`Registry`] so the builder can stack
//! console, file and capture outputs in one `Vec`.

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{Layer, Registry};

use crate::config::{ConsoleFormat, JsonFields};

pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// One flattened JSON object per event, written to `writer`
///
/// Event fields sit at the top level next to `level` and `message`, which is
/// what [`LogCapture`](crate::LogCapture) relies on.
pub fn json_layer<W>(writer: W, fields: &JsonFields) -> BoxedLayer
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(fields.spans)
        .with_span_list(fields.spans)
        .with_thread_ids(fields.thread)
        .with_thread_names(fields.thread)
        .with_file(fields.source_location)
        .with_line_number(fields.source_location)
        .with_writer(writer)
        .boxed()
}

/// Stdout layer for `format`, or `None` when the console is off
pub fn console_layer(
    format: ConsoleFormat,
    ansi: bool,
    fields: &JsonFields,
) -> Option<BoxedLayer> {
    match format {
        ConsoleFormat::Off => None,
        ConsoleFormat::Json => Some(json_layer(std::io::stdout, fields)),
        ConsoleFormat::Pretty => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .boxed(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::LogCapture;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_json_layer_flattens_fields() {
        let capture = LogCapture::new();
        let layer = json_layer(capture.clone(), &JsonFields::default());
        let subscriber = Registry::default().with(vec![layer]);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(count = 1000, removing = 1, "spool full");
        });

        let lines = capture.records();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "WARN");
        assert_eq!(lines[0]["message"], "spool full");
        assert_eq!(lines[0]["count"], 1000);
        assert!(lines[0].get("filename").is_some());
    }

    #[test]
    fn test_source_location_can_be_dropped() {
        let capture = LogCapture::new();
        let fields = JsonFields {
            source_location: false,
            ..JsonFields::default()
        };
        let subscriber = Registry::default().with(vec![json_layer(capture.clone(), &fields)]);

        tracing::subscriber::with_default(subscriber, || tracing::info!("bound"));

        let lines = capture.records();
        assert!(lines[0].get("filename").is_none());
        assert!(lines[0].get("line_number").is_none());
    }

    #[test]
    fn test_console_off_builds_nothing() {
        let fields = JsonFields::default();
        assert!(console_layer(ConsoleFormat::Off, false, &fields).is_none());
        assert!(console_layer(ConsoleFormat::Json, false, &fields).is_some());
        assert!(console_layer(ConsoleFormat::Pretty, true, &fields).is_some());
    }
}
