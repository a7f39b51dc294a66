//! Unhandled-error capture
//!
//! A panic hook stashes a [`CrashContext`] in a [`CrashRecorder`]. The
//! [`UnhandledErrorDump`] guard, held by `main` for the life of the
//! process, reports the stashed crash as a failed `UnhandledError` event only
//! when it is dropped while a panic unwinds through it. Panics that were
//! caught or contained in a joined worker are discarded at a clean exit.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::event::EventArgs;
use crate::fs::{OsFs, SpoolFs};
use crate::operation::EventOperation;
use crate::reporter::EventReporter;

/// What is known about a crash at the point it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashContext {
    pub kind: String,
    pub message: String,
    pub location: Option<String>,
    pub backtrace: String,
}

impl CrashContext {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            location: None,
            backtrace: String::new(),
        }
    }

    /// Capture the panic payload, location, and a backtrace
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let thread = std::thread::current();
        Self {
            kind: format!("panic in thread '{}'", thread.name().unwrap_or("<unnamed>")),
            message: payload_message(info.payload()),
            location: info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
            backtrace: Backtrace::force_capture().to_string(),
        }
    }

    /// Multi-line text used as the event message
    pub fn format(&self) -> String {
        let mut text = format!("{}: {}", self.kind, self.message);
        if let Some(location) = &self.location {
            text.push_str(&format!("\n  at {}", location));
        }
        if !self.backtrace.is_empty() {
            text.push_str("\nstack backtrace:\n");
            text.push_str(&self.backtrace);
        }
        text
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Holds the most recent crash until it is reported
#[derive(Debug, Default)]
pub struct CrashRecorder {
    last: Mutex<Option<CrashContext>>,
    hook_installed: AtomicBool,
    dump_registered: AtomicBool,
}

impl CrashRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stash `context`, replacing any earlier unreported crash
    pub fn record(&self, context: CrashContext) {
        *self.last.lock() = Some(context);
    }

    /// Remove and return the stashed crash
    pub fn take(&self) -> Option<CrashContext> {
        self.last.lock().take()
    }

    pub fn has_crash(&self) -> bool {
        self.last.lock().is_some()
    }

    /// Install a panic hook that records into this recorder
    ///
    /// The previous hook still runs afterwards. Returns `false` if this
    /// recorder already installed its hook.
    pub fn install_panic_hook(self: &Arc<Self>) -> bool {
        if self.hook_installed.swap(true, Ordering::SeqCst) {
            return false;
        }

        let recorder = Arc::clone(self);
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            recorder.record(CrashContext::from_panic(info));
            previous(info);
        }));
        true
    }
}

/// Report a stashed crash as a failed `UnhandledError` event for `name`
///
/// Returns whether a crash was reported.
pub fn dump_unhandled_err<F: SpoolFs>(
    reporter: &EventReporter<F>,
    recorder: &CrashRecorder,
    name: &str,
) -> bool {
    let Some(crash) = recorder.take() else {
        return false;
    };
    reporter.add_event(
        EventArgs::new(name)
            .operation(EventOperation::UnhandledError)
            .success(false)
            .message(crash.format()),
    );
    true
}

/// Exit-time guard that reports a recorded crash when dropped during unwinding
pub struct UnhandledErrorDump<F: SpoolFs = OsFs> {
    reporter: Arc<EventReporter<F>>,
    recorder: Arc<CrashRecorder>,
    name: String,
}

impl<F: SpoolFs> UnhandledErrorDump<F> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F: SpoolFs> Drop for UnhandledErrorDump<F> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            dump_unhandled_err(&*self.reporter, &self.recorder, &self.name);
        } else if let Some(crash) = self.recorder.take() {
            debug!(
                kind = %crash.kind,
                message = %crash.message,
                "Discarding panic that did not end the process"
            );
        }
    }
}

/// Install the panic hook and return the exit-time guard
///
/// Only the first registration per recorder yields a guard; later calls
/// return `None` so a crash is never reported twice.
pub fn enable_unhandled_err_dump<F: SpoolFs>(
    reporter: Arc<EventReporter<F>>,
    recorder: Arc<CrashRecorder>,
    name: impl Into<String>,
) -> Option<UnhandledErrorDump<F>> {
    if recorder.dump_registered.swap(true, Ordering::SeqCst) {
        debug!("Unhandled error dump already registered");
        return None;
    }

    recorder.install_panic_hook();
    Some(UnhandledErrorDump {
        reporter,
        recorder,
        name: name.into(),
    })
}
