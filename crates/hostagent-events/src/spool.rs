//! On-disk event spool
//!
//! Each accepted payload becomes one file named after the current time in
//! microseconds. Payloads are written to `<stamp>.tmp` and renamed to
//! `<stamp>.tld`, so a reader scanning for `.tld` files never sees a partial
//! event. The number of `.tld` files is bounded by the [`RetentionPolicy`].
//!
//! One lock per spool covers the bound directory and the whole
//! list → evict → write sequence. Concurrent callers therefore cannot both
//! pass the capacity check, and eviction never removes a file that another
//! caller of the same spool is still writing.

use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::EventPersistError;
use crate::fs::{OsFs, SpoolFs};
use crate::retention::RetentionPolicy;

/// Extension of finished event files
pub const FINAL_EXTENSION: &str = "tld";

/// Extension of event files still being written
pub const TEMP_EXTENSION: &str = "tmp";

/// Configuration for an event spool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// Limits on the number of finished files
    pub retention: RetentionPolicy,
    /// Whether to fsync each event file before renaming it
    pub sync_on_write: bool,
    /// Permission bits for the spool directory when it is created
    pub dir_mode: u32,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            retention: RetentionPolicy::default(),
            sync_on_write: true,
            dir_mode: 0o700,
        }
    }
}

/// Result of a persist call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The payload was written to this final path
    Written(PathBuf),
    /// The spool has no directory bound yet; nothing was written
    Skipped,
}

#[derive(Debug, Default)]
struct SpoolState {
    event_dir: Option<PathBuf>,
    last_stamp: i64,
}

impl SpoolState {
    /// Microsecond stamp for the next file, strictly after the previous one
    fn next_stamp(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_micros();
        let stamp = now.max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }
}

/// Directory-backed event spool
pub struct EventSpool<F: SpoolFs = OsFs> {
    config: SpoolConfig,
    fs: F,
    state: Mutex<SpoolState>,
}

impl EventSpool<OsFs> {
    /// Create an unbound spool on the real filesystem
    pub fn new(config: SpoolConfig) -> Self {
        Self::with_fs(config, OsFs)
    }
}

impl Default for EventSpool<OsFs> {
    fn default() -> Self {
        Self::new(SpoolConfig::default())
    }
}

impl<F: SpoolFs> EventSpool<F> {
    /// Create an unbound spool over a custom filesystem
    pub fn with_fs(config: SpoolConfig, fs: F) -> Self {
        Self {
            config,
            fs,
            state: Mutex::new(SpoolState::default()),
        }
    }

    /// Bind the spool to `event_dir`
    ///
    /// No I/O happens here; the directory is created by the first write.
    /// Binding again replaces the previous directory.
    pub fn initialize(&self, event_dir: impl Into<PathBuf>) {
        let event_dir = event_dir.into();
        debug!(path = %event_dir.display(), "Event spool bound");
        self.state.lock().event_dir = Some(event_dir);
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().event_dir.is_some()
    }

    /// The bound directory, if any
    pub fn event_dir(&self) -> Option<PathBuf> {
        self.state.lock().event_dir.clone()
    }

    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    /// Durably write one serialized event
    ///
    /// Returns [`PersistOutcome::Skipped`] with a warning when the spool is
    /// not bound. On an eviction failure the new event is not written.
    #[instrument(skip_all, fields(size = payload.len()))]
    pub fn persist(&self, payload: &str) -> Result<PersistOutcome, EventPersistError> {
        let mut state = self.state.lock();

        let Some(dir) = state.event_dir.clone() else {
            warn!("Event reporter is not initialized.");
            return Ok(PersistOutcome::Skipped);
        };

        if !self.fs.dir_exists(&dir) {
            self.fs
                .create_dir(&dir, self.config.dir_mode)
                .map_err(|source| EventPersistError::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
            debug!(path = %dir.display(), "Created event directory");
        }

        let existing = self.finished_names(&dir)?;
        let oldest = self.config.retention.select_for_eviction(&existing);
        if !oldest.is_empty() {
            warn!(
                path = %dir.display(),
                count = existing.len(),
                removing = oldest.len(),
                "Too many files under event directory, removing oldest"
            );
            for name in oldest {
                self.evict(&dir.join(name))?;
            }
        }

        let stamp = state.next_stamp();
        let final_path = dir.join(format!("{}.{}", stamp, FINAL_EXTENSION));
        let temp_path = final_path.with_extension(TEMP_EXTENSION);

        if let Err(source) =
            self.fs
                .write_file(&temp_path, payload.as_bytes(), self.config.sync_on_write)
        {
            self.discard_temp(&temp_path);
            return Err(EventPersistError::Write {
                path: temp_path,
                source,
            });
        }

        if let Err(source) = self.fs.rename(&temp_path, &final_path) {
            self.discard_temp(&temp_path);
            return Err(EventPersistError::Rename {
                from: temp_path,
                to: final_path,
                source,
            });
        }

        // The rename already happened, so a sync failure is only logged.
        if self.config.sync_on_write
            && let Err(e) = self.fs.sync_dir(&dir)
        {
            warn!(path = %dir.display(), error = %e, "Failed to sync event directory");
        }

        debug!(path = %final_path.display(), "Event persisted");
        Ok(PersistOutcome::Written(final_path))
    }

    /// Finished event files, oldest first
    ///
    /// Empty when the spool is unbound or its directory does not exist yet.
    pub fn pending_files(&self) -> Result<Vec<PathBuf>, EventPersistError> {
        let state = self.state.lock();
        let Some(dir) = state.event_dir.as_ref() else {
            return Ok(Vec::new());
        };
        if !self.fs.dir_exists(dir) {
            return Ok(Vec::new());
        }
        Ok(self
            .finished_names(dir)?
            .into_iter()
            .map(|name| dir.join(name))
            .collect())
    }

    /// Names of `.tld` files in `dir`, sorted ascending
    fn finished_names(&self, dir: &Path) -> Result<Vec<String>, EventPersistError> {
        let suffix = format!(".{}", FINAL_EXTENSION);
        let mut names: Vec<String> = self
            .fs
            .list_dir(dir)
            .map_err(|source| EventPersistError::List {
                path: dir.to_path_buf(),
                source,
            })?
            .into_iter()
            .filter(|name| name.ends_with(&suffix))
            .collect();
        names.sort();
        Ok(names)
    }

    fn evict(&self, path: &Path) -> Result<(), EventPersistError> {
        match self.fs.remove_file(path) {
            Ok(()) => Ok(()),
            // Already picked up by the uploader.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(EventPersistError::Evict {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn discard_temp(&self, temp_path: &Path) {
        if let Err(e) = self.fs.remove_file(temp_path)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %temp_path.display(), error = %e, "Failed to remove temporary event file");
        }
    }
}
