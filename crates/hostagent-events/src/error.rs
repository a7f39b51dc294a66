//! Error types for hostagent-events
//!
//! Persistence failures are typed so the reporting facade can log exactly
//! which filesystem step failed before dropping the event.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while persisting an event to the spool
#[derive(Debug, Error)]
pub enum EventPersistError {
    /// The spool directory could not be created
    #[error("failed to create event directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The spool directory could not be listed
    #[error("failed to list event directory {}: {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An old event file could not be removed during eviction
    #[error("failed to remove old event file {}: {source}", .path.display())]
    Evict {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The temporary event file could not be written
    #[error("failed to write events to file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The temporary event file could not be renamed to its final name
    #[error("failed to rename {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The event record could not be serialized
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventPersistError {
    /// The filesystem path involved in the failure, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::CreateDir { path, .. }
            | Self::List { path, .. }
            | Self::Evict { path, .. }
            | Self::Write { path, .. } => Some(path),
            Self::Rename { from, .. } => Some(from),
            Self::Serialization(_) => None,
        }
    }

    /// The underlying I/O error kind, if the failure came from the filesystem
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::CreateDir { source, .. }
            | Self::List { source, .. }
            | Self::Evict { source, .. }
            | Self::Write { source, .. }
            | Self::Rename { source, .. } => Some(source.kind()),
            Self::Serialization(_) => None,
        }
    }
}

/// Errors in spool configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The retention limits cannot keep the spool bounded
    #[error(
        "invalid retention policy: max_files={max_files}, retain_after_evict={retain_after_evict} \
         (need 0 < retain_after_evict + 1 <= max_files)"
    )]
    InvalidRetention {
        max_files: usize,
        retain_after_evict: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evict_error_carries_path_and_kind() {
        let err = EventPersistError::Evict {
            path: PathBuf::from("/var/lib/agent/events/1.tld"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.path(), Some(Path::new("/var/lib/agent/events/1.tld")));
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
        assert!(err.to_string().contains("1.tld"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_rename_error_mentions_both_paths() {
        let err = EventPersistError::Rename {
            from: PathBuf::from("/spool/10.tmp"),
            to: PathBuf::from("/spool/10.tld"),
            source: io::Error::other("boom"),
        };
        let message = err.to_string();
        assert!(message.contains("10.tmp"));
        assert!(message.contains("10.tld"));
        assert_eq!(err.path(), Some(Path::new("/spool/10.tmp")));
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: EventPersistError = json_err.into();
        assert!(matches!(err, EventPersistError::Serialization(_)));
        assert!(err.path().is_none());
        assert!(err.io_kind().is_none());
    }
}
