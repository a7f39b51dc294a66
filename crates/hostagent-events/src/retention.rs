//! Retention policy for the event spool
//!
//! Bounds the number of finished event files kept on disk. When a write
//! finds the spool at or above `max_files`, the oldest files are dropped
//! until `retain_after_evict` remain, so the new file brings the count back
//! to at most `max_files`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default maximum number of finished event files
pub const DEFAULT_MAX_FILES: usize = 1000;

/// Default number of files kept after an eviction pass
pub const DEFAULT_RETAIN_AFTER_EVICT: usize = 999;

/// Oldest-first retention limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Eviction triggers when the finished-file count reaches this value
    max_files: usize,
    /// Files kept after eviction, before the new file is written
    retain_after_evict: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            retain_after_evict: DEFAULT_RETAIN_AFTER_EVICT,
        }
    }
}

impl RetentionPolicy {
    /// Create a policy with the given limits
    ///
    /// Call [`validate`](Self::validate) on policies that come from
    /// configuration.
    pub fn new(max_files: usize, retain_after_evict: usize) -> Self {
        Self {
            max_files,
            retain_after_evict,
        }
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn retain_after_evict(&self) -> usize {
        self.retain_after_evict
    }

    /// Reject limits under which a write could leave more than `max_files`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files == 0 || self.retain_after_evict >= self.max_files {
            return Err(ConfigError::InvalidRetention {
                max_files: self.max_files,
                retain_after_evict: self.retain_after_evict,
            });
        }
        Ok(())
    }

    /// Check if a spool holding `current_count` files must evict before writing
    pub fn would_exceed(&self, current_count: usize) -> bool {
        current_count >= self.max_files
    }

    /// How many files to remove from a spool holding `current_count` files
    pub fn evict_count(&self, current_count: usize) -> usize {
        if !self.would_exceed(current_count) {
            return 0;
        }
        // An over-large retain value would never make room for the new file.
        let keep = self
            .retain_after_evict
            .min(self.max_files.saturating_sub(1));
        current_count.saturating_sub(keep)
    }

    /// The files to evict from `sorted_names` (ascending, oldest first)
    pub fn select_for_eviction<'a>(&self, sorted_names: &'a [String]) -> &'a [String] {
        let count = self.evict_count(sorted_names.len());
        &sorted_names[..count]
    }
}

/// Builder for RetentionPolicy
#[derive(Debug, Default)]
pub struct RetentionPolicyBuilder {
    max_files: Option<usize>,
    retain_after_evict: Option<usize>,
}

impl RetentionPolicyBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file count that triggers eviction
    pub fn max_files(mut self, max: usize) -> Self {
        self.max_files = Some(max);
        self
    }

    /// Set the file count kept after eviction
    pub fn retain_after_evict(mut self, keep: usize) -> Self {
        self.retain_after_evict = Some(keep);
        self
    }

    /// Build and validate the policy
    ///
    /// When only `max_files` is set, eviction keeps `max_files - 1`.
    pub fn build(self) -> Result<RetentionPolicy, ConfigError> {
        let mut policy = RetentionPolicy::default();

        if let Some(max) = self.max_files {
            policy.max_files = max;
            policy.retain_after_evict = max.saturating_sub(1);
        }
        if let Some(keep) = self.retain_after_evict {
            policy.retain_after_evict = keep;
        }

        policy.validate()?;
        Ok(policy)
    }
}
