//! Identity of the reporting agent

use chrono::{DateTime, Utc};

/// Name and version the agent reports about itself
///
/// Supplied by whatever owns version metadata in the host process; the
/// reporter only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInfo {
    name: String,
    version: String,
}

impl AgentInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Default for AgentInfo {
    fn default() -> Self {
        Self::new("HostAgent", env!("CARGO_PKG_VERSION"))
    }
}

/// Whole milliseconds elapsed since `start`, for the `Duration` parameter
///
/// Negative when `start` lies in the future.
pub fn elapsed_milliseconds(start: DateTime<Utc>) -> i64 {
    (Utc::now() - start).num_milliseconds()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_agent_info_accessors() {
        let agent = AgentInfo::new("WALinuxAgent", "2.2.53");
        assert_eq!(agent.name(), "WALinuxAgent");
        assert_eq!(agent.version(), "2.2.53");
    }

    #[test]
    fn test_default_uses_crate_version() {
        let agent = AgentInfo::default();
        assert_eq!(agent.version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_elapsed_milliseconds() {
        let start = Utc::now() - Duration::milliseconds(1500);
        let elapsed = elapsed_milliseconds(start);
        assert!(elapsed >= 1500);
        assert!(elapsed < 60_000);
    }
}
