//! Well-known agent operations reported as the `Operation` parameter

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Operations the agent reports about itself and the extensions it manages
///
/// Any string is accepted as an operation by the reporter; these are the
/// names the uploader side knows how to group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventOperation {
    ActivateResourceDisk,
    Disable,
    Download,
    Enable,
    HealthCheck,
    HeartBeat,
    Install,
    InitializeHostPlugin,
    ProcessGoalState,
    Provision,
    ReportStatus,
    Restart,
    UnhandledError,
    UnInstall,
    Upgrade,
    Update,
}

impl EventOperation {
    /// Every known operation, in declaration order
    pub const ALL: [EventOperation; 16] = [
        Self::ActivateResourceDisk,
        Self::Disable,
        Self::Download,
        Self::Enable,
        Self::HealthCheck,
        Self::HeartBeat,
        Self::Install,
        Self::InitializeHostPlugin,
        Self::ProcessGoalState,
        Self::Provision,
        Self::ReportStatus,
        Self::Restart,
        Self::UnhandledError,
        Self::UnInstall,
        Self::Upgrade,
        Self::Update,
    ];

    /// The wire name of the operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActivateResourceDisk => "ActivateResourceDisk",
            Self::Disable => "Disable",
            Self::Download => "Download",
            Self::Enable => "Enable",
            Self::HealthCheck => "HealthCheck",
            Self::HeartBeat => "HeartBeat",
            Self::Install => "Install",
            Self::InitializeHostPlugin => "InitializeHostPlugin",
            Self::ProcessGoalState => "ProcessGoalState",
            Self::Provision => "Provision",
            Self::ReportStatus => "ReportStatus",
            Self::Restart => "Restart",
            Self::UnhandledError => "UnhandledError",
            Self::UnInstall => "UnInstall",
            Self::Upgrade => "Upgrade",
            Self::Update => "Update",
        }
    }
}

impl AsRef<str> for EventOperation {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EventOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known operation names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for EventOperation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for op in EventOperation::ALL {
            assert_eq!(op.as_str().parse::<EventOperation>(), Ok(op));
        }
    }

    #[test]
    fn test_unknown_operation() {
        let err = "Reboot".parse::<EventOperation>().unwrap_err();
        assert_eq!(err, UnknownOperation("Reboot".to_string()));
        assert_eq!(err.to_string(), "unknown operation: Reboot");
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(EventOperation::UnhandledError.to_string(), "UnhandledError");
        assert_eq!(EventOperation::UnInstall.as_ref(), "UnInstall");
    }
}
