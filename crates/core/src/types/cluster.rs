//! Managed cluster records as reported by the cloud provider.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a managed cluster.
///
/// Maps to GKE's `Cluster.status` values. States the bot does not know about
/// are kept verbatim in [`ClusterStatus::Other`] so they can still be shown
/// to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ClusterStatus {
    #[default]
    StatusUnspecified,
    Provisioning,
    Running,
    Reconciling,
    Stopping,
    Error,
    Degraded,
    /// Any state string not covered above.
    Other(String),
}

impl ClusterStatus {
    /// Returns the provider's string form of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::StatusUnspecified => "STATUS_UNSPECIFIED",
            Self::Provisioning => "PROVISIONING",
            Self::Running => "RUNNING",
            Self::Reconciling => "RECONCILING",
            Self::Stopping => "STOPPING",
            Self::Error => "ERROR",
            Self::Degraded => "DEGRADED",
            Self::Other(s) => s,
        }
    }

    /// Whether a cluster in this state can be offered for deletion.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl From<String> for ClusterStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "STATUS_UNSPECIFIED" => Self::StatusUnspecified,
            "PROVISIONING" => Self::Provisioning,
            "RUNNING" => Self::Running,
            "RECONCILING" => Self::Reconciling,
            "STOPPING" => Self::Stopping,
            "ERROR" => Self::Error,
            "DEGRADED" => Self::Degraded,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ClusterStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<ClusterStatus> for String {
    fn from(status: ClusterStatus) -> Self {
        match status {
            ClusterStatus::Other(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cluster from the provider's inventory.
///
/// Only the fields the bot needs are kept; everything else in the provider's
/// response is ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Cluster name, unique within its location.
    pub name: String,
    /// Zone or region the cluster lives in.
    pub location: String,
    /// Current lifecycle state.
    #[serde(default)]
    pub status: ClusterStatus,
}

impl ClusterRecord {
    /// Create a new cluster record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        status: impl Into<ClusterStatus>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            status: status.into(),
        }
    }
}
