//! Shared partition identity and metrics types (§3 Partition state).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a partition, independent of its current rank
/// assignment.
pub type PartitionId = Uuid;

/// Identity of a single node (process/worker) inside a partition, used for
/// heartbeat tracking.
pub type NodeId = Uuid;

/// Lifecycle status of a partition as observed by the fault detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionStatus {
    Healthy,
    Suspected,
    Failed,
    Recovering,
    /// Reserved: partitions do not currently transition into this state.
    /// See Open Questions in DESIGN.md.
    Degraded,
}

impl PartitionStatus {
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for PartitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Healthy => "HEALTHY",
            Self::Suspected => "SUSPECTED",
            Self::Failed => "FAILED",
            Self::Recovering => "RECOVERING",
            Self::Degraded => "DEGRADED",
        };
        f.write_str(s)
    }
}

/// Rolling metrics for a single partition (§3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionMetrics {
    pub detection_latency_ms: u64,
    pub recovery_latency_ms: u64,
    pub failure_count: u32,
    pub recovery_attempts: u32,
    pub successful_recoveries: u32,
    pub failed_recoveries: u32,
}

impl PartitionMetrics {
    #[must_use]
    pub fn recovery_success_rate(&self) -> f64 {
        let total = self.successful_recoveries + self.failed_recoveries;
        if total == 0 {
            1.0
        } else {
            f64::from(self.successful_recoveries) / f64::from(total)
        }
    }
}
