//! Recovery phase machine types (§4.5).

use std::collections::HashMap;

use luciferase_types::PartitionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A partition's recovery progress. Active iff not `Idle`, `Complete` or
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryPhase {
    Idle,
    Detecting,
    Redistributing,
    Rebalancing,
    Validating,
    Complete,
    Failed,
}

impl RecoveryPhase {
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for RecoveryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Detecting => "DETECTING",
            Self::Redistributing => "REDISTRIBUTING",
            Self::Rebalancing => "REBALANCING",
            Self::Validating => "VALIDATING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Per-partition recovery bookkeeping, owned by the orchestrator for the
/// duration of an active recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryState {
    pub partition_id: PartitionId,
    pub phase: RecoveryPhase,
    pub attempts: u32,
    pub last_attempt_ms: u64,
    pub metadata: HashMap<String, Value>,
}

impl RecoveryState {
    #[must_use]
    pub fn new(partition_id: PartitionId) -> Self {
        Self {
            partition_id,
            phase: RecoveryPhase::Idle,
            attempts: 0,
            last_attempt_ms: 0,
            metadata: HashMap::new(),
        }
    }
}

/// Outcome of one `recover()` call, reported back across the async boundary
/// instead of an exception (§7, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub partition_id: PartitionId,
    pub success: bool,
    pub duration_ms: u64,
    pub strategy: String,
    pub attempts_needed: u32,
    pub status_message: String,
    pub failure_reason: Option<String>,
}
