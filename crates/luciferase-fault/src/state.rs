//! Per-partition state tracked by the fault detector (§3 Partition state).

use std::collections::{HashMap, HashSet};

use luciferase_types::{NodeId, PartitionMetrics, PartitionStatus};

/// Mutable bookkeeping for a single partition's health.
#[derive(Debug, Clone)]
pub struct PartitionState {
    pub status: PartitionStatus,
    pub consecutive_barrier_timeouts: u32,
    pub consecutive_sync_failures: u32,
    pub suspected_at_ms: Option<u64>,
    pub last_seen_ms: u64,
    pub failed_nodes: HashSet<NodeId>,
    pub node_last_heartbeat: HashMap<NodeId, u64>,
    pub total_nodes: u32,
    pub metrics: PartitionMetrics,
}

impl PartitionState {
    #[must_use]
    pub fn new(now_ms: u64) -> Self {
        Self {
            status: PartitionStatus::Healthy,
            consecutive_barrier_timeouts: 0,
            consecutive_sync_failures: 0,
            suspected_at_ms: None,
            last_seen_ms: now_ms,
            failed_nodes: HashSet::new(),
            node_last_heartbeat: HashMap::new(),
            total_nodes: 1,
            metrics: PartitionMetrics::default(),
        }
    }

    /// Majority of this partition's nodes have missed a heartbeat.
    #[must_use]
    pub fn majority_nodes_failed(&self) -> bool {
        self.total_nodes > 0 && self.failed_nodes.len() as u32 > self.total_nodes / 2
    }

    pub fn reset_suspicion_counters(&mut self) {
        self.consecutive_barrier_timeouts = 0;
        self.consecutive_sync_failures = 0;
        self.suspected_at_ms = None;
        self.failed_nodes.clear();
    }
}

/// Read-only snapshot handed out by `get_partition_view`.
#[derive(Debug, Clone)]
pub struct PartitionView {
    pub status: PartitionStatus,
    pub consecutive_barrier_timeouts: u32,
    pub consecutive_sync_failures: u32,
    pub failed_node_count: usize,
    pub metrics: PartitionMetrics,
}

impl From<&PartitionState> for PartitionView {
    fn from(state: &PartitionState) -> Self {
        Self {
            status: state.status,
            consecutive_barrier_timeouts: state.consecutive_barrier_timeouts,
            consecutive_sync_failures: state.consecutive_sync_failures,
            failed_node_count: state.failed_nodes.len(),
            metrics: state.metrics,
        }
    }
}
