//! The per-partition fault detector state machine (§4.4).
//!
//! `HEALTHY -> SUSPECTED -> FAILED -> RECOVERING -> HEALTHY`, driven entirely
//! by an injected [`TimeSource`] so tests can script exact timings instead of
//! sleeping. `DEGRADED` is reserved (§9 Open Questions) and never entered by
//! this state machine.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use luciferase_error::{LuciferaseError, Result};
use luciferase_types::{FaultToleranceConfig, NodeId, PartitionId, PartitionStatus, TimeSource};
use parking_lot::RwLock;

use crate::state::{PartitionState, PartitionView};

/// Emitted on every status transition, delivered to subscribers in the
/// order transitions occurred (best-effort across subscribers, per §5).
#[derive(Debug, Clone)]
pub struct PartitionChangeEvent {
    pub partition_id: PartitionId,
    pub old: PartitionStatus,
    pub new: PartitionStatus,
    pub ts_ms: u64,
    pub reason: String,
}

/// Subscriber to partition status transitions. A panicking implementation is
/// caught and logged rather than allowed to corrupt a transition in
/// progress — the Rust analogue of §9's "listener exceptions never affect
/// transitions".
pub trait PartitionChangeListener: Send + Sync {
    fn on_change(&self, event: &PartitionChangeEvent);
}

pub type SubscriptionId = u64;

/// Per-partition fault detector. One instance is shared across a forest;
/// partitions are created lazily on first observation.
pub struct FaultDetector {
    clock: Arc<dyn TimeSource>,
    config: FaultToleranceConfig,
    partitions: RwLock<HashMap<PartitionId, PartitionState>>,
    recovery_locks: RwLock<HashMap<PartitionId, ()>>,
    listeners: RwLock<Vec<(SubscriptionId, Arc<dyn PartitionChangeListener>)>>,
    next_subscription_id: std::sync::atomic::AtomicU64,
}

impl FaultDetector {
    #[must_use]
    pub fn new(clock: Arc<dyn TimeSource>, config: FaultToleranceConfig) -> Self {
        Self {
            clock,
            config,
            partitions: RwLock::new(HashMap::new()),
            recovery_locks: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            next_subscription_id: std::sync::atomic::AtomicU64::new(0),
        }
    }

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn emit(&self, partition_id: PartitionId, old: PartitionStatus, new: PartitionStatus, reason: &str) {
        if old == new {
            return;
        }
        let event = PartitionChangeEvent {
            partition_id,
            old,
            new,
            ts_ms: self.now(),
            reason: reason.to_string(),
        };
        tracing::info!(?partition_id, %old, %new, reason, "partition status transition");
        for (_, listener) in self.listeners.read().iter() {
            let listener = listener.clone();
            let event = event.clone();
            if panic::catch_unwind(AssertUnwindSafe(|| listener.on_change(&event))).is_err() {
                tracing::error!(?partition_id, "partition change listener panicked");
            }
        }
    }

    fn with_partition_mut<R>(&self, partition_id: PartitionId, f: impl FnOnce(&mut PartitionState) -> R) -> R {
        let now = self.now();
        let mut guard = self.partitions.write();
        let state = guard.entry(partition_id).or_insert_with(|| PartitionState::new(now));
        f(state)
    }

    /// Current status, creating a `HEALTHY` entry if this partition has
    /// never been observed before.
    pub fn check_health(&self, partition_id: PartitionId) -> PartitionStatus {
        self.with_partition_mut(partition_id, |state| state.status)
    }

    /// Force a partition back to `HEALTHY` regardless of its current state,
    /// clearing suspicion counters. Used both for `SUSPECTED -> HEALTHY` and
    /// an operator-driven `FAILED -> HEALTHY` override.
    pub fn mark_healthy(&self, partition_id: PartitionId) {
        let (old, new) = self.with_partition_mut(partition_id, |state| {
            let old = state.status;
            state.status = PartitionStatus::Healthy;
            state.reset_suspicion_counters();
            (old, PartitionStatus::Healthy)
        });
        self.emit(partition_id, old, new, "markHealthy");
    }

    fn maybe_suspect(&self, partition_id: PartitionId) {
        let (old, new, reason) = self.with_partition_mut(partition_id, |state| {
            let old = state.status;
            let mut reason = "";
            if old == PartitionStatus::Healthy {
                if state.consecutive_barrier_timeouts >= 2 {
                    reason = "Consecutive barrier timeouts exceeded threshold";
                } else if state.consecutive_sync_failures >= 2 {
                    reason = "Consecutive sync failures exceeded threshold";
                } else if state.majority_nodes_failed() {
                    reason = "Majority of partition nodes failed heartbeat";
                }
                if !reason.is_empty() {
                    state.status = PartitionStatus::Suspected;
                    state.suspected_at_ms = Some(self.now());
                }
            }
            (old, state.status, reason)
        });
        self.emit(partition_id, old, new, reason);
    }

    pub fn report_barrier_timeout(&self, partition_id: PartitionId) {
        self.with_partition_mut(partition_id, |state| state.consecutive_barrier_timeouts += 1);
        self.maybe_suspect(partition_id);
    }

    pub fn report_sync_failure(&self, partition_id: PartitionId) {
        self.with_partition_mut(partition_id, |state| state.consecutive_sync_failures += 1);
        self.maybe_suspect(partition_id);
    }

    pub fn report_heartbeat_success(&self, partition_id: PartitionId, node_id: NodeId) {
        let now = self.now();
        self.with_partition_mut(partition_id, |state| {
            state.node_last_heartbeat.insert(node_id, now);
            state.failed_nodes.remove(&node_id);
            state.last_seen_ms = now;
        });
    }

    pub fn report_heartbeat_failure(&self, partition_id: PartitionId, node_id: NodeId) {
        self.with_partition_mut(partition_id, |state| {
            state.failed_nodes.insert(node_id);
        });
        self.maybe_suspect(partition_id);
    }

    /// Set the number of nodes this partition is expected to run, used to
    /// evaluate the "majority of nodes failed heartbeat" suspicion trigger.
    pub fn set_total_nodes(&self, partition_id: PartitionId, total_nodes: u32) {
        self.with_partition_mut(partition_id, |state| state.total_nodes = total_nodes);
    }

    /// Periodic tick: confirm any partition that has been `SUSPECTED` for
    /// longer than `failure_confirmation_ms`.
    pub fn check_timeouts(&self) {
        let now = self.now();
        let failure_confirmation_ms = self.config.failure_confirmation_ms;
        let candidates: Vec<PartitionId> = {
            let guard = self.partitions.read();
            guard
                .iter()
                .filter_map(|(id, state)| {
                    let suspected_at = state.suspected_at_ms?;
                    (state.status == PartitionStatus::Suspected && now - suspected_at >= failure_confirmation_ms)
                        .then_some(*id)
                })
                .collect()
        };
        for partition_id in candidates {
            let (old, new) = self.with_partition_mut(partition_id, |state| {
                let old = state.status;
                state.status = PartitionStatus::Failed;
                state.metrics.failure_count += 1;
                (old, state.status)
            });
            self.emit(partition_id, old, new, "Suspicion window elapsed without recovery");
        }
    }

    /// Attempt to acquire the per-partition recovery lock and move
    /// `FAILED -> RECOVERING`. Returns `false` if the partition is not
    /// currently `FAILED` or the lock is already held.
    ///
    /// # Errors
    /// Returns [`LuciferaseError::RecoveryPreconditionFailed`] if the
    /// partition has never been observed.
    pub fn initiate_recovery(&self, partition_id: PartitionId) -> Result<bool> {
        let is_failed = {
            let guard = self.partitions.read();
            match guard.get(&partition_id) {
                Some(state) => state.status == PartitionStatus::Failed,
                None => {
                    return Err(LuciferaseError::RecoveryPreconditionFailed(
                        "partition has never been observed".into(),
                    ))
                }
            }
        };
        if !is_failed {
            return Ok(false);
        }
        let acquired = self.recovery_locks.write().insert(partition_id, ()).is_none();
        if !acquired {
            return Ok(false);
        }
        let (old, new) = self.with_partition_mut(partition_id, |state| {
            let old = state.status;
            state.status = PartitionStatus::Recovering;
            state.metrics.recovery_attempts += 1;
            (old, state.status)
        });
        self.emit(partition_id, old, new, "initiateRecovery acquired lock");
        Ok(true)
    }

    /// Release the recovery lock and transition `RECOVERING -> HEALTHY`
    /// (success) or `RECOVERING -> FAILED` (failure, eligible for another
    /// `initiate_recovery` up to `max_retries`).
    pub fn notify_recovery_complete(&self, partition_id: PartitionId, success: bool) {
        self.recovery_locks.write().remove(&partition_id);
        let (old, new) = self.with_partition_mut(partition_id, |state| {
            let old = state.status;
            if success {
                state.status = PartitionStatus::Healthy;
                state.reset_suspicion_counters();
                state.metrics.successful_recoveries += 1;
            } else {
                state.status = PartitionStatus::Failed;
                state.metrics.failed_recoveries += 1;
            }
            (old, state.status)
        });
        let reason = if success {
            "notifyRecoveryComplete(success=true)"
        } else {
            "notifyRecoveryComplete(success=false)"
        };
        self.emit(partition_id, old, new, reason);
    }

    pub fn subscribe_to_changes(&self, listener: Arc<dyn PartitionChangeListener>) -> SubscriptionId {
        let id = self
            .next_subscription_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.listeners.write().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) {
        self.listeners.write().retain(|(id, _)| *id != subscription);
    }

    #[must_use]
    pub fn get_partition_view(&self, partition_id: PartitionId) -> Option<PartitionView> {
        self.partitions.read().get(&partition_id).map(PartitionView::from)
    }

    #[must_use]
    pub fn get_metrics(&self, partition_id: PartitionId) -> Option<luciferase_types::PartitionMetrics> {
        self.partitions.read().get(&partition_id).map(|s| s.metrics)
    }
}
