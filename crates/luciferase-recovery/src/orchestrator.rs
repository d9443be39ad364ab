//! The recovery phase machine (§4.5): quorum check, per-partition
//! semaphore, operation pause, redistribution, rebalance, ghost validation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use luciferase_error::{LuciferaseError, Result};
use luciferase_fault::FaultDetector;
use luciferase_forest::PartitionTopology;
use luciferase_types::{FaultToleranceConfig, PartitionId};
use parking_lot::RwLock;

use crate::barrier::OperationBarrier;
use crate::phase::{RecoveryPhase, RecoveryResult, RecoveryState};

/// Confirms whether a suspected-failed partition is genuinely unreachable,
/// probing other partitions (§4.5 step 4).
pub trait FailureProbe: Send + Sync {
    fn confirm_failure(&self, partition_id: PartitionId) -> bool;
}

/// Transfers ownership of a failed partition's keys to survivors (§4.5 step
/// 5). Spatial-proximity-preferring implementations live above this crate,
/// where the actual spatial index is in scope.
pub trait RedistributionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    /// Returns an error if redistribution could not complete.
    fn redistribute(&self, partition_id: PartitionId) -> Result<()>;
}

/// The external balancer invoked during REBALANCING (§4.5 step 6, §4.7).
pub trait Balancer: Send + Sync {
    /// # Errors
    /// Returns an error if the balance pass failed.
    fn rebalance(&self, partition_id: PartitionId) -> Result<()>;
}

/// Runs the ghost layer validator during VALIDATING (§4.5 step 7).
pub trait GhostValidationSource: Send + Sync {
    /// # Errors
    /// Returns [`LuciferaseError::GhostValidationFailed`] on any consistency
    /// violation.
    fn validate(&self) -> Result<()>;
}

/// Escalation hook for permanent quorum loss (§4.5 step 1).
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Coordinates one partition's recovery from `FAILED` through to `COMPLETE`
/// or `FAILED` (terminal), sharing the fault detector's per-partition
/// recovery lock and an operation pause barrier with ordinary index traffic.
pub struct RecoveryOrchestrator {
    config: FaultToleranceConfig,
    detector: Arc<FaultDetector>,
    topology: Arc<PartitionTopology>,
    barrier: Arc<OperationBarrier>,
    probe: Arc<dyn FailureProbe>,
    redistribution: Arc<dyn RedistributionStrategy>,
    balancer: Arc<dyn Balancer>,
    ghost_validation: Arc<dyn GhostValidationSource>,
    alert_sink: Option<Arc<dyn AlertSink>>,
    states: RwLock<HashMap<PartitionId, RecoveryState>>,
    cancel_requested: RwLock<HashSet<PartitionId>>,
}

impl RecoveryOrchestrator {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: FaultToleranceConfig,
        detector: Arc<FaultDetector>,
        topology: Arc<PartitionTopology>,
        barrier: Arc<OperationBarrier>,
        probe: Arc<dyn FailureProbe>,
        redistribution: Arc<dyn RedistributionStrategy>,
        balancer: Arc<dyn Balancer>,
        ghost_validation: Arc<dyn GhostValidationSource>,
        alert_sink: Option<Arc<dyn AlertSink>>,
    ) -> Self {
        Self {
            config,
            detector,
            topology,
            barrier,
            probe,
            redistribution,
            balancer,
            ghost_validation,
            alert_sink,
            states: RwLock::new(HashMap::new()),
            cancel_requested: RwLock::new(HashSet::new()),
        }
    }

    /// Healthy partitions strictly outnumber unhealthy ones.
    #[must_use]
    pub fn has_quorum(&self) -> bool {
        let ranks = self.topology.active_ranks();
        let total = ranks.len();
        if total == 0 {
            return true;
        }
        let healthy = ranks
            .iter()
            .filter_map(|rank| self.topology.partition_at(*rank))
            .filter(|id| self.detector.check_health(*id).is_healthy())
            .count();
        healthy * 2 > total
    }

    /// Request cooperative cancellation of an in-progress recovery. Checked
    /// between phases, not mid-phase.
    pub fn request_cancel(&self, partition_id: PartitionId) {
        self.cancel_requested.write().insert(partition_id);
    }

    fn cancel_pending(&self, partition_id: PartitionId) -> bool {
        self.cancel_requested.write().remove(&partition_id)
    }

    fn state_for(&self, partition_id: PartitionId) -> RecoveryState {
        self.states
            .write()
            .entry(partition_id)
            .or_insert_with(|| RecoveryState::new(partition_id))
            .clone()
    }

    fn set_phase(&self, partition_id: PartitionId, phase: RecoveryPhase) {
        if let Some(state) = self.states.write().get_mut(&partition_id) {
            state.phase = phase;
        }
    }

    /// Force the current recovery to `FAILED`, release the lock, and resume
    /// operations. Does not roll back partial redistribution (§4.5
    /// Cancellation).
    pub fn abort(&self, partition_id: PartitionId, reason: &str) {
        tracing::warn!(%partition_id, reason, "recovery aborted");
        self.barrier.resume();
        self.detector.notify_recovery_complete(partition_id, false);
        self.set_phase(partition_id, RecoveryPhase::Failed);
    }

    fn fail(
        &self,
        partition_id: PartitionId,
        started: Instant,
        attempts: u32,
        cause: LuciferaseError,
    ) -> RecoveryResult {
        self.barrier.resume();
        self.detector.notify_recovery_complete(partition_id, false);
        self.set_phase(partition_id, RecoveryPhase::Failed);
        RecoveryResult {
            partition_id,
            success: false,
            duration_ms: started.elapsed().as_millis() as u64,
            strategy: self.redistribution.name().to_string(),
            attempts_needed: attempts,
            status_message: "recovery failed".to_string(),
            failure_reason: Some(cause.to_string()),
        }
    }

    /// Drive one partition from `FAILED` through the recovery phase machine.
    pub fn recover(&self, partition_id: PartitionId) -> RecoveryResult {
        let started = Instant::now();
        let mut state = self.state_for(partition_id);
        state.attempts += 1;
        let attempts = state.attempts;
        {
            let mut guard = self.states.write();
            guard.insert(partition_id, state);
        }

        if !self.has_quorum() {
            if attempts >= self.config.max_retries {
                if let Some(sink) = &self.alert_sink {
                    sink.alert(&format!("permanent quorum loss recovering partition {partition_id}"));
                }
                self.set_phase(partition_id, RecoveryPhase::Failed);
            }
            return RecoveryResult {
                partition_id,
                success: false,
                duration_ms: started.elapsed().as_millis() as u64,
                strategy: self.redistribution.name().to_string(),
                attempts_needed: attempts,
                status_message: "quorum not met".to_string(),
                failure_reason: Some("healthy partitions <= N/2".to_string()),
            };
        }

        match self.detector.initiate_recovery(partition_id) {
            Ok(true) => {}
            Ok(false) => {
                return self.fail(
                    partition_id,
                    started,
                    attempts,
                    LuciferaseError::RecoveryPreconditionFailed(
                        "could not acquire per-partition recovery lock".into(),
                    ),
                );
            }
            Err(e) => return self.fail(partition_id, started, attempts, e),
        }

        self.set_phase(partition_id, RecoveryPhase::Detecting);
        let timeout = Duration::from_millis(self.config.barrier_timeout_ms);
        if let Err(e) = self.barrier.pause_and_wait(timeout) {
            return self.fail(partition_id, started, attempts, e);
        }

        if self.cancel_pending(partition_id) {
            self.abort(partition_id, "cancelled during DETECTING");
            return self.fail(
                partition_id,
                started,
                attempts,
                LuciferaseError::RecoveryAborted("cancelled".into()),
            );
        }

        if !self.probe.confirm_failure(partition_id) {
            self.barrier.resume();
            self.detector.notify_recovery_complete(partition_id, true);
            self.set_phase(partition_id, RecoveryPhase::Idle);
            return RecoveryResult {
                partition_id,
                success: true,
                duration_ms: started.elapsed().as_millis() as u64,
                strategy: self.redistribution.name().to_string(),
                attempts_needed: attempts,
                status_message: "partition responded healthy; recovery aborted".to_string(),
                failure_reason: None,
            };
        }

        self.set_phase(partition_id, RecoveryPhase::Redistributing);
        if let Err(e) = self.redistribution.redistribute(partition_id) {
            return self.fail(partition_id, started, attempts, e);
        }
        if self.cancel_pending(partition_id) {
            self.abort(partition_id, "cancelled during REDISTRIBUTING");
            return self.fail(
                partition_id,
                started,
                attempts,
                LuciferaseError::RecoveryAborted("cancelled".into()),
            );
        }

        self.set_phase(partition_id, RecoveryPhase::Rebalancing);
        if let Err(e) = self.balancer.rebalance(partition_id) {
            return self.fail(partition_id, started, attempts, e);
        }

        self.set_phase(partition_id, RecoveryPhase::Validating);
        if let Err(e) = self.ghost_validation.validate() {
            return self.fail(partition_id, started, attempts, e);
        }

        self.barrier.resume();
        self.detector.notify_recovery_complete(partition_id, true);
        self.set_phase(partition_id, RecoveryPhase::Complete);
        RecoveryResult {
            partition_id,
            success: true,
            duration_ms: started.elapsed().as_millis() as u64,
            strategy: self.redistribution.name().to_string(),
            attempts_needed: attempts,
            status_message: "recovery complete".to_string(),
            failure_reason: None,
        }
    }

    #[must_use]
    pub fn phase_of(&self, partition_id: PartitionId) -> Option<RecoveryPhase> {
        self.states.read().get(&partition_id).map(|s| s.phase)
    }
}
