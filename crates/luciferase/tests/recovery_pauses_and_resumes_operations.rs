//! §8 scenario 4: while a partition recovers, the operation barrier stays
//! paused through REDISTRIBUTING, REBALANCING and VALIDATING, and
//! `resume()` fires exactly once on success.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use luciferase_error::Result;
use luciferase_fault::FaultDetector;
use luciferase_forest::PartitionTopology;
use luciferase_recovery::{
    AlertSink, Balancer, FailureProbe, GhostValidationSource, OperationBarrier, RecoveryOrchestrator,
    RedistributionStrategy,
};
use luciferase_types::{FaultToleranceConfig, ManualTimeSource, PartitionId};
use uuid::Uuid;

struct AlwaysFails;
impl FailureProbe for AlwaysFails {
    fn confirm_failure(&self, _partition_id: PartitionId) -> bool {
        true
    }
}

struct PausedDuring {
    barrier: Arc<OperationBarrier>,
    paused_observations: Arc<AtomicU32>,
}
impl RedistributionStrategy for PausedDuring {
    fn name(&self) -> &str {
        "spatial-proximity"
    }
    fn redistribute(&self, _partition_id: PartitionId) -> Result<()> {
        if self.barrier.try_begin_operation().is_none() {
            self.paused_observations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
impl Balancer for PausedDuring {
    fn rebalance(&self, _partition_id: PartitionId) -> Result<()> {
        if self.barrier.try_begin_operation().is_none() {
            self.paused_observations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
impl GhostValidationSource for PausedDuring {
    fn validate(&self) -> Result<()> {
        if self.barrier.try_begin_operation().is_none() {
            self.paused_observations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct NoAlert;
impl AlertSink for NoAlert {
    fn alert(&self, _message: &str) {}
}

#[test]
fn barrier_stays_paused_through_every_recovery_phase() {
    let clock = ManualTimeSource::shared();
    let config = FaultToleranceConfig::default();
    let detector = Arc::new(FaultDetector::new(clock.clone(), config));
    let topology = Arc::new(PartitionTopology::new());
    let barrier = Arc::new(OperationBarrier::new());

    let partition_b = Uuid::new_v4();
    topology.register(partition_b, 0).unwrap();
    topology.register(Uuid::new_v4(), 1).unwrap();
    topology.register(Uuid::new_v4(), 2).unwrap();
    detector.report_barrier_timeout(partition_b);
    detector.report_barrier_timeout(partition_b);
    clock.advance(2000);
    detector.check_timeouts();

    let paused_observations = Arc::new(AtomicU32::new(0));
    let collaborator = Arc::new(PausedDuring {
        barrier: barrier.clone(),
        paused_observations: paused_observations.clone(),
    });

    let orchestrator = RecoveryOrchestrator::new(
        config,
        detector.clone(),
        topology,
        barrier.clone(),
        Arc::new(AlwaysFails),
        collaborator.clone(),
        collaborator.clone(),
        collaborator,
        Some(Arc::new(NoAlert)),
    );

    let resumed_before = !barrier.is_paused();
    assert!(resumed_before);
    let result = orchestrator.recover(partition_b);

    assert!(result.success);
    assert_eq!(result.attempts_needed, 1);
    assert_eq!(paused_observations.load(Ordering::SeqCst), 3, "barrier must read paused in all three phases");
    assert!(!barrier.is_paused(), "resume() must run exactly once, leaving the barrier open");
    assert_eq!(detector.check_health(partition_b), luciferase_types::PartitionStatus::Healthy);
}
