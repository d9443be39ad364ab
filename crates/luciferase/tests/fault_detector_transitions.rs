//! §8 scenario 3: two consecutive barrier timeouts suspect a partition,
//! the suspicion window elapsing confirms the failure, and an operator
//! override returns it to healthy.

use std::sync::{Arc, RwLock};

use luciferase_fault::{FaultDetector, PartitionChangeEvent, PartitionChangeListener};
use luciferase_types::{FaultToleranceConfig, ManualTimeSource, PartitionStatus};
use uuid::Uuid;

struct Recorder {
    events: RwLock<Vec<PartitionChangeEvent>>,
}

impl PartitionChangeListener for Recorder {
    fn on_change(&self, event: &PartitionChangeEvent) {
        self.events.write().unwrap().push(event.clone());
    }
}

#[test]
fn two_timeouts_suspect_then_confirm_then_recover() {
    let clock = ManualTimeSource::shared();
    let config = FaultToleranceConfig {
        failure_confirmation_ms: 1000,
        ..FaultToleranceConfig::default()
    };
    let detector = FaultDetector::new(clock.clone(), config);
    let partition = Uuid::new_v4();
    let recorder = Arc::new(Recorder { events: RwLock::new(Vec::new()) });
    detector.subscribe_to_changes(recorder.clone());

    detector.report_barrier_timeout(partition);
    clock.advance(100);
    detector.report_barrier_timeout(partition);
    assert_eq!(detector.check_health(partition), PartitionStatus::Suspected);

    clock.set(1100);
    detector.check_timeouts();
    assert_eq!(detector.check_health(partition), PartitionStatus::Failed);

    detector.mark_healthy(partition);
    assert_eq!(detector.check_health(partition), PartitionStatus::Healthy);

    let events = recorder.events.read().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].new, PartitionStatus::Suspected);
    assert_eq!(events[0].reason, "Consecutive barrier timeouts exceeded threshold");
    assert_eq!(events[1].new, PartitionStatus::Failed);
    assert_eq!(events[2].new, PartitionStatus::Healthy);
}
