//! Status tracker: transition history, staleness detection, aggregated
//! metrics and alert threshold evaluation (§6 "Status Tracker / Monitor").

use std::collections::HashMap;
use std::sync::Arc;

use luciferase_fault::{PartitionChangeEvent, PartitionChangeListener};
use luciferase_types::{AlertThresholds, PartitionId, PartitionMetrics, PartitionStatus, TimeSource};
use parking_lot::RwLock;

use crate::ring::RingBuffer;

/// One partition's status at the moment it was last observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthSnapshot {
    pub partition_id: PartitionId,
    pub status: PartitionStatus,
    pub metrics: PartitionMetrics,
    pub observed_at_ms: u64,
}

/// Which threshold in [`AlertThresholds`] was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    FailedPartitionPercent,
    RecoverySuccessRateFloor,
    DetectionLatencyCeiling,
    RecoveryLatencyCeiling,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub message: String,
    pub ts_ms: u64,
}

/// Partition counts by status, as of one `aggregate` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateHealth {
    pub total: u32,
    pub healthy: u32,
    pub suspected: u32,
    pub failed: u32,
    pub recovering: u32,
    pub degraded: u32,
}

impl AggregateHealth {
    #[must_use]
    pub fn failed_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.failed) * 100.0 / f64::from(self.total)
        }
    }
}

/// Tracks per-partition transition and health history, flags staleness, and
/// evaluates [`AlertThresholds`] against aggregated state.
pub struct StatusMonitor {
    clock: Arc<dyn TimeSource>,
    thresholds: AlertThresholds,
    staleness_ms: u64,
    transitions: RwLock<HashMap<PartitionId, Arc<RingBuffer<PartitionChangeEvent>>>>,
    health: RwLock<HashMap<PartitionId, Arc<RingBuffer<HealthSnapshot>>>>,
    last_seen_ms: RwLock<HashMap<PartitionId, u64>>,
    ring_capacity: usize,
}

impl StatusMonitor {
    #[must_use]
    pub fn new(
        clock: Arc<dyn TimeSource>,
        thresholds: AlertThresholds,
        staleness_ms: u64,
        ring_capacity: usize,
    ) -> Self {
        Self {
            clock,
            thresholds,
            staleness_ms,
            transitions: RwLock::new(HashMap::new()),
            health: RwLock::new(HashMap::new()),
            last_seen_ms: RwLock::new(HashMap::new()),
            ring_capacity,
        }
    }

    fn transitions_for(&self, partition_id: PartitionId) -> Arc<RingBuffer<PartitionChangeEvent>> {
        self.transitions
            .write()
            .entry(partition_id)
            .or_insert_with(|| Arc::new(RingBuffer::new(self.ring_capacity)))
            .clone()
    }

    fn health_for(&self, partition_id: PartitionId) -> Arc<RingBuffer<HealthSnapshot>> {
        self.health
            .write()
            .entry(partition_id)
            .or_insert_with(|| Arc::new(RingBuffer::new(self.ring_capacity)))
            .clone()
    }

    /// Record a point-in-time health observation, e.g. from a periodic poll
    /// of [`luciferase_fault::FaultDetector::get_partition_view`].
    pub fn record_snapshot(&self, partition_id: PartitionId, status: PartitionStatus, metrics: PartitionMetrics) {
        let now = self.clock.now_ms();
        self.health_for(partition_id).push(HealthSnapshot {
            partition_id,
            status,
            metrics,
            observed_at_ms: now,
        });
        self.last_seen_ms.write().insert(partition_id, now);
    }

    #[must_use]
    pub fn transition_history(&self, partition_id: PartitionId) -> Vec<PartitionChangeEvent> {
        self.transitions_for(partition_id).history()
    }

    #[must_use]
    pub fn health_history(&self, partition_id: PartitionId) -> Vec<HealthSnapshot> {
        self.health_for(partition_id).history()
    }

    /// True if no observation (transition or snapshot) has been recorded
    /// for `partition_id` within `staleness_ms` of now.
    #[must_use]
    pub fn is_stale(&self, partition_id: PartitionId) -> bool {
        match self.last_seen_ms.read().get(&partition_id) {
            Some(&last) => self.clock.now_ms().saturating_sub(last) > self.staleness_ms,
            None => true,
        }
    }

    #[must_use]
    pub fn aggregate(&self, statuses: &[(PartitionId, PartitionStatus)]) -> AggregateHealth {
        let mut aggregate = AggregateHealth::default();
        for (_, status) in statuses {
            aggregate.total += 1;
            match status {
                PartitionStatus::Healthy => aggregate.healthy += 1,
                PartitionStatus::Suspected => aggregate.suspected += 1,
                PartitionStatus::Failed => aggregate.failed += 1,
                PartitionStatus::Recovering => aggregate.recovering += 1,
                PartitionStatus::Degraded => aggregate.degraded += 1,
            }
        }
        aggregate
    }

    /// Evaluate `self.thresholds` against an aggregate status snapshot and
    /// combined metrics, returning one [`AlertEvent`] per crossed
    /// threshold.
    #[must_use]
    pub fn evaluate_alerts(&self, aggregate: &AggregateHealth, metrics: &PartitionMetrics) -> Vec<AlertEvent> {
        let now = self.clock.now_ms();
        let mut alerts = Vec::new();
        let failed_percent = aggregate.failed_percent();
        if failed_percent >= self.thresholds.failed_partition_percent {
            alerts.push(AlertEvent {
                kind: AlertKind::FailedPartitionPercent,
                message: format!(
                    "{failed_percent:.1}% of partitions are FAILED (threshold {:.1}%)",
                    self.thresholds.failed_partition_percent
                ),
                ts_ms: now,
            });
        }
        let success_rate = metrics.recovery_success_rate();
        if success_rate < self.thresholds.recovery_success_rate_floor {
            alerts.push(AlertEvent {
                kind: AlertKind::RecoverySuccessRateFloor,
                message: format!(
                    "recovery success rate {success_rate:.2} below floor {:.2}",
                    self.thresholds.recovery_success_rate_floor
                ),
                ts_ms: now,
            });
        }
        if metrics.detection_latency_ms > self.thresholds.detection_latency_ceiling_ms {
            alerts.push(AlertEvent {
                kind: AlertKind::DetectionLatencyCeiling,
                message: format!(
                    "detection latency {}ms exceeds ceiling {}ms",
                    metrics.detection_latency_ms, self.thresholds.detection_latency_ceiling_ms
                ),
                ts_ms: now,
            });
        }
        if metrics.recovery_latency_ms > self.thresholds.recovery_latency_ceiling_ms {
            alerts.push(AlertEvent {
                kind: AlertKind::RecoveryLatencyCeiling,
                message: format!(
                    "recovery latency {}ms exceeds ceiling {}ms",
                    metrics.recovery_latency_ms, self.thresholds.recovery_latency_ceiling_ms
                ),
                ts_ms: now,
            });
        }
        alerts
    }
}

impl PartitionChangeListener for StatusMonitor {
    fn on_change(&self, event: &PartitionChangeEvent) {
        self.transitions_for(event.partition_id).push(event.clone());
        self.last_seen_ms.write().insert(event.partition_id, event.ts_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luciferase_types::ManualTimeSource;
    use uuid::Uuid;

    #[test]
    fn listener_records_transitions_and_clears_staleness() {
        let clock = ManualTimeSource::shared();
        let monitor = StatusMonitor::new(clock.clone(), AlertThresholds::default(), 1000, 8);
        let partition = Uuid::new_v4();
        assert!(monitor.is_stale(partition));

        monitor.on_change(&PartitionChangeEvent {
            partition_id: partition,
            old: PartitionStatus::Healthy,
            new: PartitionStatus::Suspected,
            ts_ms: clock.now_ms(),
            reason: "test".into(),
        });
        assert!(!monitor.is_stale(partition));
        assert_eq!(monitor.transition_history(partition).len(), 1);
    }

    #[test]
    fn staleness_trips_after_configured_window() {
        let clock = ManualTimeSource::shared();
        let monitor = StatusMonitor::new(clock.clone(), AlertThresholds::default(), 500, 8);
        let partition = Uuid::new_v4();
        monitor.record_snapshot(partition, PartitionStatus::Healthy, PartitionMetrics::default());
        assert!(!monitor.is_stale(partition));
        clock.advance(600);
        assert!(monitor.is_stale(partition));
    }

    #[test]
    fn aggregate_counts_by_status() {
        let clock = ManualTimeSource::shared();
        let monitor = StatusMonitor::new(clock, AlertThresholds::default(), 1000, 8);
        let statuses = vec![
            (Uuid::new_v4(), PartitionStatus::Healthy),
            (Uuid::new_v4(), PartitionStatus::Failed),
            (Uuid::new_v4(), PartitionStatus::Failed),
            (Uuid::new_v4(), PartitionStatus::Suspected),
        ];
        let aggregate = monitor.aggregate(&statuses);
        assert_eq!(aggregate.total, 4);
        assert_eq!(aggregate.failed, 2);
        assert!((aggregate.failed_percent() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn alerts_fire_when_thresholds_are_crossed() {
        let clock = ManualTimeSource::shared();
        let thresholds = AlertThresholds {
            failed_partition_percent: 25.0,
            recovery_success_rate_floor: 0.9,
            detection_latency_ceiling_ms: 1000,
            recovery_latency_ceiling_ms: 1000,
        };
        let monitor = StatusMonitor::new(clock, thresholds, 1000, 8);
        let aggregate = AggregateHealth {
            total: 4,
            healthy: 3,
            failed: 1,
            ..AggregateHealth::default()
        };
        let metrics = PartitionMetrics {
            successful_recoveries: 1,
            failed_recoveries: 1,
            detection_latency_ms: 2000,
            recovery_latency_ms: 500,
            ..PartitionMetrics::default()
        };
        let alerts = monitor.evaluate_alerts(&aggregate, &metrics);
        assert!(alerts.iter().any(|a| a.kind == AlertKind::FailedPartitionPercent));
        assert!(alerts.iter().any(|a| a.kind == AlertKind::RecoverySuccessRateFloor));
        assert!(alerts.iter().any(|a| a.kind == AlertKind::DetectionLatencyCeiling));
        assert!(!alerts.iter().any(|a| a.kind == AlertKind::RecoveryLatencyCeiling));
    }
}
