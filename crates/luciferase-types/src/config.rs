//! Configuration recognized by the spatial index, fault detector and
//! recovery orchestrator (§6 Configuration).

use luciferase_error::{LuciferaseError, Result};
use serde::{Deserialize, Serialize};

/// How an entity whose bounds straddle multiple tetrahedra at the insertion
/// level is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanningPolicy {
    /// Record the entity only at the node containing its center point.
    None,
    /// Record the entity only at the node containing its center point, same
    /// as `None` but kept distinct so future policies can diverge.
    Center,
    /// Record the entity in every node whose cell intersects its bounds
    /// (§4.2 spanning-entity policy). This is the default per the Open
    /// Questions resolution in DESIGN.md.
    FullBounds,
}

impl Default for SpanningPolicy {
    fn default() -> Self {
        Self::FullBounds
    }
}

/// Configuration for a single spatial index partition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexConfig {
    pub max_entities_per_node: u32,
    pub max_depth: u8,
    pub spanning_policy: SpanningPolicy,
    pub max_refinement_level: u8,
    /// Margin `find_collisions` pads an entity's AABB by before range-querying
    /// for neighbors (§4.2): catches near-touching entities whose bounds
    /// don't yet overlap, not just ones that already do.
    pub collision_margin: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_entities_per_node: 10,
            max_depth: 21,
            spanning_policy: SpanningPolicy::default(),
            max_refinement_level: 21,
            collision_margin: 0.0,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_entities_per_node == 0 {
            return Err(LuciferaseError::ConfigInvalid(
                "max_entities_per_node must be >= 1".into(),
            ));
        }
        if self.max_depth == 0 || self.max_depth > 21 {
            return Err(LuciferaseError::ConfigInvalid(
                "max_depth must be in 1..=21".into(),
            ));
        }
        if self.max_refinement_level > 21 {
            return Err(LuciferaseError::ConfigInvalid(
                "max_refinement_level must be <= 21".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the fault detector and recovery orchestrator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaultToleranceConfig {
    pub heartbeat_interval_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub barrier_timeout_ms: u64,
    pub failure_confirmation_ms: u64,
    pub max_retries: u32,
    pub cascading_threshold: u32,
    pub recovery_timeout_ms: u64,
    pub enable_ghost_validation: bool,
}

impl Default for FaultToleranceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 500,
            heartbeat_timeout_ms: 2000,
            barrier_timeout_ms: 5000,
            failure_confirmation_ms: 1000,
            max_retries: 3,
            cascading_threshold: 2,
            recovery_timeout_ms: 5000,
            enable_ghost_validation: true,
        }
    }
}

impl FaultToleranceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(LuciferaseError::ConfigInvalid(
                "max_retries must be >= 1".into(),
            ));
        }
        if self.failure_confirmation_ms == 0 {
            return Err(LuciferaseError::ConfigInvalid(
                "failure_confirmation_ms must be >= 1".into(),
            ));
        }
        if self.recovery_timeout_ms == 0 {
            return Err(LuciferaseError::ConfigInvalid(
                "recovery_timeout_ms must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Thresholds that drive operator alerts from the status monitor (§6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Percentage (0-100) of partitions in FAILED state that triggers an
    /// alert.
    pub failed_partition_percent: f64,
    /// Floor below which the recovery success rate triggers an alert.
    pub recovery_success_rate_floor: f64,
    /// Ceiling above which detection latency triggers an alert.
    pub detection_latency_ceiling_ms: u64,
    /// Ceiling above which recovery latency triggers an alert.
    pub recovery_latency_ceiling_ms: u64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            failed_partition_percent: 25.0,
            recovery_success_rate_floor: 0.5,
            detection_latency_ceiling_ms: 5_000,
            recovery_latency_ceiling_ms: 30_000,
        }
    }
}
