//! Public API facade for the distributed, fault-tolerant spatial index
//! forest: a single [`Forest`] composes one partition's spatial index with
//! the ghost layer, fault detector, recovery orchestrator and status
//! monitor the rest of the workspace provides (§6 External Interfaces).

pub mod collaborators;
pub mod forest;

pub use collaborators::{
    BoundaryPairSource, ClusterGhostValidation, ClusterSnapshotSource, CrossPartitionFailureProbe,
    HeartbeatProbe, NearestRankRedistribution, ButterflyBalancer, TracingAlertSink,
};
pub use forest::{Forest, ForestDependencies, RecoveryHandler};

pub use luciferase_error::{LuciferaseError, Result};
pub use luciferase_geometry::KeyKind;
pub use luciferase_index::SpatialIndex;
pub use luciferase_types::{
    Aabb, AlertThresholds, EntityId, FaultToleranceConfig, IndexConfig, PartitionId,
    PartitionMetrics, PartitionStatus, SpanningPolicy, Vec3f,
};
