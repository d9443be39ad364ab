//! Core type definitions shared by every Luciferase crate: vector/bounds
//! primitives, entity bookkeeping, configuration, the injectable clock, and
//! partition identity/metrics.
//!
//! SFC keys and tetrahedron geometry live in `luciferase-geometry`, one
//! layer up, because the Tetree key's `child()` operation needs the Bey
//! refinement tables that also produce [`Tet`](../luciferase_geometry/struct.Tet.html)
//! children; keeping them together avoids a dependency cycle.

pub mod config;
pub mod entity;
pub mod partition;
pub mod time;
pub mod vec3;

pub use config::{AlertThresholds, FaultToleranceConfig, IndexConfig, SpanningPolicy};
pub use entity::{EntityId, EntityRecord, LocationSet};
pub use partition::{NodeId, PartitionId, PartitionMetrics, PartitionStatus};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use vec3::{Aabb, Vec3f};
