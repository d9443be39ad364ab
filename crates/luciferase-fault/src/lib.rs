//! Per-partition fault detection: `HEALTHY -> SUSPECTED -> FAILED ->
//! RECOVERING -> HEALTHY`, driven by an injected clock rather than wall-clock
//! sleeps (§4.4).

pub mod detector;
pub mod state;

pub use detector::{FaultDetector, PartitionChangeEvent, PartitionChangeListener, SubscriptionId};
pub use state::{PartitionState, PartitionView};
