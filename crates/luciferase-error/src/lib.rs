//! Error taxonomy shared by every Luciferase crate.
//!
//! All fallible APIs in the spatial index, forest, fault-detection and
//! recovery layers return [`Result<T>`], a thin alias over
//! [`LuciferaseError`]. The taxonomy is intentionally flat: callers match on
//! a single enum rather than threading separate error types per crate, which
//! keeps propagation across the spatial-index / forest / recovery boundary
//! mechanical.

use std::fmt;

use uuid::Uuid;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LuciferaseError>;

/// Flat error taxonomy covering spatial-index operations, the fault
/// detector, the recovery orchestrator and the cross-partition balance
/// protocol.
#[derive(Debug, thiserror::Error)]
pub enum LuciferaseError {
    /// Coordinate is negative, beyond `MAX_COORD`, or not aligned to the
    /// cell size implied by its level.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Insert/subdivide attempted past the configured `max_depth`.
    #[error("max depth {max_depth} exceeded at level {attempted_level}")]
    MaxDepthExceeded { max_depth: u8, attempted_level: u8 },

    /// Lookup, update or remove referenced an entity id that is not present.
    #[error("entity {0} is not known to this index")]
    EntityUnknown(u64),

    /// Insert referenced an entity id that is already present.
    #[error("entity {0} is already present in this index")]
    EntityAlreadyPresent(u64),

    /// A cluster-wide barrier (pause/resume) did not complete in time.
    #[error("barrier timed out after {waited_ms}ms (limit {limit_ms}ms)")]
    BarrierTimeout { waited_ms: u64, limit_ms: u64 },

    /// A barrier was released without reaching quiescence (e.g. aborted).
    #[error("barrier broken: {0}")]
    BarrierBroken(String),

    /// Ghost-layer sync with a peer rank failed.
    #[error("ghost sync with rank {rank} failed: {cause}")]
    SyncFailure { rank: u32, cause: String },

    /// A node's heartbeat was not observed within the configured timeout.
    #[error("heartbeat timeout for node {node_id} in partition {partition_id}")]
    HeartbeatTimeout { partition_id: Uuid, node_id: Uuid },

    /// Recovery could not start: quorum, lock acquisition, or phase state
    /// preconditions were not satisfied.
    #[error("recovery precondition failed: {0}")]
    RecoveryPreconditionFailed(String),

    /// A recovery phase exceeded `recovery_timeout_ms`.
    #[error("recovery timed out in phase {phase} after {elapsed_ms}ms")]
    RecoveryTimeout { phase: String, elapsed_ms: u64 },

    /// Recovery was cancelled via `abort()`.
    #[error("recovery aborted: {0}")]
    RecoveryAborted(String),

    /// A specific recovery phase failed with a recorded cause.
    #[error("recovery phase {phase} failed: {cause}")]
    RecoveryPhaseFailed { phase: String, cause: String },

    /// Ghost-layer validation found a consistency violation.
    #[error(
        "ghost validation failed: {duplicates} duplicate entities, {orphans} orphan ghosts, {gaps} boundary gaps"
    )]
    GhostValidationFailed {
        duplicates: usize,
        orphans: usize,
        gaps: usize,
    },

    /// A configuration value was out of range or otherwise invalid.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Wire-format encode/decode failure.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A partition id was referenced that is not part of the topology.
    #[error("unknown partition: {0}")]
    PartitionUnknown(Uuid),

    /// Two different UUIDs attempted to register for the same rank.
    #[error("rank {rank} is already registered to partition {existing}, cannot assign {requested}")]
    RankCollision {
        rank: u32,
        existing: Uuid,
        requested: Uuid,
    },

    /// A write was rejected because the owning partition is mid-recovery.
    #[error("partition {0} is recovering; retry after resume")]
    RecoveryInProgress(Uuid),

    /// Catch-all for invariants that should be unreachable in correct code.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LuciferaseError {
    /// Build an [`LuciferaseError::Internal`] from anything stringifiable.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Build an [`LuciferaseError::InvalidCoordinate`] with context.
    pub fn invalid_coordinate(message: impl Into<String>) -> Self {
        Self::InvalidCoordinate(message.into())
    }

    /// Whether retrying the same operation after backoff is sensible, as
    /// opposed to a permanent failure that should propagate immediately.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::BarrierTimeout { .. }
                | Self::SyncFailure { .. }
                | Self::HeartbeatTimeout { .. }
                | Self::RecoveryTimeout { .. }
                | Self::RecoveryInProgress(_)
        )
    }
}

/// Lightweight marker wrapping a non-fatal callback failure (listener or
/// alert hook). Callback failures are logged and suppressed rather than
/// propagated; this type exists so call sites can format them uniformly.
#[derive(Debug)]
pub struct CallbackFailure {
    pub context: String,
    pub cause: String,
}

impl fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.cause)
    }
}
