//! Per-partition recovery: the in-flight operation barrier, the recovery
//! phase machine, and the orchestrator tying both to the fault detector and
//! partition topology (§4.5, §4.7).

pub mod barrier;
pub mod orchestrator;
pub mod phase;

pub use barrier::{OperationBarrier, OperationGuard};
pub use orchestrator::{
    AlertSink, Balancer, FailureProbe, GhostValidationSource, RecoveryOrchestrator,
    RedistributionStrategy,
};
pub use phase::{RecoveryPhase, RecoveryResult, RecoveryState};
