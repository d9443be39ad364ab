//! The butterfly exchange: `O(log P)` rounds of pairwise refinement
//! requests, pairing rank `r` with `r XOR (1 << round)` each round (§4.6).

use std::collections::HashMap;
use std::sync::Arc;

use luciferase_error::{LuciferaseError, Result};
use luciferase_forest::PartitionTopology;
use luciferase_geometry::SFCKey;
use luciferase_types::TimeSource;

use crate::checker::BalanceViolation;
use crate::wire::{RefinementRequest, RefinementResponse};

/// Collaborator that actually moves bytes to a peer rank and back. A real
/// implementation lives above this crate (RPC, shared memory, loopback);
/// tests supply an in-process stub.
pub trait BalanceTransport: Send + Sync {
    /// # Errors
    /// A transient error (timeout, temporarily unreachable) is retried once
    /// by the caller; anything else is treated as permanent.
    fn send_request(&self, peer_rank: u32, request: &RefinementRequest) -> Result<RefinementResponse>;
}

/// Outcome of a full butterfly run.
#[derive(Debug, Clone, Default)]
pub struct ButterflyOutcome {
    pub refined_keys: Vec<SFCKey>,
    /// Per-peer count of transient failures absorbed without aborting the
    /// run (§8 scenario 5's "failure counter for rank 3").
    pub failures: HashMap<u32, u32>,
    pub rounds_run: u32,
}

impl ButterflyOutcome {
    /// True if every round completed with no transient failures recorded
    /// against any peer.
    #[must_use]
    pub fn fully_converged(&self) -> bool {
        self.failures.values().all(|&count| count == 0) || self.failures.is_empty()
    }
}

/// Default `max_rounds`: `ceil(log2(P)) + 2` for `P` active partitions.
#[must_use]
pub fn default_max_rounds(partition_count: usize) -> u32 {
    let log2 = (partition_count.max(1) as f64).log2().ceil() as u32;
    log2 + 2
}

/// Drives one partition's side of the butterfly protocol.
pub struct ButterflyProtocol {
    self_rank: u32,
    topology: Arc<PartitionTopology>,
    clock: Arc<dyn TimeSource>,
    max_rounds: u32,
}

impl ButterflyProtocol {
    #[must_use]
    pub fn new(self_rank: u32, topology: Arc<PartitionTopology>, clock: Arc<dyn TimeSource>) -> Self {
        let max_rounds = default_max_rounds(topology.partition_count());
        Self {
            self_rank,
            topology,
            clock,
            max_rounds,
        }
    }

    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    fn send_with_retry(
        &self,
        transport: &dyn BalanceTransport,
        peer_rank: u32,
        request: &RefinementRequest,
    ) -> Result<RefinementResponse> {
        match transport.send_request(peer_rank, request) {
            Ok(response) => Ok(response),
            Err(e) if e.is_transient() => {
                tracing::warn!(peer_rank, "butterfly request failed, retrying once");
                transport.send_request(peer_rank, request)
            }
            Err(e) => Err(e),
        }
    }

    /// Run rounds until no violations remain destined for an active peer or
    /// `max_rounds` is reached. Transient per-peer failures are absorbed
    /// (graceful degradation, §8 scenario 5); a non-transient error from the
    /// transport aborts the run and is surfaced to the caller.
    ///
    /// # Errors
    /// Propagates the first permanent (non-transient) transport error.
    pub fn run(
        &self,
        transport: &dyn BalanceTransport,
        violations: Vec<BalanceViolation>,
    ) -> Result<ButterflyOutcome> {
        let mut remaining = violations;
        let mut outcome = ButterflyOutcome::default();
        let active: std::collections::HashSet<u32> = self.topology.active_ranks().into_iter().collect();

        for round in 0..self.max_rounds {
            if remaining.is_empty() {
                break;
            }
            outcome.rounds_run = round + 1;
            let partner = self.self_rank ^ (1 << round);
            if partner == self.self_rank || !active.contains(&partner) {
                continue;
            }
            let batch: Vec<BalanceViolation> = remaining
                .iter()
                .filter(|v| v.source_rank == partner)
                .cloned()
                .collect();
            if batch.is_empty() {
                continue;
            }
            let request = RefinementRequest {
                requester_rank: self.self_rank,
                round,
                timestamp_ms: self.clock.now_ms(),
                violations: batch,
            };
            match self.send_with_retry(transport, partner, &request) {
                Ok(response) => {
                    outcome.refined_keys.extend(response.refined_keys);
                    remaining.retain(|v| v.source_rank != partner);
                }
                Err(e) if e.is_transient() => {
                    *outcome.failures.entry(partner).or_insert(0) += 1;
                    tracing::warn!(
                        partner,
                        round,
                        "butterfly round degraded: peer unreachable, continuing with partial results"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luciferase_geometry::KeyKind;
    use luciferase_types::ManualTimeSource;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn violation(source_rank: u32) -> BalanceViolation {
        let mut local = SFCKey::root(KeyKind::Tetree);
        for _ in 0..2 {
            local = local.child(0).unwrap();
        }
        let mut ghost = SFCKey::root(KeyKind::Tetree);
        for _ in 0..5 {
            ghost = ghost.child(1).unwrap();
        }
        BalanceViolation {
            local_key: local,
            ghost_key: ghost,
            local_level: 2,
            ghost_level: 5,
            source_rank,
        }
    }

    fn topology_with_ranks(n: u32) -> Arc<PartitionTopology> {
        let topology = Arc::new(PartitionTopology::new());
        for rank in 0..n {
            topology.register(Uuid::new_v4(), rank).unwrap();
        }
        topology
    }

    struct AlwaysRefines;
    impl BalanceTransport for AlwaysRefines {
        fn send_request(&self, peer_rank: u32, request: &RefinementRequest) -> Result<RefinementResponse> {
            Ok(RefinementResponse {
                responder_rank: peer_rank,
                round: request.round,
                timestamp_ms: request.timestamp_ms,
                refined_keys: request.violations.iter().map(|v| v.ghost_key).collect(),
            })
        }
    }

    struct UnavailablePeer {
        unavailable_rank: u32,
    }
    impl BalanceTransport for UnavailablePeer {
        fn send_request(&self, peer_rank: u32, request: &RefinementRequest) -> Result<RefinementResponse> {
            if peer_rank == self.unavailable_rank {
                return Err(LuciferaseError::SyncFailure {
                    rank: peer_rank,
                    cause: "unavailable".into(),
                });
            }
            Ok(RefinementResponse {
                responder_rank: peer_rank,
                round: request.round,
                timestamp_ms: request.timestamp_ms,
                refined_keys: request.violations.iter().map(|v| v.ghost_key).collect(),
            })
        }
    }

    struct RetryOnceThenOk {
        attempts: Mutex<u32>,
    }
    impl BalanceTransport for RetryOnceThenOk {
        fn send_request(&self, peer_rank: u32, request: &RefinementRequest) -> Result<RefinementResponse> {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            if *attempts == 1 {
                return Err(LuciferaseError::BarrierTimeout {
                    waited_ms: 5000,
                    limit_ms: 5000,
                });
            }
            Ok(RefinementResponse {
                responder_rank: peer_rank,
                round: request.round,
                timestamp_ms: request.timestamp_ms,
                refined_keys: request.violations.iter().map(|v| v.ghost_key).collect(),
            })
        }
    }

    #[test]
    fn converging_peer_resolves_all_violations() {
        let topology = topology_with_ranks(4);
        let protocol = ButterflyProtocol::new(0, topology, ManualTimeSource::shared());
        let outcome = protocol.run(&AlwaysRefines, vec![violation(1), violation(2)]).unwrap();
        assert_eq!(outcome.refined_keys.len(), 2);
        assert!(outcome.failures.values().all(|&c| c == 0));
    }

    #[test]
    fn unavailable_peer_degrades_gracefully() {
        let topology = topology_with_ranks(4);
        let protocol = ButterflyProtocol::new(0, topology, ManualTimeSource::shared());
        let outcome = protocol
            .run(&UnavailablePeer { unavailable_rank: 3 }, vec![violation(1), violation(3)])
            .unwrap();
        assert_eq!(outcome.refined_keys.len(), 1);
        assert_eq!(*outcome.failures.get(&3).unwrap(), 1);
    }

    #[test]
    fn transient_failure_is_retried_once_before_succeeding() {
        let topology = topology_with_ranks(2);
        let protocol = ButterflyProtocol::new(0, topology, ManualTimeSource::shared());
        let transport = RetryOnceThenOk { attempts: Mutex::new(0) };
        let outcome = protocol.run(&transport, vec![violation(1)]).unwrap();
        assert_eq!(outcome.refined_keys.len(), 1);
        assert!(outcome.failures.is_empty() || outcome.failures.values().all(|&c| c == 0));
    }

    #[test]
    fn permanent_error_is_surfaced() {
        struct AlwaysPermanent;
        impl BalanceTransport for AlwaysPermanent {
            fn send_request(&self, peer_rank: u32, _request: &RefinementRequest) -> Result<RefinementResponse> {
                Err(LuciferaseError::ConfigInvalid(format!("bad peer {peer_rank}")))
            }
        }
        let topology = topology_with_ranks(2);
        let protocol = ButterflyProtocol::new(0, topology, ManualTimeSource::shared());
        let result = protocol.run(&AlwaysPermanent, vec![violation(1)]);
        assert!(result.is_err());
    }
}
