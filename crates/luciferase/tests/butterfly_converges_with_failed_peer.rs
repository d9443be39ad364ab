//! §8 scenario 5: one partition failing to respond degrades the butterfly
//! exchange gracefully instead of aborting it — violations against the
//! live peers still resolve, and the dead peer's failures are counted.

use std::sync::Arc;

use luciferase_balance::{BalanceTransport, BalanceViolation, ButterflyProtocol, RefinementRequest, RefinementResponse};
use luciferase_error::{LuciferaseError, Result};
use luciferase_forest::PartitionTopology;
use luciferase_geometry::{KeyKind, SFCKey};
use luciferase_types::ManualTimeSource;
use uuid::Uuid;

struct UnavailablePeer {
    dead_rank: u32,
}

impl BalanceTransport for UnavailablePeer {
    fn send_request(&self, peer_rank: u32, request: &RefinementRequest) -> Result<RefinementResponse> {
        if peer_rank == self.dead_rank {
            return Err(LuciferaseError::SyncFailure {
                rank: peer_rank,
                cause: "peer unavailable".into(),
            });
        }
        Ok(RefinementResponse {
            responder_rank: peer_rank,
            round: request.round,
            timestamp_ms: request.timestamp_ms,
            refined_keys: vec![key_at_level(peer_rank as u8 + 1)],
        })
    }
}

fn key_at_level(level: u8) -> SFCKey {
    let mut key = SFCKey::root(KeyKind::Tetree);
    for _ in 0..level {
        key = key.child(0).unwrap();
    }
    key
}

fn violation(source_rank: u32) -> BalanceViolation {
    BalanceViolation {
        local_key: key_at_level(2),
        ghost_key: key_at_level(5),
        local_level: 2,
        ghost_level: 5,
        source_rank,
    }
}

#[test]
fn live_peers_resolve_while_the_dead_one_is_counted_as_a_failure() {
    let clock = ManualTimeSource::shared();
    let topology = Arc::new(PartitionTopology::new());
    for rank in 0..4u32 {
        topology.register(Uuid::new_v4(), rank).unwrap();
    }
    // Self rank 2's direct partners are 2^1=3 and 2^2=0, so a single run
    // exercises both a live exchange and the dead peer in one pass.
    let protocol = ButterflyProtocol::new(2, topology, clock);
    let transport = UnavailablePeer { dead_rank: 3 };

    let violations = vec![violation(0), violation(3)];
    let outcome = protocol.run(&transport, violations).expect("transient failures must not abort the run");

    assert!(!outcome.refined_keys.is_empty(), "the live peer at rank 0 must still contribute refined keys");
    assert!(
        outcome.failures.get(&3).copied().unwrap_or(0) >= 1,
        "rank 3's unreachability must be recorded as a failure"
    );
    assert!(!outcome.fully_converged(), "a dead peer means the run reports success with degraded coverage");
}
