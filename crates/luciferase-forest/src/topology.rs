//! Bidirectional UUID-to-rank partition topology (§3 `PartitionTopology`,
//! §4.3).
//!
//! The topology is the single source of truth for "which ranks are
//! currently active", consulted by the quorum check in recovery and by the
//! butterfly balance protocol's pairing function. Every mutation bumps a
//! monotonic `version` so callers can detect a stale snapshot without
//! re-reading the whole map.

use std::collections::HashMap;

use luciferase_error::{LuciferaseError, Result};
use luciferase_types::PartitionId;
use parking_lot::RwLock;

struct TopologyInner {
    by_id: HashMap<PartitionId, u32>,
    by_rank: HashMap<u32, PartitionId>,
    version: u64,
}

/// Bidirectional `PartitionId <-> rank` map, versioned on every change.
pub struct PartitionTopology {
    inner: RwLock<TopologyInner>,
}

impl PartitionTopology {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TopologyInner {
                by_id: HashMap::new(),
                by_rank: HashMap::new(),
                version: 0,
            }),
        }
    }

    /// Register `id` at `rank`. Re-registering the same `(id, rank)` pair is
    /// a no-op (idempotent). Registering a different id at an
    /// already-occupied rank fails with [`LuciferaseError::RankCollision`].
    ///
    /// # Errors
    /// Returns [`LuciferaseError::RankCollision`] if `rank` is already held
    /// by a different partition.
    pub fn register(&self, id: PartitionId, rank: u32) -> Result<()> {
        let mut guard = self.inner.write();
        if let Some(&existing_rank) = guard.by_id.get(&id) {
            if existing_rank == rank {
                return Ok(());
            }
        }
        if let Some(&existing_id) = guard.by_rank.get(&rank) {
            if existing_id != id {
                return Err(LuciferaseError::RankCollision {
                    rank,
                    existing: existing_id,
                    requested: id,
                });
            }
        }
        guard.by_id.insert(id, rank);
        guard.by_rank.insert(rank, id);
        guard.version += 1;
        Ok(())
    }

    /// Remove a partition from the active set, e.g. on permanent failure.
    pub fn deregister(&self, id: PartitionId) {
        let mut guard = self.inner.write();
        if let Some(rank) = guard.by_id.remove(&id) {
            guard.by_rank.remove(&rank);
            guard.version += 1;
        }
    }

    #[must_use]
    pub fn rank_of(&self, id: PartitionId) -> Option<u32> {
        self.inner.read().by_id.get(&id).copied()
    }

    #[must_use]
    pub fn partition_at(&self, rank: u32) -> Option<PartitionId> {
        self.inner.read().by_rank.get(&rank).copied()
    }

    #[must_use]
    pub fn active_ranks(&self) -> Vec<u32> {
        let mut ranks: Vec<u32> = self.inner.read().by_rank.keys().copied().collect();
        ranks.sort_unstable();
        ranks
    }

    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.inner.read().by_id.len()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }
}

impl Default for PartitionTopology {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn reregistering_the_same_pair_is_idempotent() {
        let topology = PartitionTopology::new();
        let id = Uuid::new_v4();
        topology.register(id, 0).unwrap();
        let version_after_first = topology.version();
        topology.register(id, 0).unwrap();
        assert_eq!(topology.version(), version_after_first);
    }

    #[test]
    fn rank_collision_with_different_id_fails() {
        let topology = PartitionTopology::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        topology.register(a, 0).unwrap();
        assert!(matches!(
            topology.register(b, 0),
            Err(LuciferaseError::RankCollision { rank: 0, .. })
        ));
    }

    #[test]
    fn deregister_frees_the_rank_for_reuse() {
        let topology = PartitionTopology::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        topology.register(a, 0).unwrap();
        topology.deregister(a);
        topology.register(b, 0).unwrap();
        assert_eq!(topology.partition_at(0), Some(b));
    }

    #[test]
    fn active_ranks_are_sorted() {
        let topology = PartitionTopology::new();
        for (rank, _) in (0..4).enumerate() {
            topology.register(Uuid::new_v4(), (3 - rank) as u32).unwrap();
        }
        assert_eq!(topology.active_ranks(), vec![0, 1, 2, 3]);
    }
}
