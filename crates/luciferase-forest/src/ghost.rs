//! Boundary replicas owned by neighboring partitions (§4.3 Ghost Layer).
//!
//! A ghost element is a read-only copy of a cell another rank owns,
//! kept around so queries that straddle a partition boundary don't need a
//! network round trip. [`GhostManager::sync`] refreshes the per-rank sets
//! through an injected [`GhostTransport`] (production: RPC to peers; tests:
//! an in-memory stub), the same injection pattern the crate uses for time.

use std::collections::HashMap;
use std::sync::Arc;

use luciferase_error::Result;
use luciferase_geometry::SFCKey;
use parking_lot::RwLock;

use crate::topology::PartitionTopology;

/// A single boundary cell replicated from another rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostElement {
    pub origin_rank: u32,
    pub key: SFCKey,
    pub level: u8,
    pub payload: Vec<u8>,
}

/// Per-rank sets of ghost elements currently held by this partition.
#[derive(Default, Clone)]
pub struct GhostLayer {
    by_rank: HashMap<u32, Vec<GhostElement>>,
}

impl GhostLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full set of ghosts attributed to `rank`.
    pub fn replace_rank(&mut self, rank: u32, elements: Vec<GhostElement>) {
        self.by_rank.insert(rank, elements);
    }

    /// Drop every ghost attributed to `rank`, e.g. when that rank is
    /// declared permanently failed.
    pub fn drop_rank(&mut self, rank: u32) {
        self.by_rank.remove(&rank);
    }

    #[must_use]
    pub fn elements_from(&self, rank: u32) -> &[GhostElement] {
        self.by_rank.get(&rank).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn all(&self) -> Vec<&GhostElement> {
        self.by_rank.values().flatten().collect()
    }

    #[must_use]
    pub fn origin_ranks(&self) -> Vec<u32> {
        self.by_rank.keys().copied().collect()
    }
}

/// Fetches a peer rank's current boundary elements. Production
/// implementations speak an RPC protocol; tests inject a fixed or
/// failure-simulating stub.
pub trait GhostTransport: Send + Sync {
    /// # Errors
    /// Returns [`luciferase_error::LuciferaseError::SyncFailure`] (or any
    /// other error) if the peer could not be reached or refused the
    /// request.
    fn fetch_boundary(&self, rank: u32) -> Result<Vec<GhostElement>>;
}

/// Observes the outcome of each per-rank sync attempt.
pub trait GhostSyncObserver: Send + Sync {
    fn on_sync_success(&self, rank: u32);
    fn on_sync_failure(&self, rank: u32, cause: &str);
}

/// Owns this partition's ghost layer and drives periodic resync against its
/// neighbors.
pub struct GhostManager {
    self_rank: u32,
    topology: Arc<PartitionTopology>,
    layer: RwLock<GhostLayer>,
    observers: RwLock<Vec<Arc<dyn GhostSyncObserver>>>,
}

impl GhostManager {
    #[must_use]
    pub fn new(self_rank: u32, topology: Arc<PartitionTopology>) -> Self {
        Self {
            self_rank,
            topology,
            layer: RwLock::new(GhostLayer::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn GhostSyncObserver>) {
        self.observers.write().push(observer);
    }

    /// Refresh the ghost layer from every other active rank via `transport`.
    /// Per-rank outcomes are reported to subscribed observers rather than
    /// aborting the whole sync on the first failure.
    pub fn sync(&self, transport: &dyn GhostTransport) {
        for rank in self.topology.active_ranks() {
            if rank == self.self_rank {
                continue;
            }
            match transport.fetch_boundary(rank) {
                Ok(elements) => {
                    self.layer.write().replace_rank(rank, elements);
                    for observer in self.observers.read().iter() {
                        observer.on_sync_success(rank);
                    }
                }
                Err(cause) => {
                    let message = cause.to_string();
                    for observer in self.observers.read().iter() {
                        observer.on_sync_failure(rank, &message);
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn ghost_layer(&self) -> parking_lot::RwLockReadGuard<'_, GhostLayer> {
        self.layer.read()
    }

    pub fn drop_rank(&self, rank: u32) {
        self.layer.write().drop_rank(rank);
    }
}
