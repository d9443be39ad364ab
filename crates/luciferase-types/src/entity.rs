//! Entity identity and the per-entity bookkeeping the index maintains.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::hash::Hash;

/// Opaque handle to an inserted entity. Entity ids are caller-assigned
/// (typically a dense counter or an external id mapped 1:1); the index never
/// allocates them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Inline set sized for the common case (an entity lives in one node). Spans
/// a handful of nodes before falling back to heap storage, matching the
/// "spanning entity" edge case which is the exception rather than the rule.
pub type LocationSet<K> = SmallVec<[K; 4]>;

/// A record of where an entity currently lives.
///
/// Invariant: `locations` equals the exact set of node keys whose node
/// contains this entity's id (§3 Entity record).
#[derive(Debug, Clone)]
pub struct EntityRecord<K, B> {
    pub id: EntityId,
    pub position: crate::vec3::Vec3f,
    pub bounds: Option<B>,
    pub locations: LocationSet<K>,
}

impl<K: PartialEq + Clone, B> EntityRecord<K, B> {
    #[must_use]
    pub fn new(id: EntityId, position: crate::vec3::Vec3f, bounds: Option<B>) -> Self {
        Self {
            id,
            position,
            bounds,
            locations: LocationSet::new(),
        }
    }

    pub fn add_location(&mut self, key: K) {
        if !self.locations.iter().any(|k| *k == key) {
            self.locations.push(key);
        }
    }

    pub fn remove_location(&mut self, key: &K) {
        self.locations.retain(|k| k != key);
    }

    #[must_use]
    pub fn is_spanning(&self) -> bool {
        self.locations.len() > 1
    }
}
