//! A single node of the index: the entities anchored at one SFC key, plus
//! bookkeeping for which of its children currently exist as their own
//! node-store entries.
//!
//! Most nodes have at most eight children (Bey/octant index `0..8`), but
//! the type-less `Tetree` root has up to 48 (`type * 8 + bey_index`, per
//! [`luciferase_geometry::SFCKey::subdivision_children`]), so the presence
//! mask is wide enough for that worst case.

use luciferase_types::{Aabb, EntityId};
use smallvec::SmallVec;

/// Entities living at one node. Inline-stores a handful before spilling to
/// the heap, since `max_entities_per_node` (default 10) keeps most nodes
/// small.
pub type EntitySet = SmallVec<[EntityId; 12]>;

/// One node of the spatial index.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub entities: EntitySet,
    /// Bit `i` set means child slot `i` has its own entry in the node
    /// store (this node has been subdivided along that branch).
    children_present: u64,
    /// Cached union of entity bounds, invalidated on any mutation.
    cached_aabb: Option<Aabb>,
}

impl Node {
    #[must_use]
    pub fn leaf() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.children_present == 0
    }

    #[must_use]
    pub const fn has_child(&self, slot: u8) -> bool {
        self.children_present & (1 << slot) != 0
    }

    pub fn set_child_present(&mut self, slot: u8, present: bool) {
        if present {
            self.children_present |= 1 << slot;
        } else {
            self.children_present &= !(1 << slot);
        }
    }

    /// Clear all child-presence bits, e.g. when recycling a removed node.
    pub fn clear_children(&mut self) {
        self.children_present = 0;
    }

    #[must_use]
    pub const fn child_count(&self) -> u32 {
        self.children_present.count_ones()
    }

    pub fn insert_entity(&mut self, id: EntityId) {
        if !self.entities.contains(&id) {
            self.entities.push(id);
            self.cached_aabb = None;
        }
    }

    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| *e != id);
        let removed = self.entities.len() != before;
        if removed {
            self.cached_aabb = None;
        }
        removed
    }

    #[must_use]
    pub const fn cached_aabb(&self) -> Option<Aabb> {
        self.cached_aabb
    }

    pub fn set_cached_aabb(&mut self, aabb: Option<Aabb>) {
        self.cached_aabb = aabb;
    }
}
