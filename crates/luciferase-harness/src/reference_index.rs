//! Linear-scan reference index: the naive baseline scenario 6 (§8) checks
//! the real `Index`'s range queries against.

use luciferase_types::{Aabb, EntityId, Vec3f};

/// A flat `(id, position)` table queried by brute-force scan. Exists only
/// to give compliance tests an implementation-independent ground truth.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    entries: Vec<(EntityId, Vec3f)>,
}

impl ReferenceIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: Vec<(EntityId, Vec3f)>) -> Self {
        Self { entries }
    }

    pub fn insert(&mut self, id: EntityId, position: Vec3f) {
        self.entries.push((id, position));
    }

    /// All entity ids whose position falls within `bounds`, order unspecified.
    #[must_use]
    pub fn entities_in_bounds(&self, bounds: Aabb) -> Vec<EntityId> {
        self.entries
            .iter()
            .filter(|(_, p)| bounds.contains_point(*p))
            .map(|(id, _)| *id)
            .collect()
    }

    /// The `k` entities nearest `origin` by Euclidean distance, closest first.
    #[must_use]
    pub fn k_nearest(&self, origin: Vec3f, k: usize) -> Vec<EntityId> {
        let mut by_distance: Vec<(f32, EntityId)> =
            self.entries.iter().map(|(id, p)| (origin.distance_squared(*p), *id)).collect();
        by_distance.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("positions are never NaN"));
        by_distance.into_iter().take(k).map(|(_, id)| id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True if `lhs` and `rhs` contain the same entity ids, ignoring order.
#[must_use]
pub fn same_entity_set(lhs: &[EntityId], rhs: &[EntityId]) -> bool {
    let mut lhs_sorted = lhs.to_vec();
    let mut rhs_sorted = rhs.to_vec();
    lhs_sorted.sort();
    rhs_sorted.sort();
    lhs_sorted == rhs_sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_query_matches_filter_semantics() {
        let mut reference = ReferenceIndex::new();
        reference.insert(EntityId::new(1), Vec3f::new(250.0, 250.0, 250.0));
        reference.insert(EntityId::new(2), Vec3f::new(500.0, 500.0, 500.0));
        reference.insert(EntityId::new(3), Vec3f::new(900.0, 900.0, 900.0));

        let bounds = Aabb::new(Vec3f::new(200.0, 200.0, 200.0), Vec3f::new(400.0, 400.0, 400.0));
        let hits = reference.entities_in_bounds(bounds);
        assert!(same_entity_set(&hits, &[EntityId::new(1)]));
    }

    #[test]
    fn k_nearest_orders_by_distance() {
        let mut reference = ReferenceIndex::new();
        reference.insert(EntityId::new(1), Vec3f::new(10.0, 0.0, 0.0));
        reference.insert(EntityId::new(2), Vec3f::new(1.0, 0.0, 0.0));
        reference.insert(EntityId::new(3), Vec3f::new(5.0, 0.0, 0.0));
        let nearest = reference.k_nearest(Vec3f::ZERO, 2);
        assert_eq!(nearest, vec![EntityId::new(2), EntityId::new(3)]);
    }

    #[test]
    fn same_entity_set_ignores_order() {
        assert!(same_entity_set(&[EntityId::new(1), EntityId::new(2)], &[EntityId::new(2), EntityId::new(1)]));
        assert!(!same_entity_set(&[EntityId::new(1)], &[EntityId::new(1), EntityId::new(2)]));
    }
}
