//! Ghost-layer consistency invariants (§4.3), checked by the recovery
//! orchestrator's VALIDATING phase.

use std::collections::{HashMap, HashSet};

use luciferase_error::{LuciferaseError, Result};
use luciferase_geometry::SFCKey;
use luciferase_types::EntityId;

use crate::ghost::GhostLayer;

/// Runs the three ghost consistency checks from §4.3 against a snapshot of
/// the forest's current partition state.
pub struct Validator;

impl Validator {
    /// No entity id may appear in more than one partition's authoritative
    /// (non-ghost) entity set.
    #[must_use]
    pub fn count_duplicate_entities(authoritative: &HashMap<u32, HashSet<EntityId>>) -> usize {
        let mut seen = HashSet::new();
        let mut duplicates = HashSet::new();
        for ids in authoritative.values() {
            for id in ids {
                if !seen.insert(*id) {
                    duplicates.insert(*id);
                }
            }
        }
        duplicates.len()
    }

    /// Every ghost's origin rank must be in the active set.
    #[must_use]
    pub fn count_orphan_ghosts(layers: &HashMap<u32, &GhostLayer>, active_ranks: &[u32]) -> usize {
        let active: HashSet<u32> = active_ranks.iter().copied().collect();
        layers
            .values()
            .flat_map(|layer| layer.origin_ranks())
            .filter(|rank| !active.contains(rank))
            .count()
    }

    /// Every boundary element of a surviving partition must have a ghost in
    /// each neighbor whose domain abuts it.
    #[must_use]
    pub fn count_boundary_gaps(
        boundary_elements: &HashMap<u32, Vec<SFCKey>>,
        neighbors: &HashMap<u32, Vec<u32>>,
        layers: &HashMap<u32, &GhostLayer>,
    ) -> usize {
        let mut gaps = 0;
        for (&rank, keys) in boundary_elements {
            let Some(rank_neighbors) = neighbors.get(&rank) else {
                continue;
            };
            for &neighbor in rank_neighbors {
                let Some(neighbor_layer) = layers.get(&neighbor) else {
                    gaps += keys.len();
                    continue;
                };
                let ghosted: HashSet<SFCKey> = neighbor_layer
                    .elements_from(rank)
                    .iter()
                    .map(|g| g.key)
                    .collect();
                gaps += keys.iter().filter(|k| !ghosted.contains(k)).count();
            }
        }
        gaps
    }

    /// Run all three checks and fail with the aggregated counts if any is
    /// non-zero.
    ///
    /// # Errors
    /// Returns [`LuciferaseError::GhostValidationFailed`] with the
    /// individual counts if any invariant is violated.
    pub fn validate(
        authoritative: &HashMap<u32, HashSet<EntityId>>,
        layers: &HashMap<u32, &GhostLayer>,
        active_ranks: &[u32],
        boundary_elements: &HashMap<u32, Vec<SFCKey>>,
        neighbors: &HashMap<u32, Vec<u32>>,
    ) -> Result<()> {
        let duplicates = Self::count_duplicate_entities(authoritative);
        let orphans = Self::count_orphan_ghosts(layers, active_ranks);
        let gaps = Self::count_boundary_gaps(boundary_elements, neighbors, layers);
        if duplicates == 0 && orphans == 0 && gaps == 0 {
            Ok(())
        } else {
            Err(LuciferaseError::GhostValidationFailed {
                duplicates,
                orphans,
                gaps,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::GhostElement;
    use luciferase_geometry::KeyKind;

    #[test]
    fn duplicate_entity_across_partitions_is_detected() {
        let mut authoritative = HashMap::new();
        authoritative.insert(0, HashSet::from([EntityId::new(1), EntityId::new(2)]));
        authoritative.insert(1, HashSet::from([EntityId::new(2)]));
        assert_eq!(Validator::count_duplicate_entities(&authoritative), 1);
    }

    #[test]
    fn ghost_from_inactive_rank_is_an_orphan() {
        let mut layer = GhostLayer::new();
        layer.replace_rank(
            9,
            vec![GhostElement {
                origin_rank: 9,
                key: SFCKey::root(KeyKind::Morton),
                level: 0,
                payload: vec![],
            }],
        );
        let mut layers = HashMap::new();
        layers.insert(0u32, &layer);
        assert_eq!(Validator::count_orphan_ghosts(&layers, &[0, 1]), 1);
    }

    #[test]
    fn missing_ghost_for_boundary_element_is_a_gap() {
        let key = SFCKey::root(KeyKind::Morton).child(0).unwrap();
        let mut boundary = HashMap::new();
        boundary.insert(0u32, vec![key]);
        let mut neighbors = HashMap::new();
        neighbors.insert(0u32, vec![1u32]);
        let neighbor_layer = GhostLayer::new();
        let mut layers = HashMap::new();
        layers.insert(1u32, &neighbor_layer);
        assert_eq!(
            Validator::count_boundary_gaps(&boundary, &neighbors, &layers),
            1
        );
    }

    #[test]
    fn ghosted_boundary_element_is_not_a_gap() {
        let key = SFCKey::root(KeyKind::Morton).child(0).unwrap();
        let mut boundary = HashMap::new();
        boundary.insert(0u32, vec![key]);
        let mut neighbors = HashMap::new();
        neighbors.insert(0u32, vec![1u32]);
        let mut neighbor_layer = GhostLayer::new();
        neighbor_layer.replace_rank(
            0,
            vec![GhostElement {
                origin_rank: 0,
                key,
                level: key.level(),
                payload: vec![],
            }],
        );
        let mut layers = HashMap::new();
        layers.insert(1u32, &neighbor_layer);
        assert_eq!(
            Validator::count_boundary_gaps(&boundary, &neighbors, &layers),
            0
        );
    }
}
