//! §8 scenario 2: entities that all map to the same child never trigger a
//! split, since subdividing would not relieve the overload (the
//! single-child-bucket abort).

use luciferase_geometry::{KeyKind, SFCKey};
use luciferase_index::{Index, SpatialIndex};
use luciferase_types::{Aabb, EntityId, IndexConfig, SpanningPolicy, Vec3f};

#[test]
fn colocated_entities_leave_the_root_a_single_leaf() {
    let config = IndexConfig {
        max_entities_per_node: 2,
        max_depth: 5,
        spanning_policy: SpanningPolicy::Center,
        max_refinement_level: 21,
        collision_margin: 0.0,
    };
    let bounds = Aabb::new(Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(2048.0, 2048.0, 2048.0));
    let index = Index::new(KeyKind::Morton, config, bounds);

    let position = Vec3f::new(100.0, 100.0, 100.0);
    for i in 0..3u64 {
        index.insert(EntityId::new(i), position, None).unwrap();
    }

    let root = SFCKey::root(KeyKind::Morton);
    let (is_leaf, count) = index.node_entity_count(root).expect("root always exists");
    assert!(is_leaf, "colocated overflow must not split the root");
    assert_eq!(count, 3);
    assert_eq!(index.nonempty_leaf_count(), 1);
}
