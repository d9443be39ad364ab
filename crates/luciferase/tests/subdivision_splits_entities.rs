//! §8 scenario 1: an overloaded root subdivides, each entity ends up in
//! exactly one leaf, and point-location agrees with where it landed.

use luciferase_geometry::{KeyKind, SFCKey};
use luciferase_index::{Index, SpatialIndex};
use luciferase_types::{Aabb, EntityId, IndexConfig, SpanningPolicy, Vec3f};

fn index() -> Index {
    let config = IndexConfig {
        max_entities_per_node: 2,
        max_depth: 5,
        spanning_policy: SpanningPolicy::Center,
        max_refinement_level: 21,
        collision_margin: 0.0,
    };
    let bounds = Aabb::new(Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(2048.0, 2048.0, 2048.0));
    Index::new(KeyKind::Morton, config, bounds)
}

#[test]
fn root_subdivides_into_distinct_nonempty_leaves() {
    let index = index();
    let positions = [
        Vec3f::new(100.0, 100.0, 100.0),
        Vec3f::new(900.0, 900.0, 900.0),
        Vec3f::new(100.0, 900.0, 100.0),
    ];
    for (i, p) in positions.iter().enumerate() {
        index.insert(EntityId::new(i as u64), *p, None).unwrap();
    }

    assert!(
        index.nonempty_leaf_count() >= 2,
        "expected the overloaded root to split into at least two occupied leaves"
    );

    for (i, p) in positions.iter().enumerate() {
        let id = EntityId::new(i as u64);
        let locations = index.entity_locations(id).expect("entity must be tracked");
        assert_eq!(locations.len(), 1, "non-spanning entity must hold exactly one key");
        let key = locations[0];
        let (is_leaf, count) = index.node_entity_count(key).expect("held key must exist");
        assert!(is_leaf);
        assert!(count >= 1);

        let located = SFCKey::locate(KeyKind::Morton, coord_of(*p), key.level()).unwrap();
        assert_eq!(located, key, "point-location must map the entity to its holding key");
    }
}

fn coord_of(p: Vec3f) -> (i64, i64, i64) {
    let scale = luciferase_geometry::ROOT_EXTENT as f64 / 2048.0;
    (
        (f64::from(p.x) * scale) as i64,
        (f64::from(p.y) * scale) as i64,
        (f64::from(p.z) * scale) as i64,
    )
}
