//! §8 scenario 1, Tetree variant: the tetrahedral SFC ("hard part (i)" per
//! §1) subdivides and locates correctly across all six root simplices, not
//! just the `x >= y >= z` one Bey-refining a fixed root type would
//! otherwise restrict it to.

use luciferase_geometry::{KeyKind, SFCKey};
use luciferase_index::{Index, SpatialIndex};
use luciferase_types::{Aabb, EntityId, IndexConfig, SpanningPolicy, Vec3f};

fn index() -> Index {
    let config = IndexConfig {
        max_entities_per_node: 2,
        max_depth: 6,
        spanning_policy: SpanningPolicy::Center,
        max_refinement_level: 21,
        collision_margin: 0.0,
    };
    let bounds = Aabb::new(Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(2048.0, 2048.0, 2048.0));
    Index::new(KeyKind::Tetree, config, bounds)
}

fn coord_of(p: Vec3f) -> (i64, i64, i64) {
    let scale = luciferase_geometry::ROOT_EXTENT as f64 / 2048.0;
    (
        (f64::from(p.x) * scale) as i64,
        (f64::from(p.y) * scale) as i64,
        (f64::from(p.z) * scale) as i64,
    )
}

#[test]
fn overloaded_root_subdivides_for_points_in_every_axis_ordering() {
    let index = index();
    // One point per ordering of (x, y, z) so every one of the six root Kuhn
    // simplices is exercised, not only the `x >= y >= z` one.
    let positions = [
        Vec3f::new(900.0, 500.0, 100.0), // x >= y >= z
        Vec3f::new(900.0, 100.0, 500.0), // x >= z >= y
        Vec3f::new(500.0, 900.0, 100.0), // y >= x >= z
        Vec3f::new(100.0, 900.0, 500.0), // y >= z >= x
        Vec3f::new(500.0, 100.0, 900.0), // z >= x >= y
        Vec3f::new(100.0, 500.0, 900.0), // z >= y >= x
    ];
    for (i, p) in positions.iter().enumerate() {
        index.insert(EntityId::new(i as u64), *p, None).unwrap();
    }

    assert!(
        index.nonempty_leaf_count() >= 2,
        "the overloaded root must split across the simplices its entities fall in"
    );

    for (i, p) in positions.iter().enumerate() {
        let id = EntityId::new(i as u64);
        let locations = index.entity_locations(id).expect("entity must be tracked");
        assert_eq!(locations.len(), 1, "non-spanning entity must hold exactly one key");
        let key = locations[0];
        let (is_leaf, count) = index.node_entity_count(key).expect("held key must exist");
        assert!(is_leaf);
        assert!(count >= 1);

        let located = SFCKey::locate(KeyKind::Tetree, coord_of(*p), key.level()).unwrap();
        assert_eq!(located, key, "point-location must map the entity to its holding key, for every root simplex");
    }
}
