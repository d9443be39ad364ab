//! Adaptive subdivision: splitting an overloaded leaf into its children
//! (eight Bey/octant children, or — for the type-less `Tetree` root — all
//! 48 `(type, bey_index)` combinations, per
//! [`luciferase_geometry::SFCKey::subdivision_children`]), and the reverse
//! merge when a subtree becomes sparse again.
//!
//! Tetrahedral refinement is atomic: a tetrahedron splits into all of its
//! children together, never a subset, so `subdivide` always creates every
//! child entry even if some end up empty.

use luciferase_error::Result;
use luciferase_geometry::SFCKey;
use luciferase_types::{EntityId, IndexConfig, Vec3f};

use crate::coords::CoordMapper;
use crate::entity_manager::EntityManager;
use crate::node_store::NodeStore;

/// Split the leaf at `key` into its eight children, redistributing its
/// entities by re-locating each one's position one level deeper, then
/// recurses into any child that is now itself over capacity.
///
/// # Errors
/// Propagates geometry errors (e.g. refining past `max_refinement_level`).
pub fn subdivide(
    store: &NodeStore,
    entities: &EntityManager,
    config: &IndexConfig,
    mapper: &CoordMapper,
    key: SFCKey,
) -> Result<()> {
    if key.level() >= config.max_refinement_level {
        return Ok(());
    }

    let overflow: Vec<EntityId> = store.with_node_mut(key, |node| node.entities.to_vec());
    if overflow.len() <= config.max_entities_per_node as usize {
        return Ok(());
    }

    let child_level = key.level() + 1;
    let mut single_bucket = true;
    let mut first_target = None;
    for &id in &overflow {
        let Some(record) = entities.get(id) else { continue };
        let int_point = mapper.to_int(record.position)?;
        let target = SFCKey::locate(key.kind(), int_point, child_level)?;
        match first_target {
            None => first_target = Some(target),
            Some(prev) if prev == target => {}
            Some(_) => {
                single_bucket = false;
                break;
            }
        }
    }
    if single_bucket {
        // Every overflowing entity maps to the same child: subdividing
        // would not relieve the overload, so this leaf stays as-is (§8
        // scenario 2, "single-child-bucket abort").
        return Ok(());
    }

    let children = key.subdivision_children()?;
    for &child_key in &children {
        store.with_node_mut(child_key, |_| {});
    }
    store.with_node_mut(key, |node| {
        node.entities.clear();
        for slot in 0..children.len() as u8 {
            node.set_child_present(slot, true);
        }
        node.set_cached_aabb(None);
    });

    for id in overflow {
        let Some(record) = entities.get(id) else {
            continue;
        };
        let target = place_in_children(&children, record.position, mapper)?;
        store.with_node_mut(target, |node| node.insert_entity(id));
        entities.with_record_mut(id, |rec| {
            rec.remove_location(&key);
            rec.add_location(target);
        })?;
    }

    for child_key in children {
        subdivide(store, entities, config, mapper, child_key)?;
    }
    Ok(())
}

/// Which of the already-created children a position belongs to.
fn place_in_children(children: &[SFCKey], position: Vec3f, mapper: &CoordMapper) -> Result<SFCKey> {
    let level = children[0].level();
    let int_point = mapper.to_int(position)?;
    let located = SFCKey::locate(children[0].kind(), int_point, level)?;
    debug_assert!(children.contains(&located), "locate must land on a created sibling");
    Ok(located)
}

/// If `key`'s children are all present, are all leaves, and their combined
/// entity count is within capacity, fold them back into `key` and drop
/// their node-store entries.
///
/// # Errors
/// Propagates entity-manager errors while relocating entities upward.
pub fn try_merge(store: &NodeStore, entities: &EntityManager, config: &IndexConfig, key: SFCKey) -> Result<bool> {
    let Some(node) = store.get(&key) else {
        return Ok(false);
    };
    if node.is_leaf() {
        return Ok(false);
    }

    let children = key.subdivision_children()?;
    let mut child_keys = Vec::with_capacity(children.len());
    let mut total = node.entities.len();
    for (slot, &child_key) in children.iter().enumerate() {
        if !node.has_child(slot as u8) {
            return Ok(false);
        }
        let Some(child) = store.get(&child_key) else {
            return Ok(false);
        };
        if !child.is_leaf() {
            return Ok(false);
        }
        total += child.entities.len();
        child_keys.push(child_key);
    }

    if total > config.max_entities_per_node as usize {
        return Ok(false);
    }

    let mut hoisted = Vec::with_capacity(total);
    for &child_key in &child_keys {
        if let Some(child) = store.remove(&child_key) {
            hoisted.extend(child.entities);
        }
    }
    store.with_node_mut(key, |parent| {
        parent.clear_children();
        parent.set_cached_aabb(None);
        for id in &hoisted {
            parent.insert_entity(*id);
        }
    });
    for id in hoisted {
        for &child_key in &child_keys {
            let _ = entities.with_record_mut(id, |rec| {
                rec.remove_location(&child_key);
                rec.add_location(key);
            });
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use luciferase_geometry::KeyKind;
    use luciferase_types::Aabb;

    fn small_index() -> (NodeStore, EntityManager, IndexConfig, CoordMapper) {
        let store = NodeStore::new(KeyKind::Tetree);
        let entities = EntityManager::new();
        let config = IndexConfig {
            max_entities_per_node: 2,
            max_depth: 21,
            spanning_policy: luciferase_types::SpanningPolicy::FullBounds,
            max_refinement_level: 21,
            collision_margin: 0.0,
        };
        let bounds = Aabb::new(Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(1000.0, 1000.0, 1000.0));
        (store, entities, config, CoordMapper::new(bounds))
    }

    #[test]
    fn overflowing_leaf_subdivides_and_redistributes() {
        let (store, entities, config, mapper) = small_index();
        let root = SFCKey::root(KeyKind::Tetree);
        let positions = [
            Vec3f::new(10.0, 10.0, 10.0),
            Vec3f::new(900.0, 900.0, 900.0),
            Vec3f::new(10.0, 900.0, 10.0),
        ];
        for (i, p) in positions.iter().enumerate() {
            let id = EntityId::new(i as u64);
            entities.register(id, *p, None).unwrap();
            store.with_node_mut(root, |node| node.insert_entity(id));
        }
        subdivide(&store, &entities, &config, &mapper, root).unwrap();

        let root_node = store.get(&root).unwrap();
        assert!(root_node.entities.is_empty());
        assert!(!root_node.is_leaf());

        // The root is the type-less Tetree case: its children span all six
        // Kuhn simplices (48 slots), not a single type's eight.
        let children = root.subdivision_children().unwrap();
        assert_eq!(children.len(), 48);
        let total_in_children: usize = children
            .iter()
            .map(|k| store.get(k).map_or(0, |n| n.entities.len()))
            .sum();
        assert_eq!(total_in_children, 3);
    }

    #[test]
    fn merge_reverses_subdivision_once_sparse() {
        let (store, entities, config, mapper) = small_index();
        let root = SFCKey::root(KeyKind::Tetree);
        for i in 0..3u64 {
            let p = Vec3f::new(10.0 + i as f32, 10.0, 10.0);
            let id = EntityId::new(i);
            entities.register(id, p, None).unwrap();
            store.with_node_mut(root, |node| node.insert_entity(id));
        }
        subdivide(&store, &entities, &config, &mapper, root).unwrap();
        // Remove one entity so the combined count (2) fits back under the
        // cap of 2.
        let leftover = EntityId::new(2);
        let children = root.subdivision_children().unwrap();
        for &child in &children {
            store.with_node_mut(child, |node| {
                node.remove_entity(leftover);
            });
        }
        let merged = try_merge(&store, &entities, &config, root).unwrap();
        assert!(merged);
        assert!(store.get(&root).unwrap().is_leaf());
        for &child in &children {
            assert!(!store.contains(&child));
        }
    }
}
