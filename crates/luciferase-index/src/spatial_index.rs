//! The public API of a single-partition spatial index: insert, remove,
//! position updates, and the three query shapes (point/range lookup,
//! k-nearest, and broad-phase collision pairs).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use luciferase_error::{LuciferaseError, Result};
use luciferase_geometry::{KeyKind, SFCKey};
use luciferase_types::{Aabb, EntityId, IndexConfig, SpanningPolicy, Vec3f};
use parking_lot::RwLock;

use crate::coords::CoordMapper;
use crate::entity_manager::EntityManager;
use crate::node_store::NodeStore;
use crate::subdivision::{subdivide, try_merge};

/// Operations every spatial index backend (Morton or Tetree keyed) exposes.
pub trait SpatialIndex {
    fn insert(&self, id: EntityId, position: Vec3f, bounds: Option<Aabb>) -> Result<()>;
    fn insert_batch(&self, entities: &[(EntityId, Vec3f, Option<Aabb>)]) -> Result<Vec<EntityId>>;
    fn remove(&self, id: EntityId) -> Result<()>;
    fn update_position(&self, id: EntityId, position: Vec3f) -> Result<()>;
    fn lookup(&self, id: EntityId) -> Option<Vec3f>;
    fn entities_in_bounds(&self, bounds: Aabb) -> Vec<EntityId>;
    fn k_nearest(&self, origin: Vec3f, k: usize) -> Vec<EntityId>;
    fn find_collisions(&self, id: EntityId) -> Vec<(EntityId, EntityId)>;
}

/// A single-partition tetrahedral or octree spatial index.
pub struct Index {
    kind: KeyKind,
    config: RwLock<IndexConfig>,
    mapper: CoordMapper,
    nodes: NodeStore,
    entities: EntityManager,
}

impl Index {
    #[must_use]
    pub fn new(kind: KeyKind, config: IndexConfig, bounds: Aabb) -> Self {
        Self {
            kind,
            config: RwLock::new(config),
            mapper: CoordMapper::new(bounds),
            nodes: NodeStore::new(kind),
            entities: EntityManager::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        self.kind
    }

    #[must_use]
    pub fn config(&self) -> IndexConfig {
        *self.config.read()
    }

    /// Runtime-adjustable capacity threshold driving [`subdivide`] (§6
    /// Configuration).
    pub fn set_max_entities_per_node(&self, max_entities_per_node: u32) {
        self.config.write().max_entities_per_node = max_entities_per_node;
    }

    /// Runtime-adjustable ceiling on key level.
    pub fn set_max_depth(&self, max_depth: u8) {
        self.config.write().max_depth = max_depth;
    }

    pub fn set_spanning_policy(&self, policy: SpanningPolicy) {
        self.config.write().spanning_policy = policy;
    }

    /// Keys an entity's bounding box touches, per the configured spanning
    /// policy. `FullBounds` walks every leaf the box overlaps; a future
    /// `CentroidOnly` policy (not yet distinguished in config) would anchor
    /// to a single key.
    fn locations_for(&self, position: Vec3f, bounds: Option<Aabb>) -> Result<Vec<SFCKey>> {
        match (self.config.read().spanning_policy, bounds) {
            (SpanningPolicy::FullBounds, Some(b)) => {
                let corners = [
                    b.min,
                    Vec3f::new(b.max.x, b.min.y, b.min.z),
                    Vec3f::new(b.min.x, b.max.y, b.min.z),
                    Vec3f::new(b.min.x, b.min.y, b.max.z),
                    Vec3f::new(b.max.x, b.max.y, b.min.z),
                    Vec3f::new(b.max.x, b.min.y, b.max.z),
                    Vec3f::new(b.min.x, b.max.y, b.max.z),
                    b.max,
                ];
                let mut keys = Vec::with_capacity(8);
                for corner in corners {
                    let key = self.leaf_for(corner)?;
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                Ok(keys)
            }
            _ => Ok(vec![self.leaf_for(position)?]),
        }
    }

    /// Current locations of an entity, for diagnostics and tests (§8
    /// scenario 1's "each entity's locations contains exactly one key").
    #[must_use]
    pub fn entity_locations(&self, id: EntityId) -> Option<Vec<SFCKey>> {
        self.entities.get(id).map(|r| r.locations.to_vec())
    }

    /// Count of non-empty leaf nodes currently in the store (§8 scenarios 1
    /// and 2: subdivision produces multiple non-empty leaves; colocated
    /// entities stay in one).
    #[must_use]
    pub fn nonempty_leaf_count(&self) -> usize {
        self.nodes
            .all()
            .into_iter()
            .filter(|(_, node)| node.is_leaf() && !node.entities.is_empty())
            .count()
    }

    /// `(is_leaf, entity_count)` of the node at `key`, if it exists.
    #[must_use]
    pub fn node_entity_count(&self, key: SFCKey) -> Option<(bool, usize)> {
        self.nodes.get(&key).map(|node| (node.is_leaf(), node.entities.len()))
    }

    /// Descend the node store's existing branches to the leaf that already
    /// contains `p`, without jumping straight to `max_depth`. New entities
    /// land wherever the tree currently bottoms out; [`subdivide`] is what
    /// pushes a leaf deeper once it overflows.
    fn leaf_for(&self, p: Vec3f) -> Result<SFCKey> {
        let int_point = self.mapper.to_int(p)?;
        let mut current = SFCKey::root(self.kind);
        loop {
            let Some(node) = self.nodes.get(&current) else {
                return Ok(current);
            };
            if node.is_leaf() || current.level() >= self.config.read().max_depth {
                return Ok(current);
            }
            current = SFCKey::locate(self.kind, int_point, current.level() + 1)?;
        }
    }
}

impl SpatialIndex for Index {
    fn insert(&self, id: EntityId, position: Vec3f, bounds: Option<Aabb>) -> Result<()> {
        self.entities.register(id, position, bounds)?;
        let keys = self.locations_for(position, bounds)?;
        for key in &keys {
            self.nodes.with_node_mut(*key, |node| node.insert_entity(id));
            self.entities.with_record_mut(id, |rec| rec.add_location(*key))?;
        }
        let config = self.config.read();
        for key in keys {
            subdivide(&self.nodes, &self.entities, &config, &self.mapper, key)?;
        }
        Ok(())
    }

    /// Insert every entity in `entities`, returning the ids that inserted
    /// successfully; one entity failing (e.g. `EntityAlreadyPresent`) does
    /// not abort the rest of the batch (§6 `insert_batch`).
    fn insert_batch(&self, entities: &[(EntityId, Vec3f, Option<Aabb>)]) -> Result<Vec<EntityId>> {
        let mut inserted = Vec::with_capacity(entities.len());
        for &(id, position, bounds) in entities {
            if self.insert(id, position, bounds).is_ok() {
                inserted.push(id);
            }
        }
        Ok(inserted)
    }

    fn remove(&self, id: EntityId) -> Result<()> {
        let record = self.entities.unregister(id)?;
        let config = self.config.read();
        for key in record.locations {
            self.nodes.with_node_mut(key, |node| {
                node.remove_entity(id);
            });
            let mut ancestor = key;
            while let Ok(parent) = ancestor.parent() {
                if !try_merge(&self.nodes, &self.entities, &config, parent)? {
                    break;
                }
                ancestor = parent;
            }
        }
        Ok(())
    }

    fn update_position(&self, id: EntityId, position: Vec3f) -> Result<()> {
        let record = self.entities.get(id).ok_or(LuciferaseError::EntityUnknown(id.get()))?;
        let bounds = record.bounds;
        self.remove(id)?;
        self.insert(id, position, bounds)
    }

    fn lookup(&self, id: EntityId) -> Option<Vec3f> {
        self.entities.get(id).map(|r| r.position)
    }

    fn entities_in_bounds(&self, bounds: Aabb) -> Vec<EntityId> {
        let Ok(lo) = self.mapper.to_int(bounds.min) else {
            return Vec::new();
        };
        let Ok(hi) = self.mapper.to_int(bounds.max) else {
            return Vec::new();
        };
        let max_depth = self.config.read().max_depth;
        let (Ok(lo_key), Ok(hi_key)) = (
            SFCKey::locate(self.kind, lo, max_depth),
            SFCKey::locate(self.kind, hi, max_depth),
        ) else {
            return Vec::new();
        };
        let root = SFCKey::root(self.kind);
        let scan_lo = lo_key.min(hi_key).min(root);
        let scan_hi = lo_key.max(hi_key);
        let mut found = Vec::new();
        for (key, node) in self.nodes.range(scan_lo, scan_hi) {
            let (ax, ay, az) = key.cell_anchor();
            let size = key.cell_size();
            let cell_world_min = self.mapper.to_world((ax, ay, az));
            let cell_world_max = self.mapper.to_world((ax + size, ay + size, az + size));
            let cell_box = Aabb::new(cell_world_min, cell_world_max);
            if cell_box.intersects(&bounds) {
                for id in &node.entities {
                    if let Some(pos) = self.lookup(*id) {
                        if bounds.contains_point(pos) && !found.contains(id) {
                            found.push(*id);
                        }
                    }
                }
            }
        }
        found
    }

    fn k_nearest(&self, origin: Vec3f, k: usize) -> Vec<EntityId> {
        if k == 0 {
            return Vec::new();
        }
        struct Candidate {
            id: EntityId,
            dist: f32,
        }
        impl PartialEq for Candidate {
            fn eq(&self, other: &Self) -> bool {
                self.dist == other.dist
            }
        }
        impl Eq for Candidate {}
        impl PartialOrd for Candidate {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for Candidate {
            fn cmp(&self, other: &Self) -> Ordering {
                self.dist.partial_cmp(&other.dist).unwrap_or(Ordering::Equal)
            }
        }

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        for id in self.entities.all_ids() {
            let Some(pos) = self.lookup(id) else { continue };
            let dist = origin.distance(pos);
            heap.push(Candidate { id, dist });
            if heap.len() > k {
                heap.pop();
            }
        }
        let mut results: Vec<Candidate> = heap.into_vec();
        results.sort_by(|a, b| a.dist.partial_cmp(&b.dist).unwrap_or(Ordering::Equal));
        results.into_iter().map(|c| c.id).collect()
    }

    /// Collision pairs involving `id`: a spatial range query over its own
    /// AABB (or a zero-volume point box, for entities with no bounds)
    /// padded by `collision_margin`, never a node-neighbor walk — SFC
    /// locality does not imply structural adjacency, so neighboring nodes
    /// in key order can be arbitrarily far apart in space (§4.2).
    fn find_collisions(&self, id: EntityId) -> Vec<(EntityId, EntityId)> {
        let Some(record) = self.entities.get(id) else {
            return Vec::new();
        };
        let margin = self.config.read().collision_margin;
        let own_box = record.bounds.unwrap_or_else(|| Aabb::point(record.position));
        let query_box = own_box.expanded(margin);

        let mut pairs = Vec::new();
        for other in self.entities_in_bounds(query_box) {
            if other == id {
                continue;
            }
            let Some(other_record) = self.entities.get(other) else {
                continue;
            };
            let other_box = other_record.bounds.unwrap_or_else(|| Aabb::point(other_record.position));
            if query_box.intersects(&other_box) {
                let pair = if id.get() < other.get() { (id, other) } else { (other, id) };
                if !pairs.contains(&pair) {
                    pairs.push(pair);
                }
            }
        }
        pairs
    }
}
