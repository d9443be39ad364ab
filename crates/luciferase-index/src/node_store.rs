//! The node store: a `BTreeMap` keyed by [`SFCKey`], protected by a single
//! reader-writer lock. `BTreeMap`'s ordering matches `SFCKey`'s own total
//! order, so SFC-range queries are plain `BTreeMap::range` calls rather
//! than a bespoke navigable-set structure.

use std::collections::BTreeMap;

use luciferase_geometry::{KeyKind, SFCKey};
use parking_lot::RwLock;

use crate::node::Node;

/// Concurrency-safe store of `SFCKey -> Node`, always containing at least
/// the level-0 root.
pub struct NodeStore {
    kind: KeyKind,
    nodes: RwLock<BTreeMap<SFCKey, Node>>,
    /// Recycled nodes from merges, reused by the next subdivision instead
    /// of allocating a fresh `SmallVec` every time.
    pool: RwLock<Vec<Node>>,
}

impl NodeStore {
    #[must_use]
    pub fn new(kind: KeyKind) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(SFCKey::root(kind), Node::leaf());
        Self {
            kind,
            nodes: RwLock::new(nodes),
            pool: RwLock::new(Vec::new()),
        }
    }

    /// Take a recycled, cleared node from the pool, or allocate one.
    #[must_use]
    pub fn take_pooled(&self) -> Node {
        self.pool.write().pop().unwrap_or_else(Node::leaf)
    }

    /// Return a removed node's storage to the pool for reuse.
    fn recycle(&self, mut node: Node) {
        node.entities.clear();
        node.set_cached_aabb(None);
        node.clear_children();
        let mut pool = self.pool.write();
        if pool.len() < 256 {
            pool.push(node);
        }
    }

    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Read-only snapshot of a node, if present.
    #[must_use]
    pub fn get(&self, key: &SFCKey) -> Option<Node> {
        self.nodes.read().get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &SFCKey) -> bool {
        self.nodes.read().contains_key(key)
    }

    /// Run `f` against the node at `key`, creating an empty leaf first if
    /// absent.
    pub fn with_node_mut<R>(&self, key: SFCKey, f: impl FnOnce(&mut Node) -> R) -> R {
        let mut guard = self.nodes.write();
        let node = guard.entry(key).or_insert_with(Node::leaf);
        f(node)
    }

    pub fn insert(&self, key: SFCKey, node: Node) {
        self.nodes.write().insert(key, node);
    }

    pub fn remove(&self, key: &SFCKey) -> Option<Node> {
        let removed = self.nodes.write().remove(key);
        if let Some(node) = removed.clone() {
            self.recycle(node);
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All `(key, node)` pairs with key in `[lo, hi]`, matching the SFC
    /// key order (ancestors sort before descendants).
    #[must_use]
    pub fn range(&self, lo: SFCKey, hi: SFCKey) -> Vec<(SFCKey, Node)> {
        self.nodes
            .read()
            .range(lo..=hi)
            .map(|(k, v)| (*k, v.clone()))
            .collect()
    }

    /// All `(key, node)` pairs currently stored, for callers doing a full
    /// scan (small indexes, tests, diagnostics).
    #[must_use]
    pub fn all(&self) -> Vec<(SFCKey, Node)> {
        self.nodes.read().iter().map(|(k, v)| (*k, v.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_contains_only_the_root() {
        let store = NodeStore::new(KeyKind::Tetree);
        assert_eq!(store.len(), 1);
        assert!(store.contains(&SFCKey::root(KeyKind::Tetree)));
    }

    #[test]
    fn with_node_mut_creates_missing_nodes() {
        let store = NodeStore::new(KeyKind::Morton);
        let key = SFCKey::root(KeyKind::Morton).child(2).unwrap();
        store.with_node_mut(key, |node| node.insert_entity(luciferase_types::EntityId::new(7)));
        assert!(store.contains(&key));
        assert_eq!(store.get(&key).unwrap().entities.len(), 1);
    }

    #[test]
    fn removed_nodes_are_recycled_for_reuse() {
        let store = NodeStore::new(KeyKind::Morton);
        let key = SFCKey::root(KeyKind::Morton).child(0).unwrap();
        store.with_node_mut(key, |node| node.insert_entity(luciferase_types::EntityId::new(1)));
        store.remove(&key);
        let pooled = store.take_pooled();
        assert!(pooled.entities.is_empty());
    }

    #[test]
    fn range_returns_keys_in_sfc_order() {
        let store = NodeStore::new(KeyKind::Morton);
        let root = SFCKey::root(KeyKind::Morton);
        for i in 0..8u8 {
            store.with_node_mut(root.child(i).unwrap(), |_| {});
        }
        let lo = root.child(0).unwrap();
        let hi = root.child(7).unwrap();
        let keys: Vec<_> = store.range(lo, hi).into_iter().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 8);
    }
}
