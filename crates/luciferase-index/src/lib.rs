//! Single-partition spatial index: a `BTreeMap` of nodes keyed by
//! space-filling-curve key (Morton or Tetree), entities tracked separately
//! by id, and adaptive subdivision/merge driven by per-node entity counts.
//!
//! The cross-partition concerns (ghost exchange, fault detection,
//! rebalancing) live in sibling crates; this crate only owns what fits in
//! one partition's memory.

pub mod coords;
pub mod entity_manager;
pub mod node;
pub mod node_store;
pub mod spatial_index;
pub mod subdivision;

pub use coords::CoordMapper;
pub use entity_manager::EntityManager;
pub use node::{EntitySet, Node};
pub use node_store::NodeStore;
pub use spatial_index::{Index, SpatialIndex};
pub use subdivision::{subdivide, try_merge};
