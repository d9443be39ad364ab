//! Tracks where each entity currently lives, independent of the node
//! store, so removal and position updates don't require a tree scan.

use std::collections::HashMap;

use luciferase_error::{LuciferaseError, Result};
use luciferase_geometry::SFCKey;
use luciferase_types::{Aabb, EntityId, EntityRecord, Vec3f};
use parking_lot::RwLock;

/// Concurrency-safe `EntityId -> EntityRecord` table.
#[derive(Default)]
pub struct EntityManager {
    records: RwLock<HashMap<EntityId, EntityRecord<SFCKey, Aabb>>>,
}

impl EntityManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity with no locations yet.
    ///
    /// # Errors
    /// Returns [`LuciferaseError::EntityAlreadyPresent`] if `id` is
    /// already tracked.
    pub fn register(&self, id: EntityId, position: Vec3f, bounds: Option<Aabb>) -> Result<()> {
        let mut guard = self.records.write();
        if guard.contains_key(&id) {
            return Err(LuciferaseError::EntityAlreadyPresent(id.get()));
        }
        guard.insert(id, EntityRecord::new(id, position, bounds));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<EntityRecord<SFCKey, Aabb>> {
        self.records.read().get(&id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.records.read().contains_key(&id)
    }

    /// Remove an entity's record entirely, returning its final locations
    /// so the caller can clean up the node store.
    ///
    /// # Errors
    /// Returns [`LuciferaseError::EntityUnknown`] if `id` is not tracked.
    pub fn unregister(&self, id: EntityId) -> Result<EntityRecord<SFCKey, Aabb>> {
        self.records
            .write()
            .remove(&id)
            .ok_or(LuciferaseError::EntityUnknown(id.get()))
    }

    /// Mutate a tracked entity's record in place.
    ///
    /// # Errors
    /// Returns [`LuciferaseError::EntityUnknown`] if `id` is not tracked.
    pub fn with_record_mut<R>(
        &self,
        id: EntityId,
        f: impl FnOnce(&mut EntityRecord<SFCKey, Aabb>) -> R,
    ) -> Result<R> {
        let mut guard = self.records.write();
        let record = guard.get_mut(&id).ok_or(LuciferaseError::EntityUnknown(id.get()))?;
        Ok(f(record))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn all_ids(&self) -> Vec<EntityId> {
        self.records.read().keys().copied().collect()
    }
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("len", &self.len())
            .finish()
    }
}
