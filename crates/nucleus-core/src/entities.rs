//! Dense entity id allocation.

use nucleus_types::EntityId;

/// Hands out entity ids `0, 1, 2, ...` and tracks which are still alive.
///
/// Ids are never reused, so property slots of removed entities are never
/// observed by a later entity.
#[derive(Debug, Clone, Default)]
pub struct EntityAllocator {
    alive: Vec<bool>,
    count: usize,
}

impl EntityAllocator {
    /// Create an empty allocator.
    pub const fn new() -> Self {
        Self {
            alive: Vec::new(),
            count: 0,
        }
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId::from(self.alive.len());
        self.alive.push(true);
        self.count = self.count.saturating_add(1);
        id
    }

    /// Mark `entity` removed. Returns `false` if it was not alive.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(slot) = entity.index().and_then(|i| self.alive.get_mut(i)) else {
            return false;
        };
        if !*slot {
            return false;
        }
        *slot = false;
        self.count = self.count.saturating_sub(1);
        true
    }

    /// Return `true` if `entity` was allocated and not removed.
    pub fn contains(&self, entity: EntityId) -> bool {
        entity
            .index()
            .and_then(|i| self.alive.get(i))
            .is_some_and(|&alive| alive)
    }

    /// Return the number of live entities.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Iterate live entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .map(|(index, _)| EntityId::from(index))
    }
}
