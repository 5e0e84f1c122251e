//! Compiled-Shader Cache
//!
//! One [`CacheEntry`] per top-level pipeline item, holding the item's id and
//! its vertex and pixel shader objects. Entries live in a [`SlotMap`] and the
//! snapshot order is a separate list of keys, so reordering only shuffles
//! small keys and never moves or recreates shader objects.
//!
//! Invariants:
//! - an entry owns its id and both shader objects, so they cannot drift apart;
//! - no two entries share an id (`lookup` is kept in sync with `order`);
//! - shader objects are dropped exactly once, when their entry is removed
//!   or the cache is cleared.

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use crate::pipeline::ItemId;

new_key_type! {
    pub struct EntryKey;
}

/// Compile state of a cached shader pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassState {
    /// Shader objects exist but were never compiled.
    Uncompiled,
    /// Both stages compiled.
    Ready,
    /// The last compile attempt failed for at least one stage.
    Failed,
}

/// Cached shader objects of one top-level item.
#[derive(Debug)]
pub struct CacheEntry<S> {
    pub(crate) item: ItemId,
    pub(crate) vertex: S,
    pub(crate) pixel: S,
    pub(crate) state: PassState,
}

impl<S> CacheEntry<S> {
    pub(crate) fn new(item: ItemId, vertex: S, pixel: S) -> Self {
        Self {
            item,
            vertex,
            pixel,
            state: PassState::Uncompiled,
        }
    }

    #[must_use]
    pub fn item(&self) -> ItemId {
        self.item
    }

    #[must_use]
    pub fn vertex(&self) -> &S {
        &self.vertex
    }

    #[must_use]
    pub fn pixel(&self) -> &S {
        &self.pixel
    }

    #[must_use]
    pub fn state(&self) -> PassState {
        self.state
    }
}

/// Ordered snapshot of cached entries.
#[derive(Debug)]
pub struct ShaderCache<S> {
    entries: SlotMap<EntryKey, CacheEntry<S>>,
    order: Vec<EntryKey>,
    lookup: FxHashMap<ItemId, EntryKey>,
}

impl<S> Default for ShaderCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ShaderCache<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        self.lookup.contains_key(&item)
    }

    #[must_use]
    pub fn get(&self, item: ItemId) -> Option<&CacheEntry<S>> {
        self.lookup.get(&item).and_then(|&key| self.entries.get(key))
    }

    /// Snapshot index of `item`.
    #[must_use]
    pub fn position(&self, item: ItemId) -> Option<usize> {
        let key = *self.lookup.get(&item)?;
        self.order.iter().position(|&k| k == key)
    }

    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<&CacheEntry<S>> {
        self.order.get(index).and_then(|&key| self.entries.get(key))
    }

    #[must_use]
    pub fn item_at(&self, index: usize) -> Option<ItemId> {
        self.entry_at(index).map(CacheEntry::item)
    }

    /// Snapshot ids in order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.iter().map(CacheEntry::item)
    }

    /// Entries in snapshot order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry<S>> {
        self.order.iter().filter_map(|&key| self.entries.get(key))
    }

    pub(crate) fn entry_at_mut(&mut self, index: usize) -> Option<&mut CacheEntry<S>> {
        let key = *self.order.get(index)?;
        self.entries.get_mut(key)
    }

    /// Inserts `entry` at `index` (clamped to the snapshot length).
    ///
    /// An existing entry for the same item is dropped first.
    pub(crate) fn insert(&mut self, index: usize, entry: CacheEntry<S>) {
        let item = entry.item;
        if self.contains(item) {
            self.remove(item);
        }
        let key = self.entries.insert(entry);
        self.order.insert(index.min(self.order.len()), key);
        self.lookup.insert(item, key);
    }

    /// Removes and returns the entry of `item`.
    pub(crate) fn remove(&mut self, item: ItemId) -> Option<CacheEntry<S>> {
        let key = self.lookup.remove(&item)?;
        self.order.retain(|&k| k != key);
        self.entries.remove(key)
    }

    /// Moves the entry at `from` so it lands before the element currently at
    /// `before`. Returns the final index.
    ///
    /// The destination is `before - 1` when `from < before`, since removing
    /// the source shifts the insertion point left.
    pub(crate) fn relocate(&mut self, from: usize, before: usize) -> usize {
        let key = self.order.remove(from);
        let dest = if from < before { before - 1 } else { before };
        let dest = dest.min(self.order.len());
        self.order.insert(dest, key);
        dest
    }

    /// Drops every entry.
    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.lookup.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<ItemId> {
        let mut map: SlotMap<ItemId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn cache_of(ids: &[ItemId]) -> ShaderCache<u32> {
        let mut cache = ShaderCache::new();
        for (i, &id) in ids.iter().enumerate() {
            cache.insert(i, CacheEntry::new(id, i as u32, i as u32 + 100));
        }
        cache
    }

    #[test]
    fn relocate_forward_adjusts_destination() {
        let ids = ids(4);
        let mut cache = cache_of(&ids);

        // move A in front of D
        let dest = cache.relocate(0, 3);
        assert_eq!(dest, 2);
        assert_eq!(cache.items().collect::<Vec<_>>(), vec![ids[1], ids[2], ids[0], ids[3]]);
    }

    #[test]
    fn relocate_backward_keeps_destination() {
        let ids = ids(4);
        let mut cache = cache_of(&ids);

        let dest = cache.relocate(3, 1);
        assert_eq!(dest, 1);
        assert_eq!(cache.items().collect::<Vec<_>>(), vec![ids[0], ids[3], ids[1], ids[2]]);
        // objects travel with their item
        assert_eq!(cache.entry_at(1).unwrap().vertex, 3);
        assert_eq!(cache.entry_at(1).unwrap().pixel, 103);
    }

    #[test]
    fn remove_keeps_lookup_in_sync() {
        let ids = ids(3);
        let mut cache = cache_of(&ids);

        let removed = cache.remove(ids[1]).unwrap();
        assert_eq!(removed.vertex, 1);
        assert!(!cache.contains(ids[1]));
        assert_eq!(cache.position(ids[2]), Some(1));
        assert!(cache.remove(ids[1]).is_none());
    }

    #[test]
    fn entry_at_mut_follows_snapshot_order() {
        let ids = ids(3);
        let mut cache = cache_of(&ids);
        cache.relocate(2, 0);

        cache.entry_at_mut(0).unwrap().state = PassState::Failed;
        assert_eq!(cache.get(ids[2]).unwrap().state(), PassState::Failed);
        assert!(cache.entry_at_mut(3).is_none());
    }
}
