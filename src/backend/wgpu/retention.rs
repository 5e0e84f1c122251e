//! Frame-stamped storage for GPU objects the backend can recreate on demand.
//!
//! Every access stamps the entry with the current frame index; [`Retained::prune`]
//! drops entries that have not been touched for `ttl_frames` submitted frames.

use std::hash::Hash;

use rustc_hash::FxHashMap;

struct Stamped<V> {
    value: V,
    last_used_frame: u64,
}

pub(crate) struct Retained<K, V> {
    entries: FxHashMap<K, Stamped<V>>,
}

impl<K, V> Default for Retained<K, V> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<K: Hash + Eq, V> Retained<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the entry for `key`, creating it with `create` when missing.
    pub fn get_or_insert_with(&mut self, key: K, frame: u64, create: impl FnOnce() -> V) -> &V {
        let entry = self.entries.entry(key).or_insert_with(|| Stamped {
            value: create(),
            last_used_frame: frame,
        });
        entry.last_used_frame = frame;
        &entry.value
    }

    pub fn insert(&mut self, key: K, frame: u64, value: V) {
        self.entries.insert(
            key,
            Stamped {
                value,
                last_used_frame: frame,
            },
        );
    }

    /// Marks `key` as used in `frame`. Unknown keys are ignored.
    pub fn touch(&mut self, key: &K, frame: u64) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_used_frame = frame;
        }
    }

    /// Drops entries last used more than `ttl_frames` before `frame`.
    /// Returns the number of dropped entries.
    pub fn prune(&mut self, frame: u64, ttl_frames: u64) -> usize {
        if frame < ttl_frames {
            return 0;
        }
        let cutoff = frame - ttl_frames;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.last_used_frame >= cutoff);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_entries_are_pruned_after_the_ttl() {
        let mut map: Retained<u32, &str> = Retained::new();
        map.insert(1, 0, "old");
        map.insert(2, 0, "live");

        map.touch(&2, 8);
        assert_eq!(map.prune(10, 5), 1);

        assert!(map.get(&1).is_none());
        assert_eq!(map.get(&2), Some(&"live"));
    }

    #[test]
    fn access_restamps_existing_entries() {
        let mut map: Retained<u32, u32> = Retained::new();
        let mut created = 0;
        map.get_or_insert_with(7, 0, || {
            created += 1;
            70
        });
        assert_eq!(*map.get_or_insert_with(7, 9, || 0), 70);
        assert_eq!(created, 1);

        assert_eq!(map.prune(10, 2), 0);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn nothing_is_pruned_before_the_first_ttl_elapses() {
        let mut map: Retained<u32, ()> = Retained::new();
        map.insert(1, 0, ());
        assert_eq!(map.prune(3, 120), 0);
        assert!(map.contains(&1));
    }

    #[test]
    fn many_edited_sources_leave_only_the_live_one() {
        // One source hash per edit, each used for a single frame.
        let mut modules: Retained<u128, u32> = Retained::new();
        for edit in 0..50u32 {
            modules.get_or_insert_with(u128::from(edit), u64::from(edit), || edit);
        }
        let live = 49u128;
        let mut frame = 49;
        while frame < 49 + 10 {
            frame += 1;
            modules.touch(&live, frame);
            modules.prune(frame, 4);
        }
        assert_eq!(modules.len(), 1);
        assert!(modules.contains(&live));
    }
}
