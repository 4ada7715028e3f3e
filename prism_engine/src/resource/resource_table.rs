/// Handle table with path deduplication and use counts

use slotmap::{Key, SlotMap};
use rustc_hash::FxHashMap;

struct TableEntry<R> {
    path: Option<String>,
    resource: R,
    use_count: u32,
}

/// Resources keyed by slotmap handles, optionally indexed by path
///
/// Stale handles (released entries) resolve to None.
pub(crate) struct ResourceTable<K: Key, R> {
    entries: SlotMap<K, TableEntry<R>>,
    paths: FxHashMap<String, K>,
}

impl<K: Key, R> ResourceTable<K, R> {
    pub fn new() -> Self {
        Self { entries: SlotMap::with_key(), paths: FxHashMap::default() }
    }

    /// Live handle of a path, bumping its use count
    pub fn acquire(&mut self, path: &str) -> Option<K> {
        let key = *self.paths.get(path)?;
        let entry = self.entries.get_mut(key)?;
        entry.use_count += 1;
        Some(key)
    }

    /// Insert with a use count of one
    pub fn insert(&mut self, path: Option<String>, resource: R) -> K {
        let key = self.entries.insert(TableEntry { path: path.clone(), resource, use_count: 1 });
        if let Some(path) = path {
            self.paths.insert(path, key);
        }
        key
    }

    pub fn get(&self, key: K) -> Option<&R> {
        self.entries.get(key).map(|e| &e.resource)
    }

    pub fn use_count(&self, key: K) -> Option<u32> {
        self.entries.get(key).map(|e| e.use_count)
    }

    pub fn path(&self, key: K) -> Option<&str> {
        self.entries.get(key).and_then(|e| e.path.as_deref())
    }

    /// Drop one use; returns the resource once the last use is gone
    ///
    /// None for stale handles and for entries still in use.
    pub fn release(&mut self, key: K) -> Option<Option<R>> {
        let entry = self.entries.get_mut(key)?;
        entry.use_count -= 1;
        if entry.use_count > 0 {
            return Some(None);
        }
        let entry = self.entries.remove(key)?;
        if let Some(path) = &entry.path {
            self.paths.remove(path);
        }
        Some(Some(entry.resource))
    }

    /// Remove every entry regardless of use count
    pub fn drain(&mut self) -> Vec<R> {
        self.paths.clear();
        self.entries.drain().map(|(_, e)| e.resource).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
