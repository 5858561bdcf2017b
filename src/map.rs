// File: src/map.rs
//
// Open-addressed hash table keyed by interned strings, linear-probed.
// Backs globals, the string intern table, class method tables, instance
// field tables, and the Falcon-level `Map` object itself (spec.md §4.7).

use crate::value::{fnv1a, Heap, ObjRef, Value};

#[derive(Debug, Clone, Copy)]
struct Entry {
    /// `None` + `value == Null` is a never-used slot; `None` + `value ==
    /// Bool(true)` is a tombstone left by `remove`.
    key: Option<ObjRef>,
    value: Value,
}

const EMPTY: Entry = Entry { key: None, value: Value::Null };
const MAX_LOAD_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, Default)]
pub struct FalconMap {
    entries: Vec<Entry>,
    /// Live entries *plus* tombstones; recomputed (tombstones discarded) on
    /// every resize, per spec.md §4.7.
    count: usize,
}

impl FalconMap {
    pub fn new() -> Self {
        Self { entries: Vec::new(), count: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    fn find_entry_index(entries: &[Entry], capacity: usize, key: ObjRef, heap: &Heap) -> usize {
        let hash = heap.get_string(key).hash as usize;
        let mut index = hash & (capacity - 1);
        let mut tombstone: Option<usize> = None;
        loop {
            let e = &entries[index];
            match e.key {
                None => {
                    if matches!(e.value, Value::Null) {
                        // Never-used slot: stop here, preferring an earlier tombstone.
                        return tombstone.unwrap_or(index);
                    } else if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Some(k) if k == key => return index,
                Some(_) => {}
            }
            index = (index + 1) & (capacity - 1);
        }
    }

    fn grow(&mut self, heap: &Heap) {
        let new_capacity = if self.entries.is_empty() { 8 } else { self.entries.len() * 2 };
        let mut new_entries = vec![EMPTY; new_capacity];
        let mut live = 0;
        for e in &self.entries {
            if let Some(key) = e.key {
                let idx = Self::find_entry_index(&new_entries, new_capacity, key, heap);
                new_entries[idx] = Entry { key: Some(key), value: e.value };
                live += 1;
            }
        }
        self.entries = new_entries;
        self.count = live;
    }

    fn needs_grow(&self) -> bool {
        self.entries.is_empty() || (self.count + 1) as f64 / self.entries.len() as f64 > MAX_LOAD_FACTOR
    }

    /// Inserts or overwrites `key`'s value. Returns whether the key was new.
    pub fn set(&mut self, heap: &Heap, key: ObjRef, value: Value) -> bool {
        if self.needs_grow() {
            self.grow(heap);
        }
        let idx = Self::find_entry_index(&self.entries, self.entries.len(), key, heap);
        let is_new = self.entries[idx].key.is_none() && matches!(self.entries[idx].value, Value::Null);
        if is_new {
            self.count += 1;
        }
        self.entries[idx] = Entry { key: Some(key), value };
        is_new
    }

    pub fn get(&self, heap: &Heap, key: ObjRef) -> Option<Value> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = Self::find_entry_index(&self.entries, self.entries.len(), key, heap);
        match self.entries[idx].key {
            Some(k) if k == key => Some(self.entries[idx].value),
            _ => None,
        }
    }

    /// Marks the entry as a tombstone (`key = null, value = true`).
    /// Returns whether anything was removed.
    pub fn remove(&mut self, heap: &Heap, key: ObjRef) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let idx = Self::find_entry_index(&self.entries, self.entries.len(), key, heap);
        match self.entries[idx].key {
            Some(k) if k == key => {
                self.entries[idx] = Entry { key: None, value: Value::Bool(true) };
                true
            }
            _ => false,
        }
    }

    /// Interning lookup: matches length, then hash, then a byte comparison,
    /// against raw bytes rather than an existing `ObjRef` (the string being
    /// looked up may not exist as a heap object yet).
    pub fn find_string(&self, heap: &Heap, bytes: &[u8], hash: u32) -> Option<ObjRef> {
        if self.entries.is_empty() {
            return None;
        }
        let capacity = self.entries.len();
        let mut index = (hash as usize) & (capacity - 1);
        loop {
            let e = &self.entries[index];
            match e.key {
                None => {
                    if matches!(e.value, Value::Null) {
                        return None;
                    }
                    // Tombstone: keep probing.
                }
                Some(k) => {
                    let s = heap.get_string(k);
                    if s.hash == hash && s.bytes.len() == bytes.len() && s.bytes == bytes {
                        return Some(k);
                    }
                }
            }
            index = (index + 1) & (capacity - 1);
        }
    }

    /// Removes intern-table entries whose key string is unmarked (weak
    /// sweep, spec.md §4.5 step 3). Returns the number removed.
    pub fn remove_unmarked(&mut self, heap: &Heap) -> usize {
        let mut removed = 0;
        for e in self.entries.iter_mut() {
            if let Some(k) = e.key {
                if !heap.is_marked(k) {
                    *e = Entry { key: None, value: Value::Bool(true) };
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (ObjRef, Value)> + 'a {
        self.entries.iter().filter_map(|e| e.key.map(|k| (k, e.value)))
    }
}

/// Interns `bytes` into `heap`'s string table if needed, returning the
/// canonical `ObjRef`. Equal byte sequences always resolve to the same
/// object (spec.md §3 "Invariants").
pub fn intern(heap: &mut Heap, table: &mut FalconMap, bytes: &[u8]) -> ObjRef {
    let hash = fnv1a(bytes);
    if let Some(existing) = table.find_string(heap, bytes, hash) {
        return existing;
    }
    let obj = crate::value::Obj::String(crate::value::ObjString { bytes: bytes.to_vec(), hash });
    let r = heap.alloc(obj);
    table.set(heap, r, Value::Bool(true));
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_gives_pointer_equality_for_equal_bytes() {
        let mut heap = Heap::new();
        let mut table = FalconMap::new();
        let a = intern(&mut heap, &mut table, b"hello");
        let b = intern(&mut heap, &mut table, b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_strings_intern_to_distinct_refs() {
        let mut heap = Heap::new();
        let mut table = FalconMap::new();
        let a = intern(&mut heap, &mut table, b"hello");
        let b = intern(&mut heap, &mut table, b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn set_get_remove_round_trip() {
        let mut heap = Heap::new();
        let mut strings = FalconMap::new();
        let key = intern(&mut heap, &mut strings, b"x");
        let mut map = FalconMap::new();
        assert!(map.set(&heap, key, Value::Num(1.0)));
        assert!(!map.set(&heap, key, Value::Num(2.0)));
        assert_eq!(map.get(&heap, key), Some(Value::Num(2.0)));
        assert!(map.remove(&heap, key));
        assert_eq!(map.get(&heap, key), None);
        assert!(!map.remove(&heap, key));
    }

    #[test]
    fn grows_past_load_factor() {
        let mut heap = Heap::new();
        let mut strings = FalconMap::new();
        let mut map = FalconMap::new();
        for i in 0..100 {
            let key = intern(&mut heap, &mut strings, format!("k{i}").as_bytes());
            map.set(&heap, key, Value::Num(i as f64));
        }
        assert_eq!(map.count(), 100);
        assert!((map.count() as f64) / (map.capacity() as f64) <= MAX_LOAD_FACTOR);
        for i in 0..100 {
            let key = intern(&mut heap, &mut strings, format!("k{i}").as_bytes());
            assert_eq!(map.get(&heap, key), Some(Value::Num(i as f64)));
        }
    }
}
