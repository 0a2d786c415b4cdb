//! Hash bucket index implementation.

use crate::entity::RecordId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Hash-based bucket index for O(1) equality lookups.
///
/// Maps each key to the set of record ids carrying it (non-unique index).
///
/// # Invariants
///
/// - A bucket is never empty: removing the last id removes the key
/// - `len()` is the total number of (key, id) pairs
///
/// # Example
///
/// ```rust
/// use rosterdb_core::index::HashIndex;
///
/// let mut index: HashIndex<String> = HashIndex::new("name");
/// index.insert("alice".to_string(), 1);
/// assert!(index.lookup(&"alice".to_string()).unwrap().contains(&1));
///
/// index.remove(&"alice".to_string(), 1);
/// assert!(index.lookup(&"alice".to_string()).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct HashIndex<K> {
    /// Attribute name, used in log and error messages.
    name: &'static str,
    /// Key to ids mapping.
    entries: HashMap<K, HashSet<RecordId>>,
    /// Total entry count.
    count: usize,
}

impl<K: Eq + Hash + Clone> HashIndex<K> {
    /// Creates an empty index for the named attribute.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            count: 0,
        }
    }

    /// Returns the attribute name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Inserts a key-id mapping. Returns false if it was already present.
    pub fn insert(&mut self, key: K, id: RecordId) -> bool {
        let inserted = self.entries.entry(key).or_default().insert(id);
        if inserted {
            self.count += 1;
        }
        inserted
    }

    /// Removes a key-id mapping, pruning the bucket if it becomes empty.
    pub fn remove(&mut self, key: &K, id: RecordId) -> bool {
        if let Some(set) = self.entries.get_mut(key) {
            if set.remove(&id) {
                self.count -= 1;
                if set.is_empty() {
                    self.entries.remove(key);
                }
                return true;
            }
        }
        false
    }

    /// Returns the bucket for `key`, if any.
    #[must_use]
    pub fn lookup(&self, key: &K) -> Option<&HashSet<RecordId>> {
        self.entries.get(key)
    }

    /// Removes and returns the whole bucket for `key`.
    pub fn take(&mut self, key: &K) -> Option<HashSet<RecordId>> {
        let set = self.entries.remove(key)?;
        self.count -= set.len();
        Some(set)
    }

    /// Checks if the index has a bucket for `key`.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of key-id entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterates over all buckets in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &HashSet<RecordId>)> {
        self.entries.iter()
    }

    /// Clears the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
    }
}

impl<K: Eq + Hash + Clone + Ord> HashIndex<K> {
    /// Returns an ordered copy of every bucket.
    #[must_use]
    pub fn to_sorted(&self) -> BTreeMap<K, BTreeSet<RecordId>> {
        self.entries
            .iter()
            .map(|(k, ids)| (k.clone(), ids.iter().copied().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut index = HashIndex::new("name");
        assert!(index.insert("key1".to_string(), 7));

        let found = index.lookup(&"key1".to_string()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains(&7));
    }

    #[test]
    fn lookup_missing() {
        let index: HashIndex<String> = HashIndex::new("name");
        assert!(index.lookup(&"missing".to_string()).is_none());
    }

    #[test]
    fn multiple_ids_same_key() {
        let mut index = HashIndex::new("active");
        index.insert(true, 1);
        index.insert(true, 2);
        assert!(!index.insert(true, 2));

        assert_eq!(index.lookup(&true).unwrap().len(), 2);
        assert_eq!(index.len(), 2);
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn remove_prunes_empty_bucket() {
        let mut index = HashIndex::new("name");
        index.insert("key".to_string(), 1);
        assert!(index.contains(&"key".to_string()));

        assert!(index.remove(&"key".to_string(), 1));
        assert!(!index.contains(&"key".to_string()));
        assert!(index.is_empty());
        assert!(!index.remove(&"key".to_string(), 1));
    }

    #[test]
    fn remove_one_of_many() {
        let mut index = HashIndex::new("name");
        index.insert("key".to_string(), 1);
        index.insert("key".to_string(), 2);

        index.remove(&"key".to_string(), 1);

        let found = index.lookup(&"key".to_string()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains(&2));
    }

    #[test]
    fn take_removes_whole_bucket() {
        let mut index = HashIndex::new("active");
        index.insert(false, 1);
        index.insert(false, 2);
        index.insert(true, 3);

        let taken = index.take(&false).unwrap();
        assert_eq!(taken.len(), 2);
        assert_eq!(index.len(), 1);
        assert!(index.take(&false).is_none());
    }

    #[test]
    fn len_and_clear() {
        let mut index = HashIndex::new("name");
        for i in 0..5 {
            index.insert(format!("key{}", i), i);
        }

        assert_eq!(index.len(), 5);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn sorted_copy() {
        let mut index = HashIndex::new("name");
        index.insert("b".to_string(), 2);
        index.insert("a".to_string(), 3);
        index.insert("a".to_string(), 1);

        let sorted = index.to_sorted();
        let keys: Vec<_> = sorted.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sorted["a"].iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    }
}
