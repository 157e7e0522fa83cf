//! Sorted keyed containers backing the overlay layers.
//!
//! Everything here iterates in ascending key order. That is a hard
//! requirement, not a convenience: the state digest folds map entries in
//! iteration order, so two nodes disagreeing on order would disagree on
//! every block commitment.

use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    ops::Bound,
};

/// A sorted map of pending state entries.
///
/// Iteration callbacks return `bool`; returning `false` stops the walk.
#[derive(Clone, Debug, Default)]
pub(crate) struct StateMap<K, V> {
    inner: BTreeMap<K, V>,
}

impl<K: Ord, V> StateMap<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    pub(crate) fn put(&mut self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get(key)
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get_mut(key)
    }

    pub(crate) fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.contains_key(key)
    }

    pub(crate) fn delete<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.remove(key);
    }

    /// Walks every entry in ascending key order.
    pub(crate) fn each_all(&self, mut f: impl FnMut(&K, &V) -> bool) {
        for (k, v) in &self.inner {
            if !f(k, v) {
                break;
            }
        }
    }
}

impl<V> StateMap<Vec<u8>, V> {
    /// Walks entries whose key starts with `prefix`, in ascending key order.
    pub(crate) fn each_prefix(&self, prefix: &[u8], mut f: impl FnMut(&[u8], &V) -> bool) {
        let range = self
            .inner
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
        for (k, v) in range {
            if !k.starts_with(prefix) {
                break;
            }
            if !f(k, v) {
                break;
            }
        }
    }
}

impl<K: Ord, V> IntoIterator for StateMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::collections::btree_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// A sorted set of keys, used for deletion tombstones.
#[derive(Clone, Debug, Default)]
pub(crate) struct StateSet<K> {
    inner: BTreeSet<K>,
}

impl<K: Ord> StateSet<K> {
    pub(crate) fn new() -> Self {
        Self {
            inner: BTreeSet::new(),
        }
    }

    pub(crate) fn put(&mut self, key: K) {
        self.inner.insert(key);
    }

    pub(crate) fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.contains(key)
    }

    pub(crate) fn delete<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.remove(key);
    }

    /// Walks every key in ascending order.
    pub(crate) fn each_all(&self, mut f: impl FnMut(&K) -> bool) {
        for k in &self.inner {
            if !f(k) {
                break;
            }
        }
    }
}

impl StateSet<Vec<u8>> {
    /// Walks keys starting with `prefix`, in ascending order.
    pub(crate) fn each_prefix(&self, prefix: &[u8], mut f: impl FnMut(&[u8]) -> bool) {
        let range = self
            .inner
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
        for k in range {
            if !k.starts_with(prefix) {
                break;
            }
            if !f(k) {
                break;
            }
        }
    }
}

impl<K: Ord> IntoIterator for StateSet<K> {
    type Item = K;
    type IntoIter = std::collections::btree_set::IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_all_sorted() {
        let mut map = StateMap::new();
        map.put(3u64, "c");
        map.put(1u64, "a");
        map.put(2u64, "b");

        let mut seen = Vec::new();
        map.each_all(|k, v| {
            seen.push((*k, *v));
            true
        });
        assert_eq!(seen, vec![(1, "a"), (2, "b"), (3, "c")]);
    }

    #[test]
    fn test_each_all_early_stop() {
        let mut map = StateMap::new();
        for i in 0u64..10 {
            map.put(i, i);
        }

        let mut count = 0;
        map.each_all(|_, _| {
            count += 1;
            count < 3
        });
        assert_eq!(count, 3);
    }

    #[test]
    fn test_each_prefix_bounds() {
        let mut map = StateMap::new();
        map.put(b"aa1".to_vec(), 1);
        map.put(b"ab1".to_vec(), 2);
        map.put(b"ab2".to_vec(), 3);
        map.put(b"ac0".to_vec(), 4);

        let mut seen = Vec::new();
        map.each_prefix(b"ab", |k, v| {
            seen.push((k.to_vec(), *v));
            true
        });
        assert_eq!(seen, vec![(b"ab1".to_vec(), 2), (b"ab2".to_vec(), 3)]);
    }

    #[test]
    fn test_set_prefix_and_delete() {
        let mut set = StateSet::new();
        set.put(b"k1".to_vec());
        set.put(b"k2".to_vec());
        assert!(set.has(b"k1".as_slice()));

        set.delete(b"k1".as_slice());
        assert!(!set.has(b"k1".as_slice()));

        let mut seen = Vec::new();
        set.each_prefix(b"k", |k| {
            seen.push(k.to_vec());
            true
        });
        assert_eq!(seen, vec![b"k2".to_vec()]);
    }
}
