// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

use crate::iter::Keys;
use crate::map::{TransientMap, TrieMap};
use crate::Result;

/// A persistent hash set: a [`TrieMap`] with unit values.
#[derive(Clone, Debug, Default)]
pub struct TrieSet<T> {
    map: TrieMap<T, ()>,
}

/// Iterator over the elements of a set, in trie order.
pub struct SetIter<'a, T> {
    inner: Keys<'a, T, ()>,
}

impl<'a, T> Iterator for SetIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<T> TrieSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        TrieSet { map: TrieMap::new() }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The cached cumulative hash over the elements.
    pub fn cached_hash(&self) -> u64 {
        self.map.cached_hash()
    }

    /// Iterate over the elements in trie order.
    pub fn iter(&self) -> SetIter<'_, T> {
        SetIter {
            inner: self.map.keys(),
        }
    }
}

impl<T> TrieSet<T>
where
    T: Clone + Eq + Hash,
{
    /// Whether the element is present.
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.contains_key(element)
    }

    /// Look up an element, returning the stored instance.
    pub fn get<Q>(&self, element: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.get_key_value(element).map(|(stored, _)| stored)
    }

    /// Return a set with the element added.
    pub fn insert(&self, element: T) -> Self {
        TrieSet {
            map: self.map.insert(element, ()),
        }
    }

    /// Return a set with the element removed; the set itself when absent.
    pub fn remove<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        TrieSet {
            map: self.map.remove(element),
        }
    }

    /// Open a single-writer builder seeded with this set's elements.
    pub fn transient(&self) -> TransientSet<T> {
        TransientSet {
            map: self.map.transient(),
        }
    }
}

impl<T: PartialEq> PartialEq for TrieSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Eq> Eq for TrieSet<T> {}

impl<T> Hash for TrieSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.map.hash(state)
    }
}

/// A single-writer builder for batch set construction.
#[derive(Debug, Default)]
pub struct TransientSet<T> {
    map: TransientMap<T, ()>,
}

impl<T> TransientSet<T> {
    /// Create an empty builder.
    pub fn new() -> Self {
        TransientSet {
            map: TransientMap::new(),
        }
    }

    /// Number of elements so far.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the builder holds no elements.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<T> TransientSet<T>
where
    T: Clone + Eq + Hash,
{
    /// Add an element; `true` when it was not present before.
    pub fn insert(&mut self, element: T) -> Result<bool> {
        Ok(self.map.insert(element, ())?.is_none())
    }

    /// Remove an element; `true` when it was present.
    pub fn remove<Q>(&mut self, element: &Q) -> Result<bool>
    where
        T: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        Ok(self.map.remove(element)?.is_some())
    }

    /// Seal the builder and hand its structure over as a persistent set.
    pub fn freeze(&mut self) -> Result<TrieSet<T>> {
        Ok(TrieSet {
            map: self.map.freeze()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_contains_remove() {
        let set = TrieSet::<String>::new()
            .insert("a".to_string())
            .insert("b".to_string())
            .insert("a".to_string());
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(set.contains("b"));
        assert!(!set.contains("c"));

        let set = set.remove("a");
        assert_eq!(set.len(), 1);
        assert!(!set.contains("a"));
    }

    #[test]
    fn equal_sets_share_cached_hash() {
        let a = TrieSet::<u64>::new().insert(1).insert(2).insert(3);
        let b = TrieSet::<u64>::new().insert(3).insert(1).insert(2);
        assert_eq!(a, b);
        assert_eq!(a.cached_hash(), b.cached_hash());
        assert_ne!(a, b.insert(4));
    }

    #[test]
    fn transient_set_builds_and_freezes() {
        let mut builder = TransientSet::<u64>::new();
        for i in 0..100 {
            assert!(builder.insert(i).unwrap());
        }
        assert!(!builder.insert(50).unwrap());
        assert!(builder.remove(&99).unwrap());
        let set = builder.freeze().unwrap();
        assert_eq!(set.len(), 99);
        assert!(set.contains(&0));
        assert!(!set.contains(&99));
        assert!(builder.insert(1).is_err());
    }

    #[test]
    fn stored_instance_is_reachable() {
        let set = TrieSet::<String>::new().insert("shared".to_string());
        let stored = set.get("shared").unwrap();
        assert_eq!(stored, "shared");
    }
}
