// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;

use crate::bits::{hash_of, mixed_hash_of};
use crate::iter::{Iter, Keys, Values};
use crate::node::{self, Node, Owner, OwnerToken};
use crate::{HamtError, Result};

/// A persistent hash map with structural sharing.
///
/// Every update returns a new map; the old one is untouched. The entry
/// count and a cumulative XOR hash over the entries are cached on the
/// wrapper, so `len` is constant-time and equality checks can reject
/// mismatched maps without walking the trie.
#[derive(Clone, Debug)]
pub struct TrieMap<K, V> {
    root: Arc<Node<K, V>>,
    size: usize,
    hash: u64,
}

impl<K, V> TrieMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        TrieMap {
            root: Arc::new(Node::empty(None)),
            size: 0,
            hash: 0,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The cached cumulative hash: the XOR over all entries of
    /// `hash(key) ^ hash(value)`.
    pub fn cached_hash(&self) -> u64 {
        self.hash
    }

    /// Iterate over the entries in trie order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.root)
    }

    /// Iterate over the keys in trie order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterate over the values in trie order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V> TrieMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Hash,
{
    /// Look up a key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Look up a key, returning the stored key alongside the value.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        node::get(&self.root, mixed_hash_of(key), 0, key)
    }

    /// Whether the key is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get_key_value(key).is_some()
    }

    /// Return a map with the entry added or replaced.
    pub fn insert(&self, key: K, value: V) -> Self {
        let key_hash = hash_of(&key);
        let value_hash = hash_of(&value);
        let mixed = mixed_hash_of(&key);
        let mut root = self.root.clone();
        match node::insert(&mut root, None, mixed, 0, key, value) {
            Some(old_value) => TrieMap {
                root,
                size: self.size,
                hash: self.hash ^ (key_hash ^ hash_of(&old_value)) ^ (key_hash ^ value_hash),
            },
            None => TrieMap {
                root,
                size: self.size + 1,
                hash: self.hash ^ (key_hash ^ value_hash),
            },
        }
    }

    /// Return a map with the key removed; the map itself when absent.
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        if !self.contains_key(key) {
            return self.clone();
        }
        let mut root = self.root.clone();
        match node::remove(&mut root, None, mixed_hash_of(key), 0, key) {
            Some((old_key, old_value)) => TrieMap {
                root,
                size: self.size - 1,
                hash: self.hash ^ (hash_of(&old_key) ^ hash_of(&old_value)),
            },
            None => self.clone(),
        }
    }

    /// Open a single-writer builder seeded with this map's entries.
    pub fn transient(&self) -> TransientMap<K, V> {
        TransientMap {
            owner: Some(Arc::new(OwnerToken)),
            root: self.root.clone(),
            size: self.size,
            hash: self.hash,
        }
    }
}

impl<K, V> Default for TrieMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PartialEq for TrieMap<K, V>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        // cheap rejection first; the cached hashes agree for equal maps
        if self.size != other.size || self.hash != other.hash {
            return false;
        }
        Arc::ptr_eq(&self.root, &other.root) || self.root == other.root
    }
}

impl<K: Eq, V: Eq> Eq for TrieMap<K, V> {}

impl<K, V> Hash for TrieMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.size as u64);
        state.write_u64(self.hash);
    }
}

/// A single-writer builder for batch map construction.
///
/// The builder holds an owner token; nodes it creates record that token
/// and are mutated in place, while nodes shared with the persistent
/// source are copied on first write. `freeze` clears the token and hands
/// the structure over as a persistent map; any later write fails with
/// [`HamtError::Frozen`].
#[derive(Debug)]
pub struct TransientMap<K, V> {
    owner: Option<Owner>,
    root: Arc<Node<K, V>>,
    size: usize,
    hash: u64,
}

impl<K, V> TransientMap<K, V> {
    /// Create an empty builder.
    pub fn new() -> Self {
        TransientMap {
            owner: Some(Arc::new(OwnerToken)),
            root: Arc::new(Node::empty(None)),
            size: 0,
            hash: 0,
        }
    }

    /// Number of entries so far.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the builder holds no entries.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl<K, V> TransientMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Hash,
{
    /// Look up a key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        node::get(&self.root, mixed_hash_of(key), 0, key).map(|(_, value)| value)
    }

    /// Add or replace an entry, returning the replaced value if any.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let owner = self.owner.as_ref().ok_or(HamtError::Frozen)?;
        let key_hash = hash_of(&key);
        let value_hash = hash_of(&value);
        let mixed = mixed_hash_of(&key);
        let old = node::insert(&mut self.root, Some(owner), mixed, 0, key, value);
        match &old {
            Some(old_value) => {
                self.hash ^= (key_hash ^ hash_of(old_value)) ^ (key_hash ^ value_hash);
            }
            None => {
                self.size += 1;
                self.hash ^= key_hash ^ value_hash;
            }
        }
        Ok(old)
    }

    /// Remove an entry, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let owner = self.owner.as_ref().ok_or(HamtError::Frozen)?;
        match node::remove(&mut self.root, Some(owner), mixed_hash_of(key), 0, key) {
            Some((old_key, old_value)) => {
                self.size -= 1;
                self.hash ^= hash_of(&old_key) ^ hash_of(&old_value);
                Ok(Some(old_value))
            }
            None => Ok(None),
        }
    }

    /// Seal the builder and hand its structure over as a persistent map.
    pub fn freeze(&mut self) -> Result<TrieMap<K, V>> {
        if self.owner.take().is_none() {
            return Err(HamtError::Frozen);
        }
        let mut root = mem::replace(&mut self.root, Arc::new(Node::empty(None)));
        if let Some(node) = Arc::get_mut(&mut root) {
            node.clear_owner();
        }
        Ok(TrieMap {
            root,
            size: mem::take(&mut self.size),
            hash: mem::take(&mut self.hash),
        })
    }
}

impl<K, V> Default for TransientMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
