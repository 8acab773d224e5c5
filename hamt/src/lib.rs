// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! # Hash-Array-Mapped Trie
//!
//! Persistent map and set built on a 32-way [HAMT] with [CHAMP] canonical
//! form: every node carries a pair of disjoint bitmaps, `data_map` for
//! inline payload entries and `node_map` for sub-nodes, and the packed
//! children vector keeps payloads at the front and sub-nodes at the back.
//! A given set of keys always produces the same trie shape, regardless of
//! the order in which entries were inserted or removed.
//!
//! The wrappers cache the entry count and a cumulative XOR hash over the
//! entries, so that equality checks can reject mismatched collections
//! without touching the trie.
//!
//! Batch construction goes through the transient builders, which own the
//! nodes they create (an owner token compared by identity) and may mutate
//! them in place until frozen.
//!
//! [HAMT]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
//! [CHAMP]: https://michael.steindorfer.name/publications/oopsla15.pdf

#![deny(missing_docs)]

mod bits;
mod error;
mod iter;
mod map;
mod node;
mod set;

pub use self::error::HamtError;
pub use self::iter::{Iter, Keys, Values};
pub use self::map::{TransientMap, TrieMap};
pub use self::set::{SetIter, TransientSet, TrieSet};

/// Alias for a `Result` with the default error type `HamtError`.
pub type Result<T, E = HamtError> = std::result::Result<T, E>;
