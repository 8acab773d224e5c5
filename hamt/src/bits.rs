// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Number of hash bits consumed per trie level.
pub(crate) const SLOT_BITS: u32 = 5;

pub(crate) const SLOT_MASK: u32 = (1 << SLOT_BITS) - 1;

/// Depths `0..=6` dispatch through bitmaps; entries that still collide
/// after the last branching level share their full mixed hash and live in
/// a collision node.
pub(crate) const MAX_BRANCH_DEPTH: usize = 7;

/// Redistribute the upper half of a raw hash into the lower bits before
/// trie dispatch (the murmur3 32-bit finalizer, a bijection on `u32`).
///
/// Applied exactly once per key; the node operations assume their hash
/// argument is already mixed.
pub(crate) fn mix(hash: u32) -> u32 {
    let mut h = hash;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// The 5-bit slot of `hash` at `depth`.
///
/// Depth `d` in `0..=5` reads bits `[27 - 5d, 31 - 5d]`; depth `6` reads
/// the low five bits directly, so the seven levels together cover all 32
/// bits and two hashes equal at every level are equal outright.
pub(crate) fn slot(hash: u32, depth: usize) -> u32 {
    debug_assert!(depth < MAX_BRANCH_DEPTH);
    if depth == 6 {
        hash & SLOT_MASK
    } else {
        (hash >> (27 - SLOT_BITS * depth as u32)) & SLOT_MASK
    }
}

pub(crate) fn bitpos(slot: u32) -> u32 {
    1 << slot
}

/// Dense index of `bit` within `bitmap`: the number of set bits below it.
pub(crate) fn index(bitmap: u32, bit: u32) -> usize {
    (bitmap & bit.wrapping_sub(1)).count_ones() as usize
}

/// Raw 64-bit hash through the fixed-key standard hasher.
///
/// The cumulative hash cached by the wrappers participates in observable
/// equality, so every collection must agree on per-entry hashes; a
/// randomly seeded hasher would break that.
pub(crate) fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// The 32-bit mixed hash used for trie dispatch.
pub(crate) fn mixed_hash_of<T: Hash + ?Sized>(value: &T) -> u32 {
    let raw = hash_of(value);
    mix((raw ^ (raw >> 32)) as u32)
}
