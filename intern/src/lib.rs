// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! # Weak hash-consing cache
//!
//! A concurrent cache that hands out *the* canonical instance for every
//! equivalence class of values: `intern` returns an existing live
//! instance when one is structurally identical to the candidate, and
//! installs the candidate otherwise. Entries hold their referent behind
//! a [`Weak`](std::sync::Weak) reference, so the cache never keeps a
//! value alive; entries whose referent has been dropped are reclaimed
//! opportunistically and by [`WeakCache::purge`], never for capacity.
//!
//! Identity is supplied by the [`Identity`] trait rather than
//! [`Eq`]/[`Hash`], so a cache can be stricter (or merely differently
//! keyed) than a type's ordinary equality without the two getting mixed
//! up at a call site.

#![deny(missing_docs)]

mod cache;

pub use self::cache::WeakCache;

/// Structural identity used to key a [`WeakCache`].
///
/// `identical` may be stricter than the type's `Eq`, and `identity_hash`
/// may in turn be coarser than `identical`; the only requirement is that
/// identical values report the same hash.
pub trait Identity {
    /// A hash on which identical values agree.
    fn identity_hash(&self) -> u64;

    /// Strict structural equality.
    fn identical(&self, other: &Self) -> bool;
}
