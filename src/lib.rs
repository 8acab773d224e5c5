// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! # facts
//!
//! Immutable, structurally shared, hash-consed first-class values: the
//! data foundation for a term-rewriting language and its tooling.
//!
//! Values cover primitives (arbitrary-precision integers, rationals,
//! reals with configurable decimal precision, booleans, strings,
//! datetimes, source locations), containers (list, set, map, tuple) and
//! term-structured values (nodes and typed constructors with positional
//! and keyword children). Values compare by structure, hash consistently
//! with equality, print to a canonical textual notation that round-trips
//! losslessly, and are globally de-duplicated: the factory returns one
//! shared instance per equivalence class of live values.
//!
//! Sets and maps are backed by the persistent trie in [`facts_hamt`];
//! de-duplication goes through the weak cache in [`facts_intern`].

#![deny(missing_docs)]

mod error;
pub mod factory;
mod precision;
pub mod text;
mod types;
mod value;

pub use self::error::{Result, ValueError};
pub use self::factory::{ListWriter, MapWriter, SetWriter};
pub use self::precision::{real_precision, set_real_precision, DEFAULT_REAL_PRECISION};
pub use self::types::{ConsSignature, Field, Type, TypeStore};
pub use self::value::{ConsValue, DateTimeValue, NodeValue, SourceLocation, VRef, Value, ValueVisitor};

pub use facts_hamt::{TransientMap, TransientSet, TrieMap, TrieSet};
pub use facts_intern::{Identity, WeakCache};
