// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use crate::types::Type;

/// Alias for a `Result` with the default error type `ValueError`.
pub type Result<T, E = ValueError> = std::result::Result<T, E>;

/// The value library error.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// Malformed canonical text, with the character offset of the fault.
    #[error("parse error at offset {offset}: {message}")]
    Parse {
        /// Character offset into the input.
        offset: usize,
        /// What went wrong.
        message: String,
    },
    /// A value does not conform to the expected type.
    #[error("expected `{expected}`, found `{actual}`")]
    Type {
        /// The type that was required.
        expected: Type,
        /// The type of the offending value.
        actual: Type,
    },
    /// A map key violates the writer's declared key type.
    #[error("map key does not conform to `{expected}`: found `{actual}`")]
    KeyType {
        /// The declared key type.
        expected: Type,
        /// The type of the offending key.
        actual: Type,
    },
    /// A map value violates the writer's declared value type.
    #[error("map value does not conform to `{expected}`: found `{actual}`")]
    ValueType {
        /// The declared value type.
        expected: Type,
        /// The type of the offending value.
        actual: Type,
    },
    /// A constructor or node was applied to the wrong number of children.
    #[error("`{name}` expects {expected} children, found {actual}")]
    Arity {
        /// The constructor name.
        name: String,
        /// Declared arity.
        expected: usize,
        /// Number of children supplied.
        actual: usize,
    },
    /// A constructor name resolves to more than one declaration.
    #[error("constructor `{name}` is ambiguous between {candidates:?}")]
    Overload {
        /// The ambiguous name.
        name: String,
        /// The competing declarations.
        candidates: Vec<String>,
    },
    /// A constructor name resolves to no declaration at all.
    #[error("undeclared constructor `{0}`")]
    UndeclaredConstructor(String),
    /// A factory precondition was violated.
    #[error("{what} out of domain: {value}")]
    Domain {
        /// Which precondition.
        what: &'static str,
        /// The offending input.
        value: String,
    },
    /// The operation is not available on this value.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// A trie builder error (a write through a frozen transient).
    #[error(transparent)]
    Hamt(#[from] facts_hamt::HamtError),
    /// An I/O failure while reading a stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
