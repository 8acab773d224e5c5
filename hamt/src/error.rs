// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

/// The HAMT error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HamtError {
    /// A transient builder was written to after it had been frozen.
    #[error("transient builder is frozen")]
    Frozen,
}
