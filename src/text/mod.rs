// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

//! The canonical textual form.
//!
//! The writer prints every value to a deterministic notation; the reader
//! parses that notation back, so that `read(print(v))` is structurally
//! equal to `v`. Whitespace between tokens is insignificant outside
//! string literals.

mod reader;
mod writer;

pub use self::reader::{read, read_str};
pub use self::writer::value_to_string;

pub(crate) use self::writer::write_value;
