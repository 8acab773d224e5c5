// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use crate::error::{Result, ValueError};

/// A reference into a source artifact: a URI, optionally narrowed to a
/// character range, optionally annotated with line/column bounds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    uri: String,
    range: Option<(usize, usize)>,
    span: Option<(usize, usize, usize, usize)>,
}

fn domain(what: &'static str, value: impl ToString) -> ValueError {
    ValueError::Domain {
        what,
        value: value.to_string(),
    }
}

fn non_negative(what: &'static str, value: i64) -> Result<usize> {
    if value < 0 {
        return Err(domain(what, value));
    }
    Ok(value as usize)
}

impl SourceLocation {
    /// A location naming a whole artifact.
    ///
    /// The URI may not contain `|` (the canonical form's delimiter),
    /// control characters or whitespace.
    pub fn new(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        if uri.chars().any(|c| c == '|' || c.is_control() || c.is_whitespace()) {
            return Err(domain("source location uri", uri));
        }
        Ok(SourceLocation {
            uri,
            range: None,
            span: None,
        })
    }

    /// A location narrowed to `length` characters from `offset`.
    pub fn with_range(uri: impl Into<String>, offset: i64, length: i64) -> Result<Self> {
        let mut loc = Self::new(uri)?;
        loc.range = Some((
            non_negative("source location offset", offset)?,
            non_negative("source location length", length)?,
        ));
        Ok(loc)
    }

    /// A location with both a character range and line/column bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn with_span(
        uri: impl Into<String>,
        offset: i64,
        length: i64,
        begin_line: i64,
        begin_column: i64,
        end_line: i64,
        end_column: i64,
    ) -> Result<Self> {
        let mut loc = Self::with_range(uri, offset, length)?;
        let begin_line = non_negative("source location begin line", begin_line)?;
        let begin_column = non_negative("source location begin column", begin_column)?;
        let end_line = non_negative("source location end line", end_line)?;
        let end_column = non_negative("source location end column", end_column)?;
        if begin_line > end_line || (begin_line == end_line && begin_column > end_column) {
            return Err(domain(
                "source location bounds",
                format!(
                    "<{},{}> after <{},{}>",
                    begin_line, begin_column, end_line, end_column
                ),
            ));
        }
        loc.span = Some((begin_line, begin_column, end_line, end_column));
        Ok(loc)
    }

    /// The artifact URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The character range, when narrowed.
    pub fn range(&self) -> Option<(usize, usize)> {
        self.range
    }

    /// The line/column bounds, when present.
    pub fn span(&self) -> Option<(usize, usize, usize, usize)> {
        self.span
    }

    pub(crate) fn write_canonical(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        write!(out, "|{}|", self.uri)?;
        if let Some((offset, length)) = self.range {
            match self.span {
                Some((bl, bc, el, ec)) => {
                    write!(out, "({},{},<{},{}>,<{},{}>)", offset, length, bl, bc, el, ec)?
                }
                None => write!(out, "({},{})", offset, length)?,
            }
        }
        Ok(())
    }
}
