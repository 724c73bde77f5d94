// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Byte ranges into VBScript source text.
//!
//! Tokens carry a [`Span`] alongside their zero-based line index so that
//! lexer and parser failures can be reported against the original script.

use std::ops::Range;

/// A half-open byte range `start..end` into the source.
///
/// ```
/// use vbsharp_core::source_analysis::Span;
///
/// let span = Span::new(4, 9);
/// assert_eq!(span.len(), 5);
/// assert_eq!(span.as_range(), 4..9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Range<usize>> for Span {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "scripts over 4GB are not supported"
    )]
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start as usize, span.len() as usize).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both_spans() {
        let merged = Span::new(10, 12).merge(Span::new(3, 5));
        assert_eq!(merged, Span::new(3, 12));
    }

    #[test]
    fn empty_span() {
        assert!(Span::new(7, 7).is_empty());
        assert!(!Span::new(7, 8).is_empty());
    }

    #[test]
    fn converts_to_miette_span() {
        let source_span: miette::SourceSpan = Span::new(2, 6).into();
        assert_eq!(source_span.offset(), 2);
        assert_eq!(source_span.len(), 4);
    }
}
