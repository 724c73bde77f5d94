// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexer and block parser errors.
//!
//! Both carry a [`Span`] and integrate with [`miette`] so the CLI can point
//! at the offending source.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use super::Span;

/// A lexical error encountered during tokenization.
///
/// VBScript translation is all-or-nothing, so the lexer stops at the first
/// one instead of recovering.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind} on line {line}")]
#[diagnostic(code(vbsharp::lex))]
pub struct LexError {
    #[source]
    pub kind: LexErrorKind,
    /// One-based line number.
    pub line: usize,
    #[label("here")]
    pub span: Span,
}

impl LexError {
    #[must_use]
    pub fn new(kind: LexErrorKind, line_index: usize, span: Span) -> Self {
        Self {
            kind,
            line: line_index + 1,
            span,
        }
    }
}

/// The kind of lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated date literal")]
    UnterminatedDate,

    #[error("unterminated escaped name")]
    UnterminatedEscapedName,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(EcoString),
}

/// A structural error found by the stage-one block parser.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message} on line {line}")]
#[diagnostic(code(vbsharp::parse))]
pub struct ParseError {
    pub message: EcoString,
    /// One-based line number.
    pub line: usize,
    #[label("here")]
    pub span: Span,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<EcoString>, line_index: usize, span: Span) -> Self {
        Self {
            message: message.into(),
            line: line_index + 1,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_reports_one_based_line() {
        let err = LexError::new(LexErrorKind::UnterminatedString, 4, Span::new(20, 25));
        assert_eq!(err.to_string(), "unterminated string literal on line 5");
        assert_eq!(err.span.start(), 20);
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::new("expected 'End If'", 0, Span::new(0, 2));
        assert_eq!(err.to_string(), "expected 'End If' on line 1");
    }
}
