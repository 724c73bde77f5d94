// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source analysis for VBScript: tokens, lexing and stage-one parsing.
//!
//! **DDD Context:** Source Analysis
//!
//! ```
//! use vbsharp_core::source_analysis::{lex, parse, TokenKind};
//!
//! let tokens = lex("If a Then b = 1").unwrap();
//! assert_eq!(tokens[0].kind(), TokenKind::Keyword);
//! let blocks = parse(tokens).unwrap();
//! assert_eq!(blocks.len(), 1);
//! ```
//!
//! Both stages fail fast with a [`LexError`] or [`ParseError`] carrying a
//! [`Span`] for miette reporting.

mod error;
mod lexer;
mod parser;
mod span;
mod token;

#[cfg(test)]
mod lexer_property_tests;
#[cfg(test)]
mod parser_property_tests;

pub use error::{LexError, LexErrorKind, ParseError};
pub use lexer::{Lexer, lex};
pub use parser::parse;
pub use span::Span;
pub use token::{Token, TokenKind, classify_word};
