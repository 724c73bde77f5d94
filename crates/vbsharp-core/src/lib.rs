// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! vbsharp translator core.
//!
//! This crate turns VBScript source into C#:
//! - Lexical analysis (tokenization)
//! - Stage-one parsing into a code block tree
//! - Stage-two expression parsing
//! - Code generation (C# against a runtime compat layer)
//!
//! ```
//! use vbsharp_core::codegen::csharp::TranslatorOptions;
//!
//! let program = vbsharp_core::translate("Dim x\nx = 5\n", &TranslatorOptions::default()).unwrap();
//! assert!(program.render().contains("_outer.x = 5;"));
//! ```

pub mod ast;
pub mod codegen;
pub mod expressions;
pub mod source_analysis;

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use codegen::csharp::{CodeBlockTranslator, TranslatedProgram, TranslationError, TranslatorOptions};
use source_analysis::{LexError, ParseError};

/// Any failure between VBScript source and translated C#.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Translation(#[from] TranslationError),
}

/// Lexes, parses and translates a complete VBScript program.
///
/// # Errors
///
/// Returns the first lexical, structural or translation error.
pub fn translate(source: &str, options: &TranslatorOptions) -> Result<TranslatedProgram, Error> {
    let tokens = source_analysis::lex(source)?;
    debug!("Lexed {} tokens", tokens.len());
    let blocks = source_analysis::parse(tokens)?;
    debug!("Parsed {} top-level blocks", blocks.len());
    let translator = CodeBlockTranslator::new(options.clone());
    Ok(translator.translate_program(&blocks)?)
}

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::CodeBlock;
    pub use crate::codegen::csharp::{TranslatedProgram, TranslationWarning, TranslatorOptions};
    pub use crate::expressions::{Expression, ExpressionSegment};
    pub use crate::source_analysis::{Span, Token, TokenKind};
    pub use crate::{Error, translate};
}
