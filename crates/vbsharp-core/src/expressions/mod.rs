// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Stage-two expression parsing.
//!
//! **DDD Context:** Language Service — Expressions
//!
//! Turns the flat token runs left by the block parser into precedence-
//! correct [`Expression`] trees. See [`generate`].

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

mod generator;
mod segments;

#[cfg(test)]
mod property_tests;

pub use generator::generate;
pub use segments::{
    BracketedExpressionSegment, BuiltInValueExpressionSegment, CallExpressionSegment,
    CallSetExpressionSegment, CallSetItemExpressionSegment, DateValueExpressionSegment,
    Expression, ExpressionSegment, NewInstanceExpressionSegment, NumericValueExpressionSegment,
    OperationExpressionSegment, RuntimeErrorExpressionSegment, StringValueExpressionSegment,
};

/// Failures while structuring an expression. Line numbers are one-based.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ExpressionError {
    #[error("mismatched brackets in expression on line {line}")]
    #[diagnostic(code(vbsharp::expression::brackets))]
    MismatchedBrackets { line: usize },

    #[error("argument separator without an argument on line {line}")]
    #[diagnostic(code(vbsharp::expression::missing_argument))]
    MissingArgument { line: usize },

    #[error("unresolved member accessor or decimal point on line {line}")]
    #[diagnostic(code(vbsharp::expression::ambiguous_dot))]
    UnresolvedMemberAccessorOrDecimalPoint { line: usize },

    #[error("expected an operand on line {line}")]
    #[diagnostic(code(vbsharp::expression::missing_operand))]
    MissingOperand { line: usize },

    #[error("empty brackets on line {line}")]
    #[diagnostic(code(vbsharp::expression::empty_brackets))]
    EmptyBrackets { line: usize },

    #[error("unexpected '{content}' in expression on line {line}")]
    #[diagnostic(code(vbsharp::expression::unexpected_token))]
    UnexpectedToken { content: EcoString, line: usize },

    #[error("empty expression")]
    #[diagnostic(code(vbsharp::expression::empty))]
    EmptyExpression,
}
