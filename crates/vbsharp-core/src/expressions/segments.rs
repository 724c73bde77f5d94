// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression segment model.
//!
//! An [`Expression`] is an ordered, non-empty list of segments. After
//! generation every expression has one of three shapes: a single operand
//! segment, `[operator, operand]` for a unary operation, or
//! `[operand, operator, operand]` for a binary one, where nested operations
//! appear as [`BracketedExpressionSegment`]s.
//!
//! Every segment can render itself back to VBScript (for diagnostics and
//! runtime error messages) and list the source tokens it covers.

use ecow::EcoString;

use crate::source_analysis::{Token, TokenKind};

use super::ExpressionError;

/// A non-empty sequence of expression segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    segments: Vec<ExpressionSegment>,
}

impl Expression {
    /// # Errors
    ///
    /// Returns [`ExpressionError::EmptyExpression`] for an empty segment list.
    pub fn new(segments: Vec<ExpressionSegment>) -> Result<Self, ExpressionError> {
        if segments.is_empty() {
            return Err(ExpressionError::EmptyExpression);
        }
        Ok(Self { segments })
    }

    /// A single-segment expression.
    #[must_use]
    pub fn single(segment: ExpressionSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[ExpressionSegment] {
        &self.segments
    }

    #[must_use]
    pub fn into_segments(self) -> Vec<ExpressionSegment> {
        self.segments
    }

    /// The segment, when the expression consists of exactly one.
    #[must_use]
    pub fn as_single(&self) -> Option<&ExpressionSegment> {
        match self.segments.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// VBScript rendering with single spaces between segments.
    #[must_use]
    pub fn rendered_content(&self) -> String {
        self.segments
            .iter()
            .map(ExpressionSegment::rendered_content)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn all_tokens(&self) -> Vec<Token> {
        self.segments
            .iter()
            .flat_map(ExpressionSegment::all_tokens)
            .collect()
    }

    #[must_use]
    pub fn line_index(&self) -> usize {
        self.segments[0].line_index()
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered_content())
    }
}

/// One component of an [`Expression`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionSegment {
    Call(CallExpressionSegment),
    CallSet(CallSetExpressionSegment),
    Bracketed(BracketedExpressionSegment),
    Operation(OperationExpressionSegment),
    BuiltInValue(BuiltInValueExpressionSegment),
    NumericValue(NumericValueExpressionSegment),
    StringValue(StringValueExpressionSegment),
    DateValue(DateValueExpressionSegment),
    NewInstance(NewInstanceExpressionSegment),
    RuntimeError(RuntimeErrorExpressionSegment),
}

impl ExpressionSegment {
    #[must_use]
    pub fn rendered_content(&self) -> String {
        match self {
            Self::Call(call) => call.rendered_content(),
            Self::CallSet(call_set) => call_set.rendered_content(),
            Self::Bracketed(bracketed) => format!(
                "({})",
                bracketed
                    .expressions
                    .iter()
                    .map(Expression::rendered_content)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Operation(op) => op.token.content().to_string(),
            Self::BuiltInValue(value) => value.token.content().to_string(),
            Self::NumericValue(value) => value.token.content().to_string(),
            Self::StringValue(value) => value.token.to_string(),
            Self::DateValue(value) => value.token.to_string(),
            Self::NewInstance(new) => format!("{} {}", new.new_token.content(), new.class_name.content()),
            Self::RuntimeError(error) => error.rendered_content.clone(),
        }
    }

    /// Source tokens covered by the segment; never empty.
    #[must_use]
    pub fn all_tokens(&self) -> Vec<Token> {
        match self {
            Self::Call(call) => call.all_tokens(),
            Self::CallSet(call_set) => call_set
                .items
                .iter()
                .flat_map(CallSetItemExpressionSegment::all_tokens)
                .collect(),
            Self::Bracketed(bracketed) => bracketed
                .expressions
                .iter()
                .flat_map(Expression::all_tokens)
                .collect(),
            Self::Operation(OperationExpressionSegment { token })
            | Self::BuiltInValue(BuiltInValueExpressionSegment { token })
            | Self::StringValue(StringValueExpressionSegment { token })
            | Self::DateValue(DateValueExpressionSegment { token }) => vec![token.clone()],
            Self::NumericValue(value) => vec![value.token.clone()],
            Self::NewInstance(new) => vec![new.new_token.clone(), new.class_name.clone()],
            Self::RuntimeError(error) => error.tokens.clone(),
        }
    }

    #[must_use]
    pub fn line_index(&self) -> usize {
        self.all_tokens().first().map_or(0, Token::line_index)
    }

    /// True for literal values (numbers, strings, dates, built-in constants).
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::BuiltInValue(_) | Self::NumericValue(_) | Self::StringValue(_) | Self::DateValue(_)
        )
    }
}

/// A member-access chain with optional arguments: `a`, `a.b.c`, `f(1, 2)`,
/// `.Name` inside a `With` block.
///
/// Accessor tokens are implied by adjacency and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpressionSegment {
    /// The chain starts with `.` and resolves against the `With` target.
    pub leading_accessor: bool,
    /// Non-empty.
    pub member_access_tokens: Vec<Token>,
    pub arguments: Vec<Expression>,
    /// `f()` rather than `f`.
    pub zero_argument_brackets_present: bool,
}

impl CallExpressionSegment {
    /// A single bare name: `x`.
    #[must_use]
    pub fn is_bare_name(&self) -> bool {
        !self.leading_accessor
            && self.member_access_tokens.len() == 1
            && self.arguments.is_empty()
            && !self.zero_argument_brackets_present
    }

    fn has_brackets(&self) -> bool {
        !self.arguments.is_empty() || self.zero_argument_brackets_present
    }

    #[must_use]
    pub fn rendered_content(&self) -> String {
        let prefix = if self.leading_accessor { "." } else { "" };
        let members = render_members(&self.member_access_tokens);
        if self.has_brackets() {
            format!("{prefix}{members}({})", render_arguments(&self.arguments))
        } else {
            format!("{prefix}{members}")
        }
    }

    #[must_use]
    pub fn all_tokens(&self) -> Vec<Token> {
        let mut tokens = self.member_access_tokens.clone();
        tokens.extend(self.arguments.iter().flat_map(Expression::all_tokens));
        tokens
    }
}

/// Compound access of two or more items: `a(0).Name`, `f(1)(2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSetExpressionSegment {
    pub leading_accessor: bool,
    /// At least two items; only the first may have no member tokens
    /// rendered before its arguments when it follows a bracket.
    pub items: Vec<CallSetItemExpressionSegment>,
}

impl CallSetExpressionSegment {
    #[must_use]
    pub fn rendered_content(&self) -> String {
        let mut rendered = String::new();
        if self.leading_accessor {
            rendered.push('.');
        }
        for (index, item) in self.items.iter().enumerate() {
            if index > 0 && !item.member_access_tokens.is_empty() {
                rendered.push('.');
            }
            rendered.push_str(&item.rendered_content());
        }
        rendered
    }
}

/// One link in a [`CallSetExpressionSegment`]. Member tokens may be empty
/// for a bare index such as the `(1)` in `a(0)(1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSetItemExpressionSegment {
    pub member_access_tokens: Vec<Token>,
    pub arguments: Vec<Expression>,
    pub zero_argument_brackets_present: bool,
}

impl CallSetItemExpressionSegment {
    #[must_use]
    pub fn rendered_content(&self) -> String {
        let members = render_members(&self.member_access_tokens);
        if self.arguments.is_empty() && !self.zero_argument_brackets_present {
            members
        } else {
            format!("{members}({})", render_arguments(&self.arguments))
        }
    }

    #[must_use]
    pub fn all_tokens(&self) -> Vec<Token> {
        let mut tokens = self.member_access_tokens.clone();
        tokens.extend(self.arguments.iter().flat_map(Expression::all_tokens));
        tokens
    }
}

/// `(expr)` or `(a, b)`; always holds at least one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketedExpressionSegment {
    pub expressions: Vec<Expression>,
}

impl BracketedExpressionSegment {
    /// Wraps a list of segments as a single nested expression.
    ///
    /// # Errors
    ///
    /// Fails for an empty segment list.
    pub fn wrapping(segments: Vec<ExpressionSegment>) -> Result<Self, ExpressionError> {
        Ok(Self {
            expressions: vec![Expression::new(segments)?],
        })
    }
}

/// An arithmetic, comparison or logical operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationExpressionSegment {
    pub token: Token,
}

impl OperationExpressionSegment {
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        self.token.kind() == TokenKind::ComparisonOperator
    }

    #[must_use]
    pub fn is_logical(&self) -> bool {
        self.token.kind() == TokenKind::LogicalOperator
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltInValueExpressionSegment {
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericValueExpressionSegment {
    pub token: Token,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValueExpressionSegment {
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValueExpressionSegment {
    pub token: Token,
}

/// `New ClassName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstanceExpressionSegment {
    pub new_token: Token,
    pub class_name: Token,
}

/// An error that is detected while translating but must surface when the
/// statement runs, as it would in VBScript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeErrorExpressionSegment {
    pub rendered_content: String,
    /// Non-empty.
    pub tokens: Vec<Token>,
    /// Exception type raised at runtime, e.g. `TypeMismatchException`.
    pub exception_type: EcoString,
    pub message: EcoString,
}

fn render_members(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

fn render_arguments(arguments: &[Expression]) -> String {
    arguments
        .iter()
        .map(Expression::rendered_content)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(content: &str) -> Token {
        Token::new(TokenKind::Name, content, 0)
    }

    #[test]
    fn empty_expression_is_rejected() {
        assert_eq!(Expression::new(vec![]), Err(ExpressionError::EmptyExpression));
    }

    #[test]
    fn call_renders_members_and_arguments() {
        let argument = Expression::single(ExpressionSegment::NumericValue(NumericValueExpressionSegment {
            token: Token::new(TokenKind::NumericLiteral, "1", 0),
            value: 1.0,
        }));
        let call = CallExpressionSegment {
            leading_accessor: true,
            member_access_tokens: vec![name("a"), name("b")],
            arguments: vec![argument],
            zero_argument_brackets_present: false,
        };
        assert_eq!(call.rendered_content(), ".a.b(1)");
        assert_eq!(call.all_tokens().len(), 3);
        assert!(!call.is_bare_name());
    }

    #[test]
    fn call_set_renders_accessors_between_items() {
        let call_set = CallSetExpressionSegment {
            leading_accessor: false,
            items: vec![
                CallSetItemExpressionSegment {
                    member_access_tokens: vec![name("a")],
                    arguments: vec![],
                    zero_argument_brackets_present: true,
                },
                CallSetItemExpressionSegment {
                    member_access_tokens: vec![name("Name")],
                    arguments: vec![],
                    zero_argument_brackets_present: false,
                },
            ],
        };
        assert_eq!(call_set.rendered_content(), "a().Name");
    }

    #[test]
    fn string_rendering_escapes_quotes() {
        let segment = ExpressionSegment::StringValue(StringValueExpressionSegment {
            token: Token::new(TokenKind::StringLiteral, "a\"b", 0),
        });
        assert_eq!(segment.rendered_content(), "\"a\"\"b\"");
        assert!(segment.is_literal());
    }
}
