// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression generator.
//!
//! Re-segments a flat token run into [`Expression`]s:
//!
//! 1. Top-level argument separators split the run into one expression each.
//! 2. Bracketed runs are generated recursively and become opaque items.
//! 3. [`split_on_operators`] walks a cascade of precedence levels from the
//!    tightest binding to the loosest. Every level that matches overwrites
//!    the break point, so the last (loosest) match wins: the expression is
//!    split at its loosest operator. Within a binary level the rightmost
//!    occurrence is taken, which nests left-associatively.
//!
//! Sides of a split are processed one level deeper and come back wrapped in
//! a [`BracketedExpressionSegment`], so every expression is an operand, a
//! unary `[op, operand]` or a binary `[operand, op, operand]`.

use crate::source_analysis::{Token, TokenKind};

use super::segments::{
    BracketedExpressionSegment, BuiltInValueExpressionSegment, CallExpressionSegment,
    CallSetExpressionSegment, CallSetItemExpressionSegment, DateValueExpressionSegment,
    Expression, ExpressionSegment, NewInstanceExpressionSegment, NumericValueExpressionSegment,
    OperationExpressionSegment, StringValueExpressionSegment,
};
use super::ExpressionError;

type Result<T> = std::result::Result<T, ExpressionError>;

/// Builds expressions from a token run (an argument list when it contains
/// top-level separators). An empty run gives an empty list.
///
/// # Errors
///
/// Fails on mismatched brackets, a separator with no argument before or
/// after it, an unresolved `.`, a missing operand, or a token that cannot
/// appear in an expression.
///
/// # Example
///
/// ```
/// use vbsharp_core::expressions::generate;
/// use vbsharp_core::source_analysis::lex;
///
/// let expressions = generate(&lex("a + b * c, f(1)").unwrap()).unwrap();
/// assert_eq!(expressions.len(), 2);
/// assert_eq!(expressions[0].rendered_content(), "a + (b * c)");
/// ```
pub fn generate(tokens: &[Token]) -> Result<Vec<Expression>> {
    if let Some(token) = tokens
        .iter()
        .find(|t| t.kind() == TokenKind::MemberAccessorOrDecimalPoint)
    {
        return Err(ExpressionError::UnresolvedMemberAccessorOrDecimalPoint {
            line: token.line_index() + 1,
        });
    }
    split_arguments(tokens)?
        .into_iter()
        .map(build_expression)
        .collect()
}

fn split_arguments(tokens: &[Token]) -> Result<Vec<&[Token]>> {
    let Some(first) = tokens.first() else {
        return Ok(Vec::new());
    };
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, token) in tokens.iter().enumerate() {
        match token.kind() {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                depth = depth.checked_sub(1).ok_or(ExpressionError::MismatchedBrackets {
                    line: token.line_index() + 1,
                })?;
            }
            TokenKind::ArgumentSeparator if depth == 0 => {
                if index == start {
                    return Err(ExpressionError::MissingArgument {
                        line: token.line_index() + 1,
                    });
                }
                arguments.push(&tokens[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ExpressionError::MismatchedBrackets {
            line: first.line_index() + 1,
        });
    }
    if start == tokens.len() {
        return Err(ExpressionError::MissingArgument {
            line: tokens[tokens.len() - 1].line_index() + 1,
        });
    }
    arguments.push(&tokens[start..]);
    Ok(arguments)
}

fn build_expression(tokens: &[Token]) -> Result<Expression> {
    let line = tokens.first().map_or(0, Token::line_index) + 1;
    let items = group_brackets(tokens)?;
    Expression::new(split_on_operators(&items, 0, line)?)
}

/// A token, or a whole bracketed run already turned into expressions.
#[derive(Debug)]
enum Item {
    Token(Token),
    Bracket {
        open: Token,
        expressions: Vec<Expression>,
    },
}

impl Item {
    fn operator(&self) -> Option<&Token> {
        match self {
            Self::Token(token) if token.kind().is_operator() => Some(token),
            _ => None,
        }
    }

    fn line(&self) -> usize {
        match self {
            Self::Token(token) | Self::Bracket { open: token, .. } => token.line_index() + 1,
        }
    }
}

fn group_brackets(tokens: &[Token]) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        match token.kind() {
            TokenKind::OpenBrace => {
                let close = matching_close(tokens, index).ok_or(ExpressionError::MismatchedBrackets {
                    line: token.line_index() + 1,
                })?;
                items.push(Item::Bracket {
                    open: token.clone(),
                    expressions: generate(&tokens[index + 1..close])?,
                });
                index = close + 1;
            }
            TokenKind::CloseBrace => {
                return Err(ExpressionError::MismatchedBrackets {
                    line: token.line_index() + 1,
                });
            }
            _ => {
                items.push(Item::Token(token.clone()));
                index += 1;
            }
        }
    }
    Ok(items)
}

fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token.kind() {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// One rung of the precedence cascade.
enum Level {
    /// Binary operators, split at the rightmost occurrence.
    Binary(fn(&Token) -> bool),
    /// A prefix operator applying to everything after it.
    UnaryPrefix(fn(&Token) -> bool),
}

fn is_power(t: &Token) -> bool {
    t.is_operator("^")
}

fn is_sign(t: &Token) -> bool {
    t.is_operator("-") || t.is_operator("+")
}

fn is_multiplicative(t: &Token) -> bool {
    t.is_operator("*") || t.is_operator("/")
}

fn is_integer_division(t: &Token) -> bool {
    t.is_operator("\\")
}

fn is_modulo(t: &Token) -> bool {
    t.is_operator("mod")
}

fn is_concatenation(t: &Token) -> bool {
    t.is_operator("&")
}

fn is_comparison(t: &Token) -> bool {
    t.kind() == TokenKind::ComparisonOperator
}

fn is_not(t: &Token) -> bool {
    t.is_operator("not")
}

fn is_and(t: &Token) -> bool {
    t.is_operator("and")
}

fn is_or(t: &Token) -> bool {
    t.is_operator("or")
}

fn is_xor(t: &Token) -> bool {
    t.is_operator("xor")
}

fn is_eqv(t: &Token) -> bool {
    t.is_operator("eqv")
}

fn is_imp(t: &Token) -> bool {
    t.is_operator("imp")
}

/// Tightest binding first.
const PRECEDENCE: &[Level] = &[
    Level::Binary(is_power),
    Level::UnaryPrefix(is_sign),
    Level::Binary(is_multiplicative),
    Level::Binary(is_integer_division),
    Level::Binary(is_modulo),
    Level::Binary(is_sign),
    Level::Binary(is_concatenation),
    Level::Binary(is_comparison),
    Level::UnaryPrefix(is_not),
    Level::Binary(is_and),
    Level::Binary(is_or),
    Level::Binary(is_xor),
    Level::Binary(is_eqv),
    Level::Binary(is_imp),
];

#[derive(Debug, Clone, Copy)]
enum BreakPoint {
    Unary,
    Binary(usize),
}

/// Rightmost index of an operator matching `matches` in binary position:
/// preceded by an operand and followed by something.
fn rightmost_binary(items: &[Item], matches: fn(&Token) -> bool) -> Option<usize> {
    (1..items.len().saturating_sub(1)).rev().find(|&index| {
        items[index].operator().is_some_and(matches) && items[index - 1].operator().is_none()
    })
}

/// Splits `items` at its loosest operator, recursing into both sides.
fn split_on_operators(items: &[Item], depth: usize, line: usize) -> Result<Vec<ExpressionSegment>> {
    let (Some(first), Some(last)) = (items.first(), items.last()) else {
        return Err(ExpressionError::MissingOperand { line });
    };
    if last.operator().is_some() {
        return Err(ExpressionError::MissingOperand { line: last.line() });
    }

    let mut break_point = None;
    for level in PRECEDENCE {
        match level {
            Level::Binary(matches) => {
                if let Some(index) = rightmost_binary(items, *matches) {
                    break_point = Some(BreakPoint::Binary(index));
                }
            }
            Level::UnaryPrefix(matches) => {
                if first.operator().is_some_and(matches) {
                    break_point = Some(BreakPoint::Unary);
                }
            }
        }
    }

    let segments = match break_point {
        None => {
            if let Some(operator) = first.operator() {
                return Err(unexpected(operator));
            }
            return build_operand(items);
        }
        Some(BreakPoint::Unary) => {
            let operator = operation(first)?;
            let mut segments = vec![operator];
            segments.extend(split_on_operators(&items[1..], depth + 1, first.line())?);
            segments
        }
        Some(BreakPoint::Binary(index)) => {
            let operator = operation(&items[index])?;
            let mut segments = split_on_operators(&items[..index], depth + 1, first.line())?;
            segments.push(operator);
            segments.extend(split_on_operators(&items[index + 1..], depth + 1, items[index].line())?);
            segments
        }
    };

    if depth > 0 {
        Ok(vec![ExpressionSegment::Bracketed(
            BracketedExpressionSegment::wrapping(segments)?,
        )])
    } else {
        Ok(segments)
    }
}

fn operation(item: &Item) -> Result<ExpressionSegment> {
    match item {
        Item::Token(token) => Ok(ExpressionSegment::Operation(OperationExpressionSegment {
            token: token.clone(),
        })),
        Item::Bracket { open, .. } => Err(unexpected(open)),
    }
}

fn unexpected(token: &Token) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        content: token.content().clone(),
        line: token.line_index() + 1,
    }
}

/// An operator-free run: a literal, `New X`, a bracketed group or a call chain.
fn build_operand(items: &[Item]) -> Result<Vec<ExpressionSegment>> {
    let segment = match items {
        [Item::Bracket { open, expressions }] => {
            if expressions.is_empty() {
                return Err(ExpressionError::EmptyBrackets {
                    line: open.line_index() + 1,
                });
            }
            ExpressionSegment::Bracketed(BracketedExpressionSegment {
                expressions: expressions.clone(),
            })
        }
        [Item::Token(token)] if token.kind().is_literal() => literal(token)?,
        [Item::Token(new_token), Item::Token(class_name)]
            if new_token.is_keyword("new") && class_name.kind().is_name() =>
        {
            ExpressionSegment::NewInstance(NewInstanceExpressionSegment {
                new_token: new_token.clone(),
                class_name: class_name.clone(),
            })
        }
        _ => build_call(items)?,
    };
    Ok(vec![segment])
}

fn literal(token: &Token) -> Result<ExpressionSegment> {
    let token = token.clone();
    Ok(match token.kind() {
        TokenKind::NumericLiteral => {
            let value = token.content().parse::<f64>().map_err(|_| unexpected(&token))?;
            ExpressionSegment::NumericValue(NumericValueExpressionSegment { token, value })
        }
        TokenKind::StringLiteral => ExpressionSegment::StringValue(StringValueExpressionSegment { token }),
        TokenKind::DateLiteral => ExpressionSegment::DateValue(DateValueExpressionSegment { token }),
        _ => ExpressionSegment::BuiltInValue(BuiltInValueExpressionSegment { token }),
    })
}

/// A member-access chain. Accessors separate members; a bracket group
/// attaches arguments, and a member or bracket after arguments starts a new
/// call-set item.
fn build_call(items: &[Item]) -> Result<ExpressionSegment> {
    let (leading_accessor, rest) = match items {
        [Item::Token(token), rest @ ..] if token.kind() == TokenKind::MemberAccessor => (true, rest),
        _ => (false, items),
    };

    let mut chain = Vec::new();
    let mut current = CallSetItemExpressionSegment {
        member_access_tokens: Vec::new(),
        arguments: Vec::new(),
        zero_argument_brackets_present: false,
    };
    let mut has_brackets = false;
    let mut expecting_member = true;

    for item in rest {
        match item {
            Item::Token(token) if token.kind() == TokenKind::MemberAccessor => {
                if expecting_member {
                    return Err(unexpected(token));
                }
                if has_brackets {
                    chain.push(std::mem::replace(&mut current, empty_item()));
                    has_brackets = false;
                }
                expecting_member = true;
            }
            Item::Token(token) if token.kind().is_name() => {
                if !expecting_member {
                    return Err(unexpected(token));
                }
                current.member_access_tokens.push(token.clone());
                expecting_member = false;
            }
            Item::Token(token) => return Err(unexpected(token)),
            Item::Bracket { open, expressions } => {
                if expecting_member {
                    return Err(unexpected(open));
                }
                if has_brackets {
                    chain.push(std::mem::replace(&mut current, empty_item()));
                }
                current.zero_argument_brackets_present = expressions.is_empty();
                current.arguments = expressions.clone();
                has_brackets = true;
            }
        }
    }
    if expecting_member {
        let line = items.last().map_or(1, Item::line);
        return Err(ExpressionError::MissingOperand { line });
    }
    chain.push(current);

    if chain.len() == 1 {
        let only = chain.remove(0);
        return Ok(ExpressionSegment::Call(CallExpressionSegment {
            leading_accessor,
            member_access_tokens: only.member_access_tokens,
            arguments: only.arguments,
            zero_argument_brackets_present: only.zero_argument_brackets_present,
        }));
    }
    Ok(ExpressionSegment::CallSet(CallSetExpressionSegment {
        leading_accessor,
        items: chain,
    }))
}

fn empty_item() -> CallSetItemExpressionSegment {
    CallSetItemExpressionSegment {
        member_access_tokens: Vec::new(),
        arguments: Vec::new(),
        zero_argument_brackets_present: false,
    }
}
