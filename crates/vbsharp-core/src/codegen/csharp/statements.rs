// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Single-line statements: blank lines, comments, error trapping, calls,
//! assignments, `Exit` and `Erase`.
//!
//! **DDD Context:** Compilation — Code Generation

use ecow::EcoString;

use crate::ast::{CodeBlock, ExitKind, FunctionKind, Statement, ValueSetType, ValueSettingStatement};
use crate::expressions::{
    CallExpressionSegment, Expression, ExpressionSegment, RuntimeErrorExpressionSegment, generate,
};
use crate::source_analysis::{Token, TokenKind};

use super::expressions::{NameReference, ValueContext, generate_single, raise_error};
use super::naming::csharp_string_literal;
use super::scope::{LoopKind, ScopeAccessInformation, ScopeDefiningParent};
use super::{
    BlockOutcome, CodeBlockTranslator, Result, TranslatedStatement, TranslationError,
    TranslationResult, TranslationWarning,
};

/// A single bare-name expression for `token`.
pub(super) fn bare_name_expression(token: &Token) -> Expression {
    Expression::single(ExpressionSegment::Call(CallExpressionSegment {
        leading_accessor: false,
        member_access_tokens: vec![token.clone()],
        arguments: Vec::new(),
        zero_argument_brackets_present: false,
    }))
}

impl CodeBlockTranslator {
    pub(super) fn translate_blank_line(
        &self,
        block: &CodeBlock,
        _scope: &ScopeAccessInformation,
        indentation_depth: usize,
        mut result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::BlankLine(blank) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        result.push(TranslatedStatement::new("", indentation_depth, blank.line_index));
        Ok(BlockOutcome::Translated(result))
    }

    /// Inline comments join the statement emitted for the same source line.
    pub(super) fn translate_comment(
        &self,
        block: &CodeBlock,
        _scope: &ScopeAccessInformation,
        indentation_depth: usize,
        mut result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::Comment(comment) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let line_index = comment.token.line_index();
        let text = format!("//{}", comment.token.content());
        if comment.is_inline {
            if let Some(previous) = result
                .translated_statements
                .last_mut()
                .filter(|s| s.line_index == Some(line_index))
            {
                previous.content.push(' ');
                previous.content.push_str(&text);
                return Ok(BlockOutcome::Translated(result));
            }
        }
        result.push(TranslatedStatement::new(text, indentation_depth, line_index));
        Ok(BlockOutcome::Translated(result))
    }

    /// The translation always behaves as if `Option Explicit` were off.
    pub(super) fn translate_option_explicit(
        &self,
        block: &CodeBlock,
        _scope: &ScopeAccessInformation,
        _indentation_depth: usize,
        mut result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::OptionExplicit(option) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        result.warn(TranslationWarning::OptionExplicitIgnored {
            line: option.line_index + 1,
        });
        Ok(BlockOutcome::Translated(result))
    }

    pub(super) fn translate_on_error(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        mut result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let token = scope.error_registration_token();
        let (content, line_index) = match (block, token) {
            (CodeBlock::OnErrorResumeNext(statement), Some(token)) => (
                format!("_.STARTERRORTRAPPINGANDCLEARANYERROR({token});"),
                statement.line_index,
            ),
            (CodeBlock::OnErrorResumeNext(statement), None) => {
                return Err(TranslationError::Internal(format!(
                    "On Error Resume Next on line {} has no error registration token",
                    statement.line_index + 1
                )));
            }
            (CodeBlock::OnErrorGoto0(statement), Some(token)) => (
                format!("_.STOPERRORTRAPPINGANDCLEARANYERROR({token});"),
                statement.line_index,
            ),
            (CodeBlock::OnErrorGoto0(statement), None) => {
                ("_.CLEARANYERROR();".to_string(), statement.line_index)
            }
            _ => return Ok(BlockOutcome::NotApplicable(result)),
        };
        result.push(TranslatedStatement::new(content, indentation_depth, line_index));
        Ok(BlockOutcome::Translated(result))
    }

    /// Emits one statement built by `render`, aliasing captured by-ref
    /// parameters and wrapping in `_.HANDLEERROR` when errors are trapped.
    pub(super) fn emit_statement(
        &self,
        expressions: &[&Expression],
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        line_index: usize,
        result: TranslationResult,
        render: impl FnOnce(&ScopeAccessInformation, &mut TranslationResult) -> Result<String>,
    ) -> Result<TranslationResult> {
        let aliased = self.by_ref_parameters_to_alias(expressions, scope);
        self.with_by_ref_aliases(
            &aliased,
            scope,
            indentation_depth,
            line_index,
            result,
            |scope, depth, mut result| {
                let content = render(scope, &mut result)?;
                let content = match scope.error_registration_token() {
                    Some(token) => format!("_.HANDLEERROR({token}, () => {{ {content} }});"),
                    None => content,
                };
                result.push(TranslatedStatement::new(content, depth, line_index));
                Ok(result)
            },
        )
    }

    pub(super) fn translate_statement(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::Statement(statement) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let line_index = statement.line_index();
        let expression = self.call_statement_expression(statement, line_index)?;
        let result = self.emit_statement(
            &[&expression],
            scope,
            indentation_depth,
            line_index,
            result,
            |scope, result| {
                let call = self.translate_call_statement(&expression, scope, result)?;
                Ok(format!("{call};"))
            },
        )?;
        Ok(BlockOutcome::Translated(result))
    }

    /// The call expression of a statement.
    ///
    /// `Call f(a, b)` is already a call expression. Without `Call` the
    /// arguments follow the callee unbracketed (`f a, b`), and brackets
    /// around a single argument (`f (a)`) pass it by value.
    fn call_statement_expression(&self, statement: &Statement, line_index: usize) -> Result<Expression> {
        if statement.call_prefix.is_some() {
            return generate_single(&statement.tokens, line_index);
        }
        let callee_length = callee_length(&statement.tokens);
        let (callee, remainder) = statement.tokens.split_at(callee_length);
        let callee = generate_single(callee, line_index)?;
        if remainder.is_empty() {
            return Ok(callee);
        }

        let mut arguments = generate(remainder)?;
        if let [argument] = arguments.as_slice() {
            if let Some(ExpressionSegment::Bracketed(bracketed)) = argument.as_single() {
                if bracketed.expressions.len() > 1 {
                    arguments = bracketed.expressions.clone();
                }
            }
        }

        let mut segments = callee.into_segments();
        match segments.as_mut_slice() {
            [ExpressionSegment::Call(call)] => call.arguments = arguments,
            [ExpressionSegment::CallSet(call_set)] => {
                if let Some(last) = call_set.items.last_mut() {
                    last.arguments = arguments;
                }
            }
            _ => {
                return Err(TranslationError::InvalidValueExpression {
                    content: statement.tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(" "),
                    line: line_index + 1,
                });
            }
        }
        Ok(Expression::new(segments)?)
    }

    pub(super) fn translate_value_setting(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::ValueSetting(statement) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let line_index = statement.line_index();
        let target = generate_single(&statement.target, line_index)?;
        let value = generate_single(&statement.expression, line_index)?;
        let result = self.emit_statement(
            &[&target, &value],
            scope,
            indentation_depth,
            line_index,
            result,
            |scope, result| self.render_value_setting(statement, &target, &value, scope, result),
        )?;
        Ok(BlockOutcome::Translated(result))
    }

    fn render_value_setting(
        &self,
        statement: &ValueSettingStatement,
        target: &Expression,
        value: &Expression,
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> Result<String> {
        let line_index = statement.line_index();
        let context = match statement.set_type {
            ValueSetType::Let => ValueContext::Value,
            ValueSetType::Set => ValueContext::Object,
        };
        let translated_value = self.translate_expression(value, scope, context, result)?;

        let bare_name = match target.as_single() {
            Some(ExpressionSegment::Call(call)) if call.is_bare_name() => {
                Some(&call.member_access_tokens[0])
            }
            _ => None,
        };
        let Some(name) = bare_name else {
            let (base, member, arguments) = self.translate_set_target(target, scope, result)?;
            let member = member.unwrap_or_else(|| "null".to_string());
            return Ok(match arguments {
                Some(arguments) => {
                    format!("_.SET({translated_value}, this, {base}, {member}, {arguments});")
                }
                None => format!("_.SET({translated_value}, this, {base}, {member});"),
            });
        };

        let rewritten = self.rewrite_token(name);
        if scope.is_current_routine(&rewritten) {
            if let Some(return_value) = scope.parent_return_value_name() {
                return Ok(format!("{return_value} = {translated_value};"));
            }
        }
        Ok(match self.classify_name(name, scope) {
            NameReference::Variable(_) | NameReference::Undeclared => {
                let variable = self.translate_variable(name, scope, result);
                format!("{variable} = {translated_value};")
            }
            NameReference::Property(property) => format!(
                "_.SET({translated_value}, this, this, {});",
                csharp_string_literal(&property.source_name)
            ),
            NameReference::Function(_) | NameReference::BuiltInFunction => format!(
                "{};",
                raise_error(
                    "IllegalAssignmentException",
                    &format!("Illegal assignment: '{}'", name.content())
                )
            ),
            NameReference::Me | NameReference::Err => {
                return Err(TranslationError::InvalidAssignmentTarget {
                    line: line_index + 1,
                });
            }
        })
    }

    pub(super) fn translate_exit(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        mut result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::Exit(exit) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let line_index = exit.keyword.line_index();
        let invalid = || TranslationError::InvalidExit {
            line: line_index + 1,
        };

        let loop_kind = match exit.kind {
            ExitKind::Do => Some(LoopKind::Do),
            ExitKind::For => Some(LoopKind::For),
            ExitKind::Function | ExitKind::Sub | ExitKind::Property => None,
        };
        if let Some(kind) = loop_kind {
            let exit_points = scope.structure_exit_points();
            let innermost = exit_points.last().ok_or_else(invalid)?;
            if innermost.kind != kind {
                let flag = exit_points
                    .iter()
                    .rev()
                    .find(|point| point.kind == kind)
                    .and_then(|point| point.exit_flag.as_ref())
                    .ok_or_else(invalid)?;
                result.push(TranslatedStatement::new(
                    format!("{flag} = true;"),
                    indentation_depth,
                    line_index,
                ));
            }
            result.push(TranslatedStatement::new("break;", indentation_depth, line_index));
            return Ok(BlockOutcome::Translated(result));
        }

        let ScopeDefiningParent::Function { kind, .. } = scope.scope_defining_parent() else {
            return Err(invalid());
        };
        let matches_routine = match exit.kind {
            ExitKind::Function => *kind == FunctionKind::Function,
            ExitKind::Sub => *kind == FunctionKind::Sub,
            _ => kind.is_property(),
        };
        if !matches_routine {
            return Err(invalid());
        }
        let content = match (kind.returns_value(), scope.parent_return_value_name()) {
            (true, Some(return_value)) => format!("return {return_value};"),
            (true, None) => {
                return Err(TranslationError::Internal(format!(
                    "no return value name for Exit on line {}",
                    line_index + 1
                )));
            }
            (false, _) => "return;".to_string(),
        };
        result.push(TranslatedStatement::new(content, indentation_depth, line_index));
        Ok(BlockOutcome::Translated(result))
    }

    pub(super) fn translate_erase(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::Erase(erase) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let line_index = erase.keyword.line_index();

        if let [target] = erase.targets.as_slice() {
            if let [name] = target.as_slice() {
                if name.kind().is_name() && self.classify_name(name, scope).is_variable() {
                    let expression = bare_name_expression(name);
                    // The write-back lambda captures the target.
                    let rewritten = self.rewrite_token(name);
                    let aliased: Vec<EcoString> = if scope.is_unaliased_by_ref_parameter(&rewritten) {
                        vec![rewritten]
                    } else {
                        self.by_ref_parameters_to_alias(&[&expression], scope)
                    };
                    let result = self.with_by_ref_aliases(
                        &aliased,
                        scope,
                        indentation_depth,
                        line_index,
                        result,
                        |scope, depth, mut result| {
                            let variable = self.translate_variable(name, scope, &mut result);
                            let parameter = scope.next_temp_name("v");
                            let content =
                                format!("_.ERASE({variable}, {parameter} => {{ {variable} = {parameter}; }});");
                            let content = match scope.error_registration_token() {
                                Some(token) => format!("_.HANDLEERROR({token}, () => {{ {content} }});"),
                                None => content,
                            };
                            result.push(TranslatedStatement::new(content, depth, line_index));
                            Ok(result)
                        },
                    )?;
                    return Ok(BlockOutcome::Translated(result));
                }
            }
        }

        // Anything else is evaluated for its side effects, then fails the
        // way VBScript does.
        let mut result = result;
        let mut all_tokens = vec![erase.keyword.clone()];
        for target in &erase.targets {
            all_tokens.extend(target.iter().cloned());
            let expression = generate_single(target, line_index)?;
            result = self.emit_statement(
                &[&expression],
                scope,
                indentation_depth,
                line_index,
                result,
                |scope, result| {
                    let value = self.translate_expression(&expression, scope, ValueContext::Raw, result)?;
                    Ok(format!("_.VAL({value});"))
                },
            )?;
        }
        let failure = Expression::single(ExpressionSegment::RuntimeError(RuntimeErrorExpressionSegment {
            rendered_content: all_tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(" "),
            tokens: all_tokens,
            exception_type: "TypeMismatchException".into(),
            message: "Type mismatch: 'Erase'".into(),
        }));
        let result = self.emit_statement(
            &[],
            scope,
            indentation_depth,
            line_index,
            result,
            |scope, result| Ok(format!("{};", self.translate_call_statement(&failure, scope, result)?)),
        )?;
        Ok(BlockOutcome::Translated(result))
    }
}

/// Number of leading tokens naming the callee of an unbracketed call
/// statement: a member chain, including brackets followed by a further
/// member (`a.Items(0).Remove`).
fn callee_length(tokens: &[Token]) -> usize {
    let mut index = 0;
    if tokens.first().is_some_and(|t| t.kind() == TokenKind::MemberAccessor) {
        index = 1;
    }
    loop {
        match tokens.get(index) {
            Some(token) if token.kind().is_name() || token.kind() == TokenKind::Keyword => index += 1,
            _ => return index,
        }
        match tokens.get(index).map(Token::kind) {
            Some(TokenKind::MemberAccessor) => index += 1,
            Some(TokenKind::OpenBrace) => {
                let Some(close) = matching_close(tokens, index) else {
                    return index;
                };
                if tokens.get(close + 1).map(Token::kind) == Some(TokenKind::MemberAccessor) {
                    index = close + 2;
                } else {
                    return index;
                }
            }
            _ => return index,
        }
    }
}

fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        match token.kind() {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::lex;

    fn tokens(source: &str) -> Vec<Token> {
        lex(source)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind() != TokenKind::EndOfStatement)
            .collect()
    }

    #[test]
    fn callee_stops_before_arguments() {
        assert_eq!(callee_length(&tokens("f a, b")), 1);
        assert_eq!(callee_length(&tokens("obj.Method 1")), 3);
        assert_eq!(callee_length(&tokens("f (a)")), 1);
    }

    #[test]
    fn callee_includes_brackets_followed_by_member() {
        assert_eq!(callee_length(&tokens("a.Items(0).Remove 1")), 8);
    }

    #[test]
    fn callee_allows_leading_accessor() {
        assert_eq!(callee_length(&tokens(".Save")), 2);
    }

    #[test]
    fn matching_close_skips_nested_brackets() {
        let t = tokens("(a(1), b)");
        assert_eq!(matching_close(&t, 0), Some(t.len() - 1));
        assert_eq!(matching_close(&tokens("(a"), 0), None);
    }
}
