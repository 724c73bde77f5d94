// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression translation: [`Expression`] trees to C# compat-layer calls.
//!
//! **DDD Context:** Compilation — Code Generation
//!
//! Every VBScript operation goes through the compat layer `_` so that loose
//! typing behaves as it did in the script engine: `a + b` becomes
//! `_.ADD(a, b)`, `obj.Name(1)` becomes
//! `_.CALL(this, obj, "Name", _.ARGS.Val(1))`.
//!
//! Name references resolve through [`ScopeAccessInformation`]; names that
//! are not declared anywhere are recorded on the [`TranslationResult`] so
//! the enclosing scope can declare them.

use crate::expressions::{
    CallExpressionSegment, CallSetItemExpressionSegment, Expression, ExpressionSegment, generate,
};
use crate::source_analysis::{Token, TokenKind};

use super::naming::csharp_string_literal;
use super::scope::{NameLocation, ScopeAccessInformation, ScopedName};
use super::{CodeBlockTranslator, Result, TranslationError, TranslationResult};

/// How a translated value will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ValueContext {
    /// Handed to another compat call that coerces as needed.
    Raw,
    /// Assigned with `Let`: object references are reduced to their default value.
    Value,
    /// Assigned with `Set`: must be an object reference.
    Object,
}

/// What a name in an expression refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum NameReference {
    Me,
    Err,
    BuiltInFunction,
    Function(ScopedName),
    Property(ScopedName),
    Variable(ScopedName),
    Undeclared,
}

impl NameReference {
    /// Variables (declared or not) can be passed by reference.
    pub(super) fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_) | Self::Undeclared)
    }
}

/// One link of a member-access chain, borrowed from a call segment.
struct CallLink<'e> {
    members: &'e [Token],
    arguments: &'e [Expression],
    has_brackets: bool,
}

impl<'e> CallLink<'e> {
    fn from_call(call: &'e CallExpressionSegment) -> Self {
        Self {
            members: &call.member_access_tokens,
            arguments: &call.arguments,
            has_brackets: !call.arguments.is_empty() || call.zero_argument_brackets_present,
        }
    }

    fn from_item(item: &'e CallSetItemExpressionSegment) -> Self {
        Self {
            members: &item.member_access_tokens,
            arguments: &item.arguments,
            has_brackets: !item.arguments.is_empty() || item.zero_argument_brackets_present,
        }
    }
}

/// Generates exactly one expression from a token run.
pub(super) fn generate_single(tokens: &[Token], line_index: usize) -> Result<Expression> {
    let mut expressions = generate(tokens)?;
    if expressions.len() != 1 {
        return Err(TranslationError::InvalidValueExpression {
            content: tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(" "),
            line: line_index + 1,
        });
    }
    Ok(expressions.remove(0))
}

fn binary_operation(operator: &Token) -> Option<&'static str> {
    let name = match operator.content().to_ascii_lowercase().as_str() {
        "+" => "ADD",
        "-" => "SUBT",
        "*" => "MULT",
        "/" => "DIV",
        "\\" => "INTDIV",
        "^" => "POW",
        "mod" => "MOD",
        "&" => "CONCAT",
        "=" => "EQ",
        "<>" => "NOTEQ",
        "<" => "LT",
        ">" => "GT",
        "<=" => "LTE",
        ">=" => "GTE",
        "is" => "IS",
        "and" => "AND",
        "or" => "OR",
        "xor" => "XOR",
        "eqv" => "EQV",
        "imp" => "IMP",
        _ => return None,
    };
    Some(name)
}

fn unary_operation(operator: &Token) -> Option<&'static str> {
    let name = match operator.content().to_ascii_lowercase().as_str() {
        "-" => "NEG",
        "+" => "NUM",
        "not" => "NOT",
        _ => return None,
    };
    Some(name)
}

/// C# for a built-in VBScript constant.
fn built_in_value(token: &Token) -> String {
    let value = match token.content().to_ascii_lowercase().as_str() {
        "true" => "true",
        "false" => "false",
        "empty" => "null",
        "null" => "DBNull.Value",
        "nothing" => "VBScriptConstants.Nothing",
        "vbcr" => "\"\\r\"",
        "vbcrlf" | "vbnewline" => "\"\\r\\n\"",
        "vblf" => "\"\\n\"",
        "vbtab" => "\"\\t\"",
        "vbnullstring" => "\"\"",
        "vbnullchar" => "\"\\0\"",
        "vbtrue" => "-1",
        "vbfalse" | "vbbinarycompare" | "vbempty" => "0",
        "vbusedefault" => "-2",
        "vbobjecterror" => "-2147221504",
        "vbtextcompare" | "vbnull" => "1",
        "vbinteger" => "2",
        "vblong" => "3",
        "vbsingle" => "4",
        "vbdouble" => "5",
        "vbcurrency" => "6",
        "vbdate" => "7",
        "vbstring" => "8",
        "vbobject" => "9",
        "vberror" => "10",
        "vbboolean" => "11",
        "vbvariant" => "12",
        "vbdataobject" => "13",
        "vbdecimal" => "14",
        "vbbyte" => "17",
        "vbarray" => "8192",
        other => return format!("VBScriptConstants.{other}"),
    };
    value.to_string()
}

impl CodeBlockTranslator {
    /// Resolves what a bare name refers to in `scope`.
    pub(super) fn classify_name(&self, token: &Token, scope: &ScopeAccessInformation) -> NameReference {
        if token.kind() == TokenKind::Name && token.content().eq_ignore_ascii_case("me") {
            return NameReference::Me;
        }
        let rewritten = self.rewrite_token(token);
        if let Some(local) = scope
            .find_variable(&rewritten)
            .filter(|v| v.location == NameLocation::WithinFunctionOrProperty)
        {
            return NameReference::Variable(local.clone());
        }
        if let Some(property) = scope.find_property(&rewritten) {
            return NameReference::Property(property.clone());
        }
        if let Some(function) = scope.find_function(&rewritten) {
            return NameReference::Function(function.clone());
        }
        if let Some(variable) = scope.find_variable(&rewritten) {
            return NameReference::Variable(variable.clone());
        }
        if token.kind() == TokenKind::BuiltInFunction {
            return NameReference::BuiltInFunction;
        }
        if token.content().eq_ignore_ascii_case("err") {
            return NameReference::Err;
        }
        NameReference::Undeclared
    }

    /// C# for a variable reference, recording it when undeclared.
    pub(super) fn translate_variable(
        &self,
        token: &Token,
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> String {
        let rewritten = self.rewrite_token(token);
        if let Some(alias) = scope.by_ref_alias(&rewritten) {
            return alias.to_string();
        }
        match scope.find_variable(&rewritten) {
            Some(variable) => self.variable_access(&variable.rewritten, variable.location),
            None => {
                result.record_undeclared([token.clone()]);
                match scope.location() {
                    super::scope::ScopeLocation::OutermostScope => {
                        self.variable_access(&rewritten, NameLocation::Environment)
                    }
                    _ => rewritten.to_string(),
                }
            }
        }
    }

    fn variable_access(&self, rewritten: &str, location: NameLocation) -> String {
        match location {
            NameLocation::OutermostScope => format!("_outer.{rewritten}"),
            NameLocation::Environment => format!("_env.{rewritten}"),
            NameLocation::WithinClass | NameLocation::WithinFunctionOrProperty => {
                rewritten.to_string()
            }
        }
    }

    /// Translates an expression for the given use.
    pub(super) fn translate_expression(
        &self,
        expression: &Expression,
        scope: &ScopeAccessInformation,
        context: ValueContext,
        result: &mut TranslationResult,
    ) -> Result<String> {
        let translated = self.translate_raw(expression, scope, result)?;
        let Some(single) = expression.as_single() else {
            return Ok(translated);
        };
        let needs_wrapper = match context {
            ValueContext::Raw => false,
            ValueContext::Value => matches!(
                single,
                ExpressionSegment::Call(_)
                    | ExpressionSegment::CallSet(_)
                    | ExpressionSegment::Bracketed(_)
            ),
            ValueContext::Object => !matches!(
                single,
                ExpressionSegment::NewInstance(_) | ExpressionSegment::RuntimeError(_)
            ) && !is_nothing(single),
        };
        Ok(match (needs_wrapper, context) {
            (true, ValueContext::Value) => format!("_.VAL({translated})"),
            (true, ValueContext::Object) => format!("_.OBJ({translated})"),
            _ => translated,
        })
    }

    /// `_.IF(expr)`, or `_.IF(() => expr, errOn)` when errors are trapped.
    pub(super) fn translate_condition(
        &self,
        expression: &Expression,
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> Result<String> {
        let translated = self.translate_raw(expression, scope, result)?;
        Ok(self.wrap_condition(&translated, scope))
    }

    /// Wraps already-translated C# in the compat layer's truth test.
    pub(super) fn wrap_condition(&self, translated: &str, scope: &ScopeAccessInformation) -> String {
        match scope.error_registration_token() {
            Some(token) => format!("_.IF(() => {translated}, {token})"),
            None => format!("_.IF({translated})"),
        }
    }

    fn translate_raw(
        &self,
        expression: &Expression,
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> Result<String> {
        match expression.segments() {
            [operand] => self.translate_operand(operand, scope, expression, result),
            [ExpressionSegment::Operation(operator), operand] => {
                let name = unary_operation(&operator.token)
                    .ok_or_else(|| invalid_expression(expression))?;
                let operand = self.translate_operand(operand, scope, expression, result)?;
                Ok(format!("_.{name}({operand})"))
            }
            [left, ExpressionSegment::Operation(operator), right] => {
                let name = binary_operation(&operator.token)
                    .ok_or_else(|| invalid_expression(expression))?;
                let left = self.translate_operand(left, scope, expression, result)?;
                let right = self.translate_operand(right, scope, expression, result)?;
                Ok(format!("_.{name}({left}, {right})"))
            }
            _ => Err(invalid_expression(expression)),
        }
    }

    fn translate_operand(
        &self,
        segment: &ExpressionSegment,
        scope: &ScopeAccessInformation,
        whole: &Expression,
        result: &mut TranslationResult,
    ) -> Result<String> {
        match segment {
            ExpressionSegment::Call(call) => {
                self.translate_call_chain(call.leading_accessor, &[CallLink::from_call(call)], scope, false, result)
            }
            ExpressionSegment::CallSet(call_set) => {
                let links: Vec<_> = call_set.items.iter().map(CallLink::from_item).collect();
                self.translate_call_chain(call_set.leading_accessor, &links, scope, false, result)
            }
            ExpressionSegment::Bracketed(bracketed) => match bracketed.expressions.as_slice() {
                [only] => self.translate_raw(only, scope, result),
                _ => Err(invalid_expression(whole)),
            },
            ExpressionSegment::Operation(_) => Err(invalid_expression(whole)),
            ExpressionSegment::BuiltInValue(value) => Ok(built_in_value(&value.token)),
            ExpressionSegment::NumericValue(value) => Ok(value.token.content().to_string()),
            ExpressionSegment::StringValue(value) => Ok(csharp_string_literal(value.token.content())),
            ExpressionSegment::DateValue(value) => {
                Ok(format!("_.DATE({})", csharp_string_literal(value.token.content())))
            }
            ExpressionSegment::NewInstance(new) => {
                let rewritten = self.rewrite_token(&new.class_name);
                match scope.find_class(&rewritten) {
                    Some(class) => Ok(format!("new {}(_, _env, _outer)", class.rewritten)),
                    None => Ok(raise_error(
                        "ClassNotDefinedException",
                        &format!("Class not defined: '{}'", new.class_name.content()),
                    )),
                }
            }
            ExpressionSegment::RuntimeError(error) => {
                Ok(raise_error(&error.exception_type, &error.message))
            }
        }
    }

    /// Translates an expression used as a statement; the result always
    /// invokes something.
    pub(super) fn translate_call_statement(
        &self,
        expression: &Expression,
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> Result<String> {
        match expression.as_single() {
            Some(ExpressionSegment::Call(call)) => self.translate_call_chain(
                call.leading_accessor,
                &[CallLink::from_call(call)],
                scope,
                true,
                result,
            ),
            Some(ExpressionSegment::CallSet(call_set)) => {
                let links: Vec<_> = call_set.items.iter().map(CallLink::from_item).collect();
                self.translate_call_chain(call_set.leading_accessor, &links, scope, true, result)
            }
            Some(ExpressionSegment::RuntimeError(error)) => {
                Ok(raise_error(&error.exception_type, &error.message))
            }
            _ => Err(TranslationError::InvalidValueExpression {
                content: expression.rendered_content(),
                line: expression.line_index() + 1,
            }),
        }
    }

    /// Renders the base and member name of an assignment target, for
    /// `_.SET(value, this, base, member, args)`.
    ///
    /// Returns `(base, member, arguments)`, where `member` is `None` for a
    /// default-member (indexed) assignment.
    pub(super) fn translate_set_target(
        &self,
        expression: &Expression,
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> Result<(String, Option<String>, Option<String>)> {
        let (leading_accessor, links): (bool, Vec<CallLink<'_>>) = match expression.as_single() {
            Some(ExpressionSegment::Call(call)) => (call.leading_accessor, vec![CallLink::from_call(call)]),
            Some(ExpressionSegment::CallSet(call_set)) => (
                call_set.leading_accessor,
                call_set.items.iter().map(CallLink::from_item).collect(),
            ),
            _ => {
                return Err(TranslationError::InvalidAssignmentTarget {
                    line: expression.line_index() + 1,
                });
            }
        };
        let Some((last, init)) = links.split_last() else {
            return Err(TranslationError::InvalidAssignmentTarget {
                line: expression.line_index() + 1,
            });
        };

        // The last member of the last link is the one being set.
        let arguments = if last.has_brackets {
            self.translate_arguments(last.arguments, scope, result)?
        } else {
            None
        };
        let (base_members, member) = match last.members.split_last() {
            Some((member, rest)) => (rest, Some(member)),
            None => (last.members, None),
        };

        let mut base_links: Vec<CallLink<'_>> = init
            .iter()
            .map(|link| CallLink {
                members: link.members,
                arguments: link.arguments,
                has_brackets: link.has_brackets,
            })
            .collect();
        if !base_members.is_empty() {
            base_links.push(CallLink {
                members: base_members,
                arguments: &[],
                has_brackets: false,
            });
        }

        let base = if base_links.is_empty() {
            if leading_accessor {
                self.with_reference(scope, expression)?
            } else if let Some(member) = member {
                // `a(1) = x`: the variable itself is the base, indexed by
                // the arguments.
                if arguments.is_none() {
                    return Err(TranslationError::InvalidAssignmentTarget {
                        line: expression.line_index() + 1,
                    });
                }
                let base = self.translate_name_value(member, scope, result);
                return Ok((base, None, arguments));
            } else {
                return Err(TranslationError::InvalidAssignmentTarget {
                    line: expression.line_index() + 1,
                });
            }
        } else {
            self.translate_call_chain(leading_accessor, &base_links, scope, false, result)?
        };

        let member = member.map(|m| csharp_string_literal(m.content()));
        Ok((base, member, arguments))
    }

    /// A bare name as a value: `this`, a variable or a call with no arguments.
    fn translate_name_value(
        &self,
        token: &Token,
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> String {
        match self.classify_name(token, scope) {
            NameReference::Me => "this".to_string(),
            NameReference::Variable(_) | NameReference::Undeclared => {
                self.translate_variable(token, scope, result)
            }
            NameReference::Err => "_.ERR".to_string(),
            NameReference::BuiltInFunction => {
                format!("_.{}()", token.content().to_ascii_uppercase())
            }
            NameReference::Function(function) => {
                format!("_.CALL(this, {}, {})", container(&function), member_name(&function))
            }
            NameReference::Property(property) => {
                format!("_.CALL(this, this, {})", csharp_string_literal(&property.source_name))
            }
        }
    }

    fn with_reference(&self, scope: &ScopeAccessInformation, expression: &Expression) -> Result<String> {
        scope
            .directed_with_reference()
            .map(ToString::to_string)
            .ok_or(TranslationError::MissingWithTarget {
                line: expression.line_index() + 1,
            })
    }

    /// Translates a member-access chain into nested `_.CALL`s.
    ///
    /// With `force_call`, a chain that would otherwise render as a plain
    /// variable reference is invoked through `_.CALL` so it can stand as a
    /// statement.
    fn translate_call_chain(
        &self,
        leading_accessor: bool,
        links: &[CallLink<'_>],
        scope: &ScopeAccessInformation,
        force_call: bool,
        result: &mut TranslationResult,
    ) -> Result<String> {
        let line = links
            .iter()
            .find_map(|link| link.members.first())
            .map_or(0, Token::line_index);
        let mut base: Option<String> = None;
        let mut invoked = false;

        for (index, link) in links.iter().enumerate() {
            let mut members = link.members;
            if index == 0 && leading_accessor {
                base = Some(
                    scope
                        .directed_with_reference()
                        .map(ToString::to_string)
                        .ok_or(TranslationError::MissingWithTarget { line: line + 1 })?,
                );
            } else if index == 0 {
                let Some((first, rest)) = members.split_first() else {
                    return Err(TranslationError::InvalidValueExpression {
                        content: String::new(),
                        line: line + 1,
                    });
                };
                members = rest;
                let arguments = if rest.is_empty() && link.has_brackets {
                    Some(link.arguments)
                } else {
                    None
                };
                let (rendered, is_call) = self.translate_first_member(first, arguments, scope, result)?;
                base = Some(rendered);
                invoked = is_call;
            } else if members.is_empty() {
                // A bare index such as the `(1)` in `a(0)(1)`.
                let current = base.take().unwrap_or_default();
                let arguments = self.translate_arguments(link.arguments, scope, result)?;
                base = Some(call(&current, None, arguments.as_deref()));
                invoked = true;
                continue;
            }

            for (position, member) in members.iter().enumerate() {
                let is_last = position + 1 == members.len();
                let arguments = if is_last && link.has_brackets {
                    self.translate_arguments(link.arguments, scope, result)?
                } else {
                    None
                };
                let current = base.take().unwrap_or_default();
                base = Some(call(
                    &current,
                    Some(&csharp_string_literal(member.content())),
                    arguments.as_deref(),
                ));
                invoked = true;
            }
        }

        let rendered = base.unwrap_or_default();
        if force_call && !invoked {
            return Ok(format!("_.CALL(this, {rendered})"));
        }
        Ok(rendered)
    }

    /// The first name of a chain without a leading accessor. Returns the
    /// rendering and whether it already invokes something.
    fn translate_first_member(
        &self,
        first: &Token,
        arguments: Option<&[Expression]>,
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> Result<(String, bool)> {
        let reference = self.classify_name(first, scope);
        if reference == NameReference::BuiltInFunction {
            let arguments = match arguments {
                Some(arguments) => arguments
                    .iter()
                    .map(|argument| self.translate_expression(argument, scope, ValueContext::Raw, result))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            return Ok((
                format!("_.{}({})", first.content().to_ascii_uppercase(), arguments.join(", ")),
                true,
            ));
        }

        let translated_arguments = match arguments {
            Some(arguments) => self.translate_arguments(arguments, scope, result)?,
            None => None,
        };
        let has_brackets = arguments.is_some();
        Ok(match reference {
            NameReference::Function(function) => (
                call(
                    container(&function),
                    Some(&member_name(&function)),
                    translated_arguments.as_deref(),
                ),
                true,
            ),
            NameReference::Property(property) => (
                call(
                    "this",
                    Some(&csharp_string_literal(&property.source_name)),
                    translated_arguments.as_deref(),
                ),
                true,
            ),
            other => {
                let value = match other {
                    NameReference::Me => "this".to_string(),
                    NameReference::Err => "_.ERR".to_string(),
                    _ => self.translate_variable(first, scope, result),
                };
                if has_brackets {
                    (call(&value, None, translated_arguments.as_deref()), true)
                } else {
                    (value, false)
                }
            }
        })
    }

    /// `_.ARGS.Val(x).Ref(y, v1 => { y = v1; })`, or `None` for no arguments.
    ///
    /// A bare variable is passed by reference. Wrapping it in brackets
    /// passes it by value, as in VBScript.
    pub(super) fn translate_arguments(
        &self,
        arguments: &[Expression],
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> Result<Option<String>> {
        if arguments.is_empty() {
            return Ok(None);
        }
        let mut rendered = String::from("_.ARGS");
        for argument in arguments {
            if let Some(token) = self.by_ref_argument(argument, scope) {
                let target = self.translate_variable(token, scope, result);
                let parameter = scope.next_temp_name("v");
                rendered.push_str(&format!(".Ref({target}, {parameter} => {{ {target} = {parameter}; }})"));
            } else {
                let value = self.translate_expression(argument, scope, ValueContext::Raw, result)?;
                rendered.push_str(&format!(".Val({value})"));
            }
        }
        Ok(Some(rendered))
    }

    /// The variable token when an argument would be passed by reference.
    pub(super) fn by_ref_argument<'e>(
        &self,
        argument: &'e Expression,
        scope: &ScopeAccessInformation,
    ) -> Option<&'e Token> {
        match argument.as_single() {
            Some(ExpressionSegment::Call(call)) if call.is_bare_name() => {
                let token = &call.member_access_tokens[0];
                self.classify_name(token, scope).is_variable().then_some(token)
            }
            _ => None,
        }
    }
}

/// `_.CALL(this, base[, "member"][, args])`
fn call(base: &str, member: Option<&str>, arguments: Option<&str>) -> String {
    let mut rendered = format!("_.CALL(this, {base}");
    if let Some(member) = member {
        rendered.push_str(", ");
        rendered.push_str(member);
    }
    if let Some(arguments) = arguments {
        rendered.push_str(", ");
        rendered.push_str(arguments);
    }
    rendered.push(')');
    rendered
}

/// The object a user function is invoked on.
fn container(function: &ScopedName) -> &'static str {
    match function.location {
        NameLocation::WithinClass => "this",
        _ => "_outer",
    }
}

/// The quoted C# method name of a user function.
fn member_name(function: &ScopedName) -> String {
    csharp_string_literal(function.rewritten.trim_start_matches('@'))
}

/// `_.RAISEERROR(new Type("message"))`
pub(super) fn raise_error(exception_type: &str, message: &str) -> String {
    format!("_.RAISEERROR(new {exception_type}({}))", csharp_string_literal(message))
}

fn is_nothing(segment: &ExpressionSegment) -> bool {
    matches!(segment, ExpressionSegment::BuiltInValue(value) if value.token.content().eq_ignore_ascii_case("nothing"))
}

fn invalid_expression(expression: &Expression) -> TranslationError {
    TranslationError::InvalidValueExpression {
        content: expression.rendered_content(),
        line: expression.line_index() + 1,
    }
}
