// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `Select Case` blocks, translated to an `if` / `else if` chain so that
//! the first matching case wins and nothing falls through.

use crate::ast::{CaseValues, CodeBlock};
use crate::expressions::{Expression, ExpressionSegment};

use super::super::expressions::{ValueContext, generate_single};
use super::super::scope::{ParentConstruct, ScopeAccessInformation};
use super::super::{
    BlockOutcome, CodeBlockTranslator, Result, TranslatedStatement, TranslationResult,
};
use super::{Branch, TempDeclaration};

/// How the select target is referenced by each comparison.
#[derive(Debug, Clone)]
struct SelectTarget<'e> {
    rendered: String,
    /// The target expression, when comparisons evaluate it again (literals
    /// and bare names).
    inline: Option<&'e Expression>,
    is_numeric_literal: bool,
    is_literal: bool,
}

fn is_numeric_literal(expression: &Expression) -> bool {
    matches!(expression.as_single(), Some(ExpressionSegment::NumericValue(_)))
}

fn is_literal(expression: &Expression) -> bool {
    expression.as_single().is_some_and(ExpressionSegment::is_literal)
}

impl CodeBlockTranslator {
    pub(in crate::codegen::csharp) fn translate_select(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::Select(select) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let mut result = result;
        let line_index = select.keyword.line_index();

        for comment in &select.opening_comments {
            result.push(TranslatedStatement::new(
                format!("//{}", comment.token.content()),
                indentation_depth,
                comment.token.line_index(),
            ));
        }

        let expression = generate_single(&select.expression, line_index)?;
        let is_bare_name = matches!(
            expression.as_single(),
            Some(ExpressionSegment::Call(call))
                if call.is_bare_name()
                    && self.classify_name(&call.member_access_tokens[0], scope).is_variable()
        );

        let mut guard = None;
        let target = if is_literal(&expression) || is_bare_name {
            let scope = scope.extend_reserved(&result.reserved_names);
            SelectTarget {
                rendered: self.translate_expression(&expression, &scope, ValueContext::Raw, &mut result)?,
                inline: Some(&expression),
                is_numeric_literal: is_numeric_literal(&expression),
                is_literal: is_literal(&expression),
            }
        } else {
            let flag = match scope.error_registration_token() {
                Some(_) => {
                    let (flag, _) = scope
                        .extend_reserved(&result.reserved_names)
                        .reserve_temp("selectExpressionEvaluated");
                    result.reserve(flag.clone());
                    result.push(TranslatedStatement::new(
                        format!("var {flag} = false;"),
                        indentation_depth,
                        line_index,
                    ));
                    Some(flag)
                }
                None => None,
            };
            let (temp, evaluated) = self.evaluate_into_temp(
                TempDeclaration {
                    base: "selectExpression",
                    type_name: "object",
                    initial: "null",
                },
                &[&expression],
                true,
                flag.as_ref(),
                scope,
                indentation_depth,
                line_index,
                result,
                Box::new(|scope: &ScopeAccessInformation, result: &mut TranslationResult| {
                    self.translate_expression(&expression, scope, ValueContext::Value, result)
                }),
            )?;
            result = evaluated;
            guard = flag;
            SelectTarget {
                rendered: temp.to_string(),
                inline: None,
                is_numeric_literal: false,
                is_literal: false,
            }
        };

        let mut depth = indentation_depth;
        if let Some(flag) = &guard {
            result.push(TranslatedStatement::new(format!("if ({flag})"), depth, line_index));
            result.push_skeleton("{", depth);
            depth += 1;
        }

        let mut cases = Vec::new();
        let mut otherwise = None;
        for case in &select.cases {
            match &case.values {
                CaseValues::Else => {
                    otherwise.get_or_insert(case.statements.as_slice());
                }
                CaseValues::Values(values) => {
                    let case_line = case.keyword.line_index();
                    let values = values
                        .iter()
                        .map(|tokens| generate_single(tokens, case_line))
                        .collect::<Result<Vec<_>>>()?;
                    cases.push((values, case_line, case.statements.as_slice()));
                }
            }
        }

        let branches: Vec<Branch<'_>> = cases
            .iter()
            .map(|(values, case_line, statements)| {
                let mut expressions: Vec<&Expression> = values.iter().collect();
                expressions.extend(target.inline);
                let target = target.clone();
                Branch {
                    expressions,
                    line_index: *case_line,
                    condition: Box::new(
                        move |scope: &ScopeAccessInformation, result: &mut TranslationResult| {
                            self.case_condition(&target, values, scope, result)
                        },
                    ),
                    statements: *statements,
                }
            })
            .collect();

        result = if branches.is_empty() {
            match otherwise {
                Some(statements) => {
                    self.translate_body(statements, &scope.set_parent(ParentConstruct::Select), depth, result)?
                }
                None => result,
            }
        } else {
            self.emit_conditional_chain(branches, otherwise, ParentConstruct::Select, scope, depth, result)?
        };

        if guard.is_some() {
            result.push_skeleton("}", indentation_depth);
        }
        Ok(BlockOutcome::Translated(result))
    }

    /// `_.IF(_.EQ(target, a)) || _.IF(_.LOOSEEQ(target, b))`
    fn case_condition(
        &self,
        target: &SelectTarget<'_>,
        values: &[Expression],
        scope: &ScopeAccessInformation,
        result: &mut TranslationResult,
    ) -> Result<String> {
        // Inline targets are rendered again so by-ref aliases apply.
        let t = match target.inline {
            Some(expression) => self.translate_expression(expression, scope, ValueContext::Raw, result)?,
            None => target.rendered.clone(),
        };
        let mut comparisons = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            let rendered = self.translate_expression(value, scope, ValueContext::Raw, result)?;
            let comparison = match (target.is_numeric_literal, is_numeric_literal(value)) {
                (true, true) => format!("({t} == {rendered})"),
                (true, false) if !is_literal(value) => {
                    self.wrap_condition(&format!("_.EQ({t}, _.NUM({rendered}))"), scope)
                }
                (false, true) if !target.is_literal => {
                    self.wrap_condition(&format!("_.EQ(_.NUM({t}), {rendered})"), scope)
                }
                _ if index == 0 => self.wrap_condition(&format!("_.EQ({t}, {rendered})"), scope),
                _ => self.wrap_condition(&format!("_.LOOSEEQ({t}, {rendered})"), scope),
            };
            comparisons.push(comparison);
        }
        Ok(comparisons.join(" || "))
    }
}
