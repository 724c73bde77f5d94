// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `Do ... Loop` in all four orientations, plus `While ... Wend`.
//!
//! | Source | C# |
//! |---|---|
//! | `Do While c` | `while (_.IF(c))` |
//! | `Do Until c` | `while (!_.IF(c))` |
//! | `Loop While c` | `do { ... } while (_.IF(c));` |
//! | `Loop Until c` | `do { ... } while (!_.IF(c));` |
//! | `Do` ... `Loop` | `while (true)` |
//!
//! A condition that passes a by-ref parameter by reference cannot sit in
//! the loop header, so it becomes `while (true)` with an explicit
//! evaluate-and-break at the top or bottom of the body.

use crate::ast::{CodeBlock, LoopCondition, LoopConditionKind, LoopConditionPosition};
use crate::expressions::Expression;

use super::super::expressions::generate_single;
use super::super::scope::{LoopKind, ParentConstruct, ScopeAccessInformation};
use super::super::{
    BlockOutcome, CodeBlockTranslator, Result, STATEMENT_HANDLERS, TranslatedStatement,
    TranslationResult, TranslationWarning,
};
use super::TempDeclaration;

fn negate_for_until(kind: LoopConditionKind, condition: String) -> String {
    match kind {
        LoopConditionKind::While => condition,
        LoopConditionKind::Until => format!("!{condition}"),
    }
}

impl CodeBlockTranslator {
    pub(in crate::codegen::csharp) fn translate_do(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::Do(do_block) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let mut result = result;
        let line_index = do_block.keyword.line_index();
        let body_scope = self.enter_loop(
            LoopKind::Do,
            ParentConstruct::Do,
            &do_block.statements,
            scope,
            indentation_depth,
            line_index,
            &mut result,
        );
        let is_empty = do_block.statements.is_empty();

        result = match &do_block.condition {
            None if is_empty => {
                result.warn(TranslationWarning::SuspiciousInfiniteLoop {
                    line: line_index + 1,
                });
                result.push(TranslatedStatement::new("while (true) { }", indentation_depth, line_index));
                result
            }
            None => {
                result.push(TranslatedStatement::new("while (true)", indentation_depth, line_index));
                self.translate_body(&do_block.statements, &body_scope, indentation_depth, result)?
            }
            Some(condition) => {
                let condition_line = condition.tokens.first().map_or(line_index, |t| t.line_index());
                let expression = generate_single(&condition.tokens, condition_line)?;
                let condition_scope = body_scope.extend_reserved(&result.reserved_names);
                if self
                    .by_ref_parameters_to_alias(&[&expression], &condition_scope)
                    .is_empty()
                {
                    self.emit_header_condition(
                        condition,
                        &expression,
                        &do_block.statements,
                        &body_scope,
                        indentation_depth,
                        condition_line,
                        result,
                    )?
                } else {
                    self.emit_body_condition(
                        condition,
                        &expression,
                        &do_block.statements,
                        &body_scope,
                        indentation_depth,
                        condition_line,
                        result,
                    )?
                }
            }
        };

        self.propagate_exit(
            LoopKind::Do,
            &do_block.statements,
            scope,
            indentation_depth,
            line_index,
            &mut result,
        );
        Ok(BlockOutcome::Translated(result))
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_header_condition(
        &self,
        condition: &LoopCondition,
        expression: &Expression,
        statements: &[CodeBlock],
        body_scope: &ScopeAccessInformation,
        indentation_depth: usize,
        line_index: usize,
        result: TranslationResult,
    ) -> Result<TranslationResult> {
        let mut result = result;
        let rendered = self.translate_condition(expression, body_scope, &mut result)?;
        let rendered = negate_for_until(condition.kind, rendered);
        let is_empty = statements.is_empty();
        match (condition.position, is_empty) {
            (LoopConditionPosition::Pre, true) => {
                result.push(TranslatedStatement::new(
                    format!("while ({rendered}) {{ }}"),
                    indentation_depth,
                    line_index,
                ));
            }
            (LoopConditionPosition::Post, true) => {
                result.push(TranslatedStatement::new(
                    format!("do {{ }} while ({rendered});"),
                    indentation_depth,
                    line_index,
                ));
            }
            (LoopConditionPosition::Pre, false) => {
                result.push(TranslatedStatement::new(
                    format!("while ({rendered})"),
                    indentation_depth,
                    line_index,
                ));
                result = self.translate_body(statements, body_scope, indentation_depth, result)?;
            }
            (LoopConditionPosition::Post, false) => {
                result.push_skeleton("do", indentation_depth);
                result = self.translate_body(statements, body_scope, indentation_depth, result)?;
                if let Some(closing) = result.translated_statements.last_mut() {
                    closing.content = format!("}} while ({rendered});");
                    closing.line_index = Some(line_index);
                }
            }
        }
        Ok(result)
    }

    /// `while (true) { <evaluate>; if (!loopCondition1) break; ... }`
    #[allow(clippy::too_many_arguments)]
    fn emit_body_condition(
        &self,
        condition: &LoopCondition,
        expression: &Expression,
        statements: &[CodeBlock],
        body_scope: &ScopeAccessInformation,
        indentation_depth: usize,
        line_index: usize,
        result: TranslationResult,
    ) -> Result<TranslationResult> {
        let mut result = result;
        result.push(TranslatedStatement::new("while (true)", indentation_depth, line_index));
        result.push_skeleton("{", indentation_depth);
        let inner = indentation_depth + 1;

        let translate_statements = |result: TranslationResult| -> Result<TranslationResult> {
            let body = self.translate_common(
                STATEMENT_HANDLERS,
                statements,
                &body_scope.extend_reserved(&result.reserved_names),
                inner,
            )?;
            Ok(result.add(body))
        };
        if condition.position == LoopConditionPosition::Post {
            result = translate_statements(result)?;
        }

        let (temp, evaluated) = self.evaluate_into_temp(
            TempDeclaration {
                base: "loopCondition",
                type_name: "bool",
                initial: "false",
            },
            &[expression],
            false,
            None,
            body_scope,
            inner,
            line_index,
            result,
            Box::new(|scope: &ScopeAccessInformation, result: &mut TranslationResult| {
                self.translate_condition(expression, scope, result)
            }),
        )?;
        result = evaluated;
        let exit_test = match condition.kind {
            LoopConditionKind::While => format!("if (!{temp})"),
            LoopConditionKind::Until => format!("if ({temp})"),
        };
        result.push(TranslatedStatement::new(exit_test, inner, line_index));
        result.push(TranslatedStatement::new("break;", inner + 1, line_index));

        if condition.position == LoopConditionPosition::Pre {
            result = translate_statements(result)?;
        }
        result.push_skeleton("}", indentation_depth);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn until_negates_outside_the_truth_test() {
        assert_eq!(
            negate_for_until(LoopConditionKind::Until, "_.IF(x)".to_string()),
            "!_.IF(x)"
        );
        assert_eq!(
            negate_for_until(LoopConditionKind::While, "_.IF(x)".to_string()),
            "_.IF(x)"
        );
    }
}
