// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `For ... To ... Step ... Next` loops.
//!
//! Bounds are evaluated once, before the loop, as in VBScript. Numeric
//! literal bounds are used directly; anything else is materialised into a
//! `loopStartN` / `loopEndN` / `loopStepN` temporary. When every bound is
//! constant and the range is provably empty the loop is dropped.

use crate::ast::CodeBlock;
use crate::source_analysis::{Token, TokenKind};

use super::super::expressions::{ValueContext, generate_single};
use super::super::scope::{LoopKind, ParentConstruct, ScopeAccessInformation};
use super::super::{
    BlockOutcome, CodeBlockTranslator, Result, TranslatedStatement, TranslationResult,
    TranslationWarning,
};
use super::TempDeclaration;

/// A numeric literal, optionally signed: `(value, C# rendering)`.
fn constant_bound(tokens: &[Token]) -> Option<(f64, String)> {
    match tokens {
        [number] if number.kind() == TokenKind::NumericLiteral => {
            let value = number.content().parse::<f64>().ok()?;
            Some((value, number.content().to_string()))
        }
        [sign, number] if number.kind() == TokenKind::NumericLiteral && sign.is_operator("-") => {
            let value = number.content().parse::<f64>().ok()?;
            Some((-value, format!("-{}", number.content())))
        }
        [sign, number] if number.kind() == TokenKind::NumericLiteral && sign.is_operator("+") => {
            let value = number.content().parse::<f64>().ok()?;
            Some((value, number.content().to_string()))
        }
        _ => None,
    }
}

/// True when constant bounds can never enter the loop.
fn is_provably_empty(start: f64, end: f64, step: f64) -> bool {
    (step > 0.0 && start > end) || (step < 0.0 && start < end)
}

impl CodeBlockTranslator {
    pub(in crate::codegen::csharp) fn translate_for(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::For(for_block) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let mut result = result;
        let line_index = for_block.keyword.line_index();

        let start_constant = constant_bound(&for_block.from);
        let end_constant = constant_bound(&for_block.to);
        let step_constant = match &for_block.step {
            None => Some((1.0, "1".to_string())),
            Some(step) => constant_bound(step),
        };
        if let (Some((start, _)), Some((end, _)), Some((step, _))) =
            (&start_constant, &end_constant, &step_constant)
        {
            if is_provably_empty(*start, *end, *step) {
                result.warn(TranslationWarning::EmptyForLoopRemoved {
                    line: line_index + 1,
                });
                return Ok(BlockOutcome::Translated(result));
            }
        }

        let start = match start_constant {
            Some((_, rendered)) => rendered,
            None => {
                let (name, evaluated) =
                    self.materialise_bound("loopStart", &for_block.from, scope, indentation_depth, line_index, result)?;
                result = evaluated;
                name
            }
        };
        let end = match end_constant {
            Some((_, rendered)) => rendered,
            None => {
                let (name, evaluated) =
                    self.materialise_bound("loopEnd", &for_block.to, scope, indentation_depth, line_index, result)?;
                result = evaluated;
                name
            }
        };
        let (step, direction) = match (step_constant, &for_block.step) {
            (Some((value, rendered)), _) => (rendered, Some(value >= 0.0)),
            (None, Some(tokens)) => {
                let (name, evaluated) =
                    self.materialise_bound("loopStep", tokens, scope, indentation_depth, line_index, result)?;
                result = evaluated;
                (name, None)
            }
            (None, None) => ("1".to_string(), Some(true)),
        };

        let body_scope = self.enter_loop(
            LoopKind::For,
            ParentConstruct::For,
            &for_block.statements,
            scope,
            indentation_depth,
            line_index,
            &mut result,
        );
        let variable = self.translate_variable(&for_block.loop_var, &body_scope, &mut result);

        // Under error trapping the per-iteration test is error tolerant too,
        // unless that would capture a by-ref parameter in the lambda.
        let tolerant = !body_scope.is_unaliased_by_ref_parameter(&self.rewrite_token(&for_block.loop_var));
        let test = |comparison: &str| {
            let comparison = format!("_.{comparison}({variable}, {end})");
            if tolerant {
                self.wrap_condition(&comparison, &body_scope)
            } else {
                format!("_.IF({comparison})")
            }
        };

        let (condition, loop_depth) = match direction {
            Some(true) => (test("LTE"), indentation_depth),
            Some(false) => (test("GTE"), indentation_depth),
            None => {
                result.push(TranslatedStatement::new(
                    format!(
                        "if ((_.IF(_.GTE({step}, 0)) && _.IF(_.LTE({start}, {end}))) || (_.IF(_.LT({step}, 0)) && _.IF(_.GTE({start}, {end}))))"
                    ),
                    indentation_depth,
                    line_index,
                ));
                result.push_skeleton("{", indentation_depth);
                (
                    format!("_.IF(_.GTE({step}, 0)) ? {} : {}", test("LTE"), test("GTE")),
                    indentation_depth + 1,
                )
            }
        };

        result.push(TranslatedStatement::new(
            format!("for ({variable} = {start}; {condition}; {variable} = _.ADD({variable}, {step}))"),
            loop_depth,
            line_index,
        ));
        result = self.translate_body(&for_block.statements, &body_scope, loop_depth, result)?;
        if direction.is_none() {
            result.push_skeleton("}", indentation_depth);
        }
        self.propagate_exit(
            LoopKind::For,
            &for_block.statements,
            scope,
            indentation_depth,
            line_index,
            &mut result,
        );
        Ok(BlockOutcome::Translated(result))
    }

    /// `object loopStart1 = _.NUM(expr);`
    fn materialise_bound(
        &self,
        base: &'static str,
        tokens: &[Token],
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        line_index: usize,
        result: TranslationResult,
    ) -> Result<(String, TranslationResult)> {
        let expression = generate_single(tokens, line_index)?;
        let (name, result) = self.evaluate_into_temp(
            TempDeclaration {
                base,
                type_name: "object",
                initial: "null",
            },
            &[&expression],
            true,
            None,
            scope,
            indentation_depth,
            line_index,
            result,
            Box::new(|scope: &ScopeAccessInformation, result: &mut TranslationResult| {
                let value = self.translate_expression(&expression, scope, ValueContext::Raw, result)?;
                Ok(format!("_.NUM({value})"))
            }),
        )?;
        Ok((name.to_string(), result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, content: &str) -> Token {
        Token::new(kind, content, 0)
    }

    #[test]
    fn signed_literals_are_constant() {
        let minus = [token(TokenKind::ArithmeticOperator, "-"), token(TokenKind::NumericLiteral, "2")];
        assert_eq!(constant_bound(&minus), Some((-2.0, "-2".to_string())));
        assert_eq!(
            constant_bound(&[token(TokenKind::NumericLiteral, "10")]),
            Some((10.0, "10".to_string()))
        );
        assert_eq!(constant_bound(&[token(TokenKind::Name, "n")]), None);
    }

    #[test]
    fn empty_ranges_depend_on_direction() {
        assert!(is_provably_empty(5.0, 1.0, 1.0));
        assert!(is_provably_empty(1.0, 5.0, -1.0));
        assert!(!is_provably_empty(1.0, 5.0, 1.0));
        assert!(!is_provably_empty(5.0, 1.0, -1.0));
        assert!(!is_provably_empty(1.0, 1.0, 1.0));
    }
}
