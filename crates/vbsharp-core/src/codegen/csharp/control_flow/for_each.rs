// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `For Each ... In ... Next` loops.

use crate::ast::CodeBlock;

use super::super::expressions::{ValueContext, generate_single};
use super::super::scope::{LoopKind, ParentConstruct, ScopeAccessInformation};
use super::super::{
    BlockOutcome, CodeBlockTranslator, Result, STATEMENT_HANDLERS, TranslatedStatement,
    TranslationResult,
};
use super::TempDeclaration;

impl CodeBlockTranslator {
    /// `foreach (var loopValue1 in _.ENUMERABLE(src)) { i = loopValue1; ... }`
    pub(in crate::codegen::csharp) fn translate_for_each(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::ForEach(for_each) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let mut result = result;
        let line_index = for_each.keyword.line_index();
        let source = generate_single(&for_each.source, line_index)?;

        // The source expression is evaluated outside any error trap, so only
        // by-ref arguments force it into a temporary.
        let source_scope = scope.extend_reserved(&result.reserved_names);
        let rendered = if self
            .by_ref_parameters_passed_to_calls(&[&source], &source_scope)
            .is_empty()
        {
            self.translate_expression(&source, &source_scope, ValueContext::Raw, &mut result)?
        } else {
            let (temp, evaluated) = self.evaluate_into_temp(
                TempDeclaration {
                    base: "loopSource",
                    type_name: "object",
                    initial: "null",
                },
                &[&source],
                false,
                None,
                &source_scope,
                indentation_depth,
                line_index,
                result,
                Box::new(|scope: &ScopeAccessInformation, result: &mut TranslationResult| {
                    self.translate_expression(&source, scope, ValueContext::Raw, result)
                }),
            )?;
            result = evaluated;
            temp.to_string()
        };

        let body_scope = self.enter_loop(
            LoopKind::For,
            ParentConstruct::ForEach,
            &for_each.statements,
            scope,
            indentation_depth,
            line_index,
            &mut result,
        );
        let (value, body_scope) = body_scope.reserve_temp("loopValue");
        result.reserve(value.clone());
        let variable = self.translate_variable(&for_each.loop_var, &body_scope, &mut result);

        result.push(TranslatedStatement::new(
            format!("foreach (var {value} in _.ENUMERABLE({rendered}))"),
            indentation_depth,
            line_index,
        ));
        result.push_skeleton("{", indentation_depth);
        result.push(TranslatedStatement::new(
            format!("{variable} = {value};"),
            indentation_depth + 1,
            line_index,
        ));
        let body = self.translate_common(
            STATEMENT_HANDLERS,
            &for_each.statements,
            &body_scope.extend_reserved(&result.reserved_names),
            indentation_depth + 1,
        )?;
        result = result.add(body);
        result.push_skeleton("}", indentation_depth);

        self.propagate_exit(
            LoopKind::For,
            &for_each.statements,
            scope,
            indentation_depth,
            line_index,
            &mut result,
        );
        Ok(BlockOutcome::Translated(result))
    }
}
