// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `With ... End With`.
//!
//! The target is evaluated once into a `withN` temporary and the body is
//! translated at the same depth with that temporary as the destination of
//! leading-dot accesses. No braces are emitted.

use crate::ast::CodeBlock;

use super::super::expressions::{ValueContext, generate_single};
use super::super::scope::{ParentConstruct, ScopeAccessInformation};
use super::super::{
    BlockOutcome, CodeBlockTranslator, Result, STATEMENT_HANDLERS, TranslationResult,
};
use super::TempDeclaration;

impl CodeBlockTranslator {
    pub(in crate::codegen::csharp) fn translate_with(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::With(with_block) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let line_index = with_block.keyword.line_index();
        let target = generate_single(&with_block.target, line_index)?;

        let (reference, result) = self.evaluate_into_temp(
            TempDeclaration {
                base: "with",
                type_name: "object",
                initial: "null",
            },
            &[&target],
            true,
            None,
            scope,
            indentation_depth,
            line_index,
            result,
            Box::new(|scope: &ScopeAccessInformation, result: &mut TranslationResult| {
                self.translate_expression(&target, scope, ValueContext::Object, result)
            }),
        )?;

        let body_scope = scope
            .extend_reserved(&result.reserved_names)
            .set_parent(ParentConstruct::With)
            .with_directed_with_reference(reference);
        let body = self.translate_common(
            STATEMENT_HANDLERS,
            &with_block.statements,
            &body_scope,
            indentation_depth,
        )?;
        Ok(BlockOutcome::Translated(result.add(body)))
    }
}
