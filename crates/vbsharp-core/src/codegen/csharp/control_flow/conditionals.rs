// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `If` blocks.

use crate::ast::CodeBlock;

use super::super::expressions::generate_single;
use super::super::scope::{ParentConstruct, ScopeAccessInformation};
use super::super::{BlockOutcome, CodeBlockTranslator, Result, TranslationResult};
use super::Branch;

impl CodeBlockTranslator {
    /// `if (_.IF(cond)) { ... } else if (...) { ... } else { ... }`
    pub(in crate::codegen::csharp) fn translate_if(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::If(if_block) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };

        let conditions = if_block
            .clauses
            .iter()
            .map(|clause| {
                let line_index = clause
                    .condition
                    .first()
                    .map_or(if_block.keyword.line_index(), |t| t.line_index());
                generate_single(&clause.condition, line_index).map(|condition| (condition, line_index))
            })
            .collect::<Result<Vec<_>>>()?;

        let branches = if_block
            .clauses
            .iter()
            .zip(&conditions)
            .map(|(clause, (condition, line_index))| Branch {
                expressions: vec![condition],
                line_index: *line_index,
                condition: Box::new(
                    move |scope: &ScopeAccessInformation, result: &mut TranslationResult| {
                        self.translate_condition(condition, scope, result)
                    },
                ),
                statements: &clause.statements,
            })
            .collect();

        let result = self.emit_conditional_chain(
            branches,
            if_block.else_statements.as_deref(),
            ParentConstruct::If,
            scope,
            indentation_depth,
            result,
        )?;
        Ok(BlockOutcome::Translated(result))
    }
}
