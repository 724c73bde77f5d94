// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Control-flow construct parsing.

use crate::ast::{
    CaseBlock, CaseValues, CodeBlock, CommentStatement, DoBlock, ForBlock, ForEachBlock,
    IfBlock, IfClause, LoopCondition, LoopConditionKind, LoopConditionPosition, SelectBlock,
    WithBlock,
};
use crate::source_analysis::{Token, TokenKind};

use super::{Parser, Result, split_on_separators};

impl Parser {
    pub(super) fn parse_if(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("if")?;
        let condition = self.collect_until(|t| t.is_keyword("then"));
        if condition.is_empty() {
            return Err(self.error("expected a condition after 'If'"));
        }
        self.expect_keyword("then")?;

        let multi_line = self.current().is_none_or(|t| {
            t.kind() == TokenKind::EndOfStatement || t.kind() == TokenKind::InlineComment
        });
        if !multi_line {
            return self.parse_single_line_if(keyword, condition);
        }

        if self.current_kind() == Some(TokenKind::EndOfStatement) {
            self.position += 1;
        }
        let clause_end = |p: &Self| p.at_keyword("elseif") || p.at_keyword("else") || p.at_end_of("if");
        let mut clauses = vec![IfClause {
            condition,
            statements: self.parse_blocks(&clause_end)?,
        }];
        while self.at_keyword("elseif") {
            self.position += 1;
            let condition = self.collect_until(|t| t.is_keyword("then"));
            if condition.is_empty() {
                return Err(self.error("expected a condition after 'ElseIf'"));
            }
            self.expect_keyword("then")?;
            self.expect_end_of_statement()?;
            clauses.push(IfClause {
                condition,
                statements: self.parse_blocks(&clause_end)?,
            });
        }
        let else_statements = if self.at_keyword("else") {
            self.position += 1;
            self.expect_end_of_statement()?;
            Some(self.parse_blocks(&|p| p.at_end_of("if"))?)
        } else {
            None
        };
        self.expect_end_of("if")?;
        Ok(CodeBlock::If(IfBlock {
            keyword,
            clauses,
            else_statements,
        }))
    }

    /// `If c Then a: b Else d` on one line.
    fn parse_single_line_if(
        &mut self,
        keyword: Token,
        condition: Vec<Token>,
    ) -> Result<CodeBlock> {
        self.single_line_if_depth += 1;
        let statements = self.parse_single_line_statements();
        let else_statements = match statements {
            Ok(_) if self.at_keyword("else") => {
                self.position += 1;
                Some(self.parse_single_line_statements())
            }
            _ => None,
        };
        self.single_line_if_depth -= 1;
        let statements = statements?;
        let else_statements = else_statements.transpose()?;
        Ok(CodeBlock::If(IfBlock {
            keyword,
            clauses: vec![IfClause {
                condition,
                statements,
            }],
            else_statements,
        }))
    }

    /// Colon-separated statements up to the end of the line or an `Else`.
    fn parse_single_line_statements(&mut self) -> Result<Vec<CodeBlock>> {
        let mut statements = Vec::new();
        loop {
            match self.current() {
                None => break,
                Some(t) if t.is_keyword("else") || t.kind().is_comment() || t.is_line_end() => break,
                Some(t) if t.kind() == TokenKind::EndOfStatement => {
                    self.position += 1;
                    continue;
                }
                Some(_) => {}
            }
            if let Some(block) = self.parse_block()? {
                statements.push(block);
            }
            let consumed_line_end = self
                .position
                .checked_sub(1)
                .and_then(|i| self.tokens.get(i))
                .is_some_and(|t| t.is_line_end());
            if consumed_line_end {
                self.position -= 1;
                break;
            }
        }
        if statements.is_empty() {
            return Err(self.error("expected a statement"));
        }
        Ok(statements)
    }

    pub(super) fn parse_select(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("select")?;
        self.expect_keyword("case")?;
        let expression = self.collect_statement_tokens();
        if expression.is_empty() {
            return Err(self.error("expected an expression after 'Select Case'"));
        }
        self.expect_end_of_statement()?;

        let mut opening_comments = Vec::new();
        loop {
            match self.current() {
                Some(t) if t.kind() == TokenKind::EndOfStatement => self.position += 1,
                Some(t) if t.kind().is_comment() => {
                    opening_comments.push(CommentStatement {
                        is_inline: t.kind() == TokenKind::InlineComment,
                        token: t.clone(),
                    });
                    self.position += 1;
                }
                _ => break,
            }
        }

        let mut cases = Vec::new();
        while self.at_keyword("case") {
            let Some(case_keyword) = self.advance() else { break };
            let values = if self.at_keyword("else") {
                self.position += 1;
                CaseValues::Else
            } else {
                let values = split_on_separators(self.collect_statement_tokens());
                if values.is_empty() || values.iter().any(Vec::is_empty) {
                    return Err(self.error_at(&case_keyword, "expected a value after 'Case'"));
                }
                CaseValues::Values(values)
            };
            self.expect_end_of_statement()?;
            let statements = self.parse_blocks(&|p| p.at_keyword("case") || p.at_end_of("select"))?;
            cases.push(CaseBlock {
                keyword: case_keyword,
                values,
                statements,
            });
        }
        self.expect_end_of("select")?;
        Ok(CodeBlock::Select(SelectBlock {
            keyword,
            expression,
            opening_comments,
            cases,
        }))
    }

    pub(super) fn parse_for(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("for")?;
        if self.at_keyword("each") {
            self.position += 1;
            let loop_var = self.expect_name("a loop variable")?;
            self.expect_keyword("in")?;
            let source = self.collect_statement_tokens();
            if source.is_empty() {
                return Err(self.error("expected a collection after 'In'"));
            }
            self.expect_end_of_statement()?;
            let statements = self.parse_blocks(&|p| p.at_keyword("next"))?;
            self.expect_next()?;
            return Ok(CodeBlock::ForEach(ForEachBlock {
                keyword,
                loop_var,
                source,
                statements,
            }));
        }

        let loop_var = self.expect_name("a loop variable")?;
        self.expect_operator("=")?;
        let from = self.collect_until(|t| t.is_keyword("to"));
        self.expect_keyword("to")?;
        let to = self.collect_until(|t| t.is_keyword("step"));
        let step = if self.at_keyword("step") {
            self.position += 1;
            Some(self.collect_statement_tokens())
        } else {
            None
        };
        if from.is_empty() || to.is_empty() || step.as_ref().is_some_and(Vec::is_empty) {
            return Err(self.error_at(&keyword, "incomplete 'For' statement"));
        }
        self.expect_end_of_statement()?;
        let statements = self.parse_blocks(&|p| p.at_keyword("next"))?;
        self.expect_next()?;
        Ok(CodeBlock::For(ForBlock {
            keyword,
            loop_var,
            from,
            to,
            step,
            statements,
        }))
    }

    /// `Next`, optionally naming the loop variable.
    fn expect_next(&mut self) -> Result<()> {
        self.expect_keyword("next")?;
        if self.current().is_some_and(|t| t.kind().is_name()) {
            self.position += 1;
        }
        self.expect_end_of_statement()
    }

    pub(super) fn parse_do(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("do")?;
        let pre_condition = self.parse_loop_condition(LoopConditionPosition::Pre)?;
        self.expect_end_of_statement()?;
        let statements = self.parse_blocks(&|p| p.at_keyword("loop"))?;
        self.expect_keyword("loop")?;
        let post_condition = self.parse_loop_condition(LoopConditionPosition::Post)?;
        if pre_condition.is_some() && post_condition.is_some() {
            return Err(self.error_at(&keyword, "a 'Do' loop cannot have both a 'Do' and a 'Loop' condition"));
        }
        self.expect_end_of_statement()?;
        Ok(CodeBlock::Do(DoBlock {
            keyword,
            condition: pre_condition.or(post_condition),
            statements,
        }))
    }

    fn parse_loop_condition(&mut self, position: LoopConditionPosition) -> Result<Option<LoopCondition>> {
        let kind = if self.at_keyword("while") {
            LoopConditionKind::While
        } else if self.at_keyword("until") {
            LoopConditionKind::Until
        } else {
            return Ok(None);
        };
        self.position += 1;
        let tokens = self.collect_statement_tokens();
        if tokens.is_empty() {
            return Err(self.error("expected a loop condition"));
        }
        Ok(Some(LoopCondition {
            tokens,
            kind,
            position,
        }))
    }

    /// `While c ... Wend` is a pre-condition `Do While` loop.
    pub(super) fn parse_while(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("while")?;
        let tokens = self.collect_statement_tokens();
        if tokens.is_empty() {
            return Err(self.error("expected a condition after 'While'"));
        }
        self.expect_end_of_statement()?;
        let statements = self.parse_blocks(&|p| p.at_keyword("wend"))?;
        self.expect_keyword("wend")?;
        self.expect_end_of_statement()?;
        Ok(CodeBlock::Do(DoBlock {
            keyword,
            condition: Some(LoopCondition {
                tokens,
                kind: LoopConditionKind::While,
                position: LoopConditionPosition::Pre,
            }),
            statements,
        }))
    }

    pub(super) fn parse_with(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("with")?;
        let target = self.collect_statement_tokens();
        if target.is_empty() {
            return Err(self.error("expected an object after 'With'"));
        }
        self.expect_end_of_statement()?;
        let statements = self.parse_blocks(&|p| p.at_end_of("with"))?;
        self.expect_end_of("with")?;
        Ok(CodeBlock::With(WithBlock {
            keyword,
            target,
            statements,
        }))
    }
}
