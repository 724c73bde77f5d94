// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Stage-one block parser for VBScript.
//!
//! **DDD Context:** Source Analysis
//!
//! Groups the token stream into [`CodeBlock`]s: statements, declarations and
//! nested constructs. Expressions are left as flat token runs; the
//! expression generator gives them structure once the translator knows the
//! scope they are evaluated in.
//!
//! The parser is split across files the same way as the constructs:
//! - `mod.rs`: cursor helpers, dispatch and simple statements
//! - `declarations.rs`: `Dim`, `ReDim`, `Const`, functions, properties, classes
//! - `control_flow.rs`: `If`, `Select Case`, `For`, `For Each`, `Do`, `While`, `With`
//!
//! Unlike a parser built for an editor, this one stops at the first
//! structural error: a script that cannot be fully understood cannot be
//! translated.

use ecow::EcoString;

use crate::ast::{
    BlankLine, CodeBlock, CommentStatement, DeclarationKind, EraseStatement, ExitKind,
    ExitStatement, OnErrorStatement, OptionExplicit, Statement, ValueSetType,
    ValueSettingStatement, Visibility,
};

use super::{ParseError, Span, Token, TokenKind};

mod control_flow;
mod declarations;

type Result<T> = std::result::Result<T, ParseError>;

/// Parses a token stream into code blocks.
///
/// # Errors
///
/// Returns a [`ParseError`] for the first malformed construct (a missing
/// `End If`, an unexpected keyword, an assignment without a value, ...).
///
/// # Example
///
/// ```
/// use vbsharp_core::ast::CodeBlock;
/// use vbsharp_core::source_analysis::{lex, parse};
///
/// let blocks = parse(lex("Dim x\nx = 1").unwrap()).unwrap();
/// assert!(matches!(blocks[0], CodeBlock::Dim(_)));
/// assert!(matches!(blocks[1], CodeBlock::ValueSetting(_)));
/// ```
pub fn parse(tokens: Vec<Token>) -> Result<Vec<CodeBlock>> {
    let mut parser = Parser::new(tokens);
    let blocks = parser.parse_blocks(&|_| false)?;
    if let Some(token) = parser.current() {
        return Err(parser.error_at(token, format!("unexpected '{token}'")));
    }
    Ok(blocks)
}

/// Cursor over the token stream.
pub(super) struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Nesting depth of single-line `If` statements being parsed; while
    /// positive, a statement also ends at `Else`.
    single_line_if_depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            single_line_if_depth: 0,
        }
    }

    pub(super) fn current(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub(super) fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    pub(super) fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(Token::kind)
    }

    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    pub(super) fn at_keyword(&self, keyword: &str) -> bool {
        self.current().is_some_and(|t| t.is_keyword(keyword))
    }

    pub(super) fn at_keyword_at(&self, offset: usize, keyword: &str) -> bool {
        self.peek_at(offset).is_some_and(|t| t.is_keyword(keyword))
    }

    /// True at `End <keyword>`.
    pub(super) fn at_end_of(&self, keyword: &str) -> bool {
        self.at_keyword("end") && self.at_keyword_at(1, keyword)
    }

    /// True where a statement's tokens stop.
    pub(super) fn at_statement_boundary(&self) -> bool {
        match self.current() {
            None => true,
            Some(token) => {
                token.kind() == TokenKind::EndOfStatement
                    || token.kind().is_comment()
                    || (self.single_line_if_depth > 0 && token.is_keyword("else"))
            }
        }
    }

    pub(super) fn error_at(&self, token: &Token, message: impl Into<EcoString>) -> ParseError {
        ParseError::new(message, token.line_index(), token.span())
    }

    /// An error located at the current token (or the end of input).
    pub(super) fn error(&self, message: impl Into<EcoString>) -> ParseError {
        match self.current().or_else(|| self.tokens.last()) {
            Some(token) => self.error_at(token, message),
            None => ParseError::new(message, 0, Span::default()),
        }
    }

    pub(super) fn expect_keyword(&mut self, keyword: &str) -> Result<Token> {
        if self.at_keyword(keyword) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        Err(self.error(format!("expected '{keyword}'")))
    }

    /// Consumes `End <keyword>` and the statement end after it.
    pub(super) fn expect_end_of(&mut self, keyword: &str) -> Result<()> {
        if !self.at_end_of(keyword) {
            return Err(self.error(format!("expected 'End {keyword}'")));
        }
        self.position += 2;
        self.expect_end_of_statement()
    }

    pub(super) fn expect_name(&mut self, what: &str) -> Result<Token> {
        match self.current() {
            Some(token) if token.kind().is_name() => {
                let token = token.clone();
                self.position += 1;
                Ok(token)
            }
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    pub(super) fn expect_operator(&mut self, operator: &str) -> Result<Token> {
        match self.current() {
            Some(token) if token.is_operator(operator) => {
                let token = token.clone();
                self.position += 1;
                Ok(token)
            }
            _ => Err(self.error(format!("expected '{operator}'"))),
        }
    }

    /// Consumes a statement separator. A trailing comment is left in place so
    /// it becomes the next block; end of input is accepted.
    pub(super) fn expect_end_of_statement(&mut self) -> Result<()> {
        match self.current() {
            None => Ok(()),
            Some(token) if token.kind() == TokenKind::EndOfStatement => {
                self.position += 1;
                Ok(())
            }
            Some(token) if token.kind().is_comment() => Ok(()),
            Some(token) if self.single_line_if_depth > 0 && token.is_keyword("else") => Ok(()),
            Some(token) => Err(self.error_at(token, format!("expected end of statement, found '{token}'"))),
        }
    }

    /// Collects tokens up to the end of the statement (not consumed).
    pub(super) fn collect_statement_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while !self.at_statement_boundary() {
            if let Some(token) = self.advance() {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Collects tokens until `stop` matches at bracket depth zero, or the
    /// statement ends.
    pub(super) fn collect_until(&mut self, stop: impl Fn(&Token) -> bool) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        while !self.at_statement_boundary() {
            let Some(token) = self.current() else { break };
            if depth == 0 && stop(token) {
                break;
            }
            match token.kind() {
                TokenKind::OpenBrace => depth += 1,
                TokenKind::CloseBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            if let Some(token) = self.advance() {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Parses blocks until `terminated` reports the enclosing construct's end
    /// marker (which is left unconsumed) or input runs out.
    pub(super) fn parse_blocks(&mut self, terminated: &dyn Fn(&Self) -> bool) -> Result<Vec<CodeBlock>> {
        let mut blocks = Vec::new();
        while self.current().is_some() && !terminated(self) {
            if let Some(block) = self.parse_block()? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    /// Parses one block; statement separators produce nothing except for
    /// genuinely empty lines.
    fn parse_block(&mut self) -> Result<Option<CodeBlock>> {
        let Some(token) = self.current().cloned() else {
            return Ok(None);
        };
        match token.kind() {
            TokenKind::EndOfStatement => {
                let previous_ended_line = self.position == 0
                    || self
                        .tokens
                        .get(self.position - 1)
                        .is_some_and(Token::is_line_end);
                self.position += 1;
                if token.is_line_end() && previous_ended_line {
                    return Ok(Some(CodeBlock::BlankLine(BlankLine {
                        line_index: token.line_index(),
                    })));
                }
                Ok(None)
            }
            TokenKind::Comment | TokenKind::InlineComment => {
                self.position += 1;
                Ok(Some(CodeBlock::Comment(CommentStatement {
                    is_inline: token.kind() == TokenKind::InlineComment,
                    token,
                })))
            }
            TokenKind::Keyword => self.parse_keyword_statement(&token).map(Some),
            _ => self.parse_statement_or_assignment().map(Some),
        }
    }

    fn parse_keyword_statement(&mut self, keyword: &Token) -> Result<CodeBlock> {
        match keyword.content().to_ascii_lowercase().as_str() {
            "option" => {
                self.position += 1;
                self.expect_keyword("explicit")?;
                self.expect_end_of_statement()?;
                Ok(CodeBlock::OptionExplicit(OptionExplicit {
                    line_index: keyword.line_index(),
                }))
            }
            "on" => self.parse_on_error(keyword),
            "dim" => self.parse_dim(DeclarationKind::Dim),
            "redim" => self.parse_redim(),
            "const" => self.parse_const(None),
            "private" | "public" => self.parse_visibility_prefixed(),
            "function" | "sub" | "property" => self.parse_function(Visibility::Public, false),
            "class" => self.parse_class(),
            "if" => self.parse_if(),
            "select" => self.parse_select(),
            "for" => self.parse_for(),
            "do" => self.parse_do(),
            "while" => self.parse_while(),
            "with" => self.parse_with(),
            "exit" => self.parse_exit(),
            "erase" => self.parse_erase(),
            "call" => {
                self.position += 1;
                let tokens = self.collect_statement_tokens();
                if tokens.is_empty() {
                    return Err(self.error("expected a procedure name after 'Call'"));
                }
                self.expect_end_of_statement()?;
                Ok(CodeBlock::Statement(Statement {
                    tokens,
                    call_prefix: Some(keyword.clone()),
                }))
            }
            "set" | "let" => {
                self.position += 1;
                let set_type = if keyword.is_keyword("set") {
                    ValueSetType::Set
                } else {
                    ValueSetType::Let
                };
                self.parse_value_setting(set_type)
            }
            _ => Err(self.error_at(keyword, format!("unexpected '{}'", keyword.content()))),
        }
    }

    fn parse_on_error(&mut self, keyword: &Token) -> Result<CodeBlock> {
        self.position += 1;
        self.expect_keyword("error")?;
        let statement = OnErrorStatement {
            line_index: keyword.line_index(),
        };
        let block = if self.at_keyword("resume") {
            self.position += 1;
            self.expect_keyword("next")?;
            CodeBlock::OnErrorResumeNext(statement)
        } else if self.at_keyword("goto") {
            self.position += 1;
            match self.advance() {
                Some(token) if token.kind() == TokenKind::NumericLiteral && token.content() == "0" => {
                    CodeBlock::OnErrorGoto0(statement)
                }
                _ => return Err(self.error("only 'On Error Goto 0' is supported")),
            }
        } else {
            return Err(self.error("expected 'Resume Next' or 'Goto 0'"));
        };
        self.expect_end_of_statement()?;
        Ok(block)
    }

    fn parse_exit(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("exit")?;
        let kind = match self.current() {
            Some(t) if t.is_keyword("do") => ExitKind::Do,
            Some(t) if t.is_keyword("for") => ExitKind::For,
            Some(t) if t.is_keyword("function") => ExitKind::Function,
            Some(t) if t.is_keyword("sub") => ExitKind::Sub,
            Some(t) if t.is_keyword("property") => ExitKind::Property,
            _ => return Err(self.error("expected 'Do', 'For', 'Function', 'Sub' or 'Property' after 'Exit'")),
        };
        self.position += 1;
        self.expect_end_of_statement()?;
        Ok(CodeBlock::Exit(ExitStatement { keyword, kind }))
    }

    fn parse_erase(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("erase")?;
        let tokens = self.collect_statement_tokens();
        self.expect_end_of_statement()?;
        Ok(CodeBlock::Erase(EraseStatement {
            keyword,
            targets: split_on_separators(tokens),
        }))
    }

    fn parse_value_setting(&mut self, set_type: ValueSetType) -> Result<CodeBlock> {
        let tokens = self.collect_statement_tokens();
        let Some(split) = assignment_split(&tokens) else {
            return Err(self.error("expected an assignment"));
        };
        let (target, rest) = tokens.split_at(split);
        let expression = rest[1..].to_vec();
        if expression.is_empty() {
            return Err(self.error_at(&rest[0], "expected a value after '='"));
        }
        self.expect_end_of_statement()?;
        Ok(CodeBlock::ValueSetting(ValueSettingStatement {
            target: target.to_vec(),
            expression,
            set_type,
        }))
    }

    fn parse_statement_or_assignment(&mut self) -> Result<CodeBlock> {
        let tokens = self.collect_statement_tokens();
        if tokens.is_empty() {
            return Err(self.error("expected a statement"));
        }
        if let Some(split) = assignment_split(&tokens) {
            let (target, rest) = tokens.split_at(split);
            if rest.len() < 2 {
                return Err(self.error_at(&rest[0], "expected a value after '='"));
            }
            self.expect_end_of_statement()?;
            return Ok(CodeBlock::ValueSetting(ValueSettingStatement {
                target: target.to_vec(),
                expression: rest[1..].to_vec(),
                set_type: ValueSetType::Let,
            }));
        }
        self.expect_end_of_statement()?;
        Ok(CodeBlock::Statement(Statement {
            tokens,
            call_prefix: None,
        }))
    }
}

/// Index of the `=` that makes `tokens` an assignment, if the tokens before
/// it form an assignable reference (`a`, `a.b`, `a(1).c`, `.Name`).
fn assignment_split(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    let mut previous_was_operand = false;
    for (index, token) in tokens.iter().enumerate() {
        match token.kind() {
            TokenKind::OpenBrace => {
                if depth == 0 && !previous_was_operand {
                    return None;
                }
                depth += 1;
            }
            TokenKind::CloseBrace => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    previous_was_operand = true;
                }
            }
            _ if depth > 0 => {}
            TokenKind::MemberAccessor => previous_was_operand = false,
            TokenKind::Name | TokenKind::EscapedName | TokenKind::BuiltInFunction => {
                if previous_was_operand {
                    return None;
                }
                previous_was_operand = true;
            }
            TokenKind::ComparisonOperator if token.content() == "=" => {
                return (index > 0 && previous_was_operand).then_some(index);
            }
            _ => return None,
        }
    }
    None
}

/// Splits a token run on argument separators at bracket depth zero.
pub(super) fn split_on_separators(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut parts = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;
    for token in tokens {
        match token.kind() {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => depth = depth.saturating_sub(1),
            TokenKind::ArgumentSeparator if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(token);
    }
    if !current.is_empty() || !parts.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CaseValues, FunctionKind, LoopConditionKind, LoopConditionPosition};
    use crate::source_analysis::lex;

    fn parse_ok(source: &str) -> Vec<CodeBlock> {
        parse(lex(source).expect("lex should succeed")).expect("parse should succeed")
    }

    fn parse_err(source: &str) -> ParseError {
        parse(lex(source).expect("lex should succeed")).expect_err("parse should fail")
    }

    fn contents(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.content().as_str()).collect()
    }

    #[test]
    fn parse_assignment_and_call() {
        let blocks = parse_ok("x = 1\nWScript.Echo x, 2\nCall DoIt(3)");
        assert_eq!(blocks.len(), 3);
        let CodeBlock::ValueSetting(assignment) = &blocks[0] else {
            panic!("expected assignment, got {:?}", blocks[0]);
        };
        assert_eq!(contents(&assignment.target), vec!["x"]);
        assert_eq!(contents(&assignment.expression), vec!["1"]);
        let CodeBlock::Statement(call) = &blocks[1] else {
            panic!("expected statement");
        };
        assert!(call.call_prefix.is_none());
        assert_eq!(contents(&call.tokens), vec!["WScript", ".", "Echo", "x", ",", "2"]);
        let CodeBlock::Statement(call) = &blocks[2] else {
            panic!("expected statement");
        };
        assert!(call.call_prefix.is_some());
    }

    #[test]
    fn comparison_inside_call_is_not_assignment() {
        let blocks = parse_ok("Check a = b");
        assert!(matches!(blocks[0], CodeBlock::Statement(_)));
    }

    #[test]
    fn indexed_and_member_targets_are_assignments() {
        let blocks = parse_ok("a(1).Name = \"x\"\nSet obj.Child = Nothing");
        let CodeBlock::ValueSetting(first) = &blocks[0] else {
            panic!("expected assignment");
        };
        assert_eq!(contents(&first.target), vec!["a", "(", "1", ")", ".", "Name"]);
        let CodeBlock::ValueSetting(second) = &blocks[1] else {
            panic!("expected assignment");
        };
        assert_eq!(second.set_type, ValueSetType::Set);
    }

    #[test]
    fn blank_lines_are_preserved() {
        let blocks = parse_ok("a = 1\n\n\nb = 2");
        assert_eq!(blocks.len(), 4);
        assert!(matches!(blocks[1], CodeBlock::BlankLine(_)));
        assert!(matches!(blocks[2], CodeBlock::BlankLine(_)));
    }

    #[test]
    fn inline_comment_follows_statement() {
        let blocks = parse_ok("a = 1 ' note");
        assert_eq!(blocks.len(), 2);
        let CodeBlock::Comment(comment) = &blocks[1] else {
            panic!("expected comment");
        };
        assert!(comment.is_inline);
    }

    #[test]
    fn parse_dim_with_dimensions() {
        let blocks = parse_ok("Dim a, b(10), c()");
        let CodeBlock::Dim(dim) = &blocks[0] else {
            panic!("expected Dim");
        };
        assert_eq!(dim.kind, DeclarationKind::Dim);
        assert_eq!(dim.variables.len(), 3);
        assert!(dim.variables[0].dimensions.is_none());
        assert_eq!(dim.variables[1].dimensions.as_ref().map(Vec::len), Some(1));
        assert_eq!(dim.variables[2].dimensions, Some(vec![]));
    }

    #[test]
    fn parse_on_error_statements() {
        let blocks = parse_ok("On Error Resume Next\nOn Error Goto 0");
        assert!(matches!(blocks[0], CodeBlock::OnErrorResumeNext(_)));
        assert!(matches!(blocks[1], CodeBlock::OnErrorGoto0(_)));
    }

    #[test]
    fn parse_multi_line_if() {
        let blocks = parse_ok("If a Then\n  b = 1\nElseIf c Then\n  b = 2\nElse\n  b = 3\nEnd If");
        let CodeBlock::If(block) = &blocks[0] else {
            panic!("expected If");
        };
        assert_eq!(block.clauses.len(), 2);
        assert_eq!(contents(&block.clauses[1].condition), vec!["c"]);
        assert_eq!(block.else_statements.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn parse_single_line_if_with_else() {
        let blocks = parse_ok("If a Then b = 1: c = 2 Else b = 3\nd = 4");
        assert_eq!(blocks.len(), 2);
        let CodeBlock::If(block) = &blocks[0] else {
            panic!("expected If");
        };
        assert_eq!(block.clauses[0].statements.len(), 2);
        assert_eq!(block.else_statements.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn missing_end_if_is_an_error() {
        let err = parse_err("If a Then\n  b = 1\n");
        assert!(err.message.contains("End If"), "{err}");
    }

    #[test]
    fn parse_select_case() {
        let blocks = parse_ok("Select Case x\n' leading\nCase 1, 2\n  y = 1\nCase Else\n  y = 2\nEnd Select");
        let CodeBlock::Select(block) = &blocks[0] else {
            panic!("expected Select");
        };
        assert_eq!(block.opening_comments.len(), 1);
        assert_eq!(block.cases.len(), 2);
        let CaseValues::Values(values) = &block.cases[0].values else {
            panic!("expected values");
        };
        assert_eq!(values.len(), 2);
        assert_eq!(block.cases[1].values, CaseValues::Else);
    }

    #[test]
    fn parse_for_loops() {
        let blocks = parse_ok("For i = 1 To 10 Step 2\nNext\nFor Each item In items\nNext item");
        let CodeBlock::For(for_block) = &blocks[0] else {
            panic!("expected For");
        };
        assert_eq!(contents(&for_block.from), vec!["1"]);
        assert_eq!(contents(&for_block.to), vec!["10"]);
        assert_eq!(for_block.step.as_deref().map(contents), Some(vec!["2"]));
        let CodeBlock::ForEach(each) = &blocks[1] else {
            panic!("expected For Each");
        };
        assert_eq!(contents(&each.source), vec!["items"]);
    }

    #[test]
    fn parse_do_orientations() {
        let blocks = parse_ok("Do While a\nLoop\nDo\nLoop Until b\nWhile c\nWend\nDo\nLoop");
        let conditions: Vec<_> = blocks
            .iter()
            .map(|block| match block {
                CodeBlock::Do(d) => d.condition.as_ref().map(|c| (c.kind, c.position)),
                other => panic!("expected Do, got {other:?}"),
            })
            .collect();
        assert_eq!(
            conditions,
            vec![
                Some((LoopConditionKind::While, LoopConditionPosition::Pre)),
                Some((LoopConditionKind::Until, LoopConditionPosition::Post)),
                Some((LoopConditionKind::While, LoopConditionPosition::Pre)),
                None,
            ]
        );
    }

    #[test]
    fn parse_function_with_parameters() {
        let blocks = parse_ok("Private Function Add(ByVal a, b, c())\n  Add = a + b\nEnd Function");
        let CodeBlock::Function(function) = &blocks[0] else {
            panic!("expected Function");
        };
        assert_eq!(function.kind, FunctionKind::Function);
        assert_eq!(function.visibility, Visibility::Private);
        assert_eq!(function.parameters.len(), 3);
        assert!(!function.parameters[0].by_ref);
        assert!(function.parameters[1].by_ref);
        assert!(function.parameters[2].is_array);
        assert_eq!(function.statements.len(), 1);
    }

    #[test]
    fn parse_class_with_properties() {
        let blocks = parse_ok(
            "Class Person\n  Private mName\n  Public Default Property Get Name\n    Name = mName\n  End Property\n  Public Property Let Name(value)\n    mName = value\n  End Property\nEnd Class",
        );
        let CodeBlock::Class(class) = &blocks[0] else {
            panic!("expected Class");
        };
        assert_eq!(class.name.content(), "Person");
        let kinds: Vec<_> = class
            .statements
            .iter()
            .filter_map(|b| match b {
                CodeBlock::Function(f) => Some((f.kind, f.is_default)),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![(FunctionKind::PropertyGet, true), (FunctionKind::PropertyLet, false)]
        );
    }

    #[test]
    fn parse_with_block_and_exit() {
        let blocks = parse_ok("With obj\n  .Name = 1\nEnd With\nDo\n  Exit Do\nLoop");
        let CodeBlock::With(with) = &blocks[0] else {
            panic!("expected With");
        };
        assert!(matches!(with.statements[0], CodeBlock::ValueSetting(_)));
        let CodeBlock::Do(do_block) = &blocks[1] else {
            panic!("expected Do");
        };
        assert!(matches!(do_block.statements[0], CodeBlock::Exit(ExitStatement { kind: ExitKind::Do, .. })));
    }

    #[test]
    fn parse_erase_targets() {
        let blocks = parse_ok("Erase a, b(1, 2)");
        let CodeBlock::Erase(erase) = &blocks[0] else {
            panic!("expected Erase");
        };
        assert_eq!(erase.targets.len(), 2);
        assert_eq!(contents(&erase.targets[1]), vec!["b", "(", "1", ",", "2", ")"]);
    }

    #[test]
    fn unexpected_keyword_is_an_error() {
        let err = parse_err("Next");
        assert!(err.message.contains("Next"), "{err}");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn split_on_separators_respects_brackets() {
        let tokens = lex("a, f(b, c), d").unwrap();
        let parts = split_on_separators(tokens);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 6);
    }
}
