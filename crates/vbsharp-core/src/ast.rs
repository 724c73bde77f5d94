// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Stage-one code block tree.
//!
//! **DDD Context:** Source Analysis
//!
//! The block parser groups tokens into statements and nested constructs but
//! leaves expressions as flat token runs. Expression structure is recovered
//! later by [`crate::expressions::generate`], which needs the enclosing scope
//! to be known before it is useful.

use crate::source_analysis::Token;

/// A statement or construct in a VBScript program.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeBlock {
    BlankLine(BlankLine),
    Comment(CommentStatement),
    OptionExplicit(OptionExplicit),
    OnErrorResumeNext(OnErrorStatement),
    OnErrorGoto0(OnErrorStatement),
    Dim(DimStatement),
    ReDim(ReDimStatement),
    Const(ConstStatement),
    Exit(ExitStatement),
    Erase(EraseStatement),
    Statement(Statement),
    ValueSetting(ValueSettingStatement),
    If(IfBlock),
    Select(SelectBlock),
    For(ForBlock),
    ForEach(ForEachBlock),
    Do(DoBlock),
    With(WithBlock),
    Function(FunctionBlock),
    Class(ClassBlock),
}

impl CodeBlock {
    /// Zero-based line the block starts on.
    #[must_use]
    pub fn line_index(&self) -> usize {
        match self {
            Self::BlankLine(b) => b.line_index,
            Self::Comment(c) => c.token.line_index(),
            Self::OptionExplicit(o) => o.line_index,
            Self::OnErrorResumeNext(o) | Self::OnErrorGoto0(o) => o.line_index,
            Self::Dim(d) => d.keyword.line_index(),
            Self::ReDim(r) => r.keyword.line_index(),
            Self::Const(c) => c.keyword.line_index(),
            Self::Exit(e) => e.keyword.line_index(),
            Self::Erase(e) => e.keyword.line_index(),
            Self::Statement(s) => s.line_index(),
            Self::ValueSetting(v) => v.line_index(),
            Self::If(i) => i.keyword.line_index(),
            Self::Select(s) => s.keyword.line_index(),
            Self::For(f) => f.keyword.line_index(),
            Self::ForEach(f) => f.keyword.line_index(),
            Self::Do(d) => d.keyword.line_index(),
            Self::With(w) => w.keyword.line_index(),
            Self::Function(f) => f.keyword.line_index(),
            Self::Class(c) => c.keyword.line_index(),
        }
    }

    /// Short construct name used in diagnostics.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::BlankLine(_) => "blank line",
            Self::Comment(_) => "comment",
            Self::OptionExplicit(_) => "Option Explicit",
            Self::OnErrorResumeNext(_) => "On Error Resume Next",
            Self::OnErrorGoto0(_) => "On Error Goto 0",
            Self::Dim(_) => "variable declaration",
            Self::ReDim(_) => "ReDim",
            Self::Const(_) => "Const",
            Self::Exit(_) => "Exit",
            Self::Erase(_) => "Erase",
            Self::Statement(_) => "statement",
            Self::ValueSetting(_) => "assignment",
            Self::If(_) => "If block",
            Self::Select(_) => "Select Case block",
            Self::For(_) => "For loop",
            Self::ForEach(_) => "For Each loop",
            Self::Do(_) => "Do loop",
            Self::With(_) => "With block",
            Self::Function(f) => f.kind.description(),
            Self::Class(_) => "Class",
        }
    }

    /// Child block lists of constructs that contain statements.
    ///
    /// Functions and classes are included; callers that must not cross a
    /// scope boundary check for them first.
    #[must_use]
    pub fn nested_content(&self) -> Vec<&[CodeBlock]> {
        match self {
            Self::If(block) => {
                let mut content: Vec<&[CodeBlock]> = block
                    .clauses
                    .iter()
                    .map(|clause| clause.statements.as_slice())
                    .collect();
                if let Some(otherwise) = &block.else_statements {
                    content.push(otherwise);
                }
                content
            }
            Self::Select(block) => block
                .cases
                .iter()
                .map(|case| case.statements.as_slice())
                .collect(),
            Self::For(block) => vec![&block.statements],
            Self::ForEach(block) => vec![&block.statements],
            Self::Do(block) => vec![&block.statements],
            Self::With(block) => vec![&block.statements],
            Self::Function(block) => vec![&block.statements],
            Self::Class(block) => vec![&block.statements],
            _ => Vec::new(),
        }
    }

    /// True for blocks that produce no executable code.
    #[must_use]
    pub fn is_blank_or_comment(&self) -> bool {
        matches!(self, Self::BlankLine(_) | Self::Comment(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankLine {
    pub line_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentStatement {
    pub token: Token,
    /// The comment followed code on the same source line.
    pub is_inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionExplicit {
    pub line_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnErrorStatement {
    pub line_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Which keyword introduced a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Dim,
    Private,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimStatement {
    pub keyword: Token,
    pub kind: DeclarationKind,
    pub variables: Vec<DimVariable>,
}

/// One name in a `Dim` list.
///
/// `dimensions` is `None` for a scalar, `Some(vec![])` for a dynamic array
/// (`Dim a()`) and otherwise holds one token run per dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimVariable {
    pub name: Token,
    pub dimensions: Option<Vec<Vec<Token>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReDimStatement {
    pub keyword: Token,
    pub preserve: bool,
    pub variables: Vec<DimVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstStatement {
    pub keyword: Token,
    pub visibility: Option<Visibility>,
    pub values: Vec<ConstValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstValue {
    pub name: Token,
    pub value: Vec<Token>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Do,
    For,
    Function,
    Sub,
    Property,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitStatement {
    pub keyword: Token,
    pub kind: ExitKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EraseStatement {
    pub keyword: Token,
    /// One token run per comma-separated target.
    pub targets: Vec<Vec<Token>>,
}

/// A call statement: `DoThing a, b`, `Call DoThing(a, b)`, `obj.Method`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub tokens: Vec<Token>,
    /// The `Call` keyword, when present.
    pub call_prefix: Option<Token>,
}

impl Statement {
    #[must_use]
    pub fn line_index(&self) -> usize {
        self.call_prefix
            .as_ref()
            .or_else(|| self.tokens.first())
            .map_or(0, Token::line_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSetType {
    Let,
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSettingStatement {
    pub target: Vec<Token>,
    pub expression: Vec<Token>,
    pub set_type: ValueSetType,
}

impl ValueSettingStatement {
    #[must_use]
    pub fn line_index(&self) -> usize {
        self.target.first().map_or(0, Token::line_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub keyword: Token,
    /// The `If` clause followed by any `ElseIf` clauses.
    pub clauses: Vec<IfClause>,
    pub else_statements: Option<Vec<CodeBlock>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfClause {
    pub condition: Vec<Token>,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectBlock {
    pub keyword: Token,
    pub expression: Vec<Token>,
    /// Comments between `Select Case` and the first `Case`.
    pub opening_comments: Vec<CommentStatement>,
    pub cases: Vec<CaseBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseBlock {
    pub keyword: Token,
    pub values: CaseValues,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseValues {
    Values(Vec<Vec<Token>>),
    Else,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForBlock {
    pub keyword: Token,
    pub loop_var: Token,
    pub from: Vec<Token>,
    pub to: Vec<Token>,
    pub step: Option<Vec<Token>>,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForEachBlock {
    pub keyword: Token,
    pub loop_var: Token,
    pub source: Vec<Token>,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopConditionKind {
    While,
    Until,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopConditionPosition {
    /// `Do While x` / `While x ... Wend`
    Pre,
    /// `Loop While x`
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopCondition {
    pub tokens: Vec<Token>,
    pub kind: LoopConditionKind,
    pub position: LoopConditionPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoBlock {
    pub keyword: Token,
    pub condition: Option<LoopCondition>,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithBlock {
    pub keyword: Token,
    pub target: Vec<Token>,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Sub,
    PropertyGet,
    PropertyLet,
    PropertySet,
}

impl FunctionKind {
    #[must_use]
    pub fn is_property(self) -> bool {
        matches!(self, Self::PropertyGet | Self::PropertyLet | Self::PropertySet)
    }

    /// Function and Property Get produce a value.
    #[must_use]
    pub fn returns_value(self) -> bool {
        matches!(self, Self::Function | Self::PropertyGet)
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Sub => "Sub",
            Self::PropertyGet => "Property Get",
            Self::PropertyLet => "Property Let",
            Self::PropertySet => "Property Set",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: Token,
    /// VBScript parameters are `ByRef` unless marked `ByVal`.
    pub by_ref: bool,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBlock {
    pub keyword: Token,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub is_default: bool,
    pub name: Token,
    pub parameters: Vec<Parameter>,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassBlock {
    pub keyword: Token,
    pub name: Token,
    pub statements: Vec<CodeBlock>,
}
