// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Translation output records and the accumulator threaded through the
//! block translators.
//!
//! **DDD Context:** Compilation — Code Generation

use ecow::EcoString;
use tracing::warn;

use crate::source_analysis::Token;

/// One emitted line of C#.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedStatement {
    pub content: String,
    pub indentation_depth: usize,
    /// Zero-based source line, or `None` for generated skeleton lines.
    pub line_index: Option<usize>,
}

impl TranslatedStatement {
    #[must_use]
    pub fn new(content: impl Into<String>, indentation_depth: usize, line_index: usize) -> Self {
        Self {
            content: content.into(),
            indentation_depth,
            line_index: Some(line_index),
        }
    }

    /// A line with no source counterpart (braces, class scaffolding).
    #[must_use]
    pub fn skeleton(content: impl Into<String>, indentation_depth: usize) -> Self {
        Self {
            content: content.into(),
            indentation_depth,
            line_index: None,
        }
    }
}

/// Declaration scope of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    Private,
    Public,
}

/// A variable introduced by `Dim`, `Private`, `Public`, `ReDim` or `Const`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub name: Token,
    pub scope: VariableScope,
    /// `Some(vec![])` for `Dim a()`, `Some(dims)` for `Dim a(3, 4)`.
    pub constant_dimensions: Option<Vec<usize>>,
}

/// A lossy or suspicious construct that did not stop translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationWarning {
    UndeclaredVariable { name: EcoString, line: usize },
    OptionExplicitIgnored { line: usize },
    EmptyForLoopRemoved { line: usize },
    SuspiciousInfiniteLoop { line: usize },
    FunctionMadePublic { name: EcoString, line: usize },
    DuplicateFunctionReplaced { name: EcoString, line: usize },
}

impl TranslationWarning {
    /// Emits the warning through `tracing`.
    pub fn log(&self) {
        warn!("{self}");
    }
}

impl std::fmt::Display for TranslationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndeclaredVariable { name, line } => {
                write!(f, "undeclared variable '{name}' referenced on line {line}")
            }
            Self::OptionExplicitIgnored { line } => {
                write!(f, "Option Explicit on line {line} is ignored")
            }
            Self::EmptyForLoopRemoved { line } => {
                write!(f, "For loop on line {line} can never execute and was removed")
            }
            Self::SuspiciousInfiniteLoop { line } => {
                write!(f, "empty Do loop on line {line} never terminates")
            }
            Self::FunctionMadePublic { name, line } => {
                write!(f, "private function '{name}' on line {line} made public at outermost scope")
            }
            Self::DuplicateFunctionReplaced { name, line } => {
                write!(f, "function '{name}' on line {line} is replaced by a later definition")
            }
        }
    }
}

/// Accumulated output of translating a run of blocks.
///
/// Declarations are carried up to the nearest function or property, which
/// flushes them into statements at the top of its body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationResult {
    pub translated_statements: Vec<TranslatedStatement>,
    pub explicit_variable_declarations: Vec<VariableDeclaration>,
    /// In access order; may repeat until flushed.
    pub undeclared_variables_accessed: Vec<Token>,
    /// Temporary names issued so far, never to be reissued by a sibling.
    pub reserved_names: Vec<EcoString>,
    pub warnings: Vec<TranslationWarning>,
}

impl TranslationResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `other` after `self`.
    #[must_use]
    pub fn add(mut self, other: TranslationResult) -> Self {
        self.translated_statements.extend(other.translated_statements);
        self.explicit_variable_declarations
            .extend(other.explicit_variable_declarations);
        self.undeclared_variables_accessed
            .extend(other.undeclared_variables_accessed);
        self.reserved_names.extend(other.reserved_names);
        self.warnings.extend(other.warnings);
        self
    }

    pub fn push(&mut self, statement: TranslatedStatement) {
        self.translated_statements.push(statement);
    }

    /// Pushes a generated line with no source counterpart.
    pub fn push_skeleton(&mut self, content: impl Into<String>, indentation_depth: usize) {
        self.push(TranslatedStatement::skeleton(content, indentation_depth));
    }

    pub fn reserve(&mut self, name: EcoString) {
        self.reserved_names.push(name);
    }

    /// Records and logs a warning.
    pub fn warn(&mut self, warning: TranslationWarning) {
        warning.log();
        self.warnings.push(warning);
    }

    pub fn record_undeclared(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.undeclared_variables_accessed.extend(tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::TokenKind;

    fn statement(content: &str) -> TranslationResult {
        let mut result = TranslationResult::new();
        result.push(TranslatedStatement::new(content, 0, 0));
        result
    }

    #[test]
    fn add_preserves_statement_order() {
        let combined = statement("a;").add(statement("b;")).add(statement("c;"));
        let contents: Vec<_> = combined
            .translated_statements
            .iter()
            .map(|s| s.content.as_str())
            .collect();
        assert_eq!(contents, ["a;", "b;", "c;"]);
    }

    #[test]
    fn add_is_associative() {
        let left = statement("a;").add(statement("b;")).add(statement("c;"));
        let right = statement("a;").add(statement("b;").add(statement("c;")));
        assert_eq!(left, right);
    }

    #[test]
    fn add_merges_declarations_and_accesses() {
        let mut first = TranslationResult::new();
        first.undeclared_variables_accessed.push(Token::new(TokenKind::Name, "x", 1));
        let mut second = TranslationResult::new();
        second.undeclared_variables_accessed.push(Token::new(TokenKind::Name, "x", 2));
        second.reserve("ifResult1".into());
        let combined = first.add(second);
        assert_eq!(combined.undeclared_variables_accessed.len(), 2);
        assert_eq!(combined.reserved_names, vec![EcoString::from("ifResult1")]);
    }

    #[test]
    fn warning_messages_use_one_based_lines() {
        let warning = TranslationWarning::EmptyForLoopRemoved { line: 3 };
        assert_eq!(
            warning.to_string(),
            "For loop on line 3 can never execute and was removed"
        );
    }
}
