// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! C# code generation for VBScript.
//!
//! This module walks the stage-one [`CodeBlock`] tree and emits C# that calls
//! into a runtime compatibility layer, conventionally named `_`. The compat
//! layer reproduces VBScript's loose typing at execution time; the
//! translator only decides which compat calls to make.
//!
//! # Example
//!
//! VBScript source:
//! ```vbscript
//! Dim x
//! x = 5
//! If x > 1 Then WScript.Echo "big"
//! ```
//!
//! Translated body of `Go`:
//! ```csharp
//! _outer.x = 5;
//! if (_.IF(_.GT(_outer.x, 1)))
//! {
//!     _.CALL(this, _env.wscript, "Echo", _.ARGS.Val("big"));
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`scope`] - Immutable scope snapshot: declared names, exits, temporaries
//! - `translation_result` - The accumulator threaded through translators
//! - `expressions` - Expression translation into compat-layer calls
//! - `by_ref` - Capture/restore aliasing for by-ref parameters in lambdas
//! - `statements` - Comments, calls, assignments, exits, `Erase`, error trapping
//! - `declarations` - `Dim`, `ReDim`, `Const` and declaration pre-scans
//! - `control_flow` - `If`, `Select`, `For`, `For Each`, `Do`, `With`
//! - `functions` - Functions, subs and property accessors
//! - `classes` - Class translation
//! - `outer_scope` - Assembles the translation unit
//! - `document` - Rendering statements as text
//!
//! Every block translator has the same handler shape (see `BlockHandler`)
//! and recurses through `CodeBlockTranslator::translate_common` for its
//! children, so nested constructs compose without knowing about each other.

mod by_ref;
mod classes;
mod control_flow;
mod declarations;
mod document;
mod expressions;
mod functions;
pub mod naming;
mod outer_scope;
pub mod scope;
mod statements;
mod translation_result;

#[cfg(test)]
mod tests;

use std::rc::Rc;

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::ast::CodeBlock;
use crate::expressions::ExpressionError;
use crate::source_analysis::Token;

pub use naming::{DefaultNameRewriter, NameRewriter};
pub use outer_scope::TranslatedProgram;
pub use scope::{
    NameLocation, ParentConstruct, ScopeAccessInformation, ScopeDefiningParent, ScopeLocation,
    ScopedName,
};
pub use translation_result::{
    TranslatedStatement, TranslationResult, TranslationWarning, VariableDeclaration, VariableScope,
};

/// Errors that stop translation. Line numbers are one-based.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum TranslationError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Expression(#[from] ExpressionError),

    /// No handler claimed the block in this position.
    #[error("unsupported {construct} on line {line}")]
    #[diagnostic(code(vbsharp::translate::unsupported))]
    UnsupportedConstruct { construct: &'static str, line: usize },

    #[error("Name redefined: '{name}' on line {line}")]
    #[diagnostic(code(vbsharp::translate::name_redefined))]
    NameRedefined { name: EcoString, line: usize },

    #[error("'{name}' on line {line} must be a Sub with no arguments")]
    #[diagnostic(code(vbsharp::translate::class_event))]
    InvalidClassInitializeOrTerminate { name: EcoString, line: usize },

    #[error("property '{name}' on line {line} is only allowed inside a class")]
    #[diagnostic(code(vbsharp::translate::property_outside_class))]
    PropertyOutsideClass { name: EcoString, line: usize },

    #[error("class '{class}' defines '{name}' more than once (line {line})")]
    #[diagnostic(code(vbsharp::translate::duplicate_member))]
    DuplicateClassMember {
        class: EcoString,
        name: EcoString,
        line: usize,
    },

    #[error("class '{name}' on line {line} is already defined")]
    #[diagnostic(code(vbsharp::translate::duplicate_class))]
    DuplicateClass { name: EcoString, line: usize },

    #[error("Exit on line {line} has no enclosing construct to leave")]
    #[diagnostic(code(vbsharp::translate::invalid_exit))]
    InvalidExit { line: usize },

    #[error("invalid assignment target on line {line}")]
    #[diagnostic(code(vbsharp::translate::invalid_target))]
    InvalidAssignmentTarget { line: usize },

    #[error("array '{name}' on line {line} must have constant dimensions")]
    #[diagnostic(code(vbsharp::translate::array_dimension))]
    InvalidArrayDimension { name: EcoString, line: usize },

    #[error("'.' member access on line {line} is only valid inside a With block")]
    #[diagnostic(code(vbsharp::translate::missing_with))]
    MissingWithTarget { line: usize },

    #[error("invalid value expression '{content}' on line {line}")]
    #[diagnostic(code(vbsharp::translate::invalid_value))]
    InvalidValueExpression { content: String, line: usize },

    #[error("internal translation error: {0}")]
    #[diagnostic(code(vbsharp::translate::internal))]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TranslationError>;

/// Options controlling the shape of the emitted C#.
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    namespace: EcoString,
    runner_class_name: EcoString,
    outer_class_name: EcoString,
    environment_class_name: EcoString,
    /// Names supplied by the host (`WScript`, `Response`, ...). They become
    /// fields of the environment references class.
    external_dependencies: Vec<EcoString>,
    name_rewriter: Rc<dyn NameRewriter>,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            namespace: "TranslatedProgram".into(),
            runner_class_name: "Runner".into(),
            outer_class_name: "GlobalReferences".into(),
            environment_class_name: "EnvironmentReferences".into(),
            external_dependencies: Vec::new(),
            name_rewriter: Rc::new(DefaultNameRewriter),
        }
    }
}

impl TranslatorOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_runner_class_name(mut self, name: &str) -> Self {
        self.runner_class_name = name.into();
        self
    }

    #[must_use]
    pub fn with_outer_class_name(mut self, name: &str) -> Self {
        self.outer_class_name = name.into();
        self
    }

    #[must_use]
    pub fn with_environment_class_name(mut self, name: &str) -> Self {
        self.environment_class_name = name.into();
        self
    }

    /// Adds a host-supplied name the script may reference without declaring.
    #[must_use]
    pub fn with_external_dependency(mut self, name: &str) -> Self {
        self.external_dependencies.push(name.into());
        self
    }

    #[must_use]
    pub fn with_name_rewriter(mut self, rewriter: Rc<dyn NameRewriter>) -> Self {
        self.name_rewriter = rewriter;
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn runner_class_name(&self) -> &str {
        &self.runner_class_name
    }

    #[must_use]
    pub fn outer_class_name(&self) -> &str {
        &self.outer_class_name
    }

    #[must_use]
    pub fn environment_class_name(&self) -> &str {
        &self.environment_class_name
    }

    #[must_use]
    pub fn external_dependencies(&self) -> &[EcoString] {
        &self.external_dependencies
    }
}

/// Result of offering a block to one handler.
#[derive(Debug)]
pub(crate) enum BlockOutcome {
    /// The handler claimed the block; this is the new running result.
    Translated(TranslationResult),
    /// The handler does not apply; the running result comes back untouched.
    NotApplicable(TranslationResult),
}

/// A block translator: `(block, scope, indentation_depth, result)`.
pub(crate) type BlockHandler = fn(
    &CodeBlockTranslator,
    &CodeBlock,
    &ScopeAccessInformation,
    usize,
    TranslationResult,
) -> Result<BlockOutcome>;

/// Handlers for statements inside functions, loops, conditionals and the
/// outermost executable section. Function and class definitions are not
/// statements and fall through to `UnsupportedConstruct` here.
pub(crate) const STATEMENT_HANDLERS: &[BlockHandler] = &[
    CodeBlockTranslator::translate_blank_line,
    CodeBlockTranslator::translate_comment,
    CodeBlockTranslator::translate_option_explicit,
    CodeBlockTranslator::translate_on_error,
    CodeBlockTranslator::translate_dim,
    CodeBlockTranslator::translate_redim,
    CodeBlockTranslator::translate_const,
    CodeBlockTranslator::translate_exit,
    CodeBlockTranslator::translate_erase,
    CodeBlockTranslator::translate_statement,
    CodeBlockTranslator::translate_value_setting,
    CodeBlockTranslator::translate_if,
    CodeBlockTranslator::translate_select,
    CodeBlockTranslator::translate_for,
    CodeBlockTranslator::translate_for_each,
    CodeBlockTranslator::translate_do,
    CodeBlockTranslator::translate_with,
];

/// Translates code blocks into C# statements.
#[derive(Debug, Clone)]
pub struct CodeBlockTranslator {
    options: TranslatorOptions,
}

impl CodeBlockTranslator {
    #[must_use]
    pub fn new(options: TranslatorOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &TranslatorOptions {
        &self.options
    }

    fn rewrite(&self, name: &str) -> EcoString {
        self.options.name_rewriter.rewrite(name)
    }

    fn rewrite_token(&self, token: &Token) -> EcoString {
        self.rewrite(token.content())
    }

    /// Translates `blocks` in order, offering each to `handlers` until one
    /// claims it.
    ///
    /// Names reserved and variables declared by earlier siblings are added
    /// to the scope seen by later ones. When `scope` is a function or
    /// property body, declarations and undeclared accesses are flushed to
    /// the top of the output.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationError::UnsupportedConstruct`] for a block no
    /// handler claims, and propagates any handler error.
    pub(crate) fn translate_common(
        &self,
        handlers: &[BlockHandler],
        blocks: &[CodeBlock],
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
    ) -> Result<TranslationResult> {
        let mut result = TranslationResult::new();
        for block in blocks {
            let block_scope = self.scope_after_siblings(scope, &result);
            result = self.dispatch(handlers, block, &block_scope, indentation_depth, result)?;
        }

        if scope.parent() == ParentConstruct::Function
            && scope.location() == ScopeLocation::WithinFunctionOrProperty
        {
            result = self.flush_declarations(result, scope, indentation_depth)?;
        }
        Ok(result)
    }

    /// Extends `scope` with what earlier siblings reserved, declared or
    /// touched without declaring.
    fn scope_after_siblings(
        &self,
        scope: &ScopeAccessInformation,
        result: &TranslationResult,
    ) -> ScopeAccessInformation {
        let location = match scope.declaration_location() {
            NameLocation::OutermostScope => NameLocation::Environment,
            other => other,
        };
        let declared = result
            .explicit_variable_declarations
            .iter()
            .map(|declaration| (&declaration.name, scope.declaration_location()))
            .chain(result.undeclared_variables_accessed.iter().map(|token| (token, location)));

        let mut names: Vec<ScopedName> = Vec::new();
        for (token, location) in declared {
            let rewritten = self.rewrite_token(token);
            if scope.find_variable(&rewritten).is_none()
                && !names.iter().any(|n| n.rewritten == rewritten)
            {
                names.push(ScopedName::new(
                    token.content().clone(),
                    rewritten,
                    location,
                    token.line_index(),
                ));
            }
        }

        scope
            .extend_reserved(&result.reserved_names)
            .extend_variables(names)
    }

    fn dispatch(
        &self,
        handlers: &[BlockHandler],
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<TranslationResult> {
        let mut result = result;
        for handler in handlers {
            match handler(self, block, scope, indentation_depth, result)? {
                BlockOutcome::Translated(translated) => {
                    debug!(
                        "Translated {} on line {}",
                        block.description(),
                        block.line_index() + 1
                    );
                    return Ok(translated);
                }
                BlockOutcome::NotApplicable(unchanged) => result = unchanged,
            }
        }
        Err(TranslationError::UnsupportedConstruct {
            construct: block.description(),
            line: block.line_index() + 1,
        })
    }

    /// Emits one initialisation per declaration, then one per distinct
    /// undeclared name, ahead of the body.
    fn flush_declarations(
        &self,
        mut result: TranslationResult,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
    ) -> Result<TranslationResult> {
        let mut taken: Vec<EcoString> = match scope.scope_defining_parent() {
            ScopeDefiningParent::Function { parameters, .. } => parameters
                .iter()
                .map(|parameter| self.rewrite_token(&parameter.name))
                .collect(),
            _ => Vec::new(),
        };

        let mut header = Vec::new();
        for declaration in std::mem::take(&mut result.explicit_variable_declarations) {
            let rewritten = self.rewrite_token(&declaration.name);
            if taken.iter().any(|t| t.eq_ignore_ascii_case(&rewritten)) {
                return Err(TranslationError::NameRedefined {
                    name: declaration.name.content().clone(),
                    line: declaration.name.line_index() + 1,
                });
            }
            header.push(TranslatedStatement::new(
                format!(
                    "object {rewritten} = {};",
                    initial_value(declaration.constant_dimensions.as_deref())
                ),
                indentation_depth,
                declaration.name.line_index(),
            ));
            taken.push(rewritten);
        }

        for token in std::mem::take(&mut result.undeclared_variables_accessed) {
            let rewritten = self.rewrite_token(&token);
            if taken.iter().any(|t| t.eq_ignore_ascii_case(&rewritten)) {
                continue;
            }
            header.push(TranslatedStatement::new(
                format!("object {rewritten} = null; // Undeclared in source"),
                indentation_depth,
                token.line_index(),
            ));
            result.warn(TranslationWarning::UndeclaredVariable {
                name: token.content().clone(),
                line: token.line_index() + 1,
            });
            taken.push(rewritten);
        }

        header.append(&mut result.translated_statements);
        result.translated_statements = header;
        Ok(result)
    }
}

/// Initial value for a declared variable: `null`, or a new array.
fn initial_value(constant_dimensions: Option<&[usize]>) -> String {
    match constant_dimensions {
        None => "null".to_string(),
        Some([]) => "new object[0]".to_string(),
        Some(dimensions) => format!("_.NEWARRAY(new object[] {{ {} }})", join_numbers(dimensions)),
    }
}

fn join_numbers(values: &[usize]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
