// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Control-construct translation.
//!
//! **DDD Context:** Compilation — Code Generation
//!
//! - [`conditionals`] - `If` / `ElseIf` / `Else`
//! - [`select`] - `Select Case`
//! - [`for_loops`] - `For ... Next`
//! - [`for_each`] - `For Each ... Next`
//! - [`do_loops`] - `Do ... Loop` and `While ... Wend`
//! - [`with_blocks`] - `With ... End With`
//!
//! # Mismatched exits
//!
//! `Exit For` inside a `Do` (or `Exit Do` inside a `For`) has no direct C#
//! equivalent because `break` leaves only the innermost loop. The target
//! loop declares a flag before itself:
//!
//! ```csharp
//! var exitFor1 = false;
//! for (i = 1; _.IF(_.LTE(i, 10)); i = _.ADD(i, 1))
//! {
//!     while (true)
//!     {
//!         exitFor1 = true;
//!         break;
//!     }
//!     if (exitFor1)
//!         break;
//! }
//! ```
//!
//! and every loop between the exit and the target checks it after itself.

mod conditionals;
mod do_loops;
mod for_each;
mod for_loops;
mod select;
mod with_blocks;

use ecow::EcoString;

use crate::ast::{CodeBlock, ExitKind};
use crate::expressions::Expression;

use super::scope::{LoopKind, ParentConstruct, ScopeAccessInformation, StructureExitPoint};
use super::{CodeBlockTranslator, Result, STATEMENT_HANDLERS, TranslatedStatement, TranslationResult};

/// Renders a value from a scope, recording undeclared accesses on the result.
type Render<'a> = Box<dyn FnOnce(&ScopeAccessInformation, &mut TranslationResult) -> Result<String> + 'a>;

/// How a temporary is declared before it is assigned.
#[derive(Debug, Clone, Copy)]
struct TempDeclaration {
    base: &'static str,
    type_name: &'static str,
    /// Initial value when the assignment happens inside a wrapper.
    initial: &'static str,
}

/// One arm of an `if` / `else if` chain.
struct Branch<'a> {
    /// Expressions the condition evaluates, for by-ref alias detection.
    expressions: Vec<&'a Expression>,
    line_index: usize,
    /// Renders the complete C# condition, already wrapped in `_.IF`.
    condition: Render<'a>,
    statements: &'a [CodeBlock],
}

fn loop_kind_of(block: &CodeBlock) -> Option<LoopKind> {
    match block {
        CodeBlock::For(_) | CodeBlock::ForEach(_) => Some(LoopKind::For),
        CodeBlock::Do(_) => Some(LoopKind::Do),
        _ => None,
    }
}

fn exit_kind_matches(kind: ExitKind, loop_kind: LoopKind) -> bool {
    matches!(
        (kind, loop_kind),
        (ExitKind::For, LoopKind::For) | (ExitKind::Do, LoopKind::Do)
    )
}

/// True when `blocks` contain an `Exit` of `kind` that leaves the loop
/// owning them. Nested loops of the same kind absorb their own exits.
fn contains_exit_escaping(blocks: &[CodeBlock], kind: LoopKind) -> bool {
    blocks.iter().any(|block| match block {
        CodeBlock::Exit(exit) => exit_kind_matches(exit.kind, kind),
        CodeBlock::Function(_) | CodeBlock::Class(_) => false,
        nested if loop_kind_of(nested) == Some(kind) => false,
        nested => nested
            .nested_content()
            .into_iter()
            .any(|content| contains_exit_escaping(content, kind)),
    })
}

/// True when a loop of `kind` owning `blocks` is left from inside a loop of
/// the other kind, and so needs an exit flag.
fn has_mismatched_exit(blocks: &[CodeBlock], kind: LoopKind) -> bool {
    blocks.iter().any(|block| match block {
        CodeBlock::Function(_) | CodeBlock::Class(_) => false,
        nested if loop_kind_of(nested) == Some(kind) => false,
        nested if loop_kind_of(nested).is_some() => nested
            .nested_content()
            .into_iter()
            .any(|content| contains_exit_escaping(content, kind)),
        nested => nested
            .nested_content()
            .into_iter()
            .any(|content| has_mismatched_exit(content, kind)),
    })
}

fn other_kind(kind: LoopKind) -> LoopKind {
    match kind {
        LoopKind::For => LoopKind::Do,
        LoopKind::Do => LoopKind::For,
    }
}

fn flag_base(kind: LoopKind) -> &'static str {
    match kind {
        LoopKind::For => "exitFor",
        LoopKind::Do => "exitDo",
    }
}

impl CodeBlockTranslator {
    /// Prepares a loop of `kind` owning `statements`: declares its exit
    /// flag when needed and returns the scope for its body.
    fn enter_loop(
        &self,
        kind: LoopKind,
        parent: ParentConstruct,
        statements: &[CodeBlock],
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        line_index: usize,
        result: &mut TranslationResult,
    ) -> ScopeAccessInformation {
        let scope = scope.extend_reserved(&result.reserved_names);
        let exit_flag = if has_mismatched_exit(statements, kind) {
            let (flag, _) = scope.reserve_temp(flag_base(kind));
            result.reserve(flag.clone());
            result.push(TranslatedStatement::new(
                format!("var {flag} = false;"),
                indentation_depth,
                line_index,
            ));
            Some(flag)
        } else {
            None
        };
        scope
            .extend_reserved(&result.reserved_names)
            .set_parent(parent)
            .add_structure_exit_point(StructureExitPoint { kind, exit_flag })
    }

    /// After a loop of `kind`, re-raises an exit of the other kind that
    /// was flagged inside it.
    fn propagate_exit(
        &self,
        kind: LoopKind,
        statements: &[CodeBlock],
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        line_index: usize,
        result: &mut TranslationResult,
    ) {
        let escaping = other_kind(kind);
        let Some(flag) = scope
            .structure_exit_points()
            .iter()
            .rev()
            .find(|point| point.kind == escaping)
            .and_then(|point| point.exit_flag.as_ref())
        else {
            return;
        };
        if contains_exit_escaping(statements, escaping) {
            result.push(TranslatedStatement::new(
                format!("if ({flag})"),
                indentation_depth,
                line_index,
            ));
            result.push(TranslatedStatement::new("break;", indentation_depth + 1, line_index));
        }
    }

    /// Translates `statements` as a braced body one level deeper.
    fn translate_body(
        &self,
        statements: &[CodeBlock],
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<TranslationResult> {
        let mut result = result;
        result.push_skeleton("{", indentation_depth);
        let body_scope = scope.extend_reserved(&result.reserved_names);
        let body = self.translate_common(STATEMENT_HANDLERS, statements, &body_scope, indentation_depth + 1)?;
        let mut result = result.add(body);
        result.push_skeleton("}", indentation_depth);
        Ok(result)
    }

    /// Evaluates `render` once into a fresh temporary and returns its name.
    ///
    /// The value is assigned at declaration unless it needs by-ref aliasing
    /// or error trapping (`trap_errors` with a registration token), in which
    /// case the temporary starts at `initial` and is assigned inside the
    /// wrappers. `completion_flag` is set after a successful assignment.
    #[allow(clippy::too_many_arguments)]
    fn evaluate_into_temp(
        &self,
        declaration: TempDeclaration,
        expressions: &[&Expression],
        trap_errors: bool,
        completion_flag: Option<&EcoString>,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        line_index: usize,
        result: TranslationResult,
        render: Render<'_>,
    ) -> Result<(EcoString, TranslationResult)> {
        let mut result = result;
        let scope = scope.extend_reserved(&result.reserved_names);
        let (name, scope) = scope.reserve_temp(declaration.base);
        result.reserve(name.clone());

        let aliased = self.by_ref_parameters_to_alias(expressions, &scope);
        let token = scope.error_registration_token().filter(|_| trap_errors).cloned();
        if aliased.is_empty() && token.is_none() && completion_flag.is_none() {
            let value = render(&scope, &mut result)?;
            result.push(TranslatedStatement::new(
                format!("{} {name} = {value};", declaration.type_name),
                indentation_depth,
                line_index,
            ));
            return Ok((name, result));
        }

        result.push(TranslatedStatement::new(
            format!("{} {name} = {};", declaration.type_name, declaration.initial),
            indentation_depth,
            line_index,
        ));
        let result = self.with_by_ref_aliases(
            &aliased,
            &scope,
            indentation_depth,
            line_index,
            result,
            |scope, depth, mut result| {
                let value = render(scope, &mut result)?;
                let mut assignment = format!("{name} = {value};");
                if let Some(flag) = completion_flag {
                    assignment.push_str(&format!(" {flag} = true;"));
                }
                let content = match &token {
                    Some(token) => format!("_.HANDLEERROR({token}, () => {{ {assignment} }});"),
                    None => assignment,
                };
                result.push(TranslatedStatement::new(content, depth, line_index));
                Ok(result)
            },
        )?;
        Ok((name, result))
    }

    /// Emits an `if` / `else if` / `else` chain.
    ///
    /// A condition that needs by-ref aliasing is evaluated into an
    /// `ifResultN` temporary first. For a branch after the first, that
    /// setup cannot sit between `else` and `if`, so the chain continues
    /// inside `else { ... }` and the extra braces close at the end.
    fn emit_conditional_chain(
        &self,
        branches: Vec<Branch<'_>>,
        otherwise: Option<&[CodeBlock]>,
        parent: ParentConstruct,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        result: TranslationResult,
    ) -> Result<TranslationResult> {
        let mut result = result;
        let mut depth = indentation_depth;
        let mut nesting = 0;

        for (index, branch) in branches.into_iter().enumerate() {
            let branch_scope = scope.extend_reserved(&result.reserved_names);
            let aliased = self.by_ref_parameters_to_alias(&branch.expressions, &branch_scope);
            let (keyword, condition) = if aliased.is_empty() {
                let condition = (branch.condition)(&branch_scope, &mut result)?;
                (if index == 0 { "if" } else { "else if" }, condition)
            } else {
                if index > 0 {
                    result.push_skeleton("else", depth);
                    result.push_skeleton("{", depth);
                    depth += 1;
                    nesting += 1;
                }
                let (temp, evaluated) = self.evaluate_into_temp(
                    TempDeclaration {
                        base: "ifResult",
                        type_name: "bool",
                        initial: "false",
                    },
                    &branch.expressions,
                    false,
                    None,
                    &branch_scope,
                    depth,
                    branch.line_index,
                    result,
                    branch.condition,
                )?;
                result = evaluated;
                ("if", temp.to_string())
            };
            result.push(TranslatedStatement::new(
                format!("{keyword} ({condition})"),
                depth,
                branch.line_index,
            ));
            let body_scope = scope.set_parent(parent);
            result = self.translate_body(branch.statements, &body_scope, depth, result)?;
        }

        if let Some(otherwise) = otherwise {
            result.push_skeleton("else", depth);
            result = self.translate_body(otherwise, &scope.set_parent(parent), depth, result)?;
        }

        for _ in 0..nesting {
            depth -= 1;
            result.push_skeleton("}", depth);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{lex, parse};

    fn blocks(source: &str) -> Vec<CodeBlock> {
        parse(lex(source).unwrap()).unwrap()
    }

    fn body(source: &str) -> Vec<CodeBlock> {
        match blocks(source).into_iter().next() {
            Some(CodeBlock::For(block)) => block.statements,
            Some(CodeBlock::Do(block)) => block.statements,
            other => panic!("expected a loop, got {other:?}"),
        }
    }

    #[test]
    fn direct_exit_is_not_mismatched() {
        let statements = body("For i = 1 To 2\n  Exit For\nNext\n");
        assert!(contains_exit_escaping(&statements, LoopKind::For));
        assert!(!has_mismatched_exit(&statements, LoopKind::For));
    }

    #[test]
    fn exit_inside_other_loop_kind_is_mismatched() {
        let statements = body("For i = 1 To 2\n  Do\n    If x Then Exit For\n  Loop\nNext\n");
        assert!(has_mismatched_exit(&statements, LoopKind::For));
        assert!(!has_mismatched_exit(&statements, LoopKind::Do));
    }

    #[test]
    fn nested_loop_of_same_kind_absorbs_exit() {
        let statements = body("For i = 1 To 2\n  Do\n    For j = 1 To 2\n      Exit For\n    Next\n  Loop\nNext\n");
        assert!(!has_mismatched_exit(&statements, LoopKind::For));
    }
}
