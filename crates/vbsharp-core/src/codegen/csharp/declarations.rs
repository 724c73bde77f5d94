// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `Dim`, `ReDim` and `Const`, plus the declaration pre-scan.
//!
//! VBScript hoists declarations to the top of their function (or of the
//! script), so a name may be used before the `Dim` that declares it. Scope
//! owners call [`collect_declared_names`] before translating a body.

use ecow::EcoString;

use crate::ast::{CodeBlock, DeclarationKind, DimVariable, Visibility};
use crate::source_analysis::{Token, TokenKind};

use super::expressions::{ValueContext, generate_single};
use super::scope::ScopeAccessInformation;
use super::statements::bare_name_expression;
use super::{
    BlockOutcome, CodeBlockTranslator, Result, TranslationError, TranslationResult,
    VariableDeclaration, VariableScope,
};

/// Names a body declares, in source order.
#[derive(Debug, Default)]
pub(super) struct DeclaredNames {
    /// `Dim`, `Private`, `Public` and `Const` names.
    pub explicit: Vec<Token>,
    /// `ReDim` targets, which declare the name when nothing else does.
    pub redimmed: Vec<Token>,
}

/// Collects declarations from `blocks` and their nested statements, without
/// entering functions or classes.
pub(super) fn collect_declared_names(blocks: &[CodeBlock]) -> DeclaredNames {
    let mut names = DeclaredNames::default();
    collect_into(blocks, &mut names);
    names
}

fn collect_into(blocks: &[CodeBlock], names: &mut DeclaredNames) {
    for block in blocks {
        match block {
            CodeBlock::Dim(dim) => names
                .explicit
                .extend(dim.variables.iter().map(|v| v.name.clone())),
            CodeBlock::Const(constant) => names
                .explicit
                .extend(constant.values.iter().map(|v| v.name.clone())),
            CodeBlock::ReDim(redim) => names
                .redimmed
                .extend(redim.variables.iter().map(|v| v.name.clone())),
            CodeBlock::Function(_) | CodeBlock::Class(_) => {}
            other => {
                for nested in other.nested_content() {
                    collect_into(nested, names);
                }
            }
        }
    }
}

/// Constant upper bounds of a `Dim` array, `Some(vec![])` for `Dim a()`.
pub(super) fn constant_dimensions(variable: &DimVariable) -> Result<Option<Vec<usize>>> {
    let Some(dimensions) = &variable.dimensions else {
        return Ok(None);
    };
    dimensions
        .iter()
        .map(|dimension| match dimension.as_slice() {
            [bound] if bound.kind() == TokenKind::NumericLiteral => bound
                .content()
                .parse::<usize>()
                .map_err(|_| invalid_dimension(variable)),
            _ => Err(invalid_dimension(variable)),
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn invalid_dimension(variable: &DimVariable) -> TranslationError {
    TranslationError::InvalidArrayDimension {
        name: variable.name.content().clone(),
        line: variable.name.line_index() + 1,
    }
}

impl CodeBlockTranslator {
    /// Records declarations; the owning scope decides how they are emitted.
    pub(super) fn translate_dim(
        &self,
        block: &CodeBlock,
        _scope: &ScopeAccessInformation,
        _indentation_depth: usize,
        mut result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::Dim(dim) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let scope = match dim.kind {
            DeclarationKind::Public => VariableScope::Public,
            DeclarationKind::Dim | DeclarationKind::Private => VariableScope::Private,
        };
        for variable in &dim.variables {
            result.explicit_variable_declarations.push(VariableDeclaration {
                name: variable.name.clone(),
                scope,
                constant_dimensions: constant_dimensions(variable)?,
            });
        }
        Ok(BlockOutcome::Translated(result))
    }

    /// `a = _.NEWARRAY(new object[] { n });`, or `_.RESIZEARRAY` with
    /// `Preserve`.
    pub(super) fn translate_redim(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        mut result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::ReDim(redim) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let line_index = redim.keyword.line_index();
        for variable in &redim.variables {
            let dimensions = match &variable.dimensions {
                Some(dimensions) if !dimensions.is_empty() => dimensions
                    .iter()
                    .map(|dimension| generate_single(dimension, line_index))
                    .collect::<Result<Vec<_>>>()?,
                _ => return Err(invalid_dimension(variable)),
            };
            let target = bare_name_expression(&variable.name);
            let mut evaluated: Vec<_> = dimensions.iter().collect();
            evaluated.push(&target);

            result = self.emit_statement(&evaluated, scope, indentation_depth, line_index, result, |scope, result| {
                let bounds = dimensions
                    .iter()
                    .map(|d| self.translate_expression(d, scope, ValueContext::Value, result))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                let name = self.translate_variable(&variable.name, scope, result);
                Ok(if redim.preserve {
                    format!("{name} = _.RESIZEARRAY({name}, new object[] {{ {bounds} }});")
                } else {
                    format!("{name} = _.NEWARRAY(new object[] {{ {bounds} }});")
                })
            })?;
        }
        Ok(BlockOutcome::Translated(result))
    }

    /// A declaration plus an assignment of the constant's value.
    pub(super) fn translate_const(
        &self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        mut result: TranslationResult,
    ) -> Result<BlockOutcome> {
        let CodeBlock::Const(constant) = block else {
            return Ok(BlockOutcome::NotApplicable(result));
        };
        let variable_scope = match constant.visibility {
            Some(Visibility::Public) => VariableScope::Public,
            Some(Visibility::Private) | None => VariableScope::Private,
        };
        let line_index = constant.keyword.line_index();
        for value in &constant.values {
            result.explicit_variable_declarations.push(VariableDeclaration {
                name: value.name.clone(),
                scope: variable_scope,
                constant_dimensions: None,
            });
            let expression = generate_single(&value.value, line_index)?;
            let translated =
                self.translate_expression(&expression, scope, ValueContext::Value, &mut result)?;
            let name = self.translate_variable(&value.name, scope, &mut result);
            result.push(super::TranslatedStatement::new(
                format!("{name} = {translated};"),
                indentation_depth,
                line_index,
            ));
        }
        Ok(BlockOutcome::Translated(result))
    }

    /// ReDim targets that nothing else declares and that are not visible
    /// from an enclosing scope. They become implicit declarations.
    pub(super) fn implicit_declarations(
        &self,
        names: &DeclaredNames,
        scope: &ScopeAccessInformation,
    ) -> Vec<Token> {
        let explicit: Vec<EcoString> = names.explicit.iter().map(|t| self.rewrite_token(t)).collect();
        let mut implicit: Vec<(EcoString, Token)> = Vec::new();
        for token in &names.redimmed {
            let rewritten = self.rewrite_token(token);
            if explicit.iter().any(|e| e.eq_ignore_ascii_case(&rewritten))
                || implicit.iter().any(|(r, _)| r.eq_ignore_ascii_case(&rewritten))
                || scope.find_variable(&rewritten).is_some()
            {
                continue;
            }
            implicit.push((rewritten, token.clone()));
        }
        implicit.into_iter().map(|(_, token)| token).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{lex, parse};

    fn blocks(source: &str) -> Vec<CodeBlock> {
        parse(lex(source).unwrap()).unwrap()
    }

    fn contents(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.content().as_str()).collect()
    }

    #[test]
    fn pre_scan_finds_nested_declarations() {
        let names = collect_declared_names(&blocks(
            "Dim a\nIf x Then\n  Dim b\n  ReDim c(2)\nEnd If\nConst d = 1\n",
        ));
        assert_eq!(contents(&names.explicit), ["a", "b", "d"]);
        assert_eq!(contents(&names.redimmed), ["c"]);
    }

    #[test]
    fn pre_scan_does_not_enter_functions() {
        let names = collect_declared_names(&blocks("Function f()\n  Dim inner\nEnd Function\nDim outer\n"));
        assert_eq!(contents(&names.explicit), ["outer"]);
    }

    #[test]
    fn array_dimensions_must_be_numeric_literals() {
        let Some(CodeBlock::Dim(dim)) = blocks("Dim a(3, 4), b(), c\n").into_iter().next() else {
            panic!("expected Dim");
        };
        assert_eq!(constant_dimensions(&dim.variables[0]).unwrap(), Some(vec![3, 4]));
        assert_eq!(constant_dimensions(&dim.variables[1]).unwrap(), Some(vec![]));
        assert_eq!(constant_dimensions(&dim.variables[2]).unwrap(), None);

        let Some(CodeBlock::Dim(dim)) = blocks("Dim a(n)\n").into_iter().next() else {
            panic!("expected Dim");
        };
        assert!(matches!(
            constant_dimensions(&dim.variables[0]),
            Err(TranslationError::InvalidArrayDimension { .. })
        ));
    }
}
