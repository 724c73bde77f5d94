// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Functions, subs and property accessors.
//!
//! **DDD Context:** Compilation — Code Generation
//!
//! Each routine becomes one C# method. Parameters are `ref object` unless
//! declared `ByVal`. A routine that produces a value assigns to a
//! `retValN` local and returns it at the end:
//!
//! ```csharp
//! public object add(ref object a, object b)
//! {
//!     object retVal1 = null;
//!     retVal1 = _.ADD(a, b);
//!     return retVal1;
//! }
//! ```
//!
//! A body consisting of one assignment to the routine's own name skips the
//! temporary and becomes `return expr;`. A body containing
//! `On Error Resume Next` obtains an error trapping token on entry and
//! releases it in a `finally`.

use ecow::EcoString;

use crate::ast::{CodeBlock, FunctionBlock, Parameter, ValueSetType, Visibility};
use crate::expressions::{Expression, ExpressionSegment};

use super::declarations::collect_declared_names;
use super::expressions::{ValueContext, generate_single};
use super::naming::{csharp_string_literal, property_method_name};
use super::scope::{NameLocation, ScopeAccessInformation, ScopedName};
use super::{
    CodeBlockTranslator, Result, STATEMENT_HANDLERS, TranslatedStatement, TranslationError,
    TranslationResult,
};

/// True when `blocks` enable error trapping anywhere below them.
pub(super) fn contains_on_error_resume_next(blocks: &[CodeBlock]) -> bool {
    blocks.iter().any(|block| match block {
        CodeBlock::OnErrorResumeNext(_) => true,
        CodeBlock::Function(_) | CodeBlock::Class(_) => false,
        nested => nested
            .nested_content()
            .into_iter()
            .any(contains_on_error_resume_next),
    })
}

impl CodeBlockTranslator {
    /// The C# method name for a routine: its rewritten name, prefixed with
    /// the accessor kind for properties.
    pub(super) fn method_name(&self, function: &FunctionBlock) -> EcoString {
        property_method_name(function.kind, &self.rewrite_token(&function.name))
    }

    /// Translates one routine at `indentation_depth` (the depth of its
    /// signature).
    ///
    /// # Errors
    ///
    /// Returns [`TranslationError::NameRedefined`] for repeated parameter
    /// names or a local that repeats a parameter, and propagates errors
    /// from the body.
    pub(super) fn translate_function(
        &self,
        function: &FunctionBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
    ) -> Result<TranslationResult> {
        let rewritten = self.rewrite_token(&function.name);
        let line_index = function.keyword.line_index();

        let mut parameters: Vec<(Parameter, EcoString)> = Vec::with_capacity(function.parameters.len());
        for parameter in &function.parameters {
            let name = self.rewrite_token(&parameter.name);
            if parameters.iter().any(|(_, seen)| seen.eq_ignore_ascii_case(&name)) {
                return Err(TranslationError::NameRedefined {
                    name: parameter.name.content().clone(),
                    line: parameter.name.line_index() + 1,
                });
            }
            parameters.push((parameter.clone(), name));
        }
        let signature_parameters = parameters
            .iter()
            .map(|(parameter, name)| {
                if parameter.by_ref {
                    format!("ref object {name}")
                } else {
                    format!("object {name}")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let function_scope = scope.for_function(rewritten.clone(), function.kind, parameters);
        let declared = collect_declared_names(&function.statements);
        let implicit = self.implicit_declarations(&declared, &function_scope);
        let locals = declared
            .explicit
            .iter()
            .chain(&implicit)
            .map(|token| {
                ScopedName::new(
                    token.content().clone(),
                    self.rewrite_token(token),
                    NameLocation::WithinFunctionOrProperty,
                    token.line_index(),
                )
            })
            .collect::<Vec<_>>();
        let function_scope = function_scope.extend_variables(locals);

        let mut result = TranslationResult::new();
        let visibility = match function.visibility {
            Visibility::Public => "public",
            Visibility::Private => "private",
        };
        let return_type = if function.kind.returns_value() { "object" } else { "void" };
        if function.is_default {
            result.push(TranslatedStatement::new("[IsDefault]", indentation_depth, line_index));
        }
        if function.kind.is_property() {
            result.push(TranslatedStatement::new(
                format!("[TranslatedProperty({})]", csharp_string_literal(function.name.content())),
                indentation_depth,
                line_index,
            ));
        }
        result.push(TranslatedStatement::new(
            format!(
                "{visibility} {return_type} {}({signature_parameters})",
                self.method_name(function)
            ),
            indentation_depth,
            line_index,
        ));
        result.push_skeleton("{", indentation_depth);

        let body_depth = indentation_depth + 1;
        if let Some(expression) = self.single_return_expression(function, &rewritten, &function_scope)? {
            let mut body = TranslationResult::new();
            let value = self.translate_expression(&expression, &function_scope, ValueContext::Value, &mut body)?;
            body.push(TranslatedStatement::new(
                format!("return {value};"),
                body_depth,
                expression.line_index(),
            ));
            result = result.add(self.flush_declarations(body, &function_scope, body_depth)?);
            result.push_skeleton("}", indentation_depth);
            return Ok(without_locals(result));
        }

        let return_value = function.kind.returns_value().then(|| {
            let (name, _) = function_scope.reserve_temp("retVal");
            name
        });
        let function_scope = function_scope
            .extend_reserved(&return_value)
            .with_return_value_name(return_value.clone());
        let error_token = contains_on_error_resume_next(&function.statements).then(|| {
            let (name, _) = function_scope.reserve_temp("errOn");
            name
        });
        let function_scope = function_scope
            .extend_reserved(&error_token)
            .with_error_registration_token(error_token.clone());

        if let Some(return_value) = &return_value {
            result.push(TranslatedStatement::new(
                format!("object {return_value} = null;"),
                body_depth,
                line_index,
            ));
        }
        for token in &implicit {
            result.push(TranslatedStatement::new(
                format!("object {} = null;", self.rewrite_token(token)),
                body_depth,
                token.line_index(),
            ));
        }

        match &error_token {
            Some(token) => {
                result.push(TranslatedStatement::new(
                    format!("var {token} = _.GETERRORTRAPPINGTOKEN();"),
                    body_depth,
                    line_index,
                ));
                result.push_skeleton("try", body_depth);
                result.push_skeleton("{", body_depth);
                let body = self.translate_common(
                    STATEMENT_HANDLERS,
                    &function.statements,
                    &function_scope,
                    body_depth + 1,
                )?;
                result = result.add(body);
                result.push_skeleton("}", body_depth);
                result.push_skeleton("finally", body_depth);
                result.push_skeleton("{", body_depth);
                result.push(TranslatedStatement::new(
                    format!("_.RELEASEERRORTRAPPINGTOKEN({token});"),
                    body_depth + 1,
                    line_index,
                ));
                result.push_skeleton("}", body_depth);
            }
            None => {
                let body = self.translate_common(
                    STATEMENT_HANDLERS,
                    &function.statements,
                    &function_scope,
                    body_depth,
                )?;
                result = result.add(body);
            }
        }

        if let Some(return_value) = &return_value {
            result.push_skeleton(format!("return {return_value};"), body_depth);
        }
        result.push_skeleton("}", indentation_depth);
        Ok(without_locals(result))
    }

    /// The value of a body that is exactly one assignment to the routine's
    /// own name, when that can be returned directly.
    fn single_return_expression(
        &self,
        function: &FunctionBlock,
        rewritten: &EcoString,
        scope: &ScopeAccessInformation,
    ) -> Result<Option<Expression>> {
        if !function.kind.returns_value() {
            return Ok(None);
        }
        let mut executable = function
            .statements
            .iter()
            .filter(|block| !matches!(block, CodeBlock::BlankLine(_)));
        let (Some(CodeBlock::ValueSetting(statement)), None) = (executable.next(), executable.next())
        else {
            return Ok(None);
        };
        let [target] = statement.target.as_slice() else {
            return Ok(None);
        };
        if statement.set_type == ValueSetType::Set
            || !self.rewrite_token(target).eq_ignore_ascii_case(rewritten)
        {
            return Ok(None);
        }

        let value = generate_single(&statement.expression, statement.line_index())?;
        let references_self = value
            .all_tokens()
            .iter()
            .any(|token| token.kind().is_name() && self.rewrite_token(token).eq_ignore_ascii_case(rewritten));
        if references_self
            || has_leading_accessor(&value)
            || !self.by_ref_parameters_to_alias(&[&value], scope).is_empty()
        {
            return Ok(None);
        }
        Ok(Some(value))
    }
}

/// A leading `.member` needs a `With` target, which a function body
/// never inherits.
fn has_leading_accessor(expression: &Expression) -> bool {
    expression.segments().iter().any(|segment| match segment {
        ExpressionSegment::Call(call) => call.leading_accessor,
        ExpressionSegment::CallSet(call_set) => call_set.leading_accessor,
        _ => false,
    })
}

/// Locals and undeclared names are flushed inside the method, so nothing
/// leaks into the enclosing class or outer scope.
fn without_locals(mut result: TranslationResult) -> TranslationResult {
    result.explicit_variable_declarations.clear();
    result.undeclared_variables_accessed.clear();
    result.reserved_names.clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::csharp::TranslatorOptions;
    use crate::source_analysis::{lex, parse};

    fn function(source: &str) -> FunctionBlock {
        match parse(lex(source).unwrap()).unwrap().into_iter().next() {
            Some(CodeBlock::Function(function)) => function,
            other => panic!("expected a function, got {other:?}"),
        }
    }

    fn translate(source: &str) -> Vec<String> {
        let function = function(source);
        let scope = ScopeAccessInformation::outermost([]).extend_functions([ScopedName::new(
            function.name.content().clone(),
            function.name.content().to_lowercase(),
            NameLocation::OutermostScope,
            0,
        )]);
        CodeBlockTranslator::new(TranslatorOptions::default())
            .translate_function(&function, &scope, 0)
            .unwrap()
            .translated_statements
            .into_iter()
            .map(|s| format!("{}{}", "    ".repeat(s.indentation_depth), s.content))
            .collect()
    }

    #[test]
    fn single_assignment_returns_directly() {
        assert_eq!(
            translate("Function Twice(ByVal x)\n  Twice = x * 2\nEnd Function\n"),
            [
                "public object twice(object x)",
                "{",
                "    return _.MULT(x, 2);",
                "}",
            ]
        );
    }

    #[test]
    fn self_reference_uses_return_temporary() {
        let lines = translate("Function F(n)\n  F = F(n - 1)\nEnd Function\n");
        assert_eq!(lines[0], "public object f(ref object n)");
        assert_eq!(lines[2], "    object retVal1 = null;");
        assert!(lines.contains(&"    return retVal1;".to_string()));
    }

    #[test]
    fn sub_has_no_return_value() {
        let lines = translate("Private Sub S()\n  x = 1\nEnd Sub\n");
        assert_eq!(lines[0], "private void s()");
        assert!(!lines.iter().any(|l| l.contains("retVal")));
        assert!(lines.contains(&"    object x = null; // Undeclared in source".to_string()));
    }

    #[test]
    fn on_error_resume_next_takes_a_token() {
        let lines = translate("Sub S()\n  On Error Resume Next\n  Dim a\n  a = 1\nEnd Sub\n");
        assert_eq!(lines[2], "    var errOn1 = _.GETERRORTRAPPINGTOKEN();");
        assert!(lines.contains(&"        _.STARTERRORTRAPPINGANDCLEARANYERROR(errOn1);".to_string()));
        assert!(lines.contains(&"        _.HANDLEERROR(errOn1, () => { a = 1; });".to_string()));
        assert!(lines.contains(&"        _.RELEASEERRORTRAPPINGTOKEN(errOn1);".to_string()));
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let function = function("Sub S(a, A)\nEnd Sub\n");
        let error = CodeBlockTranslator::new(TranslatorOptions::default())
            .translate_function(&function, &ScopeAccessInformation::outermost([]), 0)
            .unwrap_err();
        assert!(matches!(error, TranslationError::NameRedefined { .. }));
    }

    #[test]
    fn error_trapping_is_detected_in_nested_blocks() {
        let function = function("Sub S()\n  If x Then\n    On Error Resume Next\n  End If\nEnd Sub\n");
        assert!(contains_on_error_resume_next(&function.statements));
    }
}
