// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Aliasing of by-ref parameters captured by lambdas.
//!
//! C# rejects `ref` parameters inside lambdas, but the translation needs
//! lambdas for error trapping (`_.HANDLEERROR(errOn1, () => { ... })`) and
//! for by-ref argument write-back (`.Ref(a, v1 => { a = v1; })`). When an
//! evaluation would capture such a parameter it is copied into a local
//! first and copied back afterwards, even if the evaluation throws:
//!
//! ```csharp
//! object byrefalias1 = a;
//! try
//! {
//!     _.HANDLEERROR(errOn1, () => { byrefalias1 = 1; });
//! }
//! finally
//! {
//!     a = byrefalias1;
//! }
//! ```

use ecow::EcoString;

use crate::expressions::{Expression, ExpressionSegment};
use crate::source_analysis::Token;

use super::expressions::NameReference;
use super::scope::{ByRefAlias, ScopeAccessInformation};
use super::{CodeBlockTranslator, Result, TranslatedStatement, TranslationResult};

impl CodeBlockTranslator {
    /// Unaliased by-ref parameters that evaluating `expressions` would
    /// capture in a lambda, in first-reference order.
    ///
    /// With an error registration token the whole evaluation runs inside a
    /// lambda, so every reference counts. Otherwise only parameters passed
    /// by reference to a non-built-in call are captured.
    pub(super) fn by_ref_parameters_to_alias(
        &self,
        expressions: &[&Expression],
        scope: &ScopeAccessInformation,
    ) -> Vec<EcoString> {
        let inside_lambda = scope.error_registration_token().is_some();
        self.collect_by_ref_parameters(expressions, scope, inside_lambda)
    }

    /// Unaliased by-ref parameters passed by reference to a call in
    /// `expressions`, for evaluations that never run inside an error
    /// trapping lambda (loop headers).
    pub(super) fn by_ref_parameters_passed_to_calls(
        &self,
        expressions: &[&Expression],
        scope: &ScopeAccessInformation,
    ) -> Vec<EcoString> {
        self.collect_by_ref_parameters(expressions, scope, false)
    }

    fn collect_by_ref_parameters(
        &self,
        expressions: &[&Expression],
        scope: &ScopeAccessInformation,
        inside_lambda: bool,
    ) -> Vec<EcoString> {
        let mut found = Vec::new();
        for expression in expressions {
            self.visit_expression(expression, scope, inside_lambda, &mut found);
        }
        found
    }

    fn visit_expression(
        &self,
        expression: &Expression,
        scope: &ScopeAccessInformation,
        inside_lambda: bool,
        found: &mut Vec<EcoString>,
    ) {
        for segment in expression.segments() {
            match segment {
                ExpressionSegment::Call(call) => {
                    let first = (!call.leading_accessor)
                        .then(|| call.member_access_tokens.first())
                        .flatten();
                    let callee_is_built_in = first.is_some_and(|token| {
                        call.member_access_tokens.len() == 1
                            && self.classify_name(token, scope) == NameReference::BuiltInFunction
                    });
                    if let Some(first) = first {
                        self.visit_name(first, scope, inside_lambda, found);
                    }
                    self.visit_arguments(&call.arguments, scope, inside_lambda, !callee_is_built_in, found);
                }
                ExpressionSegment::CallSet(call_set) => {
                    for (index, item) in call_set.items.iter().enumerate() {
                        let first = (index == 0 && !call_set.leading_accessor)
                            .then(|| item.member_access_tokens.first())
                            .flatten();
                        let callee_is_built_in = first.is_some_and(|token| {
                            item.member_access_tokens.len() == 1
                                && self.classify_name(token, scope) == NameReference::BuiltInFunction
                        });
                        if let Some(first) = first {
                            self.visit_name(first, scope, inside_lambda, found);
                        }
                        self.visit_arguments(&item.arguments, scope, inside_lambda, !callee_is_built_in, found);
                    }
                }
                ExpressionSegment::Bracketed(bracketed) => {
                    for inner in &bracketed.expressions {
                        self.visit_expression(inner, scope, inside_lambda, found);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_arguments(
        &self,
        arguments: &[Expression],
        scope: &ScopeAccessInformation,
        inside_lambda: bool,
        passes_by_ref: bool,
        found: &mut Vec<EcoString>,
    ) {
        for argument in arguments {
            match self.by_ref_argument(argument, scope) {
                Some(token) if passes_by_ref => self.visit_name(token, scope, true, found),
                _ => self.visit_expression(argument, scope, inside_lambda, found),
            }
        }
    }

    fn visit_name(
        &self,
        token: &Token,
        scope: &ScopeAccessInformation,
        inside_lambda: bool,
        found: &mut Vec<EcoString>,
    ) {
        if !inside_lambda {
            return;
        }
        let rewritten = self.rewrite_token(token);
        if scope.is_unaliased_by_ref_parameter(&rewritten) && !found.contains(&rewritten) {
            found.push(rewritten);
        }
    }

    /// Runs `body` with `parameters` aliased, emitting the capture before
    /// and the restore in a `finally` after.
    ///
    /// With no parameters `body` runs directly at `indentation_depth`.
    pub(super) fn with_by_ref_aliases(
        &self,
        parameters: &[EcoString],
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
        line_index: usize,
        mut result: TranslationResult,
        body: impl FnOnce(&ScopeAccessInformation, usize, TranslationResult) -> Result<TranslationResult>,
    ) -> Result<TranslationResult> {
        if parameters.is_empty() {
            return body(scope, indentation_depth, result);
        }

        let mut aliased_scope = scope.clone();
        let mut aliases = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            let (alias, next) = aliased_scope.reserve_temp("byrefalias");
            aliased_scope = next;
            result.reserve(alias.clone());
            result.push(TranslatedStatement::new(
                format!("object {alias} = {parameter};"),
                indentation_depth,
                line_index,
            ));
            aliases.push(ByRefAlias {
                parameter: parameter.clone(),
                alias,
            });
        }
        let aliased_scope = aliased_scope.extend_by_ref_aliases(aliases.iter().cloned());

        result.push_skeleton("try", indentation_depth);
        result.push_skeleton("{", indentation_depth);
        let mut result = body(&aliased_scope, indentation_depth + 1, result)?;
        result.push_skeleton("}", indentation_depth);
        result.push_skeleton("finally", indentation_depth);
        result.push_skeleton("{", indentation_depth);
        for alias in &aliases {
            result.push(TranslatedStatement::new(
                format!("{} = {};", alias.parameter, alias.alias),
                indentation_depth + 1,
                line_index,
            ));
        }
        result.push_skeleton("}", indentation_depth);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionKind, Parameter};
    use crate::codegen::csharp::TranslatorOptions;
    use crate::expressions::generate;
    use crate::source_analysis::{TokenKind, lex};

    fn expression(source: &str) -> Expression {
        let tokens: Vec<Token> = lex(source)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind() != TokenKind::EndOfStatement)
            .collect();
        generate(&tokens).unwrap().remove(0)
    }

    fn function_scope(error_token: bool) -> ScopeAccessInformation {
        let parameter = |name: &str, by_ref: bool| {
            (
                Parameter {
                    name: Token::new(TokenKind::Name, name, 0),
                    by_ref,
                    is_array: false,
                },
                EcoString::from(name),
            )
        };
        let scope = ScopeAccessInformation::outermost([]).for_function(
            "f",
            FunctionKind::Sub,
            [parameter("a", true), parameter("b", false)],
        );
        scope.with_error_registration_token(error_token.then(|| "errOn1".into()))
    }

    fn translator() -> CodeBlockTranslator {
        CodeBlockTranslator::new(TranslatorOptions::default())
    }

    #[test]
    fn plain_reference_needs_no_alias() {
        let e = expression("a + 1");
        assert!(translator().by_ref_parameters_to_alias(&[&e], &function_scope(false)).is_empty());
    }

    #[test]
    fn by_ref_argument_is_captured() {
        let e = expression("g(a, b)");
        assert_eq!(
            translator().by_ref_parameters_to_alias(&[&e], &function_scope(false)),
            vec![EcoString::from("a")]
        );
    }

    #[test]
    fn built_in_arguments_are_not_captured() {
        let e = expression("Len(a)");
        assert!(translator().by_ref_parameters_to_alias(&[&e], &function_scope(false)).is_empty());
    }

    #[test]
    fn error_trapping_captures_every_reference() {
        let e = expression("a + b");
        assert_eq!(
            translator().by_ref_parameters_to_alias(&[&e], &function_scope(true)),
            vec![EcoString::from("a")]
        );
    }

    #[test]
    fn loop_headers_only_capture_by_ref_arguments() {
        let scope = function_scope(true);
        let plain = expression("a + 1");
        let call = expression("g(a)");
        assert!(translator().by_ref_parameters_passed_to_calls(&[&plain], &scope).is_empty());
        assert_eq!(
            translator().by_ref_parameters_passed_to_calls(&[&call], &scope),
            vec![EcoString::from("a")]
        );
    }

    #[test]
    fn alias_wrapper_restores_in_finally() {
        let scope = function_scope(true);
        let result = translator()
            .with_by_ref_aliases(
                &["a".into()],
                &scope,
                2,
                0,
                TranslationResult::new(),
                |inner, depth, mut result| {
                    assert_eq!(inner.by_ref_alias("a").map(EcoString::as_str), Some("byrefalias1"));
                    result.push(TranslatedStatement::new("body();", depth, 0));
                    Ok(result)
                },
            )
            .unwrap();
        let lines: Vec<_> = result
            .translated_statements
            .iter()
            .map(|s| (s.content.as_str(), s.indentation_depth))
            .collect();
        assert_eq!(
            lines,
            [
                ("object byrefalias1 = a;", 2),
                ("try", 2),
                ("{", 2),
                ("body();", 3),
                ("}", 2),
                ("finally", 2),
                ("{", 2),
                ("a = byrefalias1;", 3),
                ("}", 2),
            ]
        );
        assert_eq!(result.reserved_names, vec![EcoString::from("byrefalias1")]);
    }
}
