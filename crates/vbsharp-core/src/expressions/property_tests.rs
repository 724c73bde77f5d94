// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the expression generator.
//!
//! 1. **Generator never panics** on any token run the lexer produces
//! 2. **Every expression has a valid shape**: operand, unary or binary
//! 3. **Tokens are preserved**: generation neither drops nor invents names
//! 4. **Rendering re-generates**: the rendered form parses to the same shape
//!
//! **DDD Context:** Language Service — Expressions

use proptest::prelude::*;

use super::{Expression, ExpressionSegment, generate};
use crate::source_analysis::{TokenKind, classify_word, lex};

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9]{0,5}".prop_filter("not a reserved word", |name| {
            name != "rem" && classify_word(name) == TokenKind::Name
        }),
        (0u32..1000).prop_map(|n| n.to_string()),
        Just("\"text\"".to_string()),
        Just("Nothing".to_string()),
        Just("obj.Prop".to_string()),
        Just("f(1, x)".to_string()),
    ]
}

fn binary_operator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "+", "-", "*", "/", "\\", "^", "&", "Mod", "=", "<>", "<", ">=", "And", "Or", "Xor",
        "Eqv", "Imp", "Is",
    ])
}

fn expression_source() -> impl Strategy<Value = String> {
    let leaf = operand();
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), binary_operator(), inner.clone())
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("Not {e}")),
            inner.prop_map(|e| format!("-{e}")),
        ]
    })
}

fn has_valid_shape(expression: &Expression) -> bool {
    let segments = expression.segments();
    let shape_ok = match segments {
        [single] => !matches!(single, ExpressionSegment::Operation(_)),
        [ExpressionSegment::Operation(_), operand] => !matches!(operand, ExpressionSegment::Operation(_)),
        [left, ExpressionSegment::Operation(_), right] => {
            !matches!(left, ExpressionSegment::Operation(_))
                && !matches!(right, ExpressionSegment::Operation(_))
        }
        _ => false,
    };
    shape_ok && segments.iter().all(nested_shapes_valid)
}

fn nested_shapes_valid(segment: &ExpressionSegment) -> bool {
    match segment {
        ExpressionSegment::Bracketed(bracketed) => bracketed.expressions.iter().all(has_valid_shape),
        ExpressionSegment::Call(call) => call.arguments.iter().all(has_valid_shape),
        ExpressionSegment::CallSet(call_set) => call_set
            .items
            .iter()
            .all(|item| item.arguments.iter().all(has_valid_shape)),
        _ => true,
    }
}

fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn generator_never_panics(input in "[a-z0-9 +*/\\-()=<>&,.\"]{0,60}") {
        if let Ok(tokens) = lex(&input) {
            let _ = generate(&tokens);
        }
    }

    #[test]
    fn generated_expressions_have_valid_shape(source in expression_source()) {
        let tokens = lex(&source).unwrap_or_default();
        let expressions = generate(&tokens);
        prop_assert!(expressions.is_ok(), "{:?} failed: {:?}", source, expressions);
        let expressions = expressions.unwrap_or_default();
        prop_assert_eq!(expressions.len(), 1);
        prop_assert!(has_valid_shape(&expressions[0]), "bad shape for {:?}", source);
    }

    #[test]
    fn names_are_preserved(source in expression_source()) {
        let tokens = lex(&source).unwrap_or_default();
        let expressions = generate(&tokens).unwrap_or_default();
        let input_names: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind().is_name() || t.kind().is_literal())
            .map(|t| t.content().clone())
            .collect();
        let output_names: Vec<_> = expressions
            .iter()
            .flat_map(Expression::all_tokens)
            .filter(|t| t.kind().is_name() || t.kind().is_literal())
            .map(|t| t.content().clone())
            .collect();
        prop_assert_eq!(input_names, output_names);
    }

    #[test]
    fn rendered_form_regenerates_identically(source in expression_source()) {
        let tokens = lex(&source).unwrap_or_default();
        let expressions = generate(&tokens).unwrap_or_default();
        prop_assume!(expressions.len() == 1);
        let rendered = expressions[0].rendered_content();
        let again = generate(&lex(&rendered).unwrap_or_default()).unwrap_or_default();
        prop_assert_eq!(again.len(), 1);
        prop_assert_eq!(again[0].rendered_content(), rendered);
    }
}
