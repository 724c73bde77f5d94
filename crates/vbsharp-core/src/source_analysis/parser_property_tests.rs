// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the block parser.
//!
//! Random trees of nested block kinds are rendered as VBScript, parsed, and
//! the parsed tree must have the same shape.
//!
//! **DDD Context:** Source Analysis

use proptest::prelude::*;

use super::lexer::lex;
use super::parser::parse;
use crate::ast::{CaseValues, CodeBlock};

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Assignment,
    If(Vec<Shape>),
    For(Vec<Shape>),
    Do(Vec<Shape>),
    With(Vec<Shape>),
    Select(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = Just(Shape::Assignment);
    leaf.prop_recursive(4, 32, 3, |inner| {
        let body = prop::collection::vec(inner, 0..3);
        prop_oneof![
            body.clone().prop_map(Shape::If),
            body.clone().prop_map(Shape::For),
            body.clone().prop_map(Shape::Do),
            body.clone().prop_map(Shape::With),
            body.prop_map(Shape::Select),
        ]
    })
}

fn render(shape: &Shape, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let (open, close, body) = match shape {
        Shape::Assignment => {
            out.push_str(&format!("{indent}x = 1\n"));
            return;
        }
        Shape::If(body) => ("If x Then".to_string(), "End If", body),
        Shape::For(body) => ("For i = 1 To 3".to_string(), "Next", body),
        Shape::Do(body) => ("Do While x".to_string(), "Loop", body),
        Shape::With(body) => ("With obj".to_string(), "End With", body),
        Shape::Select(body) => (format!("Select Case x\n{indent}  Case 1"), "End Select", body),
    };
    out.push_str(&format!("{indent}{open}\n"));
    for child in body {
        render(child, depth + 2, out);
    }
    out.push_str(&format!("{indent}{close}\n"));
}

fn shape_of(block: &CodeBlock) -> Option<Shape> {
    let children =
        |statements: &[CodeBlock]| -> Vec<Shape> { statements.iter().filter_map(shape_of).collect() };
    match block {
        CodeBlock::ValueSetting(_) => Some(Shape::Assignment),
        CodeBlock::If(block) => Some(Shape::If(children(&block.clauses[0].statements))),
        CodeBlock::For(block) => Some(Shape::For(children(&block.statements))),
        CodeBlock::Do(block) => Some(Shape::Do(children(&block.statements))),
        CodeBlock::With(block) => Some(Shape::With(children(&block.statements))),
        CodeBlock::Select(block) => {
            let case = &block.cases[0];
            assert!(matches!(case.values, CaseValues::Values(_)));
            Some(Shape::Select(children(&case.statements)))
        }
        _ => None,
    }
}

fn source_for(shapes: &[Shape]) -> String {
    let mut source = String::new();
    for shape in shapes {
        render(shape, 0, &mut source);
    }
    source
}

proptest! {
    #[test]
    fn nested_blocks_keep_their_shape(shapes in prop::collection::vec(shape(), 1..4)) {
        let source = source_for(&shapes);
        let tokens = lex(&source);
        prop_assert!(tokens.is_ok(), "lex failed for {:?}", source);
        let blocks = parse(tokens.unwrap_or_default());
        prop_assert!(blocks.is_ok(), "parse failed for {:?}: {:?}", source, blocks);
        let parsed: Vec<Shape> = blocks.unwrap_or_default().iter().filter_map(shape_of).collect();
        prop_assert_eq!(parsed, shapes);
    }

    #[test]
    fn nested_blocks_translate_with_balanced_braces(shapes in prop::collection::vec(shape(), 1..4)) {
        let source = source_for(&shapes);
        let program = crate::translate(&source, &crate::codegen::csharp::TranslatorOptions::default());
        prop_assert!(program.is_ok(), "translation failed for {:?}: {:?}", source, program);
        let rendered = program.map(|p| p.render()).unwrap_or_default();
        let opened = rendered.matches('{').count();
        let closed = rendered.matches('}').count();
        prop_assert_eq!(opened, closed, "unbalanced braces for {:?}", source);
    }
}
