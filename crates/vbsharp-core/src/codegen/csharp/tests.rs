// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Whole-program translation scenarios.

use super::*;
use crate::source_analysis::{lex, parse};

fn program(source: &str) -> Result<TranslatedProgram> {
    let blocks = parse(lex(source).unwrap()).unwrap();
    CodeBlockTranslator::new(TranslatorOptions::default()).translate_program(&blocks)
}

fn lines(source: &str) -> Vec<String> {
    program(source)
        .unwrap()
        .statements
        .into_iter()
        .map(|s| s.content)
        .collect()
}

fn position(lines: &[String], line: &str) -> usize {
    lines
        .iter()
        .position(|l| l == line)
        .unwrap_or_else(|| panic!("missing `{line}` in {lines:#?}"))
}

fn position_after(lines: &[String], start: usize, line: &str) -> usize {
    lines[start..]
        .iter()
        .position(|l| l == line)
        .map(|offset| start + offset)
        .unwrap_or_else(|| panic!("missing `{line}` after line {start} in {lines:#?}"))
}

fn has(lines: &[String], line: &str) -> bool {
    lines.iter().any(|l| l == line)
}

#[test]
fn outermost_variables_split_between_outer_and_environment() {
    let program = program("Dim x\nx = 5\ny = x + 1\n").unwrap();
    let lines: Vec<String> = program.statements.iter().map(|s| s.content.clone()).collect();
    assert!(has(&lines, "_outer.x = 5;"));
    assert!(has(&lines, "_env.y = _.ADD(_outer.x, 1);"));

    let outer = position(&lines, "public class GlobalReferences");
    let environment = position(&lines, "public class EnvironmentReferences");
    let x_field = position_after(&lines, outer, "public object x { get; set; }");
    assert!(x_field < environment);
    position_after(
        &lines,
        environment,
        "public object y { get; set; } // Undeclared in source",
    );

    assert_eq!(
        program.warnings,
        vec![TranslationWarning::UndeclaredVariable {
            name: "y".into(),
            line: 3,
        }]
    );
}

#[test]
fn rendered_program_is_a_namespace_of_classes() {
    let rendered = program("x = 1\n").unwrap().render();
    assert!(rendered.starts_with("using System;\n"));
    assert!(rendered.contains("namespace TranslatedProgram\n{\n"));
    assert!(rendered.contains("    public class Runner\n"));
    assert!(rendered.ends_with("}\n"));
}

#[test]
fn external_dependencies_are_environment_fields() {
    let options = TranslatorOptions::default()
        .with_namespace("Acme")
        .with_external_dependency("WScript");
    let blocks = parse(lex("WScript.Echo \"hi\"\n").unwrap()).unwrap();
    let program = CodeBlockTranslator::new(options).translate_program(&blocks).unwrap();
    let lines: Vec<String> = program.statements.iter().map(|s| s.content.clone()).collect();

    assert!(has(&lines, "namespace Acme"));
    assert!(lines.iter().any(|l| l.contains("_env.wscript")));
    let environment = position(&lines, "public class EnvironmentReferences");
    // Supplied by the host, so not marked as undeclared.
    position_after(&lines, environment, "public object wscript { get; set; }");
    assert!(program.warnings.is_empty());
}

#[test]
fn do_loop_orientations() {
    let pre_while = lines("Do While x\n  y = 1\nLoop\n");
    assert!(has(&pre_while, "while (_.IF(_env.x))"));
    assert!(has(&pre_while, "_env.y = 1;"));

    let pre_until = lines("Do Until x\n  y = 1\nLoop\n");
    assert!(has(&pre_until, "while (!_.IF(_env.x))"));

    let post_while = lines("Do\n  y = 1\nLoop While x\n");
    let start = position(&post_while, "do");
    position_after(&post_while, start, "} while (_.IF(_env.x));");

    let post_until = lines("Do\n  y = 1\nLoop Until x\n");
    assert!(has(&post_until, "} while (!_.IF(_env.x));"));

    let wend = lines("While x\n  y = 1\nWend\n");
    assert!(has(&wend, "while (_.IF(_env.x))"));
}

#[test]
fn empty_conditional_do_loops_keep_their_orientation() {
    assert!(has(&lines("Do While x\nLoop\n"), "while (_.IF(_env.x)) { }"));
    assert!(has(&lines("Do Until x\nLoop\n"), "while (!_.IF(_env.x)) { }"));
    assert!(has(&lines("Do\nLoop While x\n"), "do { } while (_.IF(_env.x));"));
    assert!(has(&lines("Do\nLoop Until x\n"), "do { } while (!_.IF(_env.x));"));

    let trapped = lines("On Error Resume Next\nDo\nLoop Until x\n");
    assert!(has(&trapped, "do { } while (!_.IF(() => _env.x, errOn1));"));
}

#[test]
fn empty_unconditional_do_loop_is_flagged() {
    let program = program("Do\nLoop\n").unwrap();
    assert!(program.statements.iter().any(|s| s.content == "while (true) { }"));
    assert!(
        program
            .warnings
            .contains(&TranslationWarning::SuspiciousInfiniteLoop { line: 1 })
    );
}

#[test]
fn constant_for_loops() {
    let ascending = lines("Dim i\nFor i = 1 To 3\n  y = i\nNext\n");
    assert!(has(
        &ascending,
        "for (_outer.i = 1; _.IF(_.LTE(_outer.i, 3)); _outer.i = _.ADD(_outer.i, 1))"
    ));

    let descending = lines("Dim i\nFor i = 3 To 1 Step -1\n  y = i\nNext\n");
    assert!(has(
        &descending,
        "for (_outer.i = 3; _.IF(_.GTE(_outer.i, 1)); _outer.i = _.ADD(_outer.i, -1))"
    ));
}

#[test]
fn trapped_for_loop_test_is_error_tolerant() {
    let lines = lines("On Error Resume Next\nDim i\nFor i = 1 To 3\n  y = i\nNext\n");
    assert!(has(
        &lines,
        "for (_outer.i = 1; _.IF(() => _.LTE(_outer.i, 3), errOn1); _outer.i = _.ADD(_outer.i, 1))"
    ));
}

#[test]
fn provably_empty_for_loop_is_removed() {
    for source in [
        "Dim i\nFor i = 5 To 1\n  y = i\nNext\n",
        "Dim i\nFor i = 1 To 5 Step -1\n  y = i\nNext\n",
    ] {
        let program = program(source).unwrap();
        assert!(!program.statements.iter().any(|s| s.content.starts_with("for (")));
        assert!(
            program
                .warnings
                .contains(&TranslationWarning::EmptyForLoopRemoved { line: 2 })
        );
    }
}

#[test]
fn variable_for_bound_is_evaluated_once() {
    let lines = lines("Dim i, n\nFor i = 1 To n\n  y = i\nNext\n");
    let bound = position(&lines, "object loopEnd1 = _.NUM(_outer.n);");
    let header = position(
        &lines,
        "for (_outer.i = 1; _.IF(_.LTE(_outer.i, loopEnd1)); _outer.i = _.ADD(_outer.i, 1))",
    );
    assert!(bound < header);
}

#[test]
fn select_case_becomes_if_chain() {
    let lines = lines(
        "Select Case x\n  Case 1\n    y = 1\n  Case 2, 3\n    y = 2\n  Case Else\n    y = 3\nEnd Select\n",
    );
    let first = position(&lines, "if (_.IF(_.EQ(_.NUM(_env.x), 1)))");
    let second = position_after(
        &lines,
        first,
        "else if (_.IF(_.EQ(_.NUM(_env.x), 2)) || _.IF(_.EQ(_.NUM(_env.x), 3)))",
    );
    position_after(&lines, second, "else");
    assert!(!lines.iter().any(|l| l.contains("switch") || l == "break;"));
}

#[test]
fn select_case_strings_compare_loosely_after_first_value() {
    let lines = lines("Select Case s\n  Case \"a\", \"b\"\n    y = 1\nEnd Select\n");
    assert!(has(
        &lines,
        "if (_.IF(_.EQ(_env.s, \"a\")) || _.IF(_.LOOSEEQ(_env.s, \"b\")))"
    ));
}

#[test]
fn numeric_literal_select_target() {
    let lines = lines("Select Case 1\n  Case 1, 2\n    y = 1\n  Case z\n    y = 2\nEnd Select\n");
    let first = position(&lines, "if ((1 == 1) || (1 == 2))");
    position_after(&lines, first, "else if (_.IF(_.EQ(1, _.NUM(_env.z))))");
}

#[test]
fn trapped_select_target_guards_every_case() {
    let lines = lines(
        "On Error Resume Next\nSelect Case F()\n  Case 1\n    y = 1\nEnd Select\nFunction F()\nEnd Function\n",
    );
    let flag = position(&lines, "var selectExpressionEvaluated1 = false;");
    let temp = position_after(&lines, flag, "object selectExpression1 = null;");
    let evaluation = lines
        .iter()
        .position(|l| l.ends_with("selectExpressionEvaluated1 = true; });"))
        .unwrap();
    assert!(lines[evaluation].starts_with("_.HANDLEERROR(errOn1, () => { selectExpression1 = "));
    let guard = position(&lines, "if (selectExpressionEvaluated1)");
    assert!(temp < evaluation && evaluation < guard);
}

#[test]
fn with_block_directs_leading_dot_access() {
    let lines = lines("With obj\n  .Name = 1\nEnd With\n");
    let temp = position(&lines, "object with1 = _.OBJ(_env.obj);");
    let set = position(&lines, "_.SET(1, this, with1, \"Name\");");
    assert!(temp < set);
}

#[test]
fn leading_dot_outside_with_is_rejected() {
    let error = program(".Name = 1\n").unwrap_err();
    assert!(matches!(error, TranslationError::MissingWithTarget { line: 1 }));
}

#[test]
fn undeclared_names_in_a_function_are_declared_once() {
    let lines = lines("Function F()\n  a = 1\n  a = a + 1\n  F = a\nEnd Function\n");
    let declarations = lines
        .iter()
        .filter(|l| l.as_str() == "object a = null; // Undeclared in source")
        .count();
    assert_eq!(declarations, 1);
    assert!(has(&lines, "a = _.ADD(a, 1);"));
}

#[test]
fn duplicate_dim_is_a_redefinition() {
    let error = program("Sub S()\n  Dim a\n  Dim a\nEnd Sub\n").unwrap_err();
    assert!(matches!(error, TranslationError::NameRedefined { ref name, .. } if name == "a"));

    let error = program("Dim a\nDim a\n").unwrap_err();
    assert!(matches!(error, TranslationError::NameRedefined { ref name, .. } if name == "a"));
}

#[test]
fn exit_for_from_inside_do_sets_flag() {
    let lines = lines("Dim i\nFor i = 1 To 10\n  Do\n    Exit For\n  Loop\nNext\n");
    let flag = position(&lines, "var exitFor1 = false;");
    let header = position_after(
        &lines,
        flag,
        "for (_outer.i = 1; _.IF(_.LTE(_outer.i, 10)); _outer.i = _.ADD(_outer.i, 1))",
    );
    let inner = position_after(&lines, header, "while (true)");
    let set = position_after(&lines, inner, "exitFor1 = true;");
    assert_eq!(lines[set + 1], "break;");
    let check = position_after(&lines, set, "if (exitFor1)");
    assert_eq!(lines[check + 1], "break;");
}

#[test]
fn by_ref_parameter_is_aliased_inside_error_trapping() {
    let lines = lines("Function F(a)\n  On Error Resume Next\n  F = a + 1\nEnd Function\n");
    let alias = position(&lines, "object byrefalias1 = a;");
    let call = position_after(
        &lines,
        alias,
        "_.HANDLEERROR(errOn1, () => { retVal1 = _.ADD(byrefalias1, 1); });",
    );
    let finally = position_after(&lines, call, "finally");
    position_after(&lines, finally, "a = byrefalias1;");
}

#[test]
fn by_ref_parameter_passed_on_is_aliased() {
    let lines = lines("Sub S(a)\n  x = G(a)\nEnd Sub\nFunction G(b)\nEnd Function\n");
    let alias = position(&lines, "object byrefalias1 = a;");
    let call = lines
        .iter()
        .position(|l| l.contains("_.ARGS.Ref(byrefalias1, v1 => { byrefalias1 = v1; })"))
        .unwrap();
    assert!(alias < call);
    position_after(&lines, call, "a = byrefalias1;");
}

#[test]
fn private_outermost_function_is_made_public() {
    let program = program("Private Function F()\nEnd Function\n").unwrap();
    assert!(program.statements.iter().any(|s| s.content == "public object f()"));
    assert_eq!(
        program.warnings,
        vec![TranslationWarning::FunctionMadePublic {
            name: "F".into(),
            line: 1,
        }]
    );
}

#[test]
fn later_function_definition_wins() {
    let program = program("Sub S()\n  x = 1\nEnd Sub\nSub S()\n  x = 2\nEnd Sub\n").unwrap();
    let lines: Vec<&str> = program.statements.iter().map(|s| s.content.as_str()).collect();
    assert_eq!(lines.iter().filter(|l| **l == "public void s()").count(), 1);
    assert!(lines.contains(&"x = 2;"));
    assert!(!lines.contains(&"x = 1;"));
    assert!(
        program
            .warnings
            .iter()
            .any(|w| matches!(w, TranslationWarning::DuplicateFunctionReplaced { .. }))
    );
}

#[test]
fn property_outside_class_is_rejected() {
    let error = program("Property Get P()\nEnd Property\n").unwrap_err();
    assert!(matches!(error, TranslationError::PropertyOutsideClass { .. }));
}

#[test]
fn duplicate_class_is_rejected() {
    let error = program("Class C\nEnd Class\nClass C\nEnd Class\n").unwrap_err();
    assert!(matches!(error, TranslationError::DuplicateClass { .. }));
}

#[test]
fn class_and_function_cannot_share_a_name() {
    let error = program("Class C\nEnd Class\nSub C()\nEnd Sub\n").unwrap_err();
    assert!(matches!(error, TranslationError::NameRedefined { .. }));
}

#[test]
fn outermost_error_trapping_uses_a_token() {
    let lines = lines("On Error Resume Next\nx = 1\n");
    let token = position(&lines, "var errOn1 = _.GETERRORTRAPPINGTOKEN();");
    let start = position_after(&lines, token, "_.STARTERRORTRAPPINGANDCLEARANYERROR(errOn1);");
    let statement = position_after(&lines, start, "_.HANDLEERROR(errOn1, () => { _env.x = 1; });");
    position_after(&lines, statement, "_.RELEASEERRORTRAPPINGTOKEN(errOn1);");
}

#[test]
fn if_chain_with_else() {
    let lines = lines("If a > 1 Then\n  y = 1\nElseIf a < 0 Then\n  y = 2\nElse\n  y = 3\nEnd If\n");
    let first = position(&lines, "if (_.IF(_.GT(_env.a, 1)))");
    let second = position_after(&lines, first, "else if (_.IF(_.LT(_env.a, 0)))");
    let otherwise = position_after(&lines, second, "else");
    position_after(&lines, otherwise, "_env.y = 3;");
}

#[test]
fn aliased_later_condition_nests_inside_else() {
    let lines = lines(
        "Function F(a)\n  On Error Resume Next\n  If a Then\n    F = 1\n  ElseIf a Then\n    F = 2\n  End If\nEnd Function\n",
    );
    let first = position(&lines, "if (ifResult1)");
    let otherwise = position_after(&lines, first, "else");
    assert_eq!(lines[otherwise + 1], "{");
    position_after(&lines, otherwise, "if (ifResult2)");
    assert!(!has(&lines, "else if (ifResult2)"));
}

#[test]
fn for_each_assigns_loop_variable_each_iteration() {
    let lines = lines("For Each item In items\n  y = item\nNext\n");
    let header = position(&lines, "foreach (var loopValue1 in _.ENUMERABLE(_env.items))");
    assert_eq!(lines[header + 1], "{");
    assert_eq!(lines[header + 2], "_env.item = loopValue1;");
}

#[test]
fn erase_single_variable_writes_back() {
    let lines = lines("Dim a\nErase a\n");
    assert!(has(&lines, "_.ERASE(_outer.a, v1 => { _outer.a = v1; });"));
}

#[test]
fn erase_of_several_targets_fails_at_runtime() {
    let lines = lines("Dim a, b\nErase a, b\n");
    let first = position(&lines, "_.VAL(_outer.a);");
    position_after(&lines, first, "_.VAL(_outer.b);");
    assert!(lines.iter().any(|l| l.contains("TypeMismatchException")));
}
