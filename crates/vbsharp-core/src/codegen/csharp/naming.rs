// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Mapping VBScript identifiers to C# identifiers.
//!
//! VBScript names are case-insensitive and may be bracket-escaped into
//! almost anything; C# names are case-sensitive and reserve a keyword set.
//! A [`NameRewriter`] must map every spelling of one VBScript name to the
//! same C# name, so duplicate detection can compare rewritten names.

use ecow::EcoString;

use crate::ast::FunctionKind;

/// Maps a source identifier to a C#-safe identifier.
pub trait NameRewriter: std::fmt::Debug {
    fn rewrite(&self, name: &str) -> EcoString;
}

/// Lowercases, replaces characters C# does not allow with `_`, prefixes a
/// leading digit with `_` and escapes C# keywords with `@`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNameRewriter;

impl NameRewriter for DefaultNameRewriter {
    fn rewrite(&self, name: &str) -> EcoString {
        let mut rewritten = EcoString::new();
        for c in name.chars().flat_map(char::to_lowercase) {
            if c.is_alphanumeric() || c == '_' {
                rewritten.push(c);
            } else {
                rewritten.push('_');
            }
        }
        if rewritten.is_empty() {
            return "_".into();
        }
        if rewritten.starts_with(|c: char| c.is_ascii_digit()) {
            return format!("_{rewritten}").into();
        }
        if CSHARP_KEYWORDS.contains(&rewritten.as_str()) {
            return format!("@{rewritten}").into();
        }
        rewritten
    }
}

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// C# method name for a property accessor: `get_name`, `let_name`, `set_name`.
#[must_use]
pub fn property_method_name(kind: FunctionKind, rewritten: &str) -> EcoString {
    let bare = rewritten.trim_start_matches('@');
    match kind {
        FunctionKind::PropertyGet => format!("get_{bare}").into(),
        FunctionKind::PropertyLet => format!("let_{bare}").into(),
        FunctionKind::PropertySet => format!("set_{bare}").into(),
        FunctionKind::Function | FunctionKind::Sub => rewritten.into(),
    }
}

/// C# string literal for arbitrary text.
#[must_use]
pub fn csharp_string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '\r' => literal.push_str("\\r"),
            '\n' => literal.push_str("\\n"),
            '\t' => literal.push_str("\\t"),
            '\0' => literal.push_str("\\0"),
            other => literal.push(other),
        }
    }
    literal.push('"');
    literal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(name: &str) -> String {
        DefaultNameRewriter.rewrite(name).to_string()
    }

    #[test]
    fn lowercases_so_spellings_collide() {
        assert_eq!(rewrite("MyVar"), "myvar");
        assert_eq!(rewrite("MYVAR"), rewrite("myvar"));
    }

    #[test]
    fn escapes_csharp_keywords() {
        assert_eq!(rewrite("Object"), "@object");
        assert_eq!(rewrite("string"), "@string");
        assert_eq!(rewrite("customer"), "customer");
    }

    #[test]
    fn replaces_invalid_characters() {
        assert_eq!(rewrite("odd name"), "odd_name");
        assert_eq!(rewrite("a-b"), "a_b");
        assert_eq!(rewrite("1st"), "_1st");
    }

    #[test]
    fn property_names_drop_keyword_escape() {
        assert_eq!(property_method_name(FunctionKind::PropertyGet, "@class"), "get_class");
        assert_eq!(property_method_name(FunctionKind::PropertyLet, "name"), "let_name");
        assert_eq!(property_method_name(FunctionKind::Function, "name"), "name");
    }

    #[test]
    fn string_literals_escape_control_characters() {
        assert_eq!(csharp_string_literal("a\"b\\c\r\n"), "\"a\\\"b\\\\c\\r\\n\"");
    }
}
