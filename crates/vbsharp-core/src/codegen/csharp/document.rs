// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Rendering translated statements as C# source text.
//!
//! **DDD Context:** Compilation — Code Generation
//!
//! Translators produce flat [`TranslatedStatement`] records carrying an
//! indentation depth, so rendering is a single pass. Indentation is written
//! only before text, which keeps blank lines free of trailing whitespace.

use super::TranslatedStatement;

/// Spaces per indentation level in the emitted C#.
const INDENT: usize = 4;

/// Renders statements one per line, with no trailing newline.
#[must_use]
pub(super) fn render_statements(statements: &[TranslatedStatement]) -> String {
    let mut output = String::new();
    for (index, statement) in statements.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        if !statement.content.is_empty() {
            let indent = statement.indentation_depth.saturating_mul(INDENT);
            output.extend(std::iter::repeat_n(' ', indent));
            output.push_str(&statement.content);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_render_with_four_spaces_per_level() {
        let statements = vec![
            TranslatedStatement::skeleton("namespace X", 0),
            TranslatedStatement::skeleton("{", 0),
            TranslatedStatement::new("x = 1;", 1, 3),
            TranslatedStatement::skeleton("", 1),
            TranslatedStatement::new("y = 2;", 2, 4),
            TranslatedStatement::skeleton("}", 0),
        ];
        assert_eq!(
            render_statements(&statements),
            "namespace X\n{\n    x = 1;\n\n        y = 2;\n}"
        );
    }

    #[test]
    fn first_statement_is_indented() {
        let statements = vec![TranslatedStatement::new("x = 1;", 2, 0)];
        assert_eq!(render_statements(&statements), "        x = 1;");
    }

    #[test]
    fn no_statements_render_empty() {
        assert_eq!(render_statements(&[]), "");
    }
}
