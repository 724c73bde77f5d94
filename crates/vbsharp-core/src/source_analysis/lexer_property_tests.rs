// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the VBScript lexer.
//!
//! 1. **Lexer never panics** on arbitrary input, and either yields tokens or
//!    a single error
//! 2. **Spans stay inside the input** and are ordered
//! 3. **Valid fragments lex cleanly**
//! 4. **Line indices never decrease**
//!
//! **DDD Context:** Source Analysis

use proptest::prelude::*;

use super::lexer::{Lexer, lex};
use super::token::TokenKind;

const VALID_FRAGMENTS: &[&str] = &[
    "x = 1",
    "Dim a, b(10)",
    "If a > b Then c = a Else c = b",
    "s = \"quoted \"\"word\"\"\"",
    "d = #2003-01-02#",
    "n = &HFF + &O7 + 1.5E3",
    "obj.Method(1, \"two\").Prop = Nothing",
    "x = a Mod b \\ 2 ^ 3",
    "If Not x Is Nothing And y <> 2 Then",
    "Call DoIt(a, _\n  b)",
    "' comment only",
    "x = 1 ' trailing",
    "Rem classic comment",
    "[odd name] = 1: y = 2",
    "With obj\n  .Value = .5\nEnd With",
];

fn valid_fragment() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_FRAGMENTS).prop_map(std::string::ToString::to_string)
}

/// Default is 512 cases; override via `PROPTEST_CASES` env var for nightly runs.
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
    fn lexer_never_panics(input in "\\PC{0,300}") {
        let results: Vec<_> = Lexer::new(&input).collect();
        let errors = results.iter().filter(|r| r.is_err()).count();
        prop_assert!(errors <= 1, "lexer kept going after an error for {:?}", input);
        if errors == 1 {
            prop_assert!(results.last().is_some_and(Result::is_err));
        }
    }

    #[test]
    fn token_spans_within_input_and_ordered(input in "[ -~\n]{0,200}") {
        let Ok(tokens) = lex(&input) else {
            return Ok(());
        };
        let input_len = u32::try_from(input.len()).unwrap_or(u32::MAX);
        for token in &tokens {
            prop_assert!(token.span().end() <= input_len);
            prop_assert!(token.span().start() <= token.span().end());
        }
        for window in tokens.windows(2) {
            prop_assert!(
                window[1].span().start() >= window[0].span().end(),
                "overlapping spans {:?} and {:?} for {:?}",
                window[0],
                window[1],
                input,
            );
        }
    }

    #[test]
    fn line_indices_never_decrease(input in "[a-z0-9 =+\n:']{0,200}") {
        let Ok(tokens) = lex(&input) else {
            return Ok(());
        };
        for window in tokens.windows(2) {
            prop_assert!(window[1].line_index() >= window[0].line_index());
        }
    }

    #[test]
    fn valid_fragments_lex_cleanly(input in valid_fragment()) {
        let tokens = lex(&input);
        prop_assert!(tokens.is_ok(), "valid input {:?} failed: {:?}", input, tokens);
        let tokens = tokens.unwrap_or_default();
        prop_assert!(
            tokens.iter().all(|t| t.kind() != TokenKind::MemberAccessorOrDecimalPoint),
            "unresolved '.' in {:?}",
            input,
        );
    }

    #[test]
    fn identifiers_round_trip(name in "[A-Za-z][A-Za-z0-9_]{0,12}") {
        let tokens = lex(&name).unwrap_or_default();
        if name.eq_ignore_ascii_case("rem") {
            prop_assert_eq!(tokens[0].kind(), TokenKind::Comment);
        } else {
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(tokens[0].content().as_str(), name.as_str());
        }
    }
}
