// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for VBScript source.
//!
//! The lexer is hand-written: VBScript's tokenisation depends on context in
//! a few places (`Rem` only starts a comment at the start of a statement, a
//! `.` is a decimal point or a member accessor depending on what precedes
//! it, keywords after an accessor are member names) and that is easier to
//! express as a small state machine than as a grammar.
//!
//! # Example
//!
//! ```
//! use vbsharp_core::source_analysis::{lex, TokenKind};
//!
//! let tokens = lex("x = y + 1").unwrap();
//! assert_eq!(tokens.len(), 5);
//! assert_eq!(tokens[1].kind(), TokenKind::ComparisonOperator);
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::token::classify_word;
use super::{LexError, LexErrorKind, Span, Token, TokenKind};

/// A lexer over VBScript source text.
///
/// Yields `Result<Token, LexError>` and stops after the first error.
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    position: usize,
    line_index: usize,
    /// Kind of the most recently produced token.
    previous: Option<TokenKind>,
    /// Whether a code token has been produced on the current line.
    line_has_code: bool,
    failed: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("line_index", &self.line_index)
            .finish_non_exhaustive()
    }
}

impl<'src> Lexer<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line_index: 0,
            previous: None,
            line_has_code: false,
            failed: false,
        };
        if lexer.peek_char() == Some('\u{feff}') {
            lexer.advance();
        }
        lexer
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::from(start..self.position)
    }

    fn error(&self, kind: LexErrorKind, start: usize) -> LexError {
        LexError::new(kind, self.line_index, self.span_from(start))
    }

    fn token(&self, kind: TokenKind, content: impl Into<EcoString>, start: usize) -> Token {
        Token::new(kind, content, self.line_index).with_span(self.span_from(start))
    }

    fn at_statement_start(&self) -> bool {
        matches!(self.previous, None | Some(TokenKind::EndOfStatement))
    }

    /// True after a token that a `.` would access a member of.
    fn previous_is_member_target(&self) -> bool {
        matches!(
            self.previous,
            Some(
                TokenKind::Name
                    | TokenKind::EscapedName
                    | TokenKind::BuiltInFunction
                    | TokenKind::CloseBrace
            )
        )
    }

    /// A `_` followed only by blanks up to the end of the line.
    fn at_line_continuation(&self) -> bool {
        let mut rest = self.chars.clone();
        if rest.next().map(|(_, c)| c) != Some('_') {
            return false;
        }
        for (_, c) in rest {
            match c {
                ' ' | '\t' => {}
                '\r' | '\n' => return true,
                _ => return false,
            }
        }
        true
    }

    fn skip_blanks_and_continuations(&mut self) {
        loop {
            self.advance_while(|c| matches!(c, ' ' | '\t'));
            if !self.at_line_continuation() {
                return;
            }
            self.advance();
            self.advance_while(|c| matches!(c, ' ' | '\t'));
            if self.peek_char() == Some('\r') {
                self.advance();
            }
            if self.peek_char() == Some('\n') {
                self.advance();
            }
            self.line_index += 1;
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_blanks_and_continuations();
        let start = self.position;
        let Some(c) = self.advance() else {
            return Ok(None);
        };
        let token = match c {
            '\r' | '\n' => {
                if c == '\r' && self.peek_char() == Some('\n') {
                    self.advance();
                }
                let token = self.token(TokenKind::EndOfStatement, "\n", start);
                self.line_index += 1;
                token
            }
            ':' => self.token(TokenKind::EndOfStatement, ":", start),
            '\'' => self.lex_comment(start, self.position),
            '"' => self.lex_string(start)?,
            '#' => self.lex_delimited(start, '#', TokenKind::DateLiteral, LexErrorKind::UnterminatedDate)?,
            '[' => self.lex_delimited(
                start,
                ']',
                TokenKind::EscapedName,
                LexErrorKind::UnterminatedEscapedName,
            )?,
            '(' => self.token(TokenKind::OpenBrace, "(", start),
            ')' => self.token(TokenKind::CloseBrace, ")", start),
            ',' => self.token(TokenKind::ArgumentSeparator, ",", start),
            '.' if self.peek_char().is_some_and(|n| n.is_ascii_digit())
                && !self.previous_is_member_target() =>
            {
                self.lex_number(start)?
            }
            '.' => self.token(TokenKind::MemberAccessor, ".", start),
            '0'..='9' => self.lex_number(start)?,
            '&' => match self.peek_char() {
                Some('h' | 'H') => self.lex_radix_number(start, 16)?,
                Some('o' | 'O') => self.lex_radix_number(start, 8)?,
                _ => self.token(TokenKind::ArithmeticOperator, "&", start),
            },
            '+' | '-' | '*' | '/' | '\\' | '^' => {
                self.token(TokenKind::ArithmeticOperator, c.to_string(), start)
            }
            '=' => self.token(TokenKind::ComparisonOperator, "=", start),
            '<' => match self.peek_char() {
                Some(next @ ('=' | '>')) => {
                    self.advance();
                    self.token(TokenKind::ComparisonOperator, format!("<{next}"), start)
                }
                _ => self.token(TokenKind::ComparisonOperator, "<", start),
            },
            '>' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    self.token(TokenKind::ComparisonOperator, ">=", start)
                } else {
                    self.token(TokenKind::ComparisonOperator, ">", start)
                }
            }
            c if c.is_alphabetic() => self.lex_word(start),
            other => return Err(self.error(LexErrorKind::UnexpectedCharacter(other), start)),
        };
        Ok(Some(token))
    }

    /// Reads the rest of the line as comment text starting at `text_start`.
    fn lex_comment(&mut self, start: usize, text_start: usize) -> Token {
        self.advance_while(|c| !matches!(c, '\r' | '\n'));
        let kind = if self.line_has_code {
            TokenKind::InlineComment
        } else {
            TokenKind::Comment
        };
        let text = &self.source[text_start..self.position];
        self.token(kind, text, start)
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, LexError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') if self.peek_char() == Some('"') => {
                    self.advance();
                    value.push('"');
                }
                Some('"') => return Ok(self.token(TokenKind::StringLiteral, value, start)),
                Some('\r' | '\n') | None => {
                    return Err(self.error(LexErrorKind::UnterminatedString, start));
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn lex_delimited(
        &mut self,
        start: usize,
        close: char,
        kind: TokenKind,
        unterminated: LexErrorKind,
    ) -> Result<Token, LexError> {
        let content_start = self.position;
        self.advance_while(|c| c != close && !matches!(c, '\r' | '\n'));
        if self.peek_char() != Some(close) {
            return Err(self.error(unterminated, start));
        }
        let content = &self.source[content_start..self.position];
        self.advance();
        Ok(self.token(kind, content, start))
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, LexError> {
        self.advance_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let digit_offset = usize::from(matches!(self.peek_char_n(1), Some('+' | '-')));
            if self
                .peek_char_n(1 + digit_offset)
                .is_some_and(|c| c.is_ascii_digit())
            {
                self.advance();
                if digit_offset == 1 {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
            }
        }
        let text = &self.source[start..self.position];
        if text.parse::<f64>().is_err() {
            return Err(self.error(LexErrorKind::InvalidNumber(text.into()), start));
        }
        let content = if text.starts_with('.') {
            EcoString::from(format!("0{text}"))
        } else {
            EcoString::from(text)
        };
        Ok(self.token(TokenKind::NumericLiteral, content, start))
    }

    /// `&H` / `&O` literals, normalised to decimal.
    ///
    /// Values that overflow a 16-bit (up to four hex digits) or 32-bit
    /// integer wrap to negative, as VBScript does: `&HFFFF` is `-1`.
    fn lex_radix_number(&mut self, start: usize, radix: u32) -> Result<Token, LexError> {
        self.advance();
        let digits_start = self.position;
        self.advance_while(|c| c.is_digit(radix));
        let digits = &self.source[digits_start..self.position];
        if self.peek_char() == Some('&') {
            self.advance();
        }
        let text = &self.source[start..self.position];
        let value = i64::from_str_radix(digits, radix)
            .ok()
            .filter(|value| *value <= 0xFFFF_FFFF)
            .ok_or_else(|| self.error(LexErrorKind::InvalidNumber(text.into()), start))?;
        let value = if radix == 16 && digits.len() <= 4 && value > 0x7FFF {
            value - 0x1_0000
        } else if value > 0x7FFF_FFFF {
            value - 0x1_0000_0000
        } else {
            value
        };
        Ok(self.token(TokenKind::NumericLiteral, value.to_string(), start))
    }

    fn lex_word(&mut self, start: usize) -> Token {
        self.advance_while(|c| c.is_alphanumeric() || c == '_');
        let word = &self.source[start..self.position];
        if word.eq_ignore_ascii_case("rem") && self.at_statement_start() {
            return self.lex_comment(start, self.position);
        }
        let kind = if self.previous == Some(TokenKind::MemberAccessor) {
            TokenKind::Name
        } else {
            classify_word(word)
        };
        self.token(kind, word, start)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => {
                if token.is_line_end() {
                    self.line_has_code = false;
                } else if !token.kind().is_comment() {
                    self.line_has_code = true;
                }
                self.previous = Some(token.kind());
                Some(Ok(token))
            }
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Tokenizes a whole script.
///
/// # Errors
///
/// Returns the first [`LexError`] encountered.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().iter().map(Token::kind).collect()
    }

    fn contents(source: &str) -> Vec<String> {
        lex(source)
            .unwrap()
            .iter()
            .map(|t| t.content().to_string())
            .collect()
    }

    #[test]
    fn lex_assignment() {
        assert_eq!(
            kinds("x = 1"),
            vec![
                TokenKind::Name,
                TokenKind::ComparisonOperator,
                TokenKind::NumericLiteral
            ]
        );
    }

    #[test]
    fn lex_operator_words() {
        assert_eq!(
            kinds("a Mod b And Not c Is Nothing"),
            vec![
                TokenKind::Name,
                TokenKind::ArithmeticOperator,
                TokenKind::Name,
                TokenKind::LogicalOperator,
                TokenKind::LogicalOperator,
                TokenKind::Name,
                TokenKind::ComparisonOperator,
                TokenKind::BuiltInValue,
            ]
        );
    }

    #[test]
    fn lex_compound_comparisons() {
        assert_eq!(contents("a <> b <= c >= d"), vec!["a", "<>", "b", "<=", "c", ">=", "d"]);
    }

    #[test]
    fn lex_string_with_escaped_quotes() {
        let tokens = lex(r#"s = "say ""hi""""#).unwrap();
        assert_eq!(tokens[2].kind(), TokenKind::StringLiteral);
        assert_eq!(tokens[2].content(), "say \"hi\"");
    }

    #[test]
    fn lex_unterminated_string_fails() {
        let err = lex("s = \"abc\nx = 1").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn lex_date_literal() {
        let tokens = lex("d = #2003-01-02#").unwrap();
        assert_eq!(tokens[2].kind(), TokenKind::DateLiteral);
        assert_eq!(tokens[2].content(), "2003-01-02");
    }

    #[test]
    fn lex_hex_and_octal_literals() {
        assert_eq!(contents("&H10 &HFFFF &O17 &HFF&"), vec!["16", "-1", "15", "255"]);
    }

    #[test]
    fn lex_decimal_literals() {
        assert_eq!(contents("1.5 .25 2E3 1.5e-2"), vec!["1.5", "0.25", "2E3", "1.5e-2"]);
    }

    #[test]
    fn dot_after_name_is_member_accessor() {
        assert_eq!(
            kinds("a.b"),
            vec![TokenKind::Name, TokenKind::MemberAccessor, TokenKind::Name]
        );
    }

    #[test]
    fn leading_dot_in_with_block_is_accessor() {
        assert_eq!(
            kinds(".Name = 1"),
            vec![
                TokenKind::MemberAccessor,
                TokenKind::Name,
                TokenKind::ComparisonOperator,
                TokenKind::NumericLiteral
            ]
        );
    }

    #[test]
    fn keyword_after_accessor_is_a_name() {
        let tokens = lex("obj.Property.Set").unwrap();
        assert_eq!(tokens[2].kind(), TokenKind::Name);
        assert_eq!(tokens[4].kind(), TokenKind::Name);
    }

    #[test]
    fn escaped_name() {
        let tokens = lex("[my var] = 1").unwrap();
        assert_eq!(tokens[0].kind(), TokenKind::EscapedName);
        assert_eq!(tokens[0].content(), "my var");
    }

    #[test]
    fn comments_are_classified_by_position() {
        let tokens = lex("' whole line\nx = 1 ' trailing").unwrap();
        assert_eq!(tokens[0].kind(), TokenKind::Comment);
        assert_eq!(tokens[0].content(), " whole line");
        let last = tokens.last().unwrap();
        assert_eq!(last.kind(), TokenKind::InlineComment);
        assert_eq!(last.content(), " trailing");
        assert_eq!(last.line_index(), 1);
    }

    #[test]
    fn rem_comment_only_at_statement_start() {
        let tokens = lex("Rem hello\nx = 1 : Rem there").unwrap();
        assert_eq!(tokens[0].kind(), TokenKind::Comment);
        assert_eq!(tokens[0].content(), " hello");
        assert_eq!(tokens.last().unwrap().kind(), TokenKind::InlineComment);
    }

    #[test]
    fn line_continuation_joins_lines() {
        let tokens = lex("x = 1 + _\n    2\ny = 3").unwrap();
        let separators: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind() == TokenKind::EndOfStatement)
            .collect();
        assert_eq!(separators.len(), 1);
        let two = tokens.iter().find(|t| t.content() == "2").unwrap();
        assert_eq!(two.line_index(), 1);
        assert_eq!(tokens.last().unwrap().line_index(), 2);
    }

    #[test]
    fn colon_and_newline_end_statements() {
        let tokens = lex("a = 1: b = 2\r\nc = 3").unwrap();
        let ends: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind() == TokenKind::EndOfStatement)
            .map(|t| t.content().to_string())
            .collect();
        assert_eq!(ends, vec![":", "\n"]);
    }

    #[test]
    fn unexpected_character_fails() {
        let err = lex("x = 1 ? 2").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('?'));
        assert_eq!(err.span, Span::new(6, 7));
    }

    #[test]
    fn spans_point_into_source() {
        let source = "total = price * 2";
        for token in lex(source).unwrap() {
            let text = &source[token.span().as_range()];
            assert!(text.eq_ignore_ascii_case(token.content()), "{text} vs {token}");
        }
    }
}
