// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for VBScript lexical analysis.
//!
//! VBScript is case-insensitive, so a [`Token`] keeps the source spelling in
//! its content and every keyword comparison goes through
//! [`Token::is_keyword`]. Each token also records the zero-based line it came
//! from; translated C# statements carry that index forward.

use ecow::EcoString;

use super::Span;

/// The lexical class of a token.
///
/// The class decides how the stage-one parser and the expression generator
/// treat a token; the spelling lives in [`Token::content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A plain identifier: `myVar`, `Response`, `Me`.
    Name,
    /// A bracket-escaped identifier: `[my var]` (content excludes the brackets).
    EscapedName,
    /// A reserved word: `If`, `Dim`, `Function`, `New`, ...
    Keyword,
    /// A function provided by the VBScript runtime: `Len`, `CStr`, `Now`.
    BuiltInFunction,
    /// A constant provided by the VBScript runtime: `True`, `Nothing`, `vbCrLf`.
    BuiltInValue,
    /// `+ - * / \ ^ & Mod`
    ArithmeticOperator,
    /// `= <> < > <= >= Is`
    ComparisonOperator,
    /// `And Or Not Xor Eqv Imp`
    LogicalOperator,
    /// A `.` between two members.
    MemberAccessor,
    /// A `.` that may be either an accessor or a decimal point.
    ///
    /// The bundled lexer always resolves this; it exists for token sources
    /// that leave the decision to a later pass. The expression generator
    /// rejects it.
    MemberAccessorOrDecimalPoint,
    OpenBrace,
    CloseBrace,
    ArgumentSeparator,
    /// String literal; content is the unescaped value without quotes.
    StringLiteral,
    /// Numeric literal; content is normalised to decimal notation.
    NumericLiteral,
    /// Date literal; content excludes the surrounding `#` characters.
    DateLiteral,
    /// A newline or `:` statement separator.
    EndOfStatement,
    /// A comment occupying its own line; content excludes the `'` or `Rem`.
    Comment,
    /// A comment following code on the same line.
    InlineComment,
}

impl TokenKind {
    /// True for arithmetic, comparison and logical operators.
    #[must_use]
    pub const fn is_operator(self) -> bool {
        matches!(
            self,
            Self::ArithmeticOperator | Self::ComparisonOperator | Self::LogicalOperator
        )
    }

    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::StringLiteral | Self::NumericLiteral | Self::DateLiteral | Self::BuiltInValue
        )
    }

    /// True for tokens that can name a variable, function or member.
    #[must_use]
    pub const fn is_name(self) -> bool {
        matches!(self, Self::Name | Self::EscapedName | Self::BuiltInFunction)
    }

    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::InlineComment)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            Self::Name | Self::EscapedName => "name",
            Self::Keyword => "keyword",
            Self::BuiltInFunction => "built-in function",
            Self::BuiltInValue => "built-in value",
            Self::ArithmeticOperator => "arithmetic operator",
            Self::ComparisonOperator => "comparison operator",
            Self::LogicalOperator => "logical operator",
            Self::MemberAccessor => "member accessor",
            Self::MemberAccessorOrDecimalPoint => "member accessor or decimal point",
            Self::OpenBrace => "'('",
            Self::CloseBrace => "')'",
            Self::ArgumentSeparator => "','",
            Self::StringLiteral => "string literal",
            Self::NumericLiteral => "numeric literal",
            Self::DateLiteral => "date literal",
            Self::EndOfStatement => "end of statement",
            Self::Comment | Self::InlineComment => "comment",
        };
        f.write_str(description)
    }
}

/// A lexical token with its source spelling and location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    content: EcoString,
    line_index: usize,
    span: Span,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, content: impl Into<EcoString>, line_index: usize) -> Self {
        Self {
            kind,
            content: content.into(),
            line_index,
            span: Span::default(),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[must_use]
    pub fn content(&self) -> &EcoString {
        &self.content
    }

    /// Zero-based source line.
    #[must_use]
    pub fn line_index(&self) -> usize {
        self.line_index
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Case-insensitive comparison of a keyword or keyword-like token.
    ///
    /// Operator words (`Mod`, `And`, `Is`, ...) also answer here so callers
    /// don't need to care which class the lexer put them in.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.kind,
            TokenKind::Keyword
                | TokenKind::ArithmeticOperator
                | TokenKind::ComparisonOperator
                | TokenKind::LogicalOperator
        ) && self.content.eq_ignore_ascii_case(keyword)
    }

    /// True for an operator with the given spelling (case-insensitive).
    #[must_use]
    pub fn is_operator(&self, operator: &str) -> bool {
        self.kind.is_operator() && self.content.eq_ignore_ascii_case(operator)
    }

    /// True for an identifier token with the given name (case-insensitive).
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.kind.is_name() && self.content.eq_ignore_ascii_case(name)
    }

    /// True for a newline statement separator (as opposed to `:`).
    #[must_use]
    pub fn is_line_end(&self) -> bool {
        self.kind == TokenKind::EndOfStatement && self.content == "\n"
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::StringLiteral => write!(f, "\"{}\"", self.content.replace("\"", "\"\"")),
            TokenKind::DateLiteral => write!(f, "#{}#", self.content),
            TokenKind::EscapedName => write!(f, "[{}]", self.content),
            TokenKind::EndOfStatement if self.content == "\n" => f.write_str("<newline>"),
            _ => f.write_str(&self.content),
        }
    }
}

/// Reserved words (excluding operator words).
pub(super) const KEYWORDS: &[&str] = &[
    "byref", "byval", "call", "case", "class", "const", "default", "dim", "do", "each", "else",
    "elseif", "end", "erase", "error", "exit", "explicit", "for", "function", "get", "goto", "if",
    "in", "let", "loop", "new", "next", "on", "option", "preserve", "private", "property",
    "public", "redim", "resume", "select", "set", "step", "sub", "then", "to", "until", "wend",
    "while", "with",
];

/// Operator words and the token class they lex to.
pub(super) const OPERATOR_WORDS: &[(&str, TokenKind)] = &[
    ("mod", TokenKind::ArithmeticOperator),
    ("is", TokenKind::ComparisonOperator),
    ("and", TokenKind::LogicalOperator),
    ("or", TokenKind::LogicalOperator),
    ("not", TokenKind::LogicalOperator),
    ("xor", TokenKind::LogicalOperator),
    ("eqv", TokenKind::LogicalOperator),
    ("imp", TokenKind::LogicalOperator),
];

pub(super) const BUILT_IN_VALUES: &[&str] = &[
    "true",
    "false",
    "empty",
    "null",
    "nothing",
    "vbcr",
    "vbcrlf",
    "vblf",
    "vbnewline",
    "vbtab",
    "vbnullstring",
    "vbnullchar",
    "vbtrue",
    "vbfalse",
    "vbusedefault",
    "vbobjecterror",
    "vbbinarycompare",
    "vbtextcompare",
    "vbempty",
    "vbnull",
    "vbinteger",
    "vblong",
    "vbsingle",
    "vbdouble",
    "vbcurrency",
    "vbdate",
    "vbstring",
    "vbobject",
    "vberror",
    "vbboolean",
    "vbvariant",
    "vbdataobject",
    "vbdecimal",
    "vbbyte",
    "vbarray",
];

pub(super) const BUILT_IN_FUNCTIONS: &[&str] = &[
    "abs", "array", "asc", "atn", "cbool", "cbyte", "ccur", "cdate", "cdbl", "chr", "cint",
    "clng", "cos", "createobject", "csng", "cstr", "date", "dateadd", "datediff", "datepart",
    "dateserial", "datevalue", "day", "exp", "filter", "fix", "formatcurrency",
    "formatdatetime", "formatnumber", "formatpercent", "getlocale", "getobject", "getref",
    "hex", "hour", "inputbox", "instr", "instrrev", "int", "isarray", "isdate", "isempty",
    "isnull", "isnumeric", "isobject", "join", "lbound", "lcase", "left", "len", "log", "ltrim",
    "mid", "minute", "month", "monthname", "msgbox", "now", "oct", "randomize", "replace",
    "rgb", "right", "rnd", "round", "rtrim", "scriptengine", "second", "setlocale", "sgn",
    "sin", "space", "split", "sqr", "strcomp", "string", "strreverse", "tan", "time", "timer",
    "timeserial", "timevalue", "trim", "typename", "ubound", "ucase", "vartype", "weekday",
    "weekdayname", "year",
];

/// Classifies a bare word the way the lexer does.
#[must_use]
pub fn classify_word(word: &str) -> TokenKind {
    let lowered = word.to_ascii_lowercase();
    if let Some((_, kind)) = OPERATOR_WORDS.iter().find(|(w, _)| *w == lowered) {
        return *kind;
    }
    if KEYWORDS.contains(&lowered.as_str()) {
        TokenKind::Keyword
    } else if BUILT_IN_VALUES.contains(&lowered.as_str()) {
        TokenKind::BuiltInValue
    } else if BUILT_IN_FUNCTIONS.contains(&lowered.as_str()) {
        TokenKind::BuiltInFunction
    } else {
        TokenKind::Name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(classify_word("DIM"), TokenKind::Keyword);
        assert_eq!(classify_word("Mod"), TokenKind::ArithmeticOperator);
        assert_eq!(classify_word("IS"), TokenKind::ComparisonOperator);
        assert_eq!(classify_word("Xor"), TokenKind::LogicalOperator);
        assert_eq!(classify_word("Nothing"), TokenKind::BuiltInValue);
        assert_eq!(classify_word("UBound"), TokenKind::BuiltInFunction);
        assert_eq!(classify_word("customer"), TokenKind::Name);
    }

    #[test]
    fn keyword_matching_ignores_case() {
        let token = Token::new(TokenKind::Keyword, "ElseIf", 3);
        assert!(token.is_keyword("elseif"));
        assert!(!token.is_keyword("else"));
        assert_eq!(token.line_index(), 3);
    }

    #[test]
    fn operator_words_count_as_keywords() {
        let token = Token::new(TokenKind::LogicalOperator, "AND", 0);
        assert!(token.is_keyword("and"));
        assert!(token.is_operator("And"));
    }

    #[test]
    fn display_restores_literal_delimiters() {
        let string = Token::new(TokenKind::StringLiteral, "say \"hi\"", 0);
        assert_eq!(string.to_string(), "\"say \"\"hi\"\"\"");
        let date = Token::new(TokenKind::DateLiteral, "1/2/2003", 0);
        assert_eq!(date.to_string(), "#1/2/2003#");
    }
}
