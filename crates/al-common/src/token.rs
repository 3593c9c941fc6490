use serde::Serialize;

use crate::span::Span;

/// The fixed, closed keyword set. Recognized by exact match after an
/// identifier has already been scanned -- there is no separate keyword
/// scan path.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("fn", TokenKind::Fn),
    ("struct", TokenKind::Struct),
    ("enum", TokenKind::Enum),
    ("const", TokenKind::Const),
    ("from", TokenKind::From),
    ("import", TokenKind::Import),
    ("export", TokenKind::Export),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("match", TokenKind::Match),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("none", TokenKind::None),
    ("or", TokenKind::Or),
    ("assert", TokenKind::Assert),
    ("error", TokenKind::Error),
];

pub fn keyword_from_str(text: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(kw, _)| *kw == text)
        .map(|(_, kind)| *kind)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Keywords
    Fn,
    Struct,
    Enum,
    Const,
    From,
    Import,
    Export,
    If,
    Else,
    Match,
    True,
    False,
    None,
    Or,
    Assert,
    Error,

    // Literals
    IntLiteral,
    FloatLiteral,
    Ident,
    /// Opens a (possibly interpolated) string literal -- the leading `'`.
    InterpStringStart,
    /// A run of literal text between interpolation points.
    InterpStringPart,
    /// Closes a string literal -- the trailing `'`.
    InterpStringEnd,

    // Punctuation / operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AmpAmp,
    PipePipe,
    Bang,
    Eq,
    /// `:=`, scanned but never accepted by the binding grammar -- legacy.
    ColonEq,
    Arrow,
    FatArrow,
    Dot,
    DotDot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Question,
    Pipe,
    Amp,
    /// Scanned only so the parser can reject it; increment is disallowed.
    PlusPlus,
    /// Scanned only so the parser can reject it; decrement is disallowed.
    MinusMinus,

    Eof,
    /// An unrecognized byte, or a malformed literal; always paired with a
    /// scan-stage diagnostic.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriviaKind {
    Whitespace,
    Newline,
    LineComment,
    BlockComment,
    DocComment,
}

/// Non-semantic source text attached to the token that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub span: Span,
}

impl Trivia {
    pub fn is_doc(&self) -> bool {
        self.kind == TriviaKind::DocComment
    }

    pub fn is_newline(&self) -> bool {
        self.kind == TriviaKind::Newline
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
}

/// A single scanned token: its kind, resolved literal value (if any), span,
/// and the trivia that preceded it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub literal: Option<Literal>,
    pub span: Span,
    pub leading_trivia: Vec<Trivia>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            literal: None,
            span,
            leading_trivia: Vec::new(),
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }

    pub fn with_trivia(mut self, trivia: Vec<Trivia>) -> Self {
        self.leading_trivia = trivia;
        self
    }

    /// First doc-comment trivium attached to this token, if any -- becomes
    /// the `doc` attribute of the declaration this token begins.
    pub fn doc_comment(&self) -> Option<&str> {
        self.leading_trivia
            .iter()
            .find(|t| t.is_doc())
            .map(|t| t.text.as_str())
    }

    /// Whether any leading trivia precedes this token at all (not just
    /// whitespace) -- used to disambiguate `expr[i]` from a new statement
    /// starting with `[`.
    pub fn has_leading_trivia(&self) -> bool {
        !self.leading_trivia.is_empty()
    }

    pub fn has_leading_newline(&self) -> bool {
        self.leading_trivia.iter().any(|t| t.is_newline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup() {
        assert_eq!(keyword_from_str("fn"), Some(TokenKind::Fn));
        assert_eq!(keyword_from_str("match"), Some(TokenKind::Match));
        assert_eq!(keyword_from_str("nothing"), None);
    }

    #[test]
    fn doc_comment_is_first_doc_trivium() {
        let span = Span::point(1, 1);
        let trivia = vec![
            Trivia {
                kind: TriviaKind::Whitespace,
                text: " ".into(),
                span,
            },
            Trivia {
                kind: TriviaKind::DocComment,
                text: "does a thing".into(),
                span,
            },
        ];
        let token = Token::new(TokenKind::Fn, "fn", span).with_trivia(trivia);
        assert_eq!(token.doc_comment(), Some("does a thing"));
    }
}
