//! AL scanner -- source text to token stream with attached leading trivia.

mod cursor;

use al_common::{keyword_from_str, Diagnostic, Literal, Span, Token, TokenKind, Trivia, TriviaKind};
use cursor::Cursor;

/// What the lexer is currently doing.
#[derive(Debug, Clone, PartialEq)]
enum LexerState {
    Normal,
    InString,
    /// Inside `${...}` (braced) or `$ident` (bare) interpolation.
    InInterpolation { brace_depth: u32, bare: bool },
}

/// Result of scanning a whole source file.
pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The AL scanner. Converts source text into a stream of tokens, each
/// carrying the trivia (whitespace, comments) that preceded it.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    emitted_eof: bool,
    pending: Vec<Token>,
    state_stack: Vec<LexerState>,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
            pending: Vec::new(),
            state_stack: vec![LexerState::Normal],
            diagnostics: Vec::new(),
        }
    }

    pub fn scan(source: &str) -> ScanResult {
        let mut lexer = Lexer::new(source);
        let tokens: Vec<Token> = (&mut lexer).collect();
        ScanResult {
            tokens,
            diagnostics: lexer.diagnostics,
        }
    }

    fn current_state(&self) -> LexerState {
        self.state_stack
            .last()
            .cloned()
            .expect("state stack must never be empty")
    }

    fn pos(&self) -> (u32, u32) {
        (self.cursor.line(), self.cursor.column())
    }

    fn span_from(&self, start: (u32, u32)) -> Span {
        let (end_line, end_column) = self.pos();
        Span::new(start.0, start.1, end_line, end_column)
    }

    /// Produce the next token, attaching leading trivia when the current
    /// state allows trivia at all (trivia never occurs inside string
    /// content).
    fn produce(&mut self) -> Token {
        if !self.pending.is_empty() {
            return self.pending.remove(0);
        }
        match self.current_state() {
            LexerState::Normal | LexerState::InInterpolation { .. } => self.lex_trivia_then_token(),
            LexerState::InString => self.lex_string_content(),
        }
    }

    fn lex_trivia_then_token(&mut self) -> Token {
        let trivia = self.collect_trivia();
        let mut token = match self.current_state() {
            LexerState::InInterpolation { .. } => self.lex_interpolation(),
            _ => self.lex_normal(),
        };
        token.leading_trivia = trivia;
        token
    }

    fn collect_trivia(&mut self) -> Vec<Trivia> {
        let mut trivia = Vec::new();
        loop {
            let start = self.pos();
            match self.cursor.peek() {
                Some(' ' | '\t') => {
                    self.cursor.eat_while(|c| c == ' ' || c == '\t');
                    trivia.push(Trivia {
                        kind: TriviaKind::Whitespace,
                        text: String::new(),
                        span: self.span_from(start),
                    });
                }
                Some('\r') => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('\n') {
                        self.cursor.advance();
                    }
                    trivia.push(Trivia {
                        kind: TriviaKind::Newline,
                        text: String::new(),
                        span: self.span_from(start),
                    });
                }
                Some('\n') => {
                    self.cursor.advance();
                    trivia.push(Trivia {
                        kind: TriviaKind::Newline,
                        text: String::new(),
                        span: self.span_from(start),
                    });
                }
                Some('/') if self.cursor.peek_next() == Some('/') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    let text_start = self.cursor.pos();
                    self.cursor.eat_while(|c| c != '\n' && c != '\r');
                    let text = self.cursor.slice(text_start, self.cursor.pos()).to_string();
                    trivia.push(Trivia {
                        kind: TriviaKind::LineComment,
                        text,
                        span: self.span_from(start),
                    });
                }
                Some('/') if self.cursor.peek_next() == Some('*') => {
                    trivia.push(self.lex_block_comment(start));
                }
                _ => break,
            }
        }
        trivia
    }

    /// `/* ... */` or doc form `/** ... */`. Not nested -- the first `*/`
    /// closes it.
    fn lex_block_comment(&mut self, start: (u32, u32)) -> Trivia {
        self.cursor.advance(); // '/'
        self.cursor.advance(); // '*'
        let is_doc = self.cursor.peek() == Some('*') && self.cursor.peek_next() != Some('/');
        if is_doc {
            self.cursor.advance(); // second '*'
        }
        let text_start = self.cursor.pos();
        let mut text_end = text_start;
        loop {
            match self.cursor.peek() {
                None => {
                    self.diagnostics.push(Diagnostic::error(
                        "E0001",
                        self.span_from(start),
                        "unterminated block comment",
                    ));
                    break;
                }
                Some('*') if self.cursor.peek_next() == Some('/') => {
                    text_end = self.cursor.pos();
                    self.cursor.advance();
                    self.cursor.advance();
                    break;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        let text = self.cursor.slice(text_start, text_end).to_string();
        Trivia {
            kind: if is_doc {
                TriviaKind::DocComment
            } else {
                TriviaKind::BlockComment
            },
            text,
            span: self.span_from(start),
        }
    }

    fn lex_normal(&mut self) -> Token {
        let start = self.pos();
        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, "", self.span_from(start));
        };

        match c {
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            '{' => self.single(TokenKind::LBrace, start),
            '}' => self.single(TokenKind::RBrace, start),
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::Semicolon, start),
            '?' => self.single(TokenKind::Question, start),
            '*' => self.single(TokenKind::Star, start),
            '/' => self.single(TokenKind::Slash, start),
            '%' => self.single(TokenKind::Percent, start),

            '=' => self.lex_eq(start),
            '!' => self.lex_bang(start),
            '<' => self.lex_lt(start),
            '>' => self.lex_gt(start),
            '&' => self.lex_amp(start),
            '|' => self.lex_pipe(start),
            '+' => self.lex_plus(start),
            '-' => self.lex_minus(start),
            ':' => self.lex_colon(start),
            '.' => self.lex_dot(start),

            '0'..='9' => self.lex_number(start),
            '\'' => self.lex_string_start(start),
            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.advance();
                let span = self.span_from(start);
                self.diagnostics
                    .push(Diagnostic::error("E0002", span, format!("unrecognized character `{c}`")));
                Token::new(TokenKind::Unknown, c.to_string(), span)
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: (u32, u32)) -> Token {
        let c = self.cursor.advance().unwrap();
        Token::new(kind, c.to_string(), self.span_from(start))
    }

    fn two_char(&mut self, first: char, kind: TokenKind, start: (u32, u32)) -> Token {
        self.cursor.advance();
        let mut text = String::new();
        text.push(first);
        text.push(self.cursor.advance().unwrap());
        Token::new(kind, text, self.span_from(start))
    }

    fn lex_eq(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('=') => self.two_char('=', TokenKind::EqEq, start),
            Some('>') => self.two_char('=', TokenKind::FatArrow, start),
            _ => Token::new(TokenKind::Eq, "=", self.span_from(start)),
        }
    }

    fn lex_bang(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.two_char('!', TokenKind::NotEq, start)
        } else {
            Token::new(TokenKind::Bang, "!", self.span_from(start))
        }
    }

    fn lex_lt(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.two_char('<', TokenKind::LtEq, start)
        } else {
            Token::new(TokenKind::Lt, "<", self.span_from(start))
        }
    }

    fn lex_gt(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.two_char('>', TokenKind::GtEq, start)
        } else {
            Token::new(TokenKind::Gt, ">", self.span_from(start))
        }
    }

    fn lex_amp(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('&') {
            self.two_char('&', TokenKind::AmpAmp, start)
        } else {
            Token::new(TokenKind::Amp, "&", self.span_from(start))
        }
    }

    fn lex_pipe(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('|') {
            self.two_char('|', TokenKind::PipePipe, start)
        } else {
            Token::new(TokenKind::Pipe, "|", self.span_from(start))
        }
    }

    fn lex_plus(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('+') {
            self.two_char('+', TokenKind::PlusPlus, start)
        } else {
            Token::new(TokenKind::Plus, "+", self.span_from(start))
        }
    }

    fn lex_minus(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('>') => self.two_char('-', TokenKind::Arrow, start),
            Some('-') => self.two_char('-', TokenKind::MinusMinus, start),
            _ => Token::new(TokenKind::Minus, "-", self.span_from(start)),
        }
    }

    fn lex_colon(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.two_char(':', TokenKind::ColonEq, start)
        } else {
            Token::new(TokenKind::Colon, ":", self.span_from(start))
        }
    }

    fn lex_dot(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('.') {
            self.two_char('.', TokenKind::DotDot, start)
        } else {
            Token::new(TokenKind::Dot, ".", self.span_from(start))
        }
    }

    /// Decimal integer, or decimal float if a `.` is followed by a digit.
    /// No exponent notation.
    fn lex_number(&mut self, start: (u32, u32)) -> Token {
        let byte_start = self.cursor.pos();
        self.cursor.advance();
        self.cursor.eat_while(|c| c.is_ascii_digit());

        let is_float = self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        let span = self.span_from(start);
        let text = self.cursor.slice(byte_start, self.cursor.pos()).to_string();
        if is_float {
            let value: f64 = text.parse().unwrap_or(0.0);
            Token::new(TokenKind::FloatLiteral, text, span).with_literal(Literal::Float(value))
        } else {
            let value: i64 = text.parse().unwrap_or(0);
            Token::new(TokenKind::IntLiteral, text, span).with_literal(Literal::Int(value))
        }
    }

    fn lex_string_start(&mut self, start: (u32, u32)) -> Token {
        self.cursor.advance(); // consume opening quote
        self.state_stack.push(LexerState::InString);
        Token::new(TokenKind::InterpStringStart, "'", self.span_from(start))
    }

    /// Scan string content until the closing quote or an interpolation
    /// point (`$ident` or `${`). Handles backslash escapes.
    fn lex_string_content(&mut self) -> Token {
        let start = self.pos();
        let mut buf = String::new();

        loop {
            match self.cursor.peek() {
                None => {
                    self.state_stack.pop();
                    let span = self.span_from(start);
                    self.diagnostics
                        .push(Diagnostic::error("E0003", span, "unterminated string literal"));
                    return Token::new(TokenKind::InterpStringEnd, "", span)
                        .with_literal(Literal::Str(buf));
                }
                Some('\'') => {
                    let content_span = self.span_from(start);
                    self.cursor.advance();
                    self.state_stack.pop();
                    let end_span = Span::point(self.cursor.line(), self.cursor.column() - 1);
                    if buf.is_empty() {
                        return Token::new(TokenKind::InterpStringEnd, "'", content_span.merge(end_span));
                    }
                    self.pending.push(Token::new(TokenKind::InterpStringEnd, "'", end_span));
                    return Token::new(TokenKind::InterpStringPart, buf.clone(), content_span)
                        .with_literal(Literal::Str(buf));
                }
                Some('$') if self.cursor.peek_next() == Some('{') => {
                    let part_span = self.span_from(start);
                    self.cursor.advance(); // '$'
                    self.cursor.advance(); // '{'
                    self.state_stack
                        .push(LexerState::InInterpolation { brace_depth: 0, bare: false });
                    if !buf.is_empty() {
                        return Token::new(TokenKind::InterpStringPart, buf.clone(), part_span)
                            .with_literal(Literal::Str(buf));
                    }
                    return self.produce();
                }
                Some('$') if self.cursor.peek_next().is_some_and(is_ident_start) => {
                    let part_span = self.span_from(start);
                    self.cursor.advance(); // '$'
                    self.state_stack
                        .push(LexerState::InInterpolation { brace_depth: 0, bare: true });
                    if !buf.is_empty() {
                        return Token::new(TokenKind::InterpStringPart, buf.clone(), part_span)
                            .with_literal(Literal::Str(buf));
                    }
                    return self.produce();
                }
                Some('\\') => {
                    self.cursor.advance();
                    match self.cursor.advance() {
                        Some('n') => buf.push('\n'),
                        Some('r') => buf.push('\r'),
                        Some('t') => buf.push('\t'),
                        Some('\\') => buf.push('\\'),
                        Some('\'') => buf.push('\''),
                        Some('0') => buf.push('\0'),
                        Some(other) => {
                            self.diagnostics.push(Diagnostic::error(
                                "E0004",
                                self.span_from(start),
                                format!("invalid escape sequence `\\{other}`"),
                            ));
                            buf.push(other);
                        }
                        None => {}
                    }
                }
                Some(c) => {
                    self.cursor.advance();
                    buf.push(c);
                }
            }
        }
    }

    /// Tokens inside `${...}`/`$ident` interpolation. For the braced form,
    /// tracks nesting depth and pops back to `InString` on the matching `}`.
    /// For the bare form, a single identifier token closes it immediately.
    fn lex_interpolation(&mut self) -> Token {
        let (brace_depth, bare) = match self.current_state() {
            LexerState::InInterpolation { brace_depth, bare } => (brace_depth, bare),
            _ => unreachable!(),
        };

        if bare {
            let start = self.pos();
            let token = self.lex_ident(start);
            self.state_stack.pop();
            return token;
        }

        let start = self.pos();
        match self.cursor.peek() {
            Some('{') => {
                if let Some(LexerState::InInterpolation { brace_depth, .. }) = self.state_stack.last_mut() {
                    *brace_depth += 1;
                }
                self.single(TokenKind::LBrace, start)
            }
            Some('}') => {
                if brace_depth == 0 {
                    self.cursor.advance();
                    self.state_stack.pop();
                    self.produce()
                } else {
                    if let Some(LexerState::InInterpolation { brace_depth, .. }) = self.state_stack.last_mut() {
                        *brace_depth -= 1;
                    }
                    self.single(TokenKind::RBrace, start)
                }
            }
            Some(_) => self.lex_normal(),
            None => {
                self.state_stack.pop();
                let span = self.span_from(start);
                self.diagnostics
                    .push(Diagnostic::error("E0005", span, "unterminated string interpolation"));
                Token::new(TokenKind::Unknown, "", span)
            }
        }
    }

    fn lex_ident(&mut self, start: (u32, u32)) -> Token {
        let mut text = String::new();
        text.push(self.cursor.advance().unwrap());
        while let Some(c) = self.cursor.peek() {
            if is_ident_continue(c) {
                text.push(c);
                self.cursor.advance();
            } else {
                break;
            }
        }
        let kind = keyword_from_str(&text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, self.span_from(start))
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.produce();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::scan(source).tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_binding() {
        assert_eq!(
            kinds("x = 42"),
            vec![TokenKind::Ident, TokenKind::Eq, TokenKind::IntLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn keyword_vs_ident() {
        assert_eq!(kinds("fn foo"), vec![TokenKind::Fn, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn plain_string_single_part() {
        let result = Lexer::scan("'hello'");
        let kinds: Vec<_> = result.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::InterpStringStart,
                TokenKind::InterpStringPart,
                TokenKind::InterpStringEnd,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            result.tokens[1].literal,
            Some(Literal::Str("hello".to_string()))
        );
    }

    #[test]
    fn braced_interpolation() {
        let kinds = kinds("'a ${x} b'");
        assert_eq!(
            kinds,
            vec![
                TokenKind::InterpStringStart,
                TokenKind::InterpStringPart,
                TokenKind::Ident,
                TokenKind::InterpStringPart,
                TokenKind::InterpStringEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bare_interpolation() {
        let kinds = kinds("'hi $name!'");
        assert_eq!(
            kinds,
            vec![
                TokenKind::InterpStringStart,
                TokenKind::InterpStringPart,
                TokenKind::Ident,
                TokenKind::InterpStringPart,
                TokenKind::InterpStringEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn escapes_resolve() {
        let result = Lexer::scan(r"'a\nb'");
        assert_eq!(result.tokens[1].literal, Some(Literal::Str("a\nb".to_string())));
    }

    #[test]
    fn unterminated_string_reports_diagnostic() {
        let result = Lexer::scan("'abc");
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn float_vs_int() {
        assert_eq!(kinds("3.14"), vec![TokenKind::FloatLiteral, TokenKind::Eof]);
        assert_eq!(kinds("42"), vec![TokenKind::IntLiteral, TokenKind::Eof]);
    }

    #[test]
    fn range_dotdot_not_confused_with_float() {
        assert_eq!(
            kinds("1..2"),
            vec![TokenKind::IntLiteral, TokenKind::DotDot, TokenKind::IntLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn increment_decrement_scanned_but_distinct() {
        assert_eq!(kinds("++"), vec![TokenKind::PlusPlus, TokenKind::Eof]);
        assert_eq!(kinds("--"), vec![TokenKind::MinusMinus, TokenKind::Eof]);
    }

    #[test]
    fn doc_comment_attaches_as_trivia() {
        let result = Lexer::scan("/** does a thing */\nfn f() {}");
        let fn_token = &result.tokens[0];
        assert_eq!(fn_token.kind, TokenKind::Fn);
        assert_eq!(fn_token.doc_comment(), Some("does a thing "));
    }

    #[test]
    fn line_comment_is_trivia_not_a_token() {
        assert_eq!(kinds("// hi\n42"), vec![TokenKind::IntLiteral, TokenKind::Eof]);
    }

    #[test]
    fn unrecognized_byte_reports_diagnostic() {
        let result = Lexer::scan("@");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.tokens[0].kind, TokenKind::Unknown);
    }
}
