mod expressions;
mod items;
mod patterns;
mod types;

use al_common::{Diagnostic, Span, Token, TokenKind};

use crate::ast::{Block, Node};
use crate::error::{internal_recovery_limit, unexpected_token, Context, PResult, ParseFailure};

/// Hard cap on `synchronize()` iterations per parse run (spec: ~1000).
const SYNCHRONIZE_LIMIT: usize = 1000;

pub struct ParseResult {
    pub ast: Block,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parser state: token cursor, accumulated diagnostics, and the context
/// stack that drives error recovery. Mutated exclusively by parser
/// methods -- no outside access during a parse run.
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    diagnostics: Vec<Diagnostic>,
    context_stack: Vec<Context>,
}

pub fn parse(tokens: Vec<Token>) -> ParseResult {
    let mut parser = Parser::new(tokens);
    let ast = parser.parse_top_level();
    ParseResult {
        ast,
        diagnostics: parser.diagnostics,
    }
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            diagnostics: Vec::new(),
            context_stack: vec![Context::TopLevel],
        }
    }

    fn parse_top_level(&mut self) -> Block {
        let start = self.current().span;
        let mut body = Vec::new();
        while !self.check(TokenKind::Eof) {
            match self.parse_statement_or_expr() {
                Ok(node) => body.push(node),
                Err(ParseFailure) => {
                    let span = self.current().span;
                    body.push(Node::Expr(crate::ast::Expr::ErrorNode {
                        message: "failed to parse top-level item".to_string(),
                        span,
                    }));
                    self.synchronize();
                }
            }
        }
        let end = self.current().span;
        Block {
            body,
            span: start.merge(end),
        }
    }

    // ── Token stream navigation ────────────────────────────────────────

    fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.index + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn check_at(&self, offset: usize, kind: TokenKind) -> bool {
        self.peek_at(offset).kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.index.min(self.tokens.len() - 1)].clone();
        if !self.is_at_end() {
            self.index += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let span = self.current().span;
            let found = self.current().text.clone();
            self.diagnostics.push(unexpected_token(span, what, &found));
            Err(ParseFailure)
        }
    }

    fn error_here(&mut self, message: impl Into<String>) -> ParseFailure {
        let span = self.current().span;
        self.diagnostics.push(Diagnostic::error("P0002", span, message));
        ParseFailure
    }

    // ── Context stack / recovery ────────────────────────────────────────

    fn push_context(&mut self, ctx: Context) {
        self.context_stack.push(ctx);
    }

    fn pop_context(&mut self) {
        self.context_stack.pop();
    }

    fn current_context(&self) -> Context {
        *self.context_stack.last().expect("context stack must never be empty")
    }

    /// Advance tokens until a context-specific resync point is reached.
    /// See spec's parser design: each context has its own re-entry rule.
    fn synchronize(&mut self) {
        let mut iterations = 0usize;
        loop {
            iterations += 1;
            if iterations > SYNCHRONIZE_LIMIT {
                let span = self.current().span;
                self.diagnostics.push(internal_recovery_limit(span));
                while !self.is_at_end() {
                    self.advance();
                }
                return;
            }

            if self.is_at_end() {
                return;
            }

            match self.current_context() {
                Context::TopLevel => {
                    if self.at_top_level_resync_point() {
                        return;
                    }
                    self.advance();
                }
                Context::Block => {
                    if self.check(TokenKind::RBrace) {
                        self.advance();
                        self.pop_context();
                        return;
                    }
                    if self.at_statement_start() {
                        return;
                    }
                    self.advance();
                }
                Context::FunctionParams | Context::Array | Context::StructInit | Context::StructDef | Context::EnumDef => {
                    let close = self.closing_bracket_for(self.current_context());
                    if self.check(close) {
                        self.advance();
                        self.pop_context();
                        return;
                    }
                    if self.check(TokenKind::Comma) {
                        self.advance();
                        return;
                    }
                    self.advance();
                }
                Context::MatchArms => {
                    if self.check(TokenKind::RBrace) {
                        self.advance();
                        self.pop_context();
                        return;
                    }
                    if self.check(TokenKind::Arrow) {
                        return;
                    }
                    if self.check(TokenKind::Comma) {
                        self.advance();
                        return;
                    }
                    self.advance();
                }
            }
        }
    }

    fn closing_bracket_for(&self, ctx: Context) -> TokenKind {
        match ctx {
            Context::FunctionParams => TokenKind::RParen,
            Context::Array => TokenKind::RBracket,
            Context::StructInit | Context::StructDef | Context::EnumDef => TokenKind::RBrace,
            _ => TokenKind::RBrace,
        }
    }

    fn at_top_level_resync_point(&self) -> bool {
        if self.current().span.start_column == 1 && self.check(TokenKind::Ident) {
            return true;
        }
        matches!(
            self.current().kind,
            TokenKind::Fn
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Const
                | TokenKind::From
                | TokenKind::Export
        )
    }

    fn at_statement_start(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Fn
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Const
                | TokenKind::From
                | TokenKind::Export
                | TokenKind::If
                | TokenKind::Match
                | TokenKind::Assert
                | TokenKind::Error
                | TokenKind::Ident
                | TokenKind::LParen
        )
    }

    fn span_here(&self) -> Span {
        self.current().span
    }
}
