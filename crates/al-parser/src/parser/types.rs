use al_common::TokenKind;

use crate::ast::TypeExpr;
use crate::error::PResult;

use super::Parser;

impl Parser {
    /// `type_expr := '?' base | base ('!' base)?`
    pub(crate) fn parse_type_expr(&mut self) -> PResult<TypeExpr> {
        match self.try_parse_type_expr() {
            Some(t) => Ok(t),
            None => Err(self.error_here("expected a type")),
        }
    }

    /// Non-diagnostic-emitting variant used for lookahead when deciding
    /// whether an identifier begins a typed binding.
    pub(crate) fn try_parse_type_expr(&mut self) -> Option<TypeExpr> {
        let start = self.span_here();
        if self.check(TokenKind::Question) {
            self.advance();
            let inner = self.try_parse_type_base()?;
            let span = start.merge(inner.span());
            return Some(TypeExpr::Optional(Box::new(inner), span));
        }

        let base = self.try_parse_type_base()?;
        if self.check(TokenKind::Bang) {
            self.advance();
            let err = self.try_parse_type_base()?;
            let span = base.span().merge(err.span());
            return Some(TypeExpr::Fallible(Box::new(base), Box::new(err), span));
        }
        Some(base)
    }

    fn try_parse_type_base(&mut self) -> Option<TypeExpr> {
        if !self.check(TokenKind::Ident) {
            return None;
        }
        let token = self.advance();
        if self.check(TokenKind::LParen) {
            self.advance();
            let mut args = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    args.push(self.try_parse_type_expr()?);
                    if self.eat(TokenKind::Comma).is_some() {
                        continue;
                    }
                    break;
                }
            }
            let close = self.current().span;
            if self.eat(TokenKind::RParen).is_none() {
                return None;
            }
            let span = token.span.merge(close);
            return Some(TypeExpr::Applied(token.text, args, span));
        }
        Some(TypeExpr::Named(token.text, token.span))
    }
}
