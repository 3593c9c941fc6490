use al_common::TokenKind;

use crate::ast::Pattern;
use crate::error::PResult;

use super::Parser;

impl Parser {
    /// `pattern := '_' | pattern ('|' pattern)+ | expr`
    ///
    /// Everything that isn't `_` or an or-chain is parsed as an ordinary
    /// expression and wrapped -- literals, identifiers (bindings), tuples,
    /// arrays with spread, constructor calls, and property accesses are all
    /// read structurally by the exhaustiveness analyzer later, not here.
    pub(crate) fn parse_pattern(&mut self) -> PResult<Pattern> {
        let first = self.parse_pattern_atom()?;
        if !self.check(TokenKind::Pipe) {
            return Ok(first);
        }
        let mut alts = vec![first];
        while self.eat(TokenKind::Pipe).is_some() {
            alts.push(self.parse_pattern_atom()?);
        }
        let span = alts.first().unwrap().span().merge(alts.last().unwrap().span());
        Ok(Pattern::Or(alts, span))
    }

    fn parse_pattern_atom(&mut self) -> PResult<Pattern> {
        if self.check(TokenKind::Ident) && self.current().text == "_" {
            let t = self.advance();
            return Ok(Pattern::Wildcard(t.span));
        }
        let expr = self.parse_expression()?;
        Ok(Pattern::Expr(Box::new(expr)))
    }
}
