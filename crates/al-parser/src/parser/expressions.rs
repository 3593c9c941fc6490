use al_common::{Diagnostic, Literal, TokenKind};

use crate::ast::{ArrayElement, BinOp, Expr, MatchArm, PropagateKind, PropertyRight, StringPart, TypeExpr, UnOp};
use crate::error::{Context, PResult};

use super::Parser;

impl Parser {
    /// Entry point: `or` (lowest) down through precedence tiers to postfix.
    pub(crate) fn parse_expression(&mut self) -> PResult<Expr> {
        self.parse_or_level()
    }

    fn parse_or_level(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_logical_or()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let err_name = if self.check(TokenKind::Ident) && self.check_at(1, TokenKind::Arrow) {
                let name = self.advance().text;
                self.advance(); // '->'
                Some(name)
            } else {
                None
            };
            let body = self.parse_logical_or()?;
            let span = lhs.span().merge(body.span());
            lhs = Expr::OrExpression {
                lhs: Box::new(lhs),
                err_name,
                body: Box::new(body),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_logical_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_logical_and()?;
        while self.check(TokenKind::PipePipe) {
            self.advance();
            let rhs = self.parse_logical_and()?;
            lhs = self.binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.check(TokenKind::AmpAmp) {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = self.binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn binary(&self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        let span = lhs.span().merge(rhs.span());
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span,
        }
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        if matches!(self.current().kind, TokenKind::Bang | TokenKind::Minus) {
            let op_token = self.advance();
            let operand = self.parse_unary()?;
            let op = if op_token.kind == TokenKind::Bang { UnOp::Not } else { UnOp::Neg };
            let span = op_token.span.merge(operand.span());
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_range()
    }

    /// Range sits alongside postfix operators in precedence; parsed as one
    /// non-range postfix chain, optionally followed by `..` and another.
    fn parse_range(&mut self) -> PResult<Expr> {
        let start = self.parse_postfix()?;
        if self.check(TokenKind::DotDot) {
            self.advance();
            let end = self.parse_postfix()?;
            let span = start.span().merge(end.span());
            return Ok(Expr::Range {
                start: Box::new(start),
                end: Box::new(end),
                span,
            });
        }
        Ok(start)
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    expr = self.parse_property_access_tail(expr)?;
                }
                // `[` only continues an index if it has no leading trivia at
                // all -- this is what stops `arr\n[1, 2]` from being parsed
                // as a continued index into a new-line array literal.
                TokenKind::LBracket if !self.current().has_leading_trivia() => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let close = self.expect(TokenKind::RBracket, "`]`")?;
                    let span = expr.span().merge(close.span);
                    expr = Expr::ArrayIndex {
                        array: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Bang => {
                    let t = self.advance();
                    let span = expr.span().merge(t.span);
                    expr = Expr::Propagate {
                        inner: Box::new(expr),
                        kind: PropagateKind::Bang,
                        span,
                    };
                }
                TokenKind::Question => {
                    let t = self.advance();
                    let span = expr.span().merge(t.span);
                    expr = Expr::Propagate {
                        inner: Box::new(expr),
                        kind: PropagateKind::Question,
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_property_access_tail(&mut self, left: Expr) -> PResult<Expr> {
        self.advance(); // '.'
        if self.check(TokenKind::IntLiteral) {
            let idx_token = self.advance();
            let idx = idx_token.text.parse::<u32>().unwrap_or(0);
            let span = left.span().merge(idx_token.span);
            return Ok(Expr::PropertyAccess {
                left: Box::new(left),
                right: PropertyRight::TupleIndex(idx),
                span,
            });
        }
        let name = self.expect(TokenKind::Ident, "a property name")?;
        if self.check(TokenKind::LParen) {
            let (args, close_span) = self.parse_paren_args()?;
            let span = left.span().merge(close_span);
            return Ok(Expr::PropertyAccess {
                left: Box::new(left),
                right: PropertyRight::Call { name: name.text, args },
                span,
            });
        }
        let span = left.span().merge(name.span);
        Ok(Expr::PropertyAccess {
            left: Box::new(left),
            right: PropertyRight::Name(name.text),
            span,
        })
    }

    fn parse_paren_args(&mut self) -> PResult<(Vec<Expr>, al_common::Span)> {
        self.expect(TokenKind::LParen, "`(`")?;
        self.push_context(Context::FunctionParams);
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                match self.parse_expression() {
                    Ok(e) => args.push(e),
                    Err(_) => {
                        self.synchronize();
                        continue;
                    }
                }
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = if self.check(TokenKind::RParen) {
            let t = self.advance();
            self.pop_context();
            t.span
        } else {
            self.synchronize();
            self.span_here()
        };
        Ok((args, close))
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.current().kind {
            TokenKind::IntLiteral => {
                let t = self.advance();
                let value = match t.literal {
                    Some(Literal::Int(v)) => v,
                    _ => 0,
                };
                Ok(Expr::IntLiteral(value, t.span))
            }
            TokenKind::FloatLiteral => {
                let t = self.advance();
                let value = match t.literal {
                    Some(Literal::Float(v)) => v,
                    _ => 0.0,
                };
                Ok(Expr::FloatLiteral(value, t.span))
            }
            TokenKind::True => {
                let t = self.advance();
                Ok(Expr::BoolLiteral(true, t.span))
            }
            TokenKind::False => {
                let t = self.advance();
                Ok(Expr::BoolLiteral(false, t.span))
            }
            TokenKind::None => {
                let t = self.advance();
                Ok(Expr::NoneLiteral(t.span))
            }
            TokenKind::InterpStringStart => self.parse_string_literal_or_interp(),
            TokenKind::LParen => self.parse_paren_or_tuple(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::If => self.parse_if_expr(),
            TokenKind::Match => self.parse_match_expr(),
            TokenKind::LBrace => Ok(Expr::Block(self.parse_block()?)),
            TokenKind::Fn => self.parse_function_expr(),
            TokenKind::Assert => self.parse_assert_expr(),
            TokenKind::Error => self.parse_error_expr(),
            TokenKind::Ident => self.parse_ident_primary(),
            _ => {
                let text = self.current().text.clone();
                Err(self.error_here(format!("unexpected token `{text}`")))
            }
        }
    }

    /// The scanner swallows the `${`/`}` delimiters of depth-0 interpolation
    /// itself (and the `$` of bare `$ident`), so an interpolated segment in
    /// the token stream is just whatever tokens its expression needs -- no
    /// opening or closing delimiter token to match here.
    fn parse_string_literal_or_interp(&mut self) -> PResult<Expr> {
        let start = self.advance(); // InterpStringStart
        let mut parts = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::InterpStringPart => {
                    let t = self.advance();
                    let text = match t.literal {
                        Some(Literal::Str(s)) => s,
                        _ => t.text,
                    };
                    parts.push(StringPart::Text(text));
                }
                TokenKind::InterpStringEnd => break,
                _ => {
                    let e = self.parse_expression()?;
                    parts.push(StringPart::Expr(Box::new(e)));
                }
            }
        }
        let end = self.expect(TokenKind::InterpStringEnd, "`'`")?;
        let span = start.span.merge(end.span);

        if parts.iter().all(|p| matches!(p, StringPart::Text(_))) {
            let mut combined = String::new();
            for part in &parts {
                if let StringPart::Text(t) = part {
                    combined.push_str(t);
                }
            }
            return Ok(Expr::StringLiteral(combined, span));
        }
        Ok(Expr::InterpolatedString(parts, span))
    }

    /// `(e)` is grouping; `(e,)`/`(e, e, ...)` is a tuple; `()` is rejected.
    fn parse_paren_or_tuple(&mut self) -> PResult<Expr> {
        let open = self.advance(); // '('
        if self.check(TokenKind::RParen) {
            let close = self.advance();
            let span = open.span.merge(close.span);
            self.diagnostics
                .push(Diagnostic::error("P0003", span, "empty `()` is not a valid expression"));
            return Ok(Expr::ErrorNode {
                message: "empty parentheses".to_string(),
                span,
            });
        }
        let first = self.parse_expression()?;
        if self.eat(TokenKind::Comma).is_some() {
            let mut elements = vec![first];
            while !self.check(TokenKind::RParen) {
                elements.push(self.parse_expression()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            let close = self.expect(TokenKind::RParen, "`)`")?;
            let span = open.span.merge(close.span);
            return Ok(Expr::Tuple(elements, span));
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(first)
    }

    fn parse_array_literal(&mut self) -> PResult<Expr> {
        let open = self.advance(); // '['
        self.push_context(Context::Array);
        let mut elements = Vec::new();
        while !self.check(TokenKind::RBracket) && !self.is_at_end() {
            if self.eat(TokenKind::DotDot).is_some() {
                match self.parse_expression() {
                    Ok(e) => elements.push(ArrayElement::Spread(e)),
                    Err(_) => {
                        self.synchronize();
                        continue;
                    }
                }
            } else {
                match self.parse_expression() {
                    Ok(e) => elements.push(ArrayElement::Item(e)),
                    Err(_) => {
                        self.synchronize();
                        continue;
                    }
                }
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = if self.check(TokenKind::RBracket) {
            let t = self.advance();
            self.pop_context();
            t.span
        } else {
            self.synchronize();
            self.span_here()
        };
        let span = open.span.merge(close);
        Ok(Expr::Array(elements, span))
    }

    fn parse_if_expr(&mut self) -> PResult<Expr> {
        let if_token = self.advance();
        let cond = self.parse_expression()?;
        let then = self.parse_block()?;
        let else_ = if self.eat(TokenKind::Else).is_some() {
            if self.check(TokenKind::If) {
                Some(Box::new(self.parse_if_expr()?))
            } else {
                Some(Box::new(Expr::Block(self.parse_block()?)))
            }
        } else {
            None
        };
        let end_span = else_.as_ref().map(|e| e.span()).unwrap_or(then.span);
        let span = if_token.span.merge(end_span);
        Ok(Expr::If {
            cond: Box::new(cond),
            then,
            else_,
            span,
        })
    }

    fn parse_match_expr(&mut self) -> PResult<Expr> {
        let match_token = self.advance();
        let subject = self.parse_expression()?;
        self.expect(TokenKind::LBrace, "`{`")?;
        self.push_context(Context::MatchArms);
        let mut arms = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_match_arm() {
                Ok(arm) => arms.push(arm),
                Err(_) => {
                    self.synchronize();
                    continue;
                }
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = if self.check(TokenKind::RBrace) {
            let t = self.advance();
            self.pop_context();
            t.span
        } else {
            self.synchronize();
            self.span_here()
        };
        let span = match_token.span.merge(close);
        Ok(Expr::Match {
            subject: Box::new(subject),
            arms,
            span,
        })
    }

    fn parse_match_arm(&mut self) -> PResult<MatchArm> {
        let pattern = if self.check(TokenKind::Else) {
            let t = self.advance();
            crate::ast::Pattern::Wildcard(t.span)
        } else {
            self.parse_pattern()?
        };
        self.expect(TokenKind::Arrow, "`->`")?;
        let body = self.parse_expression()?;
        let span = pattern.span().merge(body.span());
        Ok(MatchArm {
            pattern,
            body: Box::new(body),
            span,
        })
    }

    fn parse_function_expr(&mut self) -> PResult<Expr> {
        let fn_token = self.advance();
        self.expect(TokenKind::LParen, "`(`")?;
        self.push_context(Context::FunctionParams);
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            match self.parse_param() {
                Ok(p) => params.push(p),
                Err(_) => {
                    self.synchronize();
                    continue;
                }
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        if self.check(TokenKind::RParen) {
            self.advance();
            self.pop_context();
        } else {
            self.synchronize();
        }
        let return_type: Option<TypeExpr> = if self.check(TokenKind::LBrace) {
            None
        } else {
            Some(self.parse_type_expr()?)
        };
        let body = self.parse_block()?;
        let span = fn_token.span.merge(body.span);
        Ok(Expr::FunctionExpr { params, return_type, body, span })
    }

    fn parse_assert_expr(&mut self) -> PResult<Expr> {
        let assert_token = self.advance();
        let cond = self.parse_expression()?;
        self.expect(TokenKind::Comma, "`,`")?;
        let message = self.parse_expression()?;
        let span = assert_token.span.merge(message.span());
        Ok(Expr::Assert {
            cond: Box::new(cond),
            message: Box::new(message),
            span,
        })
    }

    fn parse_error_expr(&mut self) -> PResult<Expr> {
        let error_token = self.advance();
        let inner = self.parse_postfix()?;
        let span = error_token.span.merge(inner.span());
        Ok(Expr::ErrorExpression {
            inner: Box::new(inner),
            span,
        })
    }

    fn parse_ident_primary(&mut self) -> PResult<Expr> {
        let name_token = self.advance();

        if self.check(TokenKind::LParen) {
            if let Some((type_args, close_span)) = self.try_parse_generic_init_type_args() {
                let name_span = name_token.span.merge(close_span);
                return self.parse_struct_init_fields(name_token.text, type_args, name_span);
            }
            let (args, close_span) = self.parse_paren_args()?;
            let callee_span = name_token.span;
            let span = callee_span.merge(close_span);
            return Ok(Expr::Call {
                callee: Box::new(Expr::Identifier(name_token.text, callee_span)),
                args,
                span,
            });
        }

        if self.check(TokenKind::LBrace) && self.looks_like_struct_init_body() {
            return self.parse_struct_init_fields(name_token.text, Vec::new(), name_token.span);
        }

        Ok(Expr::Identifier(name_token.text, name_token.span))
    }

    fn looks_like_struct_init_body(&self) -> bool {
        self.peek_at(1).kind == TokenKind::RBrace
            || (self.peek_at(1).kind == TokenKind::Ident && self.peek_at(2).kind == TokenKind::Colon)
    }

    /// `(T1, T2)` followed directly by `{` is generic type arguments for a
    /// struct initializer, not a call -- try the type-list reading first
    /// and fall back to call-argument parsing if it doesn't fit.
    fn try_parse_generic_init_type_args(&mut self) -> Option<(Vec<TypeExpr>, al_common::Span)> {
        let checkpoint = self.index;
        self.advance(); // '('
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                match self.try_parse_type_expr() {
                    Some(t) => args.push(t),
                    None => {
                        self.index = checkpoint;
                        return None;
                    }
                }
                if self.eat(TokenKind::Comma).is_some() {
                    continue;
                }
                break;
            }
        }
        if !self.check(TokenKind::RParen) {
            self.index = checkpoint;
            return None;
        }
        let close = self.advance().span;
        if !self.check(TokenKind::LBrace) {
            self.index = checkpoint;
            return None;
        }
        Some((args, close))
    }

    fn parse_struct_init_fields(&mut self, name: String, type_args: Vec<TypeExpr>, name_span: al_common::Span) -> PResult<Expr> {
        self.expect(TokenKind::LBrace, "`{`")?;
        self.push_context(Context::StructInit);
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_struct_init_field() {
                Ok(f) => fields.push(f),
                Err(_) => {
                    self.synchronize();
                    continue;
                }
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = if self.check(TokenKind::RBrace) {
            let t = self.advance();
            self.pop_context();
            t.span
        } else {
            self.synchronize();
            self.span_here()
        };
        let span = name_span.merge(close);
        Ok(Expr::StructInit { name, type_args, fields, span })
    }

    fn parse_struct_init_field(&mut self) -> PResult<(String, Expr)> {
        let name = self.expect(TokenKind::Ident, "a field name")?;
        self.expect(TokenKind::Colon, "`:`")?;
        let value = self.parse_expression()?;
        Ok((name.text, value))
    }
}
