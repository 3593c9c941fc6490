use al_common::TokenKind;

use crate::ast::{Block, DestructureElement, FieldDef, Node, Param, Stmt, VariantDef};
use crate::error::{Context, PResult};

use super::Parser;

fn is_uppercase_ident(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_uppercase())
}

impl Parser {
    pub(crate) fn parse_statement_or_expr(&mut self) -> PResult<Node> {
        match self.current().kind {
            TokenKind::Fn => self.parse_function_declaration().map(Node::Stmt),
            TokenKind::Struct => self.parse_struct_declaration().map(Node::Stmt),
            TokenKind::Enum => self.parse_enum_declaration().map(Node::Stmt),
            TokenKind::Const => self.parse_const_binding().map(Node::Stmt),
            TokenKind::From => self.parse_import_declaration().map(Node::Stmt),
            TokenKind::Export => self.parse_export_declaration().map(Node::Stmt),
            TokenKind::LParen => self.parse_paren_led_statement(),
            TokenKind::Ident => self.parse_ident_led_statement(),
            _ => self.parse_expression().map(Node::Expr),
        }
    }

    fn parse_paren_led_statement(&mut self) -> PResult<Node> {
        if self.looks_like_tuple_destructure() {
            self.parse_tuple_destructuring_binding().map(Node::Stmt)
        } else {
            self.parse_expression().map(Node::Expr)
        }
    }

    fn looks_like_tuple_destructure(&self) -> bool {
        let mut offset = 1; // skip '('
        if self.peek_at(offset).kind == TokenKind::RParen {
            return false;
        }
        loop {
            if self.peek_at(offset).kind != TokenKind::Ident {
                return false;
            }
            offset += 1;
            match self.peek_at(offset).kind {
                TokenKind::Comma => {
                    offset += 1;
                }
                TokenKind::RParen => {
                    offset += 1;
                    return self.peek_at(offset).kind == TokenKind::Eq;
                }
                _ => return false,
            }
        }
    }

    fn parse_tuple_destructuring_binding(&mut self) -> PResult<Stmt> {
        let start = self.span_here();
        self.advance(); // '('
        let mut elements = Vec::new();
        while !self.check(TokenKind::RParen) {
            let token = self.expect(TokenKind::Ident, "a binding name")?;
            if is_uppercase_ident(&token.text) {
                elements.push(DestructureElement::TypeAssert(token.text, token.span));
            } else {
                elements.push(DestructureElement::Name(token.text, token.span));
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Eq, "`=`")?;
        let init = self.parse_expression()?;
        let span = start.merge(init.span());
        Ok(Stmt::TupleDestructuringBinding {
            elements,
            init: Box::new(init),
            span,
        })
    }

    fn parse_ident_led_statement(&mut self) -> PResult<Node> {
        let name_token = self.current().clone();

        if self.check_at(1, TokenKind::Eq) {
            self.advance(); // name
            self.advance(); // '='
            let init = self.parse_expression()?;
            let span = name_token.span.merge(init.span());
            if is_uppercase_ident(&name_token.text) {
                return Ok(Node::Stmt(Stmt::TypePatternBinding {
                    type_name: name_token.text,
                    init: Box::new(init),
                    span,
                }));
            }
            let doc = name_token.doc_comment().map(|s| s.to_string());
            return Ok(Node::Stmt(Stmt::VariableBinding {
                name: name_token.text,
                type_annotation: None,
                init: Box::new(init),
                doc,
                span,
            }));
        }

        if matches!(self.peek_at(1).kind, TokenKind::Ident | TokenKind::Question) {
            let checkpoint = self.index;
            self.advance(); // name
            if let Some(type_annotation) = self.try_parse_type_expr() {
                if self.check(TokenKind::Eq) {
                    self.advance();
                    let init = self.parse_expression()?;
                    let span = name_token.span.merge(init.span());
                    let doc = name_token.doc_comment().map(|s| s.to_string());
                    return Ok(Node::Stmt(Stmt::VariableBinding {
                        name: name_token.text,
                        type_annotation: Some(type_annotation),
                        init: Box::new(init),
                        doc,
                        span,
                    }));
                }
            }
            self.index = checkpoint;
        }

        self.parse_expression().map(Node::Expr)
    }

    fn parse_const_binding(&mut self) -> PResult<Stmt> {
        let const_token = self.advance(); // 'const'
        let name = self.expect(TokenKind::Ident, "a constant name")?;
        self.expect(TokenKind::Eq, "`=`")?;
        let init = self.parse_expression()?;
        let span = const_token.span.merge(init.span());
        let doc = const_token.doc_comment().map(|s| s.to_string());
        Ok(Stmt::ConstBinding {
            name: name.text,
            init: Box::new(init),
            doc,
            span,
        })
    }

    fn parse_import_declaration(&mut self) -> PResult<Stmt> {
        let from_token = self.advance(); // 'from'
        let path_start = self.expect(TokenKind::InterpStringStart, "a module path string")?;
        let mut path = String::new();
        while let Some(part) = self.eat(TokenKind::InterpStringPart) {
            path.push_str(&part.text);
        }
        let path_end = self.expect(TokenKind::InterpStringEnd, "`'`")?;
        self.expect(TokenKind::Import, "`import`")?;
        let mut names = Vec::new();
        loop {
            let name = self.expect(TokenKind::Ident, "an imported name")?;
            names.push(name.text);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let _ = path_start;
        let span = from_token.span.merge(path_end.span);
        Ok(Stmt::ImportDeclaration { path, names, span })
    }

    fn parse_export_declaration(&mut self) -> PResult<Stmt> {
        let export_token = self.advance(); // 'export'
        let inner = self.parse_declaration_statement()?;
        let span = export_token.span.merge(inner.span());
        Ok(Stmt::ExportDeclaration {
            inner: Box::new(inner),
            span,
        })
    }

    /// A declaration suitable for `export` (not an arbitrary statement).
    fn parse_declaration_statement(&mut self) -> PResult<Stmt> {
        match self.current().kind {
            TokenKind::Fn => self.parse_function_declaration(),
            TokenKind::Struct => self.parse_struct_declaration(),
            TokenKind::Enum => self.parse_enum_declaration(),
            TokenKind::Const => self.parse_const_binding(),
            _ => Err(self.error_here("expected a declaration after `export`")),
        }
    }

    fn parse_function_declaration(&mut self) -> PResult<Stmt> {
        let fn_token = self.advance(); // 'fn'
        let doc = fn_token.doc_comment().map(|s| s.to_string());
        let name = self.expect(TokenKind::Ident, "a function name")?;

        self.expect(TokenKind::LParen, "`(`")?;
        self.push_context(Context::FunctionParams);
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            match self.parse_param() {
                Ok(param) => params.push(param),
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

        let return_type = if self.check(TokenKind::LBrace) {
            None
        } else {
            Some(self.parse_type_expr()?)
        };

        let body = self.parse_block()?;
        let span = fn_token.span.merge(body.span);
        Ok(Stmt::FunctionDeclaration {
            name: name.text,
            params,
            return_type,
            body,
            doc,
            span,
        })
    }

    pub(crate) fn parse_param(&mut self) -> PResult<Param> {
        let name = self.expect(TokenKind::Ident, "a parameter name")?;
        let type_annotation = if matches!(self.current().kind, TokenKind::Comma | TokenKind::RParen) {
            None
        } else {
            Some(self.parse_type_expr()?)
        };
        let span = match &type_annotation {
            Some(t) => name.span.merge(t.span()),
            None => name.span,
        };
        Ok(Param {
            name: name.text,
            type_annotation,
            span,
        })
    }

    pub(crate) fn parse_block(&mut self) -> PResult<Block> {
        let open = self.expect(TokenKind::LBrace, "`{`")?;
        self.push_context(Context::Block);
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_statement_or_expr() {
                Ok(node) => body.push(node),
                Err(_) => {
                    let span = self.span_here();
                    body.push(Node::Expr(crate::ast::Expr::ErrorNode {
                        message: "failed to parse statement".to_string(),
                        span,
                    }));
                    self.synchronize();
                }
            }
        }
        let close = if self.check(TokenKind::RBrace) {
            let t = self.advance();
            self.pop_context();
            t.span
        } else {
            self.span_here()
        };
        Ok(Block {
            body,
            span: open.span.merge(close),
        })
    }

    fn parse_struct_declaration(&mut self) -> PResult<Stmt> {
        let struct_token = self.advance(); // 'struct'
        let doc = struct_token.doc_comment().map(|s| s.to_string());
        let name = self.expect(TokenKind::Ident, "a struct name")?;
        let generics = self.parse_optional_generics()?;

        self.expect(TokenKind::LBrace, "`{`")?;
        self.push_context(Context::StructDef);
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_field_def() {
                Ok(field) => fields.push(field),
                Err(_) => {
                    self.synchronize();
                    continue;
                }
            }
            if !self.eat_item_separator() {
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

        let span = struct_token.span.merge(close);
        Ok(Stmt::StructDeclaration {
            name: name.text,
            generics,
            fields,
            doc,
            span,
        })
    }

    fn parse_field_def(&mut self) -> PResult<FieldDef> {
        let name = self.expect(TokenKind::Ident, "a field name")?;
        self.eat(TokenKind::Colon);
        let type_annotation = self.parse_type_expr()?;
        let span = name.span.merge(type_annotation.span());
        Ok(FieldDef {
            name: name.text,
            type_annotation,
            span,
        })
    }

    fn parse_enum_declaration(&mut self) -> PResult<Stmt> {
        let enum_token = self.advance(); // 'enum'
        let doc = enum_token.doc_comment().map(|s| s.to_string());
        let name = self.expect(TokenKind::Ident, "an enum name")?;
        let generics = self.parse_optional_generics()?;

        self.expect(TokenKind::LBrace, "`{`")?;
        self.push_context(Context::EnumDef);
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_variant_def() {
                Ok(variant) => variants.push(variant),
                Err(_) => {
                    self.synchronize();
                    continue;
                }
            }
            if !self.eat_item_separator() {
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

        let span = enum_token.span.merge(close);
        Ok(Stmt::EnumDeclaration {
            name: name.text,
            generics,
            variants,
            doc,
            span,
        })
    }

    fn parse_variant_def(&mut self) -> PResult<VariantDef> {
        let name = self.expect(TokenKind::Ident, "a variant name")?;
        let mut payload = Vec::new();
        let mut span = name.span;
        if self.eat(TokenKind::LParen).is_some() {
            while !self.check(TokenKind::RParen) {
                let t = self.parse_type_expr()?;
                payload.push(t);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            let close = self.expect(TokenKind::RParen, "`)`")?;
            span = span.merge(close.span);
        }
        Ok(VariantDef {
            name: name.text,
            payload,
            span,
        })
    }

    /// Struct/enum definitions accept either `,` (canonical, matches the
    /// recovery rule) or `;` as an item separator; the trailing one is
    /// optional.
    fn eat_item_separator(&mut self) -> bool {
        self.eat(TokenKind::Comma).is_some() || self.eat(TokenKind::Semicolon).is_some()
    }

    fn parse_optional_generics(&mut self) -> PResult<Vec<String>> {
        if self.eat(TokenKind::LParen).is_none() {
            return Ok(Vec::new());
        }
        let mut generics = Vec::new();
        while !self.check(TokenKind::RParen) {
            let t = self.expect(TokenKind::Ident, "a type parameter")?;
            generics.push(t.text);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(generics)
    }
}
