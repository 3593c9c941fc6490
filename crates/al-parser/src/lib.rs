//! Recursive-descent parser with context-stack error recovery.
//!
//! [`parse`] never fails outright: a malformed program still yields a
//! [`ParseResult`] with a best-effort AST (holes filled by
//! `Expr::ErrorNode`) plus the diagnostics explaining what broke.

pub mod ast;
pub mod error;
mod parser;

pub use ast::{
    ArrayElement, BinOp, Block, DestructureElement, Expr, FieldDef, MatchArm, Node, Param,
    Pattern, PropagateKind, PropertyRight, Stmt, StringPart, TypeExpr, UnOp, VariantDef,
};
pub use error::Context;
pub use parser::{parse, ParseResult};

#[cfg(test)]
mod tests {
    use super::*;
    use al_lexer::Lexer;

    fn parse_source(src: &str) -> ParseResult {
        let scan = Lexer::scan(src);
        parse(scan.tokens)
    }

    #[test]
    fn parses_variable_binding() {
        let result = parse_source("x = 1\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.ast.body.len(), 1);
        assert!(matches!(result.ast.body[0], Node::Stmt(Stmt::VariableBinding { .. })));
    }

    #[test]
    fn parses_typed_variable_binding() {
        let result = parse_source("count Int = 0\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Stmt(Stmt::VariableBinding { type_annotation, .. }) => {
                assert!(type_annotation.is_some());
            }
            other => panic!("expected VariableBinding, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_declaration() {
        let result = parse_source("fn add(a Int, b Int) Int { a + b }\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert!(matches!(result.ast.body[0], Node::Stmt(Stmt::FunctionDeclaration { .. })));
    }

    #[test]
    fn parses_struct_declaration_with_generics() {
        let result = parse_source("struct Box(T) { value T }\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Stmt(Stmt::StructDeclaration { generics, fields, .. }) => {
                assert_eq!(generics, &["T".to_string()]);
                assert_eq!(fields.len(), 1);
            }
            other => panic!("expected StructDeclaration, got {other:?}"),
        }
    }

    #[test]
    fn parses_enum_declaration_with_comma_and_semicolon_separators() {
        let result = parse_source("enum Color { Red, Green, Blue }\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let result2 = parse_source("enum Option(T) { Some(T); None }\n");
        assert!(result2.diagnostics.is_empty(), "{:?}", result2.diagnostics);
    }

    #[test]
    fn parses_match_with_wildcard_and_or_pattern() {
        let src = "match n { 1 | 2 -> 'small', _ -> 'other' }\n";
        let result = parse_source(src);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Expr(Expr::Match { arms, .. }) => {
                assert_eq!(arms.len(), 2);
                assert!(matches!(arms[0].pattern, Pattern::Or(..)));
                assert!(matches!(arms[1].pattern, Pattern::Wildcard(_)));
            }
            other => panic!("expected Match, got {other:?}"),
        }
    }

    #[test]
    fn parses_struct_init_vs_block_ambiguity() {
        let result = parse_source("p = Point { x: 1, y: 2 }\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Stmt(Stmt::VariableBinding { init, .. }) => {
                assert!(matches!(**init, Expr::StructInit { .. }));
            }
            other => panic!("expected VariableBinding, got {other:?}"),
        }
    }

    #[test]
    fn parses_generic_struct_init_vs_call_ambiguity() {
        let result = parse_source("b = Box(Int) { value: 1 }\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Stmt(Stmt::VariableBinding { init, .. }) => match &**init {
                Expr::StructInit { type_args, .. } => assert_eq!(type_args.len(), 1),
                other => panic!("expected StructInit, got {other:?}"),
            },
            other => panic!("expected VariableBinding, got {other:?}"),
        }
    }

    #[test]
    fn array_index_requires_no_leading_trivia() {
        let result = parse_source("x = arr[0]\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Stmt(Stmt::VariableBinding { init, .. }) => {
                assert!(matches!(**init, Expr::ArrayIndex { .. }));
            }
            other => panic!("expected VariableBinding, got {other:?}"),
        }
    }

    #[test]
    fn recovers_from_malformed_top_level_item() {
        let src = "fn broken(\nfn ok() Int { 1 }\n";
        let result = parse_source(src);
        assert!(!result.diagnostics.is_empty());
        assert!(result
            .ast
            .body
            .iter()
            .any(|n| matches!(n, Node::Stmt(Stmt::FunctionDeclaration { name, .. }) if name == "ok")));
    }

    #[test]
    fn empty_parens_is_reported_as_error() {
        let result = parse_source("x = ()\n");
        assert!(result.diagnostics.iter().any(|d| d.code == "P0003"));
    }

    #[test]
    fn parses_import_declaration() {
        let result = parse_source("from 'math' import sin, cos\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Stmt(Stmt::ImportDeclaration { path, names, .. }) => {
                assert_eq!(path, "math");
                assert_eq!(names, &["sin".to_string(), "cos".to_string()]);
            }
            other => panic!("expected ImportDeclaration, got {other:?}"),
        }
    }

    #[test]
    fn parses_interpolated_string() {
        let result = parse_source("greeting = 'hello $name'\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Stmt(Stmt::VariableBinding { init, .. }) => {
                assert!(matches!(**init, Expr::InterpolatedString(..)));
            }
            other => panic!("expected VariableBinding, got {other:?}"),
        }
    }

    #[test]
    fn parses_tuple_destructuring_binding() {
        let result = parse_source("(a, b) = pair\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert!(matches!(result.ast.body[0], Node::Stmt(Stmt::TupleDestructuringBinding { .. })));
    }

    #[test]
    fn parses_or_expression_with_error_binding() {
        let result = parse_source("v = risky() or e -> 0\n");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match &result.ast.body[0] {
            Node::Stmt(Stmt::VariableBinding { init, .. }) => {
                assert!(matches!(**init, Expr::OrExpression { .. }));
            }
            other => panic!("expected VariableBinding, got {other:?}"),
        }
    }
}
