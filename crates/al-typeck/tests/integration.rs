//! End-to-end type-checker scenarios, covering generics, structs, patterns,
//! propagation, and diagnostic provenance together rather than in isolation.

use al_lexer::Lexer;
use al_typeck::ty::Ty;
use al_typeck::CheckResult;

fn check_source(src: &str) -> CheckResult {
    let tokens = Lexer::scan(src).tokens;
    let parsed = al_parser::parse(tokens);
    al_typeck::check(&parsed.ast)
}

fn errors(result: &CheckResult) -> Vec<&al_common::Diagnostic> {
    result.diagnostics.iter().filter(|d| d.is_error()).collect()
}

#[test]
fn generic_struct_instantiates_fresh_per_site() {
    let result = check_source("struct Box(D) { data D }\na = Box{data: 1}\nb = Box{data: 'hi'}\n");
    assert!(errors(&result).is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn tuple_destructuring_binds_each_element() {
    let result = check_source("pair = (1, 'a')\n(n, s) = pair\n");
    assert!(errors(&result).is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn occurs_check_rejects_self_application() {
    let result = check_source("fn f(x) { x(x) }\n");
    assert!(result.diagnostics.iter().any(|d| d.code == "T0002"), "{:?}", result.diagnostics);
}

#[test]
fn question_mark_propagates_through_option_returning_function() {
    let result = check_source("fn head(xs Array(Int)) Option(Int) {\n  Some(xs[0])\n}\nfn first(xs Array(Int)) Option(Int) {\n  v = head(xs)?\n  Some(v)\n}\n");
    assert!(errors(&result).is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn propagation_outside_a_function_is_rejected() {
    let result = check_source("x = Some(1)\ny = x?\n");
    assert!(result.diagnostics.iter().any(|d| d.code == "T0015"), "{:?}", result.diagnostics);
}

#[test]
fn type_position_index_records_every_resolved_reference() {
    let result = check_source("x = 1\ny = x\n");
    assert!(result.env.type_positions.iter().any(|p| p.name == "x" && p.ty == Ty::Int));
}

#[test]
fn scope_stack_returns_to_top_level_depth() {
    let result = check_source("fn f(x) {\n  y = x\n  y\n}\n");
    assert!(errors(&result).is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.env.depth(), 1);
}

#[test]
fn negative_literal_and_range_patterns_lower_correctly() {
    let result = check_source("n = -1\nmatch n {\n  -1 -> 'neg',\n  0..10 -> 'small',\n  else -> 'other',\n}\n");
    assert!(errors(&result).is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn or_pattern_arm_is_useful_once() {
    let result = check_source("enum Color { Red, Green, Blue }\nc = Red\nmatch c {\n  Red | Green -> 1,\n  Blue -> 2,\n}\n");
    assert!(errors(&result).is_empty(), "{:?}", result.diagnostics);
    assert!(!result.diagnostics.iter().any(|d| d.code == "T0012"), "{:?}", result.diagnostics);
}

#[test]
fn qualified_enum_variant_construction_checks_arity() {
    let result = check_source("enum Shape { Circle(Int); Square(Int, Int) }\ns = Shape.Circle(1, 2)\n");
    assert!(result.diagnostics.iter().any(|d| d.code == "T0010"), "{:?}", result.diagnostics);
}
