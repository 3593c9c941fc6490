//! End-to-end scenarios exercised through the full `al::compile` pipeline.

fn codes(diagnostics: &[al_common::Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.code).collect()
}

fn errors(result: &al::CompileResult) -> Vec<&al_common::Diagnostic> {
    result.diagnostics.iter().filter(|d| d.is_error()).collect()
}

#[test]
fn polymorphism_infers_both_call_sites() {
    let result = al::compile("fn id(x) { x }\na = id(42)\nb = id('hi')\n");
    assert!(result.success, "{:?}", result.diagnostics);
}

#[test]
fn exhaustiveness_on_enums_names_missing_witness() {
    let result = al::compile("enum Color { Red, Green, Blue }\nc Color = Color.Red\nmatch c { Red -> 1, Green -> 2 }\n");
    let errs = errors(&result);
    assert_eq!(errs.len(), 1, "{:?}", result.diagnostics);
    assert!(errs[0].message.contains("Blue"), "{}", errs[0].message);
}

#[test]
fn or_expression_unwraps_result() {
    let result = al::compile("struct E { msg String }\nfn f() Int!E { error E{ msg: 'x' } }\nv = f() or 0\n");
    assert!(result.success, "{:?}", result.diagnostics);
}

#[test]
fn unused_value_is_an_error() {
    let result = al::compile("fn g() Int { 1 }\nfn main() { g()\n0 }\n");
    let errs = errors(&result);
    assert_eq!(errs.len(), 1, "{:?}", result.diagnostics);
    assert!(errs[0].message.contains("must be consumed"));
}

#[test]
fn parser_recovers_across_multiple_errors() {
    let source = "fn a(x { 1 }\nfn b(y { 2 }\nfn c(z { 3 }\nfn tail() { 4 }\n";
    let result = al::compile(source);
    let parse_errors = codes(&result.diagnostics).into_iter().filter(|c| c.starts_with('P')).count();
    assert!(parse_errors >= 3, "{:?}", result.diagnostics);
    // The well-formed tail declaration still parses and type-checks.
    assert!(result.env.lookup("tail").is_some());
}

#[test]
fn array_spread_pattern_is_exhaustive() {
    let result = al::compile("match [1, 2, 3, 4] { [1, ..rest] -> rest, [] -> [] }\n");
    assert!(!codes(&result.diagnostics).contains(&"T0011"), "{:?}", result.diagnostics);
}
