//! Driver crate: wires the scanner, parser, and type checker into a single
//! synchronous `compile` pipeline, plus the ambient concerns a standalone
//! tool needs around that core -- configuration and diagnostic rendering.
//!
//! The core crates ([`al_lexer`], [`al_parser`], [`al_typeck`]) never touch
//! the filesystem or a terminal; this crate is where that happens.

pub mod config;
pub mod render;

use al_common::Diagnostic;
use al_parser::ast::Block;
use al_typeck::typed::TypedBlock;
use al_typeck::env::TypeEnv;

/// Everything produced by running a source string through every stage.
pub struct CompileResult {
    pub ast: Block,
    pub typed_ast: TypedBlock,
    pub env: TypeEnv,
    /// Scanner, parser, and type-checker diagnostics, in that stage order;
    /// within a stage, in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// `true` iff no diagnostic is error-severity.
    pub success: bool,
}

/// Run the full `source -> (typed_ast, diagnostics)` pipeline.
///
/// No diagnostic is fatal: scan, parse, and check all run to completion
/// regardless of earlier failures, matching the core's "diagnostics are
/// accumulated, never thrown" design.
pub fn compile(source: &str) -> CompileResult {
    log::debug!("scanning {} byte(s)", source.len());
    let scan = al_lexer::Lexer::scan(source);
    let mut diagnostics = scan.diagnostics;

    log::debug!("parsing {} token(s)", scan.tokens.len());
    let parsed = al_parser::parse(scan.tokens);
    diagnostics.extend(parsed.diagnostics);

    log::debug!("type-checking");
    let checked = al_typeck::check(&parsed.ast);
    diagnostics.extend(checked.diagnostics);

    let success = !diagnostics.iter().any(Diagnostic::is_error);
    if !success {
        log::debug!("compile finished with {} error(s)", diagnostics.iter().filter(|d| d.is_error()).count());
    }

    CompileResult {
        ast: parsed.ast,
        typed_ast: checked.typed_ast,
        env: checked.env,
        diagnostics,
        success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polymorphic_identity_compiles_clean() {
        let result = compile("fn id(x) { x }\na = id(42)\nb = id('hi')\n");
        assert!(result.success, "{:?}", result.diagnostics);
    }

    #[test]
    fn scan_parse_check_diagnostics_are_stage_ordered() {
        // A lone unterminated string produces only a scan error; parsing and
        // checking still run over whatever the scanner recovered.
        let result = compile("x = 'unterminated\n");
        assert!(!result.success);
    }
}
