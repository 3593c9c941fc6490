use al_common::{Diagnostic, Span};

/// Where the parser currently is syntactically. Drives `synchronize()`'s
/// resync strategy after a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    TopLevel,
    Block,
    FunctionParams,
    Array,
    StructInit,
    StructDef,
    EnumDef,
    MatchArms,
}

/// Internal result type for parser helpers. `Err` carries no payload --
/// the diagnostic was already appended to the shared list by the point a
/// helper fails; the caller's job is only to insert an `ErrorNode` and
/// call `synchronize`.
pub type PResult<T> = Result<T, ParseFailure>;

#[derive(Debug, Clone, Copy)]
pub struct ParseFailure;

pub fn unexpected_token(span: Span, expected: &str, found: &str) -> Diagnostic {
    Diagnostic::error(
        "P0001",
        span,
        format!("expected {expected}, found `{found}`"),
    )
}

pub fn internal_recovery_limit(span: Span) -> Diagnostic {
    Diagnostic::error(
        "P0999",
        span,
        "parser internal error: synchronize() exceeded its iteration limit",
    )
}
