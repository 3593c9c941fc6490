use serde::Serialize;

use crate::span::Span;

/// Severity of a single diagnostic. Errors block downstream stages from
/// running on the affected item; warnings and hints never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

/// A single compiler diagnostic: a positioned message plus the stable code
/// that identifies what produced it.
///
/// Diagnostics are values, never exceptions -- every stage of the pipeline
/// collects them into a `Vec<Diagnostic>` and keeps going, so a single source
/// file can surface every problem it has in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub span: Span,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &'static str, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Error,
            code,
            message: message.into(),
            help: None,
        }
    }

    pub fn warning(code: &'static str, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Warning,
            code,
            message: message.into(),
            help: None,
        }
    }

    pub fn hint(code: &'static str, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Hint,
            code,
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let span = Span::point(1, 1);
        let diag = Diagnostic::error("E0100", span, "boom").with_help("try this instead");
        assert!(diag.is_error());
        assert_eq!(diag.help.as_deref(), Some("try this instead"));
    }
}
