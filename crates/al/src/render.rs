//! Ariadne-based rendering of [`Diagnostic`] lists to terminal-friendly text.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use al_common::{Diagnostic, LineIndex, Severity};

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Hint => ReportKind::Advice,
    }
}

fn label_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Hint => Color::Blue,
    }
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let start = range.start.min(len);
    let end = range.end.min(len).max(start);
    if start == end {
        start..end.saturating_add(1).min(len.max(1))
    } else {
        start..end
    }
}

/// Render a single diagnostic as an ariadne report against `source`.
///
/// Colorless (`Config::default().with_color(false)`), for output that stays
/// stable across terminals and test assertions.
pub fn render_diagnostic(diag: &Diagnostic, source: &str) -> String {
    let index = LineIndex::new(source);
    let span = clamp(index.span_to_range(diag.span), source.len());

    let mut builder = Report::<Range<usize>>::build(report_kind(diag.severity), span.clone())
        .with_code(diag.code)
        .with_message(&diag.message)
        .with_config(Config::default().with_color(false))
        .with_label(Label::new(span).with_message(&diag.message).with_color(label_color(diag.severity)));
    if let Some(help) = &diag.help {
        builder.set_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    report.write(Source::from(source), &mut buf).expect("writing to an in-memory buffer never fails");
    String::from_utf8(buf).expect("ariadne emits valid UTF-8")
}

/// Render every diagnostic and a trailing error/warning-count summary.
pub fn render_all(diagnostics: &[Diagnostic], source: &str) -> String {
    let mut out = String::new();
    for diag in diagnostics {
        out.push_str(&render_diagnostic(diag, source));
    }
    let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    let warnings = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
    out.push_str(&format!("{errors} error(s), {warnings} warning(s)\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use al_common::Span;

    #[test]
    fn renders_code_and_message() {
        let diag = Diagnostic::error("T0004", Span::point(1, 5), "unknown name `xx`");
        let out = render_diagnostic(&diag, "y = xx\n");
        assert!(out.contains("T0004"));
        assert!(out.contains("unknown name"));
    }

    #[test]
    fn summary_counts_by_severity() {
        let diags = vec![
            Diagnostic::error("T0001", Span::point(1, 1), "mismatch"),
            Diagnostic::warning("T0012", Span::point(2, 1), "unreachable"),
        ];
        let out = render_all(&diags, "a\nb\n");
        assert!(out.contains("1 error(s), 1 warning(s)"));
    }
}
