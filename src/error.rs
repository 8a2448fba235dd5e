//! Error types for template compilation

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in template source text
pub type Span = std::ops::Range<usize>;

/// Compile-time failure in a template: bad declaration, unknown state,
/// undeclared capture, or an invalid assembled regex. Carries the 1-based
/// source line so a failure can be diagnosed without re-running anything.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template syntax error on line {line}: {reason}")]
    Syntax {
        line: usize,
        span: Span,
        reason: String,
    },
}

impl TemplateError {
    /// The offending 1-based source line.
    pub fn line(&self) -> usize {
        match self {
            TemplateError::Syntax { line, .. } => *line,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            TemplateError::Syntax { span, reason, .. } => {
                let span = clamp_span(span.clone(), source.len());
                let write_result = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(reason)
                    .with_label(
                        Label::new((filename, span))
                            .with_message(reason)
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if write_result.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8(buf).unwrap_or_else(|_| self.to_string())
    }
}

fn clamp_span(span: Span, len: usize) -> Span {
    let start = span.start.min(len);
    let end = span.end.min(len).max(start);
    start..end
}
