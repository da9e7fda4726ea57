//! Diagnostics reported while parsing
//!
//! Parsing never fails: anything the parser cannot use is skipped and
//! recorded here so that callers can show it next to the source.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::ast::Span;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("unrecognized block notation '{text}'")]
    UnrecognizedBlock { text: String, span: Span },

    #[error("unrecognized statement '{text}'")]
    UnrecognizedStatement { text: String, span: Span },

    #[error("reference to undeclared block '{token}'")]
    UnresolvedReference {
        token: String,
        span: Span,
        /// Declared tokens that are a small edit away
        suggestions: Vec<String>,
    },

    #[error("connection has no preceding block to start from")]
    MissingSource { span: Span },

    #[error("group is never closed with ']'")]
    UnclosedGroup { span: Span },
}

impl Diagnostic {
    pub fn span(&self) -> &Span {
        match self {
            Diagnostic::UnrecognizedBlock { span, .. }
            | Diagnostic::UnrecognizedStatement { span, .. }
            | Diagnostic::UnresolvedReference { span, .. }
            | Diagnostic::MissingSource { span }
            | Diagnostic::UnclosedGroup { span } => span,
        }
    }

    fn hint(&self) -> String {
        match self {
            Diagnostic::UnrecognizedBlock { .. } => "this line is skipped".to_string(),
            Diagnostic::UnrecognizedStatement { .. } => "this statement is skipped".to_string(),
            Diagnostic::UnresolvedReference { suggestions, .. } if !suggestions.is_empty() => {
                format!("did you mean {}?", suggestions.join(" or "))
            }
            Diagnostic::UnresolvedReference { .. } => {
                "no block with this notation is declared".to_string()
            }
            Diagnostic::MissingSource { .. } => "no connection is created".to_string(),
            Diagnostic::UnclosedGroup { .. } => {
                "the group runs to the end of the input".to_string()
            }
        }
    }

    /// Format the diagnostic with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        self.format_with_color(source, filename, false)
    }

    /// Same as [`Diagnostic::format`], optionally with terminal colors
    pub fn format_with_color(&self, source: &str, filename: &str, color: bool) -> String {
        let mut buf = Vec::new();
        // ariadne counts characters, spans count bytes
        let to_chars = |offset: usize| source.get(..offset).map_or(offset, |s| s.chars().count());
        let span = to_chars(self.span().start)..to_chars(self.span().end);
        let written = Report::build(ReportKind::Warning, filename, span.start)
            .with_config(Config::default().with_color(color))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(self.hint())
                    .with_color(Color::Yellow),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("warning: {}", self),
        }
    }
}
