//! Error types and diagnostics
//!
//! Two layers of errors:
//! - [`SolverError`]: fatal conditions raised by the core. Unsat is never an
//!   error; it is a [`Satisfiability`](crate::sat::Satisfiability) value.
//! - [`ElabError`]: problems turning script text into solver input.
//!
//! Rendering for humans goes through ariadne reports over the source text.

use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::prelude::Simple;
use std::ops::Range;
use thiserror::Error;

use crate::ast::Span;
use crate::id::VarId;
use crate::lexer::Token;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SolverError {
    /// An expression shape that cannot be handled in its position.
    #[error("unhandled case: {0}")]
    UnhandledCase(String),

    /// Alias resolution ran past the depth guard.
    #[error("alias cycle detected while resolving variable #{var} (depth > {depth})")]
    CycleDetected { var: VarId, depth: usize },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

pub type SolverResult<T> = Result<T, SolverError>;

#[derive(Debug, Error)]
pub enum ElabError {
    /// Rendered lexer diagnostics
    #[error("{0}")]
    Lex(String),

    /// Rendered parser diagnostics
    #[error("{0}")]
    Parse(String),

    #[error("unknown sort '{name}'")]
    UnknownSort { name: String, span: Span },

    #[error("unknown symbol '{name}'")]
    UnknownSymbol { name: String, span: Span },

    #[error("{message}")]
    Malformed { message: String, span: Span },

    #[error("unsupported command '{name}'")]
    UnsupportedCommand { name: String, span: Span },

    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl ElabError {
    pub fn malformed(message: impl Into<String>, span: Span) -> Self {
        ElabError::Malformed {
            message: message.into(),
            span,
        }
    }

    /// Source location, for the variants that have one.
    pub fn span(&self) -> Option<Span> {
        match self {
            ElabError::UnknownSort { span, .. }
            | ElabError::UnknownSymbol { span, .. }
            | ElabError::Malformed { span, .. }
            | ElabError::UnsupportedCommand { span, .. } => Some(*span),
            ElabError::Lex(_) | ElabError::Parse(_) | ElabError::Solver(_) => None,
        }
    }
}

pub type ElabResult<T> = Result<T, ElabError>;

fn render(source: &str, span: Range<usize>, title: &str, message: String) -> String {
    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, (), span.start)
        .with_message(title)
        .with_label(Label::new(span).with_message(&message).with_color(Color::Red))
        .finish()
        .write(Source::from(source), &mut output);

    match written {
        Ok(()) => String::from_utf8(output).unwrap_or(message),
        Err(_) => message,
    }
}

/// Format an elaboration error against the script it came from.
pub fn format_elab_error(source: &str, error: &ElabError) -> String {
    match error.span() {
        Some(span) => {
            let range = span.start.min(source.len())..span.end.min(source.len());
            render(source, range, "Elaboration error", error.to_string())
        }
        None => error.to_string(),
    }
}

/// Format lexer errors into a user-friendly string
pub fn format_lexer_errors(source: &str, errors: Vec<Simple<char>>) -> String {
    errors
        .iter()
        .map(|error| render(source, error.span(), "Lexical error", format_lexer_error(error)))
        .collect()
}

fn format_lexer_error(error: &Simple<char>) -> String {
    let found = error
        .found()
        .map(|c| format!("'{}'", c))
        .unwrap_or_else(|| "end of input".to_string());

    let expected: Vec<String> = error
        .expected()
        .filter_map(|opt| opt.as_ref())
        .map(|c| format!("'{}'", c))
        .collect();

    if expected.is_empty() {
        format!("Unexpected character {}", found)
    } else {
        format!("Unexpected {}, expected {}", found, expected.join(" or "))
    }
}

/// Format parser errors into a user-friendly string.
///
/// Token streams are built with character spans, so error spans index the
/// source directly. The end-of-input span may point one past the end.
pub fn format_parser_errors(source: &str, errors: Vec<Simple<Token>>) -> String {
    errors
        .iter()
        .map(|error| {
            let span = error.span();
            let start = span.start.min(source.len());
            let end = span.end.min(source.len()).max(start);
            render(source, start..end, "Parse error", format_parser_error(error))
        })
        .collect()
}

fn format_parser_error(error: &Simple<Token>) -> String {
    use chumsky::error::SimpleReason;

    if let SimpleReason::Custom(msg) = error.reason() {
        return msg.clone();
    }
    if let SimpleReason::Unclosed { delimiter, .. } = error.reason() {
        return format!("Unclosed delimiter '{}'", delimiter);
    }

    let found = error
        .found()
        .map(|t| format!("'{}'", t))
        .unwrap_or_else(|| "end of input".to_string());

    let expected: Vec<String> = error
        .expected()
        .filter_map(|opt| opt.as_ref())
        .map(|t| format!("'{}'", t))
        .collect();

    if !expected.is_empty() {
        format!("Unexpected {}, expected one of: {}", found, expected.join(", "))
    } else if let Some(label) = error.label() {
        label.to_string()
    } else {
        format!("Unexpected token {}", found)
    }
}
