//! Error types for compilation.
//!
//! Copyright (c) 2025 Posit, PBC

use sassc_source_map::{SourceContext, SourceSpan};
use thiserror::Error;

/// A stylesheet that cannot be compiled.
///
/// Covers malformed syntax, the wrong syntax mode for the input, imports
/// that cannot be found or loop, and undefined variables.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error: {message}{}", self.location_suffix())]
pub struct SyntaxError {
    pub message: String,
    /// Path of the offending document, or `stdin`
    pub origin: String,
    /// 1-based line, 0 when unknown
    pub line: usize,
    /// 1-based column, 0 when unknown
    pub column: usize,
    pub span: Option<SourceSpan>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: origin.into(),
            line: 0,
            column: 0,
            span: None,
        }
    }

    pub fn at(message: impl Into<String>, origin: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            message: message.into(),
            origin: origin.into(),
            line: span.line(),
            column: span.column(),
            span: Some(span),
        }
    }

    /// `on line L:C of origin` when the line is known, else `in origin`.
    fn location_suffix(&self) -> String {
        if self.line > 0 {
            format!(
                "\n        on line {}:{} of {}",
                self.line, self.column, self.origin
            )
        } else if !self.origin.is_empty() {
            format!("\n        in {}", self.origin)
        } else {
            String::new()
        }
    }
}

/// Errors surfaced by the engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SassError {
    /// Parse, import, or evaluation failure
    #[error("{0}")]
    Syntax(SyntaxError),

    /// Dependency information was requested before a successful render
    #[error("dependencies are only available after a successful render")]
    NotRendered,

    /// Engine options were rejected at construction
    #[error("Invalid engine options: {message}")]
    InvalidOptions { message: String },
}

impl From<SyntaxError> for SassError {
    fn from(err: SyntaxError) -> Self {
        SassError::Syntax(err)
    }
}

impl SassError {
    pub fn syntax(message: impl Into<String>, origin: impl Into<String>, span: SourceSpan) -> Self {
        SassError::Syntax(SyntaxError::at(message, origin, span))
    }

    pub fn invalid_options(message: impl Into<String>) -> Self {
        SassError::InvalidOptions {
            message: message.into(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, SassError::Syntax(_))
    }

    pub fn is_not_rendered(&self) -> bool {
        matches!(self, SassError::NotRendered)
    }

    /// The bare message, without location.
    pub fn message(&self) -> String {
        match self {
            SassError::Syntax(err) => err.message.clone(),
            other => other.to_string(),
        }
    }

    /// 1-based line of a syntax error, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            SassError::Syntax(err) if err.line > 0 => Some(err.line),
            _ => None,
        }
    }

    /// Render the error with a source snippet of the offending line.
    ///
    /// Falls back to the plain `Display` text when the span or the file
    /// content is not available in `ctx`.
    pub fn report(&self, ctx: &SourceContext) -> String {
        let SassError::Syntax(err) = self else {
            return self.to_string();
        };
        let Some(span) = err.span else {
            return self.to_string();
        };
        let Some(file) = ctx.get_file(span.file) else {
            return self.to_string();
        };
        let Some(content) = file.content.as_deref() else {
            return self.to_string();
        };

        render_snippet(&err.message, &file.path, content, span).unwrap_or_else(|| self.to_string())
    }
}

fn render_snippet(message: &str, path: &str, content: &str, span: SourceSpan) -> Option<String> {
    use ariadne::{Color, Config, Label, Report, ReportKind, Source};

    // ariadne counts characters, spans count bytes
    let start_byte = span.range.start.offset.min(content.len());
    let end_byte = span.range.end.offset.clamp(start_byte, content.len());
    let start = content.get(..start_byte)?.chars().count();
    let end = (start + content.get(start_byte..end_byte)?.chars().count()).max(start + 1);

    let mut output = Vec::new();
    Report::build(ReportKind::Error, path.to_string(), start)
        .with_config(Config::default().with_color(false))
        .with_message(message)
        .with_label(
            Label::new((path.to_string(), start..end))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .write((path.to_string(), Source::from(content)), &mut output)
        .ok()?;

    String::from_utf8(output).ok()
}

pub type Result<T> = std::result::Result<T, SassError>;
