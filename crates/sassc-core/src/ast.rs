//! Syntax tree produced by the parser.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Both input syntaxes parse to the same tree, so evaluation never needs to
//! know which one a file was written in.

use sassc_source_map::{FileId, SourceSpan};

use crate::number::Rational;
use crate::options::Syntax;
use crate::value::ListSeparator;

#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    pub file: FileId,
    pub syntax: Syntax,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    StyleRule(StyleRule),
    Declaration(Declaration),
    Variable(VariableBinding),
    Import(Import),
    Comment(Comment),
    AtRule(AtRule),
}

impl Stmt {
    pub fn span(&self) -> SourceSpan {
        match self {
            Stmt::StyleRule(s) => s.span,
            Stmt::Declaration(s) => s.span,
            Stmt::Variable(s) => s.span,
            Stmt::Import(s) => s.span,
            Stmt::Comment(s) => s.span,
            Stmt::AtRule(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selector: Interpolation,
    pub body: Vec<Stmt>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: Interpolation,
    pub value: Expr,
    pub span: SourceSpan,
}

/// `$name: value [!default] [!global]`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableBinding {
    pub name: String,
    pub value: Expr,
    pub default: bool,
    pub global: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub targets: Vec<ImportTarget>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportTarget {
    /// A stylesheet to load and evaluate in place
    Sass { url: String, span: SourceSpan },
    /// A plain CSS `@import`, emitted as written after interpolation
    Css(Interpolation),
}

/// `/* ... */`, kept in the output
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: SourceSpan,
}

/// Any at-rule without Sass semantics (`@media`, `@font-face`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    pub name: String,
    pub prelude: Interpolation,
    pub body: Option<Vec<Stmt>>,
    pub span: SourceSpan,
}

/// Text with `#{}` holes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interpolation {
    pub parts: Vec<InterpolationPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationPart {
    Text(String),
    Expr(Expr),
}

impl Interpolation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(InterpolationPart::Text(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(InterpolationPart::Text(text.to_string()));
        }
    }

    pub fn push_expr(&mut self, expr: Expr) {
        self.parts.push(InterpolationPart::Expr(expr));
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The text, if there are no `#{}` holes.
    pub fn as_plain(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [] => Some(""),
            [InterpolationPart::Text(t)] => Some(t),
            _ => None,
        }
    }

    /// Drop trailing whitespace from the final text part.
    pub fn trim_end(&mut self) {
        if let Some(InterpolationPart::Text(text)) = self.parts.last_mut() {
            let len = text.trim_end().len();
            text.truncate(len);
            if text.is_empty() {
                self.parts.pop();
            }
        }
    }

    pub fn has_expressions(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, InterpolationPart::Expr(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number {
        value: Rational,
        unit: String,
        span: SourceSpan,
    },
    /// Plain text: an identifier, a color, a quoted string without holes
    String {
        value: String,
        quote: Option<char>,
        span: SourceSpan,
    },
    /// Identifier or quoted string with `#{}` holes
    Interpolated {
        parts: Interpolation,
        quote: Option<char>,
        span: SourceSpan,
    },
    /// Text passed through to CSS without evaluation, apart from `#{}`
    Raw(Interpolation),
    Null,
    Variable {
        name: String,
        span: SourceSpan,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        /// `/` between two literal numbers, which CSS may mean as a separator
        literal_slash: bool,
        span: SourceSpan,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: SourceSpan,
    },
    Paren(Box<Expr>),
    List {
        items: Vec<Expr>,
        separator: ListSeparator,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: SourceSpan,
    },
}

impl Expr {
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            Expr::Number { span, .. }
            | Expr::String { span, .. }
            | Expr::Interpolated { span, .. }
            | Expr::Variable { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Call { span, .. } => Some(*span),
            Expr::Paren(inner) => inner.span(),
            Expr::List { items, .. } => {
                let first = items.iter().find_map(Expr::span)?;
                let last = items.iter().rev().find_map(Expr::span)?;
                Some(first.to(&last))
            }
            Expr::Raw(_) | Expr::Null => None,
        }
    }

    /// A number literal, possibly negated, or a chain of such literals
    /// joined by literal slashes.
    pub fn is_slash_operand(&self) -> bool {
        match self {
            Expr::Number { .. } => true,
            Expr::Unary { operand, .. } => matches!(**operand, Expr::Number { .. }),
            Expr::Binary {
                literal_slash: true,
                ..
            } => true,
            _ => false,
        }
    }
}
