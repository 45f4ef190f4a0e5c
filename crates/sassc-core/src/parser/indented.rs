//! Indented syntax: statements are lines, blocks are deeper indentation.
//!
//! Copyright (c) 2025 Posit, PBC

use sassc_source_map::SourceSpan;

use super::Parser;
use crate::ast::{Comment, Stmt, StyleRule};
use crate::error::{Result, SassError};
use crate::lexer::{Token, TokenKind};
use crate::options::Syntax;

/// Token range of one logical line. A line ending in a comma continues
/// onto the next physical line.
#[derive(Debug, Clone, Copy)]
struct Line {
    indent: usize,
    start: usize,
    end: usize,
}

fn split_lines(tokens: &[Token]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let TokenKind::Indent(indent) = tokens[i].kind else {
            i += 1;
            continue;
        };
        let start = i + 1;
        let mut end = start;
        loop {
            while end < tokens.len()
                && !matches!(tokens[end].kind, TokenKind::Newline | TokenKind::Eof)
            {
                end += 1;
            }
            let ends_with_comma = tokens[start..end]
                .iter()
                .rev()
                .find(|t| !t.is_trivia())
                .is_some_and(|t| t.kind == TokenKind::Comma);
            let next_is_line = tokens.get(end).is_some_and(|t| t.kind == TokenKind::Newline)
                && tokens
                    .get(end + 1)
                    .is_some_and(|t| matches!(t.kind, TokenKind::Indent(_)));
            if ends_with_comma && next_is_line {
                end += 2;
                continue;
            }
            break;
        }
        lines.push(Line { indent, start, end });
        i = end;
    }
    lines
}

pub(super) fn parse_lines(tokens: &[Token], origin: &str) -> Result<Vec<Stmt>> {
    let mut builder = Builder {
        tokens,
        origin,
        lines: split_lines(tokens),
        next: 0,
    };
    builder.block(0)
}

struct Builder<'t> {
    tokens: &'t [Token],
    origin: &'t str,
    lines: Vec<Line>,
    next: usize,
}

impl Builder<'_> {
    /// Parse consecutive lines at exactly `indent`, each with the deeper
    /// lines that follow it as its body.
    fn block(&mut self, indent: usize) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        while let Some(line) = self.lines.get(self.next).copied() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                let message = if self.next == 0 {
                    "Indenting at the beginning of the document is illegal."
                } else {
                    "Inconsistent indentation."
                };
                return Err(SassError::syntax(message, self.origin, self.line_span(line)));
            }
            self.next += 1;
            let children = match self.lines.get(self.next) {
                Some(next) if next.indent > indent => Some(self.block(next.indent)?),
                _ => None,
            };
            if let Some(stmt) = self.statement(line, children)? {
                body.push(stmt);
            }
        }
        Ok(body)
    }

    fn line_span(&self, line: Line) -> SourceSpan {
        // every line is followed by at least the end-of-input token
        self.tokens[line.start.min(self.tokens.len() - 1)].span
    }

    fn statement(&self, line: Line, children: Option<Vec<Stmt>>) -> Result<Option<Stmt>> {
        let slice = &self.tokens[line.start..line.end];
        let mut parser = Parser::new(slice, Syntax::Indented, self.origin);
        parser.skip_whitespace();
        let first = parser.peek().clone();

        match (first.kind, children) {
            (TokenKind::Comment, None) => {
                parser.bump();
                parser.expect_statement_end()?;
                Ok(Some(Stmt::Comment(Comment {
                    text: first.text,
                    span: first.span,
                })))
            }
            (TokenKind::Comment, Some(_)) => Err(parser.error(
                "Illegal nesting: Nothing may be nested beneath comments.",
                first.span,
            )),
            (TokenKind::Variable, Some(_)) => Err(parser.error(
                "Illegal nesting: Nothing may be nested beneath variable declarations.",
                first.span,
            )),
            (TokenKind::Variable, None) => parser.parse_variable_binding().map(Some),
            (TokenKind::AtKeyword, children) => parser.parse_at_rule(children),
            (_, Some(children)) => {
                let selector = parser.parse_interpolation_until(
                    |k| {
                        matches!(
                            k,
                            TokenKind::LBrace | TokenKind::RBrace | TokenKind::Semicolon
                        )
                    },
                    false,
                )?;
                if !parser.at_end() {
                    let token = parser.peek();
                    return Err(
                        parser.error(format!("unexpected \"{}\".", token.text), token.span)
                    );
                }
                Ok(Some(Stmt::StyleRule(StyleRule {
                    selector,
                    body: children,
                    span: first.span.to(&parser.last_span()),
                })))
            }
            (_, None) if slice.iter().any(|t| t.kind == TokenKind::Colon) => {
                parser.parse_declaration().map(Some)
            }
            (_, None) => {
                // a selector with nothing nested under it
                let selector = parser.parse_interpolation_until(|_| false, false)?;
                Ok(Some(Stmt::StyleRule(StyleRule {
                    selector,
                    body: Vec::new(),
                    span: first.span.to(&parser.last_span()),
                })))
            }
        }
    }
}
