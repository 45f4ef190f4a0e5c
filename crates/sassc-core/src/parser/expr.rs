//! Expression parsing.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Precedence, loosest first: comma lists, space lists, `+`/`-`,
//! `*`/`/`/`%`, unary `-`/`+`, primaries.

use sassc_source_map::{Location, SourceSpan};

use super::{Parser, unquote};
use crate::ast::{BinaryOp, Expr, Interpolation, InterpolationPart, UnaryOp};
use crate::error::Result;
use crate::lexer::{Token, TokenKind, tokenize_fragment};
use crate::number::Rational;
use crate::options::Syntax;
use crate::value::ListSeparator;

/// Functions whose arguments pass through to CSS untouched.
const RAW_FUNCTIONS: &[&str] = &[
    "calc",
    "-webkit-calc",
    "-moz-calc",
    "var",
    "env",
    "element",
    "expression",
    "url",
];

impl Parser<'_> {
    /// Parse a full expression: a comma-separated list of space lists.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr> {
        self.skip_trivia();
        let mut items = vec![self.parse_space_list()?];
        loop {
            let save = self.pos;
            self.skip_trivia();
            if *self.kind() != TokenKind::Comma {
                self.pos = save;
                break;
            }
            self.bump();
            self.skip_trivia();
            if !self.starts_term() {
                break;
            }
            items.push(self.parse_space_list()?);
        }
        Ok(collapse_list(items, ListSeparator::Comma))
    }

    fn parse_space_list(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_additive()?];
        loop {
            let save = self.pos;
            self.skip_trivia();
            if !self.starts_term() {
                self.pos = save;
                break;
            }
            items.push(self.parse_additive()?);
        }
        Ok(collapse_list(items, ListSeparator::Space))
    }

    fn starts_term(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Ident
            | TokenKind::Variable
            | TokenKind::Number
            | TokenKind::Hash
            | TokenKind::String
            | TokenKind::BadString
            | TokenKind::Url
            | TokenKind::InterpStart
            | TokenKind::LParen
            | TokenKind::Minus
            | TokenKind::Plus => true,
            TokenKind::Bang => token.text == "!important",
            _ => false,
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => {
                    self.pos = save;
                    break;
                }
            };
            // `a -b` is a list of `a` and `-b`, while `a - b` and `a-b`
            // subtract
            let operator = self.peek();
            if operator.spaced && !self.peek_nth(1).is_trivia() {
                self.pos = save;
                break;
            }
            let operator = self.bump();
            self.skip_trivia();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs, false, operator.span);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => {
                    self.pos = save;
                    break;
                }
            };
            let operator = self.bump();
            self.skip_trivia();
            let rhs = self.parse_unary()?;
            let literal_slash =
                op == BinaryOp::Div && lhs.is_slash_operand() && is_number_literal(&rhs);
            lhs = binary(op, lhs, rhs, literal_slash, operator.span);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_primary(),
        };
        let operator = self.bump();
        self.skip_trivia();
        let operand = self.parse_unary()?;
        let span = match operand.span() {
            Some(end) => operator.span.to(&end),
            None => operator.span,
        };
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.bump();
                let (digits, unit) = split_number(&token.text);
                let value = Rational::parse_decimal(digits)
                    .ok_or_else(|| self.error("Invalid number.", token.span))?;
                Ok(Expr::Number {
                    value,
                    unit: unit.to_string(),
                    span: token.span,
                })
            }
            TokenKind::Variable => {
                self.bump();
                Ok(Expr::Variable {
                    name: token.text.trim_start_matches('$').to_string(),
                    span: token.span,
                })
            }
            TokenKind::String => {
                self.bump();
                self.parse_quoted(&token)
            }
            TokenKind::BadString => {
                let quote = token.text.chars().next().unwrap_or('"');
                Err(self.error(format!("Expected {quote}."), token.span))
            }
            TokenKind::Hash | TokenKind::Url | TokenKind::Bang => {
                self.bump();
                Ok(Expr::String {
                    value: token.text,
                    quote: None,
                    span: token.span,
                })
            }
            TokenKind::LParen => self.parse_paren(),
            TokenKind::Ident | TokenKind::InterpStart => self.parse_identifier_like(),
            _ => Err(self.error("Expected expression.", token.span)),
        }
    }

    fn parse_paren(&mut self) -> Result<Expr> {
        self.bump();
        self.skip_trivia();
        if *self.kind() == TokenKind::RParen {
            self.bump();
            return Ok(Expr::List {
                items: Vec::new(),
                separator: ListSeparator::Space,
            });
        }
        let inner = self.parse_expression()?;
        self.expect(TokenKind::RParen, ")")?;
        Ok(Expr::Paren(Box::new(inner)))
    }

    /// An identifier, a function call, or an identifier built from
    /// adjacent text and `#{}` pieces such as `margin-#{$side}`.
    fn parse_identifier_like(&mut self) -> Result<Expr> {
        let first = self.peek().clone();
        if first.kind == TokenKind::Ident && self.peek_nth(1).kind == TokenKind::LParen {
            return self.parse_call();
        }

        let mut parts = Interpolation::new();
        let mut span = first.span;
        loop {
            let token = self.peek().clone();
            if !parts.is_empty() && token.spaced {
                break;
            }
            match token.kind {
                TokenKind::Ident | TokenKind::Number => {
                    self.bump();
                    parts.push_text(&token.text);
                }
                TokenKind::InterpStart => {
                    let expr = self.parse_interpolation_expr()?;
                    parts.push_expr(expr);
                }
                _ => break,
            }
            span = span.to(&self.last_span());
        }

        Ok(match parts.as_plain() {
            Some("null") => Expr::Null,
            Some(text) => Expr::String {
                value: text.to_string(),
                quote: None,
                span,
            },
            None => Expr::Interpolated {
                parts,
                quote: None,
                span,
            },
        })
    }

    fn parse_call(&mut self) -> Result<Expr> {
        let name = self.bump();
        self.bump();
        let lower = name.text.to_ascii_lowercase();

        if RAW_FUNCTIONS.contains(&lower.as_str()) {
            let mut raw = Interpolation::new();
            raw.push_text(&name.text);
            raw.push_text("(");
            let inner = self.parse_interpolation_until(|k| *k == TokenKind::RParen, false)?;
            for part in inner.parts {
                match part {
                    InterpolationPart::Text(t) => raw.push_text(&t),
                    InterpolationPart::Expr(e) => raw.push_expr(e),
                }
            }
            self.expect(TokenKind::RParen, ")")?;
            raw.push_text(")");
            return Ok(Expr::Raw(raw));
        }

        let mut args = Vec::new();
        loop {
            self.skip_trivia();
            if *self.kind() == TokenKind::RParen {
                self.bump();
                break;
            }
            args.push(self.parse_space_list()?);
            self.skip_trivia();
            match self.kind() {
                TokenKind::Comma => {
                    self.bump();
                }
                TokenKind::RParen => {
                    self.bump();
                    break;
                }
                _ => return Err(self.error("expected \")\".", self.peek().span)),
            }
        }
        Ok(Expr::Call {
            name: name.text,
            args,
            span: name.span.to(&self.last_span()),
        })
    }

    /// `#{ expr }`, with the cursor on `#{`.
    pub(crate) fn parse_interpolation_expr(&mut self) -> Result<Expr> {
        self.bump();
        let expr = self.parse_expression()?;
        self.expect(TokenKind::RBrace, "}")?;
        Ok(expr)
    }

    fn parse_quoted(&self, token: &Token) -> Result<Expr> {
        let quote = token.text.chars().next().unwrap_or('"');
        let inner = unquote(&token.text);
        if !inner.contains("#{") {
            return Ok(Expr::String {
                value: inner.to_string(),
                quote: Some(quote),
                span: token.span,
            });
        }
        Ok(Expr::Interpolated {
            parts: self.string_parts(token)?,
            quote: Some(quote),
            span: token.span,
        })
    }

    /// Split the inside of a quoted string into text and `#{}` expressions.
    fn string_parts(&self, token: &Token) -> Result<Interpolation> {
        let inner = unquote(&token.text);
        let start = token.span.range.start;
        let mut parts = Interpolation::new();
        let mut rest = 0;

        while let Some(found) = inner[rest..].find("#{") {
            let open = rest + found;
            parts.push_text(&inner[rest..open]);
            let body_start = open + 2;
            let close = matching_brace(&inner[body_start..])
                .map(|i| body_start + i)
                .ok_or_else(|| self.error("expected \"}\".", token.span))?;

            // the opening quote precedes `inner`
            let location = Location::new(
                start.offset + 1 + body_start,
                start.row,
                start.column + 1 + inner[..body_start].chars().count(),
            );
            let tokens = tokenize_fragment(
                &inner[body_start..close],
                Syntax::Scss,
                token.span.file,
                location,
            );
            let mut sub = Parser::new(&tokens, Syntax::Scss, self.origin);
            let expr = sub.parse_expression()?;
            sub.skip_trivia();
            if !sub.at_end() {
                return Err(sub.error("expected \"}\".", sub.peek().span));
            }
            parts.push_expr(expr);
            rest = close + 1;
        }
        parts.push_text(&inner[rest..]);
        Ok(parts)
    }

    /// Push a quoted string token, holes included, onto `interp` keeping its
    /// quotes.
    fn push_quoted(&self, interp: &mut Interpolation, token: &Token) -> Result<()> {
        let quote = token.text.chars().next().unwrap_or('"');
        let mut buf = [0; 4];
        let quote = quote.encode_utf8(&mut buf);
        interp.push_text(quote);
        let parts = self.string_parts(token)?;
        for part in parts.parts {
            match part {
                InterpolationPart::Text(t) => interp.push_text(&t),
                InterpolationPart::Expr(e) => interp.push_expr(e),
            }
        }
        interp.push_text(quote);
        Ok(())
    }

    /// Collect raw text up to a token for which `stop` holds, outside any
    /// parentheses or brackets. Whitespace runs and comments collapse to
    /// one space; `#{}` becomes an expression, and so do variables when
    /// `variables` is set.
    pub(crate) fn parse_interpolation_until(
        &mut self,
        stop: impl Fn(&TokenKind) -> bool,
        variables: bool,
    ) -> Result<Interpolation> {
        let mut interp = Interpolation::new();
        let mut depth = 0usize;
        loop {
            let token = self.peek().clone();
            if token.kind == TokenKind::Eof || (depth == 0 && stop(&token.kind)) {
                break;
            }
            match token.kind {
                TokenKind::InterpStart => {
                    let expr = self.parse_interpolation_expr()?;
                    interp.push_expr(expr);
                    continue;
                }
                TokenKind::Whitespace
                | TokenKind::Comment
                | TokenKind::Newline
                | TokenKind::Indent(_) => {
                    self.bump();
                    let ends_with_space = matches!(
                        interp.parts.last(),
                        Some(InterpolationPart::Text(t)) if t.ends_with(' ')
                    );
                    if !ends_with_space {
                        interp.push_text(" ");
                    }
                    continue;
                }
                TokenKind::String if token.text.contains("#{") => {
                    self.bump();
                    self.push_quoted(&mut interp, &token)?;
                    continue;
                }
                TokenKind::Variable if variables => {
                    self.bump();
                    interp.push_expr(Expr::Variable {
                        name: token.text.trim_start_matches('$').to_string(),
                        span: token.span,
                    });
                    continue;
                }
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
            interp.push_text(&token.text);
        }
        Ok(interp)
    }
}

fn collapse_list(mut items: Vec<Expr>, separator: ListSeparator) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Expr::List { items, separator }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, literal_slash: bool, operator: SourceSpan) -> Expr {
    let start = lhs.span().unwrap_or(operator);
    let end = rhs.span().unwrap_or(operator);
    let span = start.to(&end);
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        literal_slash,
        span,
    }
}

fn is_number_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Number { .. } => true,
        Expr::Unary { operand, .. } => matches!(**operand, Expr::Number { .. }),
        _ => false,
    }
}

/// Split a number token into its numeric text and unit.
fn split_number(text: &str) -> (&str, &str) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    text.split_at(i)
}

/// Byte index of the `}` closing an interpolation whose body starts `text`.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use sassc_source_map::FileId;

    fn expr(text: &str) -> Expr {
        let tokens = tokenize(text, Syntax::Scss, FileId(0));
        let mut parser = Parser::new(&tokens, Syntax::Scss, "stdin");
        let e = parser.parse_expression().unwrap();
        parser.skip_trivia();
        assert!(parser.at_end(), "trailing input in {text:?}");
        e
    }

    #[test]
    fn test_split_number() {
        assert_eq!(split_number("10px"), ("10", "px"));
        assert_eq!(split_number("1.5em"), ("1.5", "em"));
        assert_eq!(split_number("1e3"), ("1e3", ""));
        assert_eq!(split_number("50%"), ("50", "%"));
    }

    #[test]
    fn test_precedence() {
        let Expr::Binary { op, rhs, .. } = expr("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_space_and_comma_lists() {
        let Expr::List { items, separator } = expr("1px solid, 2px dashed") else {
            panic!("expected list");
        };
        assert_eq!(separator, ListSeparator::Comma);
        assert!(
            items
                .iter()
                .all(|i| matches!(i, Expr::List { separator: ListSeparator::Space, .. }))
        );
    }

    #[test]
    fn test_minus_disambiguation() {
        assert!(matches!(expr("$a - $b"), Expr::Binary { op: BinaryOp::Sub, .. }));
        assert!(matches!(expr("$a-$b"), Expr::Binary { op: BinaryOp::Sub, .. }));
        assert!(matches!(expr("10px-2px"), Expr::Binary { op: BinaryOp::Sub, .. }));
        let Expr::List { items, .. } = expr("0 -1px") else {
            panic!("expected list");
        };
        assert!(matches!(items[1], Expr::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn test_literal_slash() {
        assert!(matches!(expr("12px/1.5"), Expr::Binary { literal_slash: true, .. }));
        assert!(matches!(expr("$a/2"), Expr::Binary { literal_slash: false, .. }));
        assert!(matches!(expr("(12px/2)"), Expr::Paren(_)));
    }

    #[test]
    fn test_function_calls() {
        let Expr::Call { name, args, .. } = expr("percentage(0.5)") else {
            panic!("expected call");
        };
        assert_eq!(name, "percentage");
        assert_eq!(args.len(), 1);

        let Expr::Raw(raw) = expr("calc(100% - #{$x})") else {
            panic!("expected raw");
        };
        assert!(raw.has_expressions());
    }

    #[test]
    fn test_interpolated_identifier() {
        let Expr::Interpolated { parts, quote, .. } = expr("foo-#{$x}-bar") else {
            panic!("expected interpolation");
        };
        assert_eq!(quote, None);
        assert_eq!(parts.parts.len(), 3);
    }

    #[test]
    fn test_quoted_string_interpolation() {
        let Expr::Interpolated { parts, quote, .. } = expr("\"a #{1 + 1} b\"") else {
            panic!("expected interpolation");
        };
        assert_eq!(quote, Some('"'));
        assert_eq!(parts.parts.len(), 3);
    }

    #[test]
    fn test_null_and_important() {
        assert_eq!(expr("null"), Expr::Null);
        let Expr::List { items, .. } = expr("red !important") else {
            panic!("expected list");
        };
        assert!(matches!(&items[1], Expr::String { value, .. } if value == "!important"));
    }

    #[test]
    fn test_empty_parens_are_empty_list() {
        assert!(matches!(expr("()"), Expr::List { items, .. } if items.is_empty()));
    }
}
