//! Parser for SCSS and indented Sass.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! SCSS is parsed statement by statement from the token stream. The
//! indented syntax is first split into lines, nested by indentation, and
//! each line's tokens go through the same statement parsers, so both
//! syntaxes produce the same [`Stylesheet`] tree.

mod expr;
mod indented;

use sassc_source_map::{FileId, Range, SourceSpan};

use crate::ast::{
    AtRule, Comment, Declaration, Expr, Import, ImportTarget, Interpolation, InterpolationPart,
    Stmt, StyleRule, Stylesheet, VariableBinding,
};
use crate::error::{Result, SassError};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::options::Syntax;

/// At-rules with Sass semantics this compiler does not implement.
const UNSUPPORTED_AT_RULES: &[&str] = &[
    "mixin", "include", "content", "function", "return", "if", "else", "each", "for", "while",
    "extend", "use", "forward", "at-root", "debug", "warn", "error",
];

/// Parse a token stream produced by [`tokenize`].
pub fn parse(tokens: &[Token], syntax: Syntax, file: FileId, origin: &str) -> Result<Stylesheet> {
    let body = match syntax {
        Syntax::Scss => Parser::new(tokens, syntax, origin).parse_stylesheet()?,
        Syntax::Indented => indented::parse_lines(tokens, origin)?,
    };
    Ok(Stylesheet { file, syntax, body })
}

/// Tokenize and parse a document.
pub fn parse_text(text: &str, syntax: Syntax, file: FileId, origin: &str) -> Result<Stylesheet> {
    let tokens = tokenize(text, syntax, file);
    parse(&tokens, syntax, file, origin)
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    syntax: Syntax,
    origin: &'t str,
    eof: Token,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token], syntax: Syntax, origin: &'t str) -> Self {
        let end = tokens
            .last()
            .map(|t| SourceSpan::new(t.span.file, Range::new(t.span.range.end, t.span.range.end)))
            .unwrap_or_else(|| SourceSpan::new(FileId(0), Range::default()));
        Self {
            tokens,
            pos: 0,
            syntax,
            origin,
            eof: Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: end,
                spaced: true,
            },
        }
    }

    // ---- cursor ----

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.eof)
    }

    fn kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        *self.kind() == TokenKind::Eof
    }

    fn skip_trivia(&mut self) {
        while self.peek().is_trivia() {
            self.pos += 1;
        }
    }

    /// Skip whitespace but stop at comments, which are statements of their
    /// own between statements.
    fn skip_whitespace(&mut self) {
        while matches!(
            self.kind(),
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Indent(_)
        ) {
            self.pos += 1;
        }
    }

    /// Next token that isn't trivia, without consuming anything.
    fn peek_non_trivia(&self) -> &Token {
        let mut i = self.pos;
        while self.tokens.get(i).is_some_and(Token::is_trivia) {
            i += 1;
        }
        self.tokens.get(i).unwrap_or(&self.eof)
    }

    /// Span of the most recently consumed token that isn't trivia.
    fn last_span(&self) -> SourceSpan {
        self.tokens[..self.pos.min(self.tokens.len())]
            .iter()
            .rev()
            .find(|t| !t.is_trivia())
            .map(|t| t.span)
            .unwrap_or(self.eof.span)
    }

    fn error(&self, message: impl Into<String>, span: SourceSpan) -> SassError {
        SassError::syntax(message, self.origin, span)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        self.skip_trivia();
        if *self.kind() == kind {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected \"{what}\"."), self.peek().span))
        }
    }

    fn expect_statement_end(&mut self) -> Result<()> {
        self.skip_trivia();
        let token = self.peek().clone();
        match (&token.kind, self.syntax) {
            (TokenKind::Eof, _) => Ok(()),
            (TokenKind::Semicolon, Syntax::Scss) => {
                self.bump();
                Ok(())
            }
            (TokenKind::RBrace, Syntax::Scss) => Ok(()),
            (TokenKind::Semicolon, Syntax::Indented) => Err(self.error(
                "semicolons aren't allowed in the indented syntax.",
                token.span,
            )),
            (_, Syntax::Scss) => Err(self.error("expected \";\".", token.span)),
            (_, Syntax::Indented) => Err(self.error(
                format!("expected end of line, was \"{}\".", token.text),
                token.span,
            )),
        }
    }

    // ---- statements (SCSS) ----

    fn parse_stylesheet(&mut self) -> Result<Vec<Stmt>> {
        self.parse_statements(true)
    }

    fn parse_statements(&mut self, top_level: bool) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            self.skip_whitespace();
            let (kind, span) = (self.kind().clone(), self.peek().span);
            match kind {
                TokenKind::Eof if top_level => break,
                TokenKind::Eof => return Err(self.error("expected \"}\".", span)),
                TokenKind::RBrace if top_level => {
                    return Err(self.error("unmatched \"}\".", span));
                }
                TokenKind::RBrace => break,
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Comment => {
                    let token = self.bump();
                    body.push(Stmt::Comment(Comment {
                        text: token.text,
                        span: token.span,
                    }));
                }
                _ => {
                    if let Some(stmt) = self.parse_statement(top_level)? {
                        body.push(stmt);
                    }
                }
            }
        }
        Ok(body)
    }

    fn parse_statement(&mut self, top_level: bool) -> Result<Option<Stmt>> {
        match self.kind().clone() {
            TokenKind::Variable => self.parse_variable_binding().map(Some),
            TokenKind::AtKeyword => self.parse_at_rule(None),
            _ if self.looks_like_rule() => self.parse_style_rule().map(Some),
            _ if top_level => {
                let stop = self.statement_stop();
                Err(self.error("expected \"{\".", stop))
            }
            _ => self.parse_declaration().map(Some),
        }
    }

    /// Whether the statement at the cursor opens a block before it ends.
    fn looks_like_rule(&self) -> bool {
        let mut depth = 0usize;
        let mut interpolation = 0usize;
        for token in &self.tokens[self.pos..] {
            match token.kind {
                TokenKind::InterpStart => interpolation += 1,
                TokenKind::RBrace if interpolation > 0 => interpolation -= 1,
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ if depth > 0 || interpolation > 0 => {}
                TokenKind::LBrace => return true,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => return false,
                _ => {}
            }
        }
        false
    }

    /// Span of the token that ends the statement at the cursor.
    fn statement_stop(&self) -> SourceSpan {
        self.tokens[self.pos..]
            .iter()
            .find(|t| {
                matches!(
                    t.kind,
                    TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                )
            })
            .map(|t| t.span)
            .unwrap_or(self.eof.span)
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.expect(TokenKind::LBrace, "{")?;
        let body = self.parse_statements(false)?;
        self.expect(TokenKind::RBrace, "}")?;
        Ok(body)
    }

    fn parse_style_rule(&mut self) -> Result<Stmt> {
        let start = self.peek().span;
        let selector = self.parse_interpolation_until(|k| *k == TokenKind::LBrace, false)?;
        let body = self.parse_block()?;
        Ok(Stmt::StyleRule(StyleRule {
            selector,
            body,
            span: start.to(&self.last_span()),
        }))
    }

    pub(crate) fn parse_variable_binding(&mut self) -> Result<Stmt> {
        let name_token = self.bump();
        let name = name_token.text.trim_start_matches('$').to_string();
        self.expect(TokenKind::Colon, ":")?;
        self.skip_trivia();
        if matches!(
            self.kind(),
            TokenKind::Eof | TokenKind::Semicolon | TokenKind::RBrace
        ) {
            return Err(self.error("Expected expression.", self.peek().span));
        }
        let value = self.parse_expression()?;

        let mut default = false;
        let mut global = false;
        loop {
            self.skip_trivia();
            let token = self.peek();
            match (&token.kind, token.text.as_str()) {
                (TokenKind::Bang, "!default") => default = true,
                (TokenKind::Bang, "!global") => global = true,
                (TokenKind::Bang, other) => {
                    return Err(self.error(format!("Invalid flag name \"{other}\"."), token.span));
                }
                _ => break,
            }
            self.bump();
        }
        let span = name_token.span.to(&self.last_span());
        self.expect_statement_end()?;

        Ok(Stmt::Variable(VariableBinding {
            name,
            value,
            default,
            global,
            span,
        }))
    }

    pub(crate) fn parse_declaration(&mut self) -> Result<Stmt> {
        let start = self.peek().span;
        let mut name = Interpolation::new();
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Colon => break,
                TokenKind::InterpStart => {
                    let expr = self.parse_interpolation_expr()?;
                    name.push_expr(expr);
                }
                TokenKind::Whitespace | TokenKind::Comment
                    if self.peek_non_trivia().kind == TokenKind::Colon =>
                {
                    self.skip_trivia();
                }
                TokenKind::Ident
                | TokenKind::Minus
                | TokenKind::Number
                | TokenKind::Star
                | TokenKind::Delim
                    if !token.text.is_empty() =>
                {
                    name.push_text(&token.text);
                    self.bump();
                }
                _ => return Err(self.error("expected \":\".", token.span)),
            }
        }
        if name.is_empty() {
            return Err(self.error("expected a property name.", start));
        }
        self.bump();

        let custom_property = name.as_plain().is_some_and(|n| n.starts_with("--"));
        let value = if custom_property {
            let raw = self.parse_interpolation_until(
                |k| matches!(k, TokenKind::Semicolon | TokenKind::RBrace),
                false,
            )?;
            Expr::Raw(raw)
        } else {
            self.skip_trivia();
            if matches!(
                self.kind(),
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::RBrace
            ) {
                return Err(self.error("Expected expression.", self.peek().span));
            }
            self.parse_expression()?
        };
        let span = start.to(&self.last_span());
        self.expect_statement_end()?;

        Ok(Stmt::Declaration(Declaration { name, value, span }))
    }

    /// Parse an at-rule. Returns `None` for at-rules that produce nothing,
    /// such as `@charset`.
    ///
    /// `nested` holds the body of an indented-syntax at-rule, which comes
    /// from the lines below it rather than from braces.
    pub(crate) fn parse_at_rule(&mut self, nested: Option<Vec<Stmt>>) -> Result<Option<Stmt>> {
        let keyword = self.bump();
        let name = keyword.text.trim_start_matches('@').to_string();
        let lower = name.to_ascii_lowercase();

        if UNSUPPORTED_AT_RULES.contains(&lower.as_str()) {
            return Err(self.error(format!("@{lower} is not supported."), keyword.span));
        }
        if nested.is_some() && matches!(lower.as_str(), "import" | "charset") {
            return Err(self.error(
                format!("Illegal nesting: Nothing may be nested beneath @{lower} directives."),
                keyword.span,
            ));
        }

        match lower.as_str() {
            "import" => self.parse_import(keyword.span).map(Some),
            "charset" => {
                self.parse_interpolation_until(
                    |k| matches!(k, TokenKind::Semicolon | TokenKind::RBrace),
                    false,
                )?;
                self.expect_statement_end()?;
                Ok(None)
            }
            _ => {
                let prelude = self.parse_interpolation_until(
                    |k| {
                        matches!(
                            k,
                            TokenKind::LBrace | TokenKind::Semicolon | TokenKind::RBrace
                        )
                    },
                    true,
                )?;
                let body = if let Some(children) = nested {
                    self.expect_statement_end()?;
                    Some(children)
                } else if *self.kind() == TokenKind::LBrace {
                    if self.syntax == Syntax::Indented {
                        return Err(self.error("unexpected \"{\".", self.peek().span));
                    }
                    Some(self.parse_block()?)
                } else {
                    self.expect_statement_end()?;
                    None
                };
                Ok(Some(Stmt::AtRule(AtRule {
                    name,
                    prelude,
                    body,
                    span: keyword.span.to(&self.last_span()),
                })))
            }
        }
    }

    fn parse_import(&mut self, start: SourceSpan) -> Result<Stmt> {
        let mut targets = Vec::new();
        loop {
            self.skip_trivia();
            let token = self.peek().clone();
            let target = match token.kind {
                TokenKind::String => {
                    self.bump();
                    let url = unquote(&token.text).to_string();
                    let media = self.parse_import_media()?;
                    if is_plain_css_import(&url) || !media.is_empty() {
                        let mut raw = Interpolation::new();
                        raw.push_text(&token.text);
                        append_media(&mut raw, media);
                        ImportTarget::Css(raw)
                    } else {
                        ImportTarget::Sass {
                            url,
                            span: token.span,
                        }
                    }
                }
                TokenKind::Url => {
                    self.bump();
                    let media = self.parse_import_media()?;
                    let mut raw = Interpolation::new();
                    raw.push_text(&token.text);
                    append_media(&mut raw, media);
                    ImportTarget::Css(raw)
                }
                TokenKind::Ident
                    if token.text.eq_ignore_ascii_case("url")
                        && self.peek_nth(1).kind == TokenKind::LParen =>
                {
                    let raw = self.parse_interpolation_until(
                        |k| {
                            matches!(
                                k,
                                TokenKind::Comma | TokenKind::Semicolon | TokenKind::RBrace
                            )
                        },
                        false,
                    )?;
                    ImportTarget::Css(raw)
                }
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::RBrace => {
                    return Err(self.error(
                        "@import directive requires a url or quoted path.",
                        token.span,
                    ));
                }
                _ if self.syntax == Syntax::Indented => {
                    let raw = self.parse_interpolation_until(|k| *k == TokenKind::Comma, false)?;
                    match raw.as_plain().map(str::trim) {
                        Some(url) if !is_plain_css_import(url) => ImportTarget::Sass {
                            url: url.to_string(),
                            span: token.span.to(&self.last_span()),
                        },
                        _ => ImportTarget::Css(raw),
                    }
                }
                _ => {
                    return Err(self.error(
                        "@import directive requires a url or quoted path.",
                        token.span,
                    ));
                }
            };
            targets.push(target);

            self.skip_trivia();
            if *self.kind() == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        let span = start.to(&self.last_span());
        self.expect_statement_end()?;
        Ok(Stmt::Import(Import { targets, span }))
    }

    /// Media queries after an import url, up to the next url or the end of
    /// the statement.
    fn parse_import_media(&mut self) -> Result<Interpolation> {
        self.skip_trivia();
        self.parse_interpolation_until(
            |k| {
                matches!(
                    k,
                    TokenKind::Comma | TokenKind::Semicolon | TokenKind::RBrace
                )
            },
            true,
        )
    }
}

fn append_media(raw: &mut Interpolation, media: Interpolation) {
    if media.is_empty() {
        return;
    }
    raw.push_text(" ");
    for part in media.parts {
        match part {
            InterpolationPart::Text(text) => raw.push_text(&text),
            InterpolationPart::Expr(expr) => raw.push_expr(expr),
        }
    }
    raw.trim_end();
}

/// Text between the quotes of a string token.
pub(crate) fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    match chars.next() {
        Some(q @ ('"' | '\'')) => {
            let inner = &text[1..];
            inner.strip_suffix(q).unwrap_or(inner)
        }
        _ => text,
    }
}

/// Imports CSS leaves to the browser.
fn is_plain_css_import(url: &str) -> bool {
    url.ends_with(".css")
        || url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scss(text: &str) -> Vec<Stmt> {
        parse_text(text, Syntax::Scss, FileId(0), "stdin").unwrap().body
    }

    fn scss_err(text: &str) -> SassError {
        parse_text(text, Syntax::Scss, FileId(0), "stdin").unwrap_err()
    }

    fn plain(interp: &Interpolation) -> &str {
        interp.as_plain().unwrap()
    }

    #[test]
    fn test_rule_with_declaration() {
        let body = scss(".foo {\n  baz: bang; }");
        let [Stmt::StyleRule(rule)] = body.as_slice() else {
            panic!("expected one rule, got {body:?}");
        };
        assert_eq!(plain(&rule.selector).trim(), ".foo");
        let [Stmt::Declaration(decl)] = rule.body.as_slice() else {
            panic!("expected one declaration");
        };
        assert_eq!(plain(&decl.name), "baz");
        assert!(matches!(&decl.value, Expr::String { value, .. } if value == "bang"));
        assert_eq!(rule.span.line(), 1);
    }

    #[test]
    fn test_nested_rules_and_hover() {
        let body = scss("a { &:hover { color: red } b { x: y; } }");
        let [Stmt::StyleRule(rule)] = body.as_slice() else {
            panic!("expected one rule");
        };
        assert_eq!(rule.body.len(), 2);
        assert!(rule.body.iter().all(|s| matches!(s, Stmt::StyleRule(_))));
    }

    #[test]
    fn test_variable_flags() {
        let body = scss("$a: 1 !default;\n$b: 2 !global;");
        let [Stmt::Variable(a), Stmt::Variable(b)] = body.as_slice() else {
            panic!("expected two bindings");
        };
        assert!(a.default && !a.global);
        assert!(b.global && !b.default);
        assert_eq!(a.name, "a");
    }

    #[test]
    fn test_top_level_declaration_is_error() {
        let err = scss_err("width: 1px;");
        assert!(err.message().contains("expected \"{\""));
    }

    #[test]
    fn test_indented_input_in_scss_mode_fails() {
        let err = scss_err("$size: 30px\n.foo\n  width: $size\n");
        assert!(err.is_syntax());
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_unclosed_block() {
        let err = scss_err(".a { b: c;");
        assert!(err.message().contains("expected \"}\""));
    }

    #[test]
    fn test_comments_are_statements_between_statements() {
        let body = scss("/* top */\n.a { /* in */ b: c; }");
        assert!(matches!(&body[0], Stmt::Comment(c) if c.text == "/* top */"));
        let Stmt::StyleRule(rule) = &body[1] else {
            panic!("expected rule");
        };
        assert!(matches!(&rule.body[0], Stmt::Comment(c) if c.text == "/* in */"));
    }

    #[test]
    fn test_import_targets() {
        let body = scss("@import \"a\", 'b.css', url(c.css), \"d\" screen;");
        let [Stmt::Import(import)] = body.as_slice() else {
            panic!("expected import");
        };
        assert_eq!(import.targets.len(), 4);
        assert!(matches!(&import.targets[0], ImportTarget::Sass { url, .. } if url == "a"));
        assert!(matches!(&import.targets[1], ImportTarget::Css(raw) if raw.as_plain() == Some("'b.css'")));
        assert!(matches!(&import.targets[2], ImportTarget::Css(raw) if raw.as_plain() == Some("url(c.css)")));
        assert!(matches!(&import.targets[3], ImportTarget::Css(raw) if raw.as_plain() == Some("\"d\" screen")));
    }

    #[test]
    fn test_charset_consumed() {
        assert!(scss("@charset \"UTF-8\";").is_empty());
    }

    #[test]
    fn test_unsupported_at_rules() {
        let err = scss_err("@mixin foo { a: b; }");
        assert_eq!(err.message(), "@mixin is not supported.");
    }

    #[test]
    fn test_media_prelude_keeps_variables() {
        let body = scss("@media screen and (max-width: $bp) { a { b: c } }");
        let [Stmt::AtRule(at)] = body.as_slice() else {
            panic!("expected at-rule");
        };
        assert_eq!(at.name, "media");
        assert!(at.prelude.has_expressions());
        assert!(at.body.as_ref().is_some_and(|b| b.len() == 1));
    }

    #[test]
    fn test_custom_property_is_raw() {
        let body = scss("a { --gap: 1px $y; }");
        let Stmt::StyleRule(rule) = &body[0] else {
            panic!("expected rule");
        };
        let Stmt::Declaration(decl) = &rule.body[0] else {
            panic!("expected declaration");
        };
        let Expr::Raw(raw) = &decl.value else {
            panic!("expected raw value");
        };
        assert!(matches!(&raw.parts[0], InterpolationPart::Text(t) if t.trim() == "1px $y"));
    }

    #[test]
    fn test_interpolated_selector() {
        let body = scss(".a-#{$b} { c: d }");
        let Stmt::StyleRule(rule) = &body[0] else {
            panic!("expected rule");
        };
        assert!(rule.selector.has_expressions());
    }
}
