//! Tokenizer for SCSS and indented Sass.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The lexer never fails: malformed input (an unterminated string, a stray
//! character) becomes a token the parser reports on. Silent `//` comments
//! are dropped here and never reach the parser. The lexer tracks whether it
//! is inside a quoted string, so `//` in `"http://x"` stays text; the
//! bodies of unquoted `url(...)` are lexed raw for the same reason.
//!
//! In indented mode each line starts with an [`TokenKind::Indent`] token
//! holding its indentation width and ends with [`TokenKind::Newline`];
//! blank lines produce no tokens at all.

use sassc_source_map::{FileId, Location, Range, SourceSpan};

use crate::options::Syntax;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// `$name`
    Variable,
    /// `@name`
    AtKeyword,
    /// Numeric literal including its unit, without sign
    Number,
    /// `#abc`
    Hash,
    /// Quoted string, quotes included in the text
    String,
    /// Unterminated string
    BadString,
    /// Unquoted `url(...)`, kept verbatim
    Url,
    /// `#{`
    InterpStart,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semicolon,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Gt,
    Tilde,
    Amp,
    /// `!important`, `!default`, `!global`; text is normalized to `!name`
    Bang,
    Delim,
    Whitespace,
    /// End of a line (indented syntax only)
    Newline,
    /// Indentation width at the start of a line (indented syntax only)
    Indent(usize),
    /// `/* ... */`
    Comment,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: SourceSpan,
    /// Whitespace, a line start, or a comment came right before this token
    pub spaced: bool,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Tokens skipped between the parts of a statement.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Newline | TokenKind::Indent(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Normal,
    InSingleQuote,
    InDoubleQuote,
}

/// Tokenize a whole document.
pub fn tokenize(text: &str, syntax: Syntax, file: FileId) -> Vec<Token> {
    Lexer::new(text, syntax, file, Location::default(), true).run()
}

/// Tokenize a fragment of a document that starts at `start`, such as the
/// inside of an interpolation in a quoted string.
pub fn tokenize_fragment(text: &str, syntax: Syntax, file: FileId, start: Location) -> Vec<Token> {
    Lexer::new(text, syntax, file, start, false).run()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    base_offset: usize,
    row: usize,
    column: usize,
    file: FileId,
    syntax: Syntax,
    state: LexState,
    at_line_start: bool,
    pending_space: bool,
    string_start: (usize, Location),
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, syntax: Syntax, file: FileId, start: Location, document: bool) -> Self {
        Self {
            src,
            pos: 0,
            base_offset: start.offset,
            row: start.row,
            column: start.column,
            file,
            syntax,
            state: LexState::Normal,
            at_line_start: document && syntax == Syntax::Indented,
            pending_space: true,
            string_start: (0, start),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        loop {
            match self.state {
                LexState::InSingleQuote | LexState::InDoubleQuote => self.lex_string_body(),
                LexState::Normal => {
                    if self.at_line_start {
                        self.lex_line_start();
                        continue;
                    }
                    let Some(c) = self.peek() else { break };
                    self.lex_normal(c);
                }
            }
        }
        let end = self.location();
        self.push_text(TokenKind::Eof, end, String::new());
        self.tokens
    }

    // ---- cursor ----

    fn location(&self) -> Location {
        Location::new(self.base_offset + self.pos, self.row, self.column)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.row += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    // ---- token output ----

    fn push(&mut self, kind: TokenKind, start: Location) {
        let local_start = start.offset - self.base_offset;
        let text = self.src[local_start..self.pos].to_string();
        self.push_text(kind, start, text);
    }

    fn push_text(&mut self, kind: TokenKind, start: Location, text: String) {
        let span = SourceSpan::new(self.file, Range::new(start, self.location()));

        if kind == TokenKind::Whitespace
            && let Some(last) = self.tokens.last_mut()
            && last.kind == TokenKind::Whitespace
        {
            last.text.push_str(&text);
            last.span = last.span.to(&span);
            return;
        }

        let spaced = self.pending_space;
        self.pending_space = matches!(
            kind,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Indent(_) | TokenKind::Comment
        );
        self.tokens.push(Token {
            kind,
            text,
            span,
            spaced,
        });
    }

    // ---- indented syntax line handling ----

    fn lex_line_start(&mut self) {
        self.at_line_start = false;
        loop {
            let start = self.location();
            let indent = self.consume_indentation();
            match self.peek() {
                None => return,
                Some('\n') | Some('\r') => {
                    self.bump();
                }
                _ if self.starts_with("//") => self.skip_comment_block(indent),
                _ if self.starts_with("/*") && !self.current_line().contains("*/") => {
                    self.push(TokenKind::Indent(indent), start);
                    self.lex_indented_loud_comment(indent);
                    return;
                }
                _ => {
                    self.push(TokenKind::Indent(indent), start);
                    return;
                }
            }
        }
    }

    fn consume_indentation(&mut self) -> usize {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' => {
                    width += 1;
                    self.bump();
                }
                _ => break,
            }
        }
        width
    }

    fn current_line(&self) -> &'a str {
        let rest = self.rest();
        rest.split('\n').next().unwrap_or(rest)
    }

    /// Indentation of the line after the current one, or `None` when that
    /// line is blank or missing.
    fn next_line_indent(&self) -> Option<usize> {
        let rest = self.rest();
        let newline = rest.find('\n')?;
        let line = rest[newline + 1..].split('\n').next().unwrap_or("");
        let trimmed = line.trim_start_matches([' ', '\t']);
        if trimmed.trim().is_empty() {
            return Some(usize::MAX);
        }
        Some(line.len() - trimmed.len())
    }

    /// Consume the rest of the line and every following line indented
    /// deeper than `indent`.
    fn consume_nested_lines(&mut self, indent: usize) {
        loop {
            self.bump_while(|c| c != '\n');
            match self.next_line_indent() {
                Some(next) if next > indent => {
                    self.bump();
                }
                _ => return,
            }
        }
    }

    fn skip_comment_block(&mut self, indent: usize) {
        self.consume_nested_lines(indent);
        self.pending_space = true;
    }

    fn lex_indented_loud_comment(&mut self, indent: usize) {
        let start = self.location();
        self.consume_nested_lines(indent);
        let local_start = start.offset - self.base_offset;
        let body = self.src[local_start..self.pos].trim_end();
        let text = format!("{body} */");
        self.push_text(TokenKind::Comment, start, text);
    }

    // ---- normal mode ----

    fn lex_normal(&mut self, c: char) {
        let start = self.location();
        match c {
            '\n' if self.syntax == Syntax::Indented => {
                self.bump();
                self.push(TokenKind::Newline, start);
                self.at_line_start = true;
            }
            c if c.is_whitespace() => {
                let indented = self.syntax == Syntax::Indented;
                self.bump_while(|c| c.is_whitespace() && !(indented && c == '\n'));
                self.push(TokenKind::Whitespace, start);
            }
            '/' if self.starts_with("//") => {
                self.bump_while(|c| c != '\n');
                self.pending_space = true;
            }
            '/' if self.starts_with("/*") => {
                self.bump();
                self.bump();
                while self.peek().is_some() && !self.starts_with("*/") {
                    self.bump();
                }
                self.bump();
                self.bump();
                self.push(TokenKind::Comment, start);
            }
            '"' | '\'' => {
                self.state = if c == '"' {
                    LexState::InDoubleQuote
                } else {
                    LexState::InSingleQuote
                };
                self.string_start = (self.pos, start);
                self.bump();
            }
            '$' if self.peek_at(1).is_some_and(is_name_start) => {
                self.bump();
                self.consume_name();
                self.push(TokenKind::Variable, start);
            }
            '@' if self.peek_at(1).is_some_and(|c| is_name_start(c) || c == '-') => {
                self.bump();
                self.consume_name();
                self.push(TokenKind::AtKeyword, start);
            }
            '#' if self.peek_at(1) == Some('{') => {
                self.bump();
                self.bump();
                self.push(TokenKind::InterpStart, start);
            }
            '#' if self.peek_at(1).is_some_and(is_name_char) => {
                self.bump();
                self.consume_name();
                self.push(TokenKind::Hash, start);
            }
            '!' => self.lex_bang(start),
            c if c.is_ascii_digit() => self.lex_number(start),
            '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(start),
            'u' | 'U' if self.lex_url(start) => {}
            _ if self.at_ident_start() => {
                self.consume_name();
                self.push(TokenKind::Ident, start);
            }
            _ => {
                self.bump();
                let kind = match c {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ':' => TokenKind::Colon,
                    ';' => TokenKind::Semicolon,
                    ',' => TokenKind::Comma,
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '%' => TokenKind::Percent,
                    '=' => TokenKind::Eq,
                    '>' => TokenKind::Gt,
                    '~' => TokenKind::Tilde,
                    '&' => TokenKind::Amp,
                    _ => TokenKind::Delim,
                };
                self.push(kind, start);
            }
        }
    }

    fn lex_string_body(&mut self) {
        let quote = if self.state == LexState::InDoubleQuote {
            '"'
        } else {
            '\''
        };
        let mut interpolation_depth = 0usize;
        let kind = loop {
            match self.peek() {
                None | Some('\n') => break TokenKind::BadString,
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('#') if self.peek_at(1) == Some('{') => {
                    self.bump();
                    self.bump();
                    interpolation_depth += 1;
                }
                Some('}') if interpolation_depth > 0 => {
                    self.bump();
                    interpolation_depth -= 1;
                }
                Some(c) if c == quote && interpolation_depth == 0 => {
                    self.bump();
                    break TokenKind::String;
                }
                Some(_) => {
                    self.bump();
                }
            }
        };
        self.state = LexState::Normal;
        let (_, start) = self.string_start;
        self.push(kind, start);
    }

    fn lex_bang(&mut self, start: Location) {
        self.bump();
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t']);
        if trimmed.chars().next().is_some_and(is_name_start) {
            self.bump_while(|c| c == ' ' || c == '\t');
            let name_start = self.pos;
            self.consume_name();
            let name = self.src[name_start..self.pos].to_ascii_lowercase();
            self.push_text(TokenKind::Bang, start, format!("!{name}"));
        } else {
            self.push(TokenKind::Delim, start);
        }
    }

    fn lex_number(&mut self, start: Location) {
        self.bump_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.bump_while(|c| c.is_ascii_digit());
        }
        // exponent
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                self.bump_while(|c| c.is_ascii_digit());
            }
        }
        // unit
        if self.peek() == Some('%') {
            self.bump();
        } else if self.peek().is_some_and(is_unit_char) {
            while let Some(c) = self.peek() {
                if is_unit_char(c) || (c == '-' && self.peek_at(1).is_some_and(is_unit_char)) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.push(TokenKind::Number, start);
    }

    /// Lex `url(...)` with an unquoted body as one token. Returns false if
    /// this isn't such a url, leaving the cursor untouched.
    fn lex_url(&mut self, start: Location) -> bool {
        let rest = self.rest();
        if !rest.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("url(")) {
            return false;
        }
        let body = rest[4..].trim_start();
        if body.starts_with('"') || body.starts_with('\'') {
            return false;
        }
        let Some(close) = rest.find(')') else {
            return false;
        };
        if rest[..close].contains('\n') {
            return false;
        }
        let inner = rest[4..close].trim();
        let text = format!("url({inner})");
        for _ in rest[..=close].chars() {
            self.bump();
        }
        self.push_text(TokenKind::Url, start, text);
        true
    }

    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some('-') => self
                .peek_at(1)
                .is_some_and(|c| is_name_start(c) || c == '-' || c == '\\'),
            Some('\\') => true,
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    /// Consume identifier characters, including escapes. A `-` is kept only
    /// when more of the name follows it, so `$a-$b` and `foo- bar` split.
    fn consume_name(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '-' => {
                    let continues = self.peek_at(1).is_some_and(|n| is_name_char(n) || n == '\\')
                        || self.rest()[1..].starts_with("#{");
                    if !continues {
                        break;
                    }
                    self.bump();
                }
                c if is_name_char(c) => {
                    self.bump();
                }
                _ => break,
            }
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

fn is_unit_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str, syntax: Syntax) -> Vec<TokenKind> {
        tokenize(text, syntax, FileId(0))
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(text: &str) -> Vec<String> {
        tokenize(text, Syntax::Scss, FileId(0))
            .into_iter()
            .filter(|t| !t.is_trivia() && t.kind != TokenKind::Eof)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_non_ascii_names_starting_with_u() {
        assert_eq!(texts("uéé: uñ€ ué"), vec!["uéé", ":", "uñ€", "ué"]);
        assert_eq!(texts("b: URL(x.png)"), vec!["b", ":", "url(x.png)"]);
    }

    #[test]
    fn test_declaration_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("a{b:1px}", Syntax::Scss),
            vec![Ident, LBrace, Ident, Colon, Number, RBrace, Eof]
        );
    }

    #[test]
    fn test_silent_comment_dropped() {
        assert_eq!(texts(".foo {// bar: baz;}\n  baz: bang; //}\n}"), vec![
            ".", "foo", "{", "baz", ":", "bang", ";", "}"
        ]);
    }

    #[test]
    fn test_comment_markers_inside_strings_kept() {
        assert_eq!(texts("[val=\"//\"]"), vec!["[", "val", "=", "\"//\"", "]"]);
        assert_eq!(texts("a: 'x // y'"), vec!["a", ":", "'x // y'"]);
    }

    #[test]
    fn test_unquoted_url_is_raw() {
        assert_eq!(texts("url(http://x.com/a.png)"), vec!["url(http://x.com/a.png)"]);
        assert_eq!(texts("url(\"a.png\")"), vec!["url", "(", "\"a.png\"", ")"]);
    }

    #[test]
    fn test_block_comment_token() {
        let tokens = tokenize("/* hi */ a", Syntax::Scss, FileId(0));
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text, "/* hi */");
    }

    #[test]
    fn test_numbers_and_units() {
        assert_eq!(texts("1.5em .5 10% 3px-2px"), vec![
            "1.5em", ".5", "10%", "3px", "-", "2px"
        ]);
    }

    #[test]
    fn test_variable_names_stop_before_operators() {
        assert_eq!(texts("$a-$b $another-var"), vec!["$a", "-", "$b", "$another-var"]);
    }

    #[test]
    fn test_bang_normalized() {
        assert_eq!(texts("red ! IMPORTANT"), vec!["red", "!important"]);
        assert_eq!(texts("1 !default"), vec!["1", "!default"]);
    }

    #[test]
    fn test_interpolation_start() {
        use TokenKind::*;
        assert_eq!(
            kinds("#{$x}-foo", Syntax::Scss),
            vec![InterpStart, Variable, RBrace, Ident, Eof]
        );
        assert_eq!(texts("margin-#{$side}"), vec!["margin-", "#{", "$side", "}"]);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize("a: \"oops\nb", Syntax::Scss, FileId(0));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::BadString));
    }

    #[test]
    fn test_spaced_flag() {
        let tokens = tokenize("a -$b c-d", Syntax::Scss, FileId(0));
        let minus = tokens.iter().find(|t| t.kind == TokenKind::Minus).unwrap();
        assert!(minus.spaced);
        let b = tokens.iter().find(|t| t.text == "$b").unwrap();
        assert!(!b.spaced);
        assert!(tokens.iter().any(|t| t.text == "c-d"));
    }

    #[test]
    fn test_spans_track_rows() {
        let tokens = tokenize("a\n  b", Syntax::Scss, FileId(0));
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!(b.span.range.start.row, 1);
        assert_eq!(b.span.range.start.column, 2);
        assert_eq!(b.span.range.start.offset, 4);
    }

    #[test]
    fn test_indented_lines() {
        use TokenKind::*;
        assert_eq!(
            kinds(".a\n  b: c\n\n.d\n", Syntax::Indented),
            vec![
                Indent(0),
                Delim,
                Ident,
                Newline,
                Indent(2),
                Ident,
                Colon,
                Whitespace,
                Ident,
                Newline,
                Indent(0),
                Delim,
                Ident,
                Newline,
                Eof
            ]
        );
    }

    #[test]
    fn test_indented_silent_comment_block() {
        use TokenKind::*;
        let src = "// note\n  still comment\n.a\n  b: c";
        let k = kinds(src, Syntax::Indented);
        assert_eq!(k[0], Indent(0));
        assert_eq!(k[1], Delim);
        assert!(!k.contains(&Comment));
    }

    #[test]
    fn test_indented_loud_comment_closed() {
        let tokens = tokenize("/* note\n   more\n.a\n  b: c", Syntax::Indented, FileId(0));
        let comment = tokens.iter().find(|t| t.kind == TokenKind::Comment).unwrap();
        assert_eq!(comment.text, "/* note\n   more */");
    }

    #[test]
    fn test_fragment_offsets() {
        let start = Location::new(10, 2, 4);
        let tokens = tokenize_fragment("$x", Syntax::Scss, FileId(0), start);
        assert_eq!(tokens[0].span.range.start.offset, 10);
        assert_eq!(tokens[0].span.range.end.column, 6);
    }
}
