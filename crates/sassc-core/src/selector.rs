//! Selector lists: normalization and parent resolution.
//!
//! Copyright (c) 2025 Posit, PBC

/// A comma-separated list of complex selectors, each normalized to single
/// spaces with combinators written as ` > `, ` + ` and ` ~ `.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorList {
    pub complex: Vec<String>,
}

impl SelectorList {
    pub fn parse(text: &str) -> Result<Self, String> {
        let complex = split_top_level(text)
            .into_iter()
            .map(normalize)
            .collect::<Vec<_>>();
        if complex.iter().any(String::is_empty) {
            return Err(format!("Invalid CSS: expected selector, was \"{}\".", text.trim()));
        }
        Ok(Self { complex })
    }

    pub fn has_parent_ref(&self) -> bool {
        self.complex.iter().any(|c| contains_parent_ref(c))
    }

    /// Combine with the enclosing rule's selectors. `&` is replaced by each
    /// parent selector; a selector without `&` becomes a descendant of each.
    pub fn resolve_parent(&self, parent: &SelectorList) -> SelectorList {
        let mut complex = Vec::new();
        for child in &self.complex {
            for p in &parent.complex {
                if contains_parent_ref(child) {
                    complex.push(replace_parent_ref(child, p));
                } else {
                    complex.push(format!("{p} {child}"));
                }
            }
        }
        SelectorList { complex }
    }

    /// Selectors that can appear in CSS: placeholder selectors are dropped.
    pub fn visible(&self) -> Vec<String> {
        self.complex
            .iter()
            .filter(|c| !is_placeholder(c))
            .cloned()
            .collect()
    }
}

/// Walk `text` calling `f(index, char, depth)` for every character outside
/// quoted strings. Depth counts open parentheses and brackets.
fn scan_unquoted(text: &str, mut f: impl FnMut(usize, char, usize)) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => {
                f(i, c, depth);
                depth += 1;
            }
            (None, ')' | ']') => {
                depth = depth.saturating_sub(1);
                f(i, c, depth);
            }
            (None, c) => f(i, c, depth),
        }
    }
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    scan_unquoted(text, |i, c, depth| {
        if c == ',' && depth == 0 {
            parts.push(&text[start..i]);
            start = i + 1;
        }
    });
    parts.push(&text[start..]);
    parts
}

fn normalize(complex: &str) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    let mut after_combinator = false;
    let mut chars = complex.trim().chars();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            c if c.is_whitespace() => pending_space = true,
            '>' | '+' | '~' if depth == 0 => {
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push(c);
                out.push(' ');
                pending_space = false;
                after_combinator = true;
            }
            _ => {
                if pending_space && !after_combinator && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                after_combinator = false;
                match c {
                    '"' | '\'' => quote = Some(c),
                    '(' | '[' => depth += 1,
                    ')' | ']' => depth = depth.saturating_sub(1),
                    '\\' => {
                        out.push(c);
                        if let Some(next) = chars.next() {
                            out.push(next);
                        }
                        continue;
                    }
                    _ => {}
                }
                out.push(c);
            }
        }
    }
    out.trim_end().to_string()
}

fn contains_parent_ref(complex: &str) -> bool {
    let mut found = false;
    scan_unquoted(complex, |_, c, _| found |= c == '&');
    found
}

fn replace_parent_ref(complex: &str, parent: &str) -> String {
    let mut positions = Vec::new();
    scan_unquoted(complex, |i, c, _| {
        if c == '&' {
            positions.push(i);
        }
    });
    let mut out = String::with_capacity(complex.len() + parent.len());
    let mut last = 0;
    for i in positions {
        out.push_str(&complex[last..i]);
        out.push_str(parent);
        last = i + 1;
    }
    out.push_str(&complex[last..]);
    out
}

fn is_placeholder(complex: &str) -> bool {
    let mut found = false;
    scan_unquoted(complex, |_, c, depth| found |= c == '%' && depth == 0);
    found
}
