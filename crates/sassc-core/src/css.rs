//! Evaluated CSS tree.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Everything Sass-specific is gone by this point: selectors are resolved,
//! values are text, and imports are inlined. Only plain CSS `@import`s
//! remain. Spans point back at the statement each node came from, for line
//! comments and source maps.

use sassc_source_map::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CssNode {
    Style(CssStyleRule),
    AtRule(CssAtRule),
    Comment(CssComment),
    Import(CssImport),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CssStyleRule {
    /// Complex selectors, already resolved against their parents. Empty
    /// when every selector was a placeholder.
    pub selectors: Vec<String>,
    pub block: CssBlock,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CssAtRule {
    pub name: String,
    pub prelude: String,
    pub block: Option<CssBlock>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CssComment {
    pub text: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CssImport {
    pub url: String,
    pub span: SourceSpan,
}

/// Contents of a rule: its own declarations, then the rules nested in it.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct CssBlock {
    pub body: Vec<CssBodyItem>,
    pub children: Vec<CssNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CssBodyItem {
    Declaration(CssDeclaration),
    Comment(CssComment),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CssDeclaration {
    pub name: String,
    pub value: String,
    pub span: SourceSpan,
}

impl CssBlock {
    /// True if anything in this block would be printed.
    pub fn is_visible(&self) -> bool {
        !self.body.is_empty() || self.children.iter().any(CssNode::is_visible)
    }
}

impl CssNode {
    pub fn is_visible(&self) -> bool {
        match self {
            CssNode::Style(rule) => {
                (!rule.selectors.is_empty() && !rule.block.body.is_empty())
                    || rule.block.children.iter().any(CssNode::is_visible)
            }
            // an empty @media is dropped, other empty at-rules are kept
            CssNode::AtRule(at) => match &at.block {
                Some(block) if at.name.eq_ignore_ascii_case("media") => block.is_visible(),
                _ => true,
            },
            CssNode::Comment(_) | CssNode::Import(_) => true,
        }
    }
}
