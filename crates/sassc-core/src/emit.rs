//! CSS text output.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The emitter builds the output as a list of lines, each with its
//! indentation and the positions where a selector or declaration starts.
//! Nested style closes a block by appending ` }` to the last line written,
//! which is why lines stay editable until the end. Source map mappings are
//! computed from the final line and column of every recorded position.

use sassc_source_map::{Mapping, SourceContext, SourceMapBuilder, SourceSpan};

use crate::css::{CssAtRule, CssBlock, CssBodyItem, CssComment, CssNode, CssStyleRule};
use crate::options::{EngineOptions, OutputStyle};

/// CSS text and the mappings recorded while writing it.
#[derive(Debug)]
pub(crate) struct Emitted {
    pub css: String,
    pub mappings: SourceMapBuilder,
}

pub(crate) fn emit(nodes: &[CssNode], options: &EngineOptions, ctx: &SourceContext) -> Emitted {
    let mut emitter = Emitter {
        style: options.output_style,
        line_comments: options.line_comments && options.output_style != OutputStyle::Compressed,
        ctx,
        lines: Vec::new(),
        last_was_block: false,
    };
    for node in nodes {
        emitter.node(node, 0);
    }
    emitter.finish()
}

#[derive(Debug, Default)]
struct Line {
    indent: usize,
    text: String,
    /// Byte offsets into `text` where mapped content starts
    marks: Vec<(usize, SourceSpan)>,
}

struct Emitter<'a> {
    style: OutputStyle,
    line_comments: bool,
    ctx: &'a SourceContext,
    lines: Vec<Line>,
    /// The previous top-level item was a block, so a blank line separates
    /// it from the next one
    last_was_block: bool,
}

impl Emitter<'_> {
    fn start_line(&mut self, depth: usize) {
        let indent = if self.style == OutputStyle::Compressed {
            0
        } else {
            depth * 2
        };
        if self.style == OutputStyle::Compressed && !self.lines.is_empty() {
            return;
        }
        self.lines.push(Line {
            indent,
            ..Line::default()
        });
    }

    fn push(&mut self, text: &str) {
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        if let Some(line) = self.lines.last_mut() {
            line.text.push_str(text);
        }
    }

    fn mark(&mut self, span: SourceSpan) {
        if let Some(line) = self.lines.last_mut() {
            line.marks.push((line.text.len(), span));
        }
    }

    /// Called before every item at `depth`; separates top-level blocks.
    fn separate(&mut self, depth: usize, is_block: bool) {
        if depth > 0 || self.style == OutputStyle::Compressed {
            return;
        }
        if self.last_was_block && !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.last_was_block = is_block;
    }

    fn node(&mut self, node: &CssNode, depth: usize) {
        if !node.is_visible() {
            return;
        }
        match node {
            CssNode::Style(rule) => self.style_rule(rule, depth),
            CssNode::AtRule(at) => self.at_rule(at, depth),
            CssNode::Comment(comment) => {
                if self.keeps_comment(comment) {
                    self.separate(depth, false);
                    self.comment(comment, depth);
                }
            }
            CssNode::Import(import) => {
                self.separate(depth, false);
                self.start_line(depth);
                self.mark(import.span);
                self.push(&format!("@import {};", import.url));
            }
        }
    }

    fn keeps_comment(&self, comment: &CssComment) -> bool {
        self.style != OutputStyle::Compressed || comment.text.starts_with("/*!")
    }

    fn comment(&mut self, comment: &CssComment, depth: usize) {
        self.start_line(depth);
        let mut lines = comment.text.split('\n');
        if let Some(first) = lines.next() {
            self.push(first);
        }
        for rest in lines {
            if self.style == OutputStyle::Compressed {
                self.push("\n");
                self.push(rest);
            } else {
                self.lines.push(Line {
                    text: rest.to_string(),
                    ..Line::default()
                });
            }
        }
    }

    fn selector_text(&self, selectors: &[String], depth: usize) -> String {
        match self.style {
            OutputStyle::Compressed => selectors
                .iter()
                .map(|s| compress_selector(s))
                .collect::<Vec<_>>()
                .join(","),
            OutputStyle::Expanded => {
                selectors.join(&format!(",\n{}", " ".repeat(depth * 2)))
            }
            OutputStyle::Nested | OutputStyle::Compact => selectors.join(", "),
        }
    }

    fn line_comment(&mut self, span: SourceSpan, depth: usize) {
        if !self.line_comments {
            return;
        }
        let origin = self.ctx.path(span.file).to_string();
        self.start_line(depth);
        self.push(&format!("/* line {}, {} */", span.line(), origin));
    }

    fn style_rule(&mut self, rule: &CssStyleRule, depth: usize) {
        let printed = !rule.selectors.is_empty() && !rule.block.body.is_empty();
        if printed {
            self.separate(depth, true);
            self.line_comment(rule.span, depth);
            self.start_line(depth);
            self.mark(rule.span);
            let selectors = self.selector_text(&rule.selectors, depth);
            self.push_multiline(&selectors);
            self.open_block();
            self.body(&rule.block, depth + 1);
            self.close_block(depth);
        }
        let child_depth = match self.style {
            OutputStyle::Nested if printed => depth + 1,
            _ => depth,
        };
        for child in &rule.block.children {
            self.node(child, child_depth);
        }
    }

    fn at_rule(&mut self, at: &CssAtRule, depth: usize) {
        self.separate(depth, at.block.is_some());
        self.start_line(depth);
        self.mark(at.span);
        self.push("@");
        self.push(&at.name);
        if !at.prelude.is_empty() {
            self.push(" ");
            let prelude = match self.style {
                OutputStyle::Compressed => compress_prelude(&at.prelude),
                _ => at.prelude.clone(),
            };
            self.push(&prelude);
        }
        let Some(block) = &at.block else {
            self.push(";");
            return;
        };
        self.open_block();
        self.body(block, depth + 1);
        for child in &block.children {
            self.node(child, depth + 1);
        }
        match self.style {
            OutputStyle::Expanded => {
                self.start_line(depth);
                self.push("}");
            }
            OutputStyle::Compressed => self.push("}"),
            OutputStyle::Nested | OutputStyle::Compact => self.push(" }"),
        }
    }

    /// Push text that may contain line breaks (expanded selector lists).
    fn push_multiline(&mut self, text: &str) {
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.push(first);
        }
        for part in parts {
            let trimmed = part.trim_start();
            let indent = part.len() - trimmed.len();
            self.lines.push(Line {
                indent,
                text: trimmed.to_string(),
                marks: Vec::new(),
            });
        }
    }

    fn open_block(&mut self) {
        match self.style {
            OutputStyle::Compressed => self.push("{"),
            _ => self.push(" {"),
        }
    }

    fn close_block(&mut self, depth: usize) {
        match self.style {
            OutputStyle::Expanded => {
                self.start_line(depth);
                self.push("}");
            }
            OutputStyle::Compressed => self.push("}"),
            OutputStyle::Nested | OutputStyle::Compact => self.push(" }"),
        }
    }

    /// Declarations and comments of one block.
    fn body(&mut self, block: &CssBlock, depth: usize) {
        let mut first = true;
        for item in &block.body {
            match item {
                CssBodyItem::Declaration(decl) => {
                    match self.style {
                        OutputStyle::Compressed => {
                            if !first {
                                self.push(";");
                            }
                            self.mark(decl.span);
                            self.push(&format!("{}:{}", decl.name, decl.value));
                        }
                        OutputStyle::Compact => {
                            self.push(" ");
                            self.mark(decl.span);
                            self.push(&format!("{}: {};", decl.name, decl.value));
                        }
                        OutputStyle::Nested | OutputStyle::Expanded => {
                            self.start_line(depth);
                            self.mark(decl.span);
                            self.push(&format!("{}: {};", decl.name, decl.value));
                        }
                    }
                    first = false;
                }
                CssBodyItem::Comment(comment) => {
                    if !self.keeps_comment(comment) {
                        continue;
                    }
                    match self.style {
                        OutputStyle::Compact | OutputStyle::Compressed => {
                            if self.style == OutputStyle::Compact {
                                self.push(" ");
                            } else if !first {
                                self.push(";");
                                first = true;
                            }
                            self.push(&comment.text);
                        }
                        OutputStyle::Nested | OutputStyle::Expanded => {
                            self.comment(comment, depth);
                        }
                    }
                }
            }
        }
    }

    fn finish(self) -> Emitted {
        let mut css = String::new();
        let mut mappings = SourceMapBuilder::new();
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                css.push('\n');
            }
            if line.text.is_empty() {
                continue;
            }
            for _ in 0..line.indent {
                css.push(' ');
            }
            for (offset, span) in &line.marks {
                let column = line.indent + line.text[..*offset].chars().count();
                mappings.add(Mapping {
                    generated_line: index,
                    generated_column: column,
                    source: span.file,
                    original: span.range.start,
                });
            }
            css.push_str(&line.text);
        }
        if !css.is_empty() {
            css.push('\n');
        }
        Emitted { css, mappings }
    }
}

/// `a > b` becomes `a>b`.
fn compress_selector(selector: &str) -> String {
    selector
        .replace(" > ", ">")
        .replace(" + ", "+")
        .replace(" ~ ", "~")
}

/// `(max-width: 10px), print` becomes `(max-width:10px),print`.
fn compress_prelude(prelude: &str) -> String {
    prelude.replace(": ", ":").replace(", ", ",")
}
