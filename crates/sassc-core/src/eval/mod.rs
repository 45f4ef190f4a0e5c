//! Evaluation: from a parsed stylesheet to a CSS tree.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The evaluator walks statements top to bottom. Variable bindings update
//! the [`ScopeChain`], declarations are evaluated where they appear, and
//! `@import`s load and evaluate the imported file in place, in the current
//! scope, as if its text were written there. Each file keeps its own
//! `FileId`, so spans in the output tree still point at the right source.

mod functions;
mod scope;

use std::path::{Path, PathBuf};

use sassc_source_map::{SourceContext, SourceSpan};
use sassc_system_runtime::SystemRuntime;

use crate::ast::{
    AtRule, BinaryOp, Declaration, Expr, Import, ImportTarget, Interpolation, InterpolationPart,
    Stmt, StyleRule, UnaryOp, VariableBinding,
};
use crate::css::{
    CssAtRule, CssBlock, CssBodyItem, CssComment, CssDeclaration, CssImport, CssNode,
    CssStyleRule,
};
use crate::error::{Result, SassError, SyntaxError};
use crate::import::{Dependency, ImportResolver};
use crate::number::{Number, Unit};
use crate::options::{EngineOptions, OutputStyle};
use crate::parser;
use crate::selector::SelectorList;
use crate::value::{FormatOptions, ListSeparator, Value};

pub(crate) use scope::ScopeChain;

/// Output of evaluating the main document.
#[derive(Debug)]
pub(crate) struct Evaluated {
    pub nodes: Vec<CssNode>,
    pub dependencies: Vec<Dependency>,
}

/// Where evaluated statements are written.
struct Target<'o> {
    /// Declarations of the enclosing rule, if any
    body: Option<&'o mut Vec<CssBodyItem>>,
    /// Rules and at-rules at this level
    nodes: &'o mut Vec<CssNode>,
}

/// The file currently being evaluated.
#[derive(Debug, Clone)]
struct FileFrame {
    origin: String,
    dir: PathBuf,
}

/// Evaluate the main document. Imported files are registered in `ctx` as
/// they are loaded.
pub(crate) fn evaluate(
    body: &[Stmt],
    options: &EngineOptions,
    runtime: &dyn SystemRuntime,
    ctx: &mut SourceContext,
) -> Result<Evaluated> {
    let mut evaluator = Evaluator::new(options, runtime, ctx);
    let mut nodes = Vec::new();
    evaluator.exec_block(
        body,
        &mut Target {
            body: None,
            nodes: &mut nodes,
        },
    )?;
    Ok(Evaluated {
        nodes,
        dependencies: evaluator.resolver.into_dependencies(),
    })
}

struct Evaluator<'a> {
    ctx: &'a mut SourceContext,
    resolver: ImportResolver<'a>,
    scopes: ScopeChain,
    files: Vec<FileFrame>,
    /// Selectors of the innermost enclosing style rule
    parent: Option<SelectorList>,
    /// Span of the statement being evaluated, for errors in expressions
    /// that carry no span of their own
    current: Option<SourceSpan>,
    format: FormatOptions,
}

impl<'a> Evaluator<'a> {
    fn new(
        options: &EngineOptions,
        runtime: &'a dyn SystemRuntime,
        ctx: &'a mut SourceContext,
    ) -> Self {
        let cwd = runtime.cwd().unwrap_or_else(|_| PathBuf::from("."));
        let mut resolver = ImportResolver::new(runtime, &options.load_paths);
        let dir = match &options.filename {
            Some(filename) => {
                let absolute = cwd.join(filename);
                resolver.enter_root(&absolute);
                absolute
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.clone())
            }
            None => cwd,
        };
        Self {
            ctx,
            resolver,
            scopes: ScopeChain::new(),
            files: vec![FileFrame {
                origin: options.origin(),
                dir,
            }],
            parent: None,
            current: None,
            format: FormatOptions {
                precision: options.precision,
                compressed: options.output_style == OutputStyle::Compressed,
            },
        }
    }

    fn origin(&self) -> &str {
        self.files.last().map(|f| f.origin.as_str()).unwrap_or("stdin")
    }

    fn error(&self, message: impl Into<String>, span: Option<SourceSpan>) -> SassError {
        match span.or(self.current) {
            Some(span) => SassError::syntax(message, self.origin(), span),
            None => SyntaxError::new(message, self.origin()).into(),
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt], target: &mut Target<'_>) -> Result<()> {
        for stmt in stmts {
            self.current = Some(stmt.span());
            self.exec(stmt, target)?;
        }
        Ok(())
    }

    /// Evaluate `stmts` in a fresh variable frame.
    fn exec_scoped(&mut self, stmts: &[Stmt], target: &mut Target<'_>) -> Result<()> {
        self.scopes.push();
        let result = self.exec_block(stmts, target);
        self.scopes.pop();
        result
    }

    fn exec(&mut self, stmt: &Stmt, target: &mut Target<'_>) -> Result<()> {
        match stmt {
            Stmt::Variable(binding) => self.exec_binding(binding),
            Stmt::Declaration(decl) => self.exec_declaration(decl, target),
            Stmt::StyleRule(rule) => self.exec_style_rule(rule, target),
            Stmt::AtRule(at) => self.exec_at_rule(at, target),
            Stmt::Import(import) => self.exec_import(import, target),
            Stmt::Comment(comment) => {
                let comment = CssComment {
                    text: comment.text.clone(),
                    span: comment.span,
                };
                match target.body.as_deref_mut() {
                    Some(body) => body.push(CssBodyItem::Comment(comment)),
                    None => target.nodes.push(CssNode::Comment(comment)),
                }
                Ok(())
            }
        }
    }

    fn exec_binding(&mut self, binding: &VariableBinding) -> Result<()> {
        let already_set = if binding.global {
            self.scopes.is_set_globally(&binding.name)
        } else {
            self.scopes.is_set(&binding.name)
        };
        if binding.default && already_set {
            return Ok(());
        }
        let value = self.eval_expr(&binding.value, false)?;
        tracing::trace!(name = %binding.name, "bind variable");
        if binding.global {
            self.scopes.set_global(&binding.name, value);
        } else {
            self.scopes.set(&binding.name, value);
        }
        Ok(())
    }

    fn exec_declaration(&mut self, decl: &Declaration, target: &mut Target<'_>) -> Result<()> {
        if target.body.is_none() {
            return Err(self.error(
                "Properties are only allowed within rules, directives, mixin includes, or other properties.",
                Some(decl.span),
            ));
        }
        let name = self.eval_interpolation(&decl.name)?.trim().to_string();
        let value = self.eval_expr(&decl.value, true)?;
        if value.is_null() {
            return Ok(());
        }
        let text = value
            .to_css(self.format)
            .map_err(|m| self.error(m, decl.value.span()))?;
        if text.is_empty() {
            return Ok(());
        }
        if let Some(body) = target.body.as_deref_mut() {
            body.push(CssBodyItem::Declaration(CssDeclaration {
                name,
                value: text,
                span: decl.span,
            }));
        }
        Ok(())
    }

    fn exec_style_rule(&mut self, rule: &StyleRule, target: &mut Target<'_>) -> Result<()> {
        let text = self.eval_interpolation(&rule.selector)?;
        let list = SelectorList::parse(&text).map_err(|m| self.error(m, Some(rule.span)))?;
        let resolved = match &self.parent {
            Some(parent) => list.resolve_parent(parent),
            None if list.has_parent_ref() => {
                return Err(self.error(
                    "Base-level rules cannot contain the parent-selector-referencing character '&'.",
                    Some(rule.span),
                ));
            }
            None => list,
        };

        let mut block = CssBlock::default();
        let saved = self.parent.replace(resolved.clone());
        let result = self.exec_scoped(
            &rule.body,
            &mut Target {
                body: Some(&mut block.body),
                nodes: &mut block.children,
            },
        );
        self.parent = saved;
        result?;

        target.nodes.push(CssNode::Style(CssStyleRule {
            selectors: resolved.visible(),
            block,
            span: rule.span,
        }));
        Ok(())
    }

    fn exec_at_rule(&mut self, at: &AtRule, target: &mut Target<'_>) -> Result<()> {
        let prelude = collapse_whitespace(&self.eval_interpolation(&at.prelude)?);
        let Some(stmts) = &at.body else {
            target.nodes.push(CssNode::AtRule(CssAtRule {
                name: at.name.clone(),
                prelude,
                block: None,
                span: at.span,
            }));
            return Ok(());
        };

        let mut block = CssBlock::default();
        match self.parent.clone() {
            // inside a style rule: declarations go into a copy of that rule
            // and the at-rule moves out to the enclosing level
            Some(parent) => {
                let mut inner = CssBlock::default();
                self.exec_scoped(
                    stmts,
                    &mut Target {
                        body: Some(&mut inner.body),
                        nodes: &mut inner.children,
                    },
                )?;
                block.children.push(CssNode::Style(CssStyleRule {
                    selectors: parent.visible(),
                    block: inner,
                    span: at.span,
                }));
            }
            None => {
                self.exec_scoped(
                    stmts,
                    &mut Target {
                        body: Some(&mut block.body),
                        nodes: &mut block.children,
                    },
                )?;
            }
        }

        target.nodes.push(CssNode::AtRule(CssAtRule {
            name: at.name.clone(),
            prelude,
            block: Some(block),
            span: at.span,
        }));
        Ok(())
    }

    fn exec_import(&mut self, import: &Import, target: &mut Target<'_>) -> Result<()> {
        for item in &import.targets {
            match item {
                ImportTarget::Css(url) => {
                    let url = self.eval_interpolation(url)?;
                    target.nodes.push(CssNode::Import(CssImport {
                        url: url.trim().to_string(),
                        span: import.span,
                    }));
                }
                ImportTarget::Sass { url, span } => self.import_file(url, *span, target)?,
            }
        }
        Ok(())
    }

    fn import_file(&mut self, url: &str, span: SourceSpan, target: &mut Target<'_>) -> Result<()> {
        let dir = self
            .files
            .last()
            .map(|f| f.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let loaded = self
            .resolver
            .load(url, &dir)
            .map_err(|m| self.error(m, Some(span)))?;

        let origin = loaded.path.display().to_string();
        let file = match self.ctx.find_file(&origin) {
            Some(id) => id,
            None => self.ctx.add_file(origin.clone(), Some(loaded.text.clone())),
        };

        self.files.push(FileFrame {
            origin: origin.clone(),
            dir: loaded
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or(dir),
        });
        let saved = self.current;
        let result = parser::parse_text(&loaded.text, loaded.syntax, file, &origin)
            .and_then(|sheet| self.exec_block(&sheet.body, target));
        self.current = saved;
        self.files.pop();
        self.resolver.leave();
        result
    }

    fn eval_interpolation(&mut self, interp: &Interpolation) -> Result<String> {
        let mut out = String::new();
        for part in &interp.parts {
            match part {
                InterpolationPart::Text(text) => out.push_str(text),
                InterpolationPart::Expr(expr) => {
                    let value = self.eval_expr(expr, false)?;
                    let text = value
                        .to_interpolated(self.format)
                        .map_err(|m| self.error(m, expr.span()))?;
                    out.push_str(&text);
                }
            }
        }
        Ok(out)
    }

    /// Evaluate an expression. `allow_slash` keeps `/` between two literal
    /// numbers as a separator, as it is in a declaration value.
    fn eval_expr(&mut self, expr: &Expr, allow_slash: bool) -> Result<Value> {
        match expr {
            Expr::Number { value, unit, .. } => {
                Ok(Value::Number(Number::new(*value, Unit::parse(unit))))
            }
            Expr::String { value, quote, .. } => Ok(Value::String {
                text: value.clone(),
                quote: *quote,
            }),
            Expr::Interpolated { parts, quote, .. } => Ok(Value::String {
                text: self.eval_interpolation(parts)?,
                quote: *quote,
            }),
            Expr::Raw(interp) => Ok(Value::unquoted(self.eval_interpolation(interp)?)),
            Expr::Null => Ok(Value::Null),
            Expr::Variable { name, span } => self
                .scopes
                .get(name)
                .cloned()
                .ok_or_else(|| self.error(format!("Undefined variable: \"${name}\"."), Some(*span))),
            Expr::Paren(inner) => self.eval_expr(inner, false),
            Expr::List { items, separator } => {
                let items = items
                    .iter()
                    .map(|item| self.eval_expr(item, allow_slash))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::List {
                    items,
                    separator: *separator,
                })
            }
            Expr::Unary { op, operand, span } => {
                let value = self.eval_expr(operand, false)?;
                match op {
                    UnaryOp::Neg => value
                        .neg(self.format)
                        .map_err(|m| self.error(m, Some(*span))),
                    UnaryOp::Plus => match value {
                        Value::Number(_) => Ok(value),
                        other => {
                            let text = other
                                .to_interpolated(self.format)
                                .map_err(|m| self.error(m, Some(*span)))?;
                            Ok(Value::unquoted(format!("+{text}")))
                        }
                    },
                }
            }
            Expr::Binary {
                op,
                lhs,
                rhs,
                literal_slash,
                span,
            } => {
                if *op == BinaryOp::Div && *literal_slash && allow_slash {
                    let lhs = self.eval_expr(lhs, true)?;
                    let rhs = self.eval_expr(rhs, false)?;
                    return Ok(Value::List {
                        items: vec![lhs, rhs],
                        separator: ListSeparator::Slash,
                    });
                }
                let lhs = self.eval_expr(lhs, false)?;
                let rhs = self.eval_expr(rhs, false)?;
                let result = match op {
                    BinaryOp::Add => lhs.add(&rhs, self.format),
                    BinaryOp::Sub => lhs.sub(&rhs, self.format),
                    BinaryOp::Mul => lhs.mul(&rhs, self.format),
                    BinaryOp::Div => lhs.div(&rhs, self.format),
                    BinaryOp::Rem => lhs.rem(&rhs, self.format),
                };
                result.map_err(|m| self.error(m, Some(*span)))
            }
            Expr::Call { name, args, span } => {
                let builtin = functions::is_builtin(name);
                let args = args
                    .iter()
                    .map(|arg| self.eval_expr(arg, !builtin))
                    .collect::<Result<Vec<_>>>()?;
                match functions::call(name, &args, self.format) {
                    Some(result) => result.map_err(|m| self.error(m, Some(*span))),
                    None => {
                        let sep = if self.format.compressed { "," } else { ", " };
                        let args = args
                            .iter()
                            .map(|arg| arg.to_css(self.format))
                            .collect::<std::result::Result<Vec<_>, _>>()
                            .map_err(|m| self.error(m, Some(*span)))?;
                        Ok(Value::unquoted(format!("{name}({})", args.join(sep))))
                    }
                }
            }
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
