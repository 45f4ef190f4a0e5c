//! Compilation entry points.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! [`compile`] is a pure function of the source, the options and the files
//! visible through the runtime. [`Engine`] wraps one source and its options
//! and keeps the result of the last successful render, which is what
//! [`Engine::dependencies`] and [`Engine::source_map`] read.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sassc_source_map::{SourceContext, SourceMapOptions};
use sassc_system_runtime::{NativeRuntime, SystemRuntime};

use crate::emit;
use crate::error::{Result, SassError, SyntaxError};
use crate::eval;
use crate::import::Dependency;
use crate::options::EngineOptions;
use crate::parser;
use crate::source::{Css, Source};

/// Output of one successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub css: Css,
    /// Every imported file, once each, in first-import order
    pub dependencies: Vec<Dependency>,
    /// Source map JSON, when one was requested
    pub source_map: Option<String>,
}

/// Compile `source` with `options`, reading imports through `runtime`.
pub fn compile(
    source: impl Into<Source>,
    options: &EngineOptions,
    runtime: &dyn SystemRuntime,
) -> Result<Compilation> {
    let mut ctx = SourceContext::new();
    compile_in(&source.into(), options, runtime, &mut ctx)
}

/// Compile, registering every file read in `ctx`.
fn compile_in(
    source: &Source,
    options: &EngineOptions,
    runtime: &dyn SystemRuntime,
    ctx: &mut SourceContext,
) -> Result<Compilation> {
    let origin = options.origin();
    tracing::debug!(origin = %origin, syntax = %options.syntax, "compiling stylesheet");

    let file = ctx.add_file(origin.clone(), Some(source.text().to_string()));
    let sheet = parser::parse_text(source.text(), options.syntax, file, &origin)?;
    let evaluated = eval::evaluate(&sheet.body, options, runtime, ctx)?;
    let emitted = emit::emit(&evaluated.nodes, options, ctx);

    let mut css = emitted.css;
    let source_map = if options.wants_source_map() && !css.is_empty() {
        let cwd = runtime.cwd().unwrap_or_else(|_| PathBuf::from("."));
        let map_file = options
            .source_map_file
            .as_deref()
            .filter(|path| *path != Path::new("."));
        let base_dir = match map_file {
            Some(path) => cwd
                .join(path)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or(cwd),
            None => cwd,
        };
        let map_name = map_file
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());

        let map = emitted.mappings.build(
            ctx,
            &SourceMapOptions {
                file: map_name
                    .as_deref()
                    .map(|name| name.strip_suffix(".map").unwrap_or(name).to_string()),
                base_dir: Some(base_dir),
                include_contents: options.source_map_contents,
            },
        );
        let map_error = |e: serde_json::Error| -> SassError {
            SyntaxError::new(format!("Unable to write source map: {e}"), origin.as_str()).into()
        };

        if options.source_map_embed {
            let url = map.to_data_url().map_err(map_error)?;
            css.push_str(&format!("\n/*# sourceMappingURL={url} */"));
        } else if let Some(name) = map_name.as_deref()
            && !options.omit_source_map_url
        {
            css.push_str(&format!("\n/*# sourceMappingURL={name} */"));
        }
        Some(map.to_json().map_err(map_error)?)
    } else {
        None
    };

    tracing::debug!(
        origin = %origin,
        bytes = css.len(),
        dependencies = evaluated.dependencies.len(),
        "compiled stylesheet"
    );

    Ok(Compilation {
        css: Css::new(css, source.encoding().clone()),
        dependencies: evaluated.dependencies,
        source_map,
    })
}

/// One stylesheet and the options to compile it with.
///
/// ```rust
/// use sassc_core::{Engine, EngineOptions};
///
/// let mut engine = Engine::new("$var: 1;\n.foo {\n  baz: $var / 3; }", EngineOptions::default().with_precision(8));
/// assert!(engine.dependencies().unwrap_err().is_not_rendered());
/// assert_eq!(engine.render().unwrap(), ".foo {\n  baz: 0.33333333; }\n");
/// assert!(engine.dependencies().unwrap().is_empty());
/// ```
pub struct Engine {
    source: Source,
    options: EngineOptions,
    runtime: Arc<dyn SystemRuntime>,
    rendered: Option<Compilation>,
    /// Files read by the last render attempt, for error reports
    context: SourceContext,
}

impl Engine {
    /// Engine reading imports from the native filesystem.
    pub fn new(source: impl Into<Source>, options: EngineOptions) -> Self {
        Self::with_runtime(source, options, Arc::new(NativeRuntime::new()))
    }

    pub fn with_runtime(
        source: impl Into<Source>,
        options: EngineOptions,
        runtime: Arc<dyn SystemRuntime>,
    ) -> Self {
        Self {
            source: source.into(),
            options,
            runtime,
            rendered: None,
            context: SourceContext::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Compile the stylesheet.
    ///
    /// Rendering again compiles again and replaces the previous result. A
    /// failed render leaves the previous result in place.
    pub fn render(&mut self) -> Result<Css> {
        let mut ctx = SourceContext::new();
        let result = compile_in(&self.source, &self.options, self.runtime.as_ref(), &mut ctx);
        self.context = ctx;
        let compilation = result?;
        let css = compilation.css.clone();
        self.rendered = Some(compilation);
        Ok(css)
    }

    /// The result of the last successful render.
    pub fn compilation(&self) -> Result<&Compilation> {
        self.rendered.as_ref().ok_or(SassError::NotRendered)
    }

    /// Files imported by the last successful render.
    pub fn dependencies(&self) -> Result<&[Dependency]> {
        self.compilation().map(|c| c.dependencies.as_slice())
    }

    /// Source map JSON from the last successful render, if one was requested.
    pub fn source_map(&self) -> Result<Option<&str>> {
        self.compilation().map(|c| c.source_map.as_deref())
    }

    /// Render `error` with a snippet of the source it points at, when the
    /// source was read by the last render.
    pub fn report(&self, error: &SassError) -> String {
        error.report(&self.context)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("rendered", &self.rendered.is_some())
            .finish_non_exhaustive()
    }
}
