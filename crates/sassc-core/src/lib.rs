//! SCSS and indented Sass compiler core.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The compilation flow is:
//! 1. Tokenize the source ([`lexer`]), SCSS or indented syntax
//! 2. Parse tokens into a [`Stylesheet`] ([`parser`])
//! 3. Evaluate the tree: variables, arithmetic, `@import` resolution through
//!    a [`SystemRuntime`](sassc_system_runtime::SystemRuntime)
//! 4. Emit CSS text, optional line comments, and an optional source map
//!
//! # Example
//!
//! ```rust
//! use sassc_core::{Engine, EngineOptions};
//!
//! let mut engine = Engine::new("$var: 1;\n.foo {\n  baz: $var / 3; }", EngineOptions::default());
//! let css = engine.render().unwrap();
//! assert_eq!(css.as_str(), ".foo {\n  baz: 0.33333; }\n");
//! ```

pub mod ast;
mod css;
mod emit;
mod engine;
mod error;
mod eval;
mod import;
pub mod lexer;
pub mod number;
mod options;
pub mod parser;
mod selector;
mod source;
mod value;

pub use ast::Stylesheet;
pub use engine::{Compilation, Engine, compile};
pub use error::{Result, SassError, SyntaxError};
pub use import::{Dependency, DependencyOptions};
pub use number::{Number, Rational, Unit, format_number};
pub use options::{EngineOptions, OutputStyle, Syntax};
pub use source::{Css, Encoding, Source};
pub use value::{ListSeparator, Value};
