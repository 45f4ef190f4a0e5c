//! Source tracking for the sassc compiler.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This crate keeps track of every document that contributes to a
//! compilation and maps generated CSS positions back to them:
//! - [`SourceContext`]: registry of source files, keyed by [`FileId`]
//! - [`SourceSpan`]: a location inside a registered file
//! - [`SourceMapBuilder`]: collects mappings and renders a source map v3
//!
//! # Example
//!
//! ```rust
//! use sassc_source_map::*;
//!
//! let mut ctx = SourceContext::new();
//! let file = ctx.add_file("stdin".into(), Some(".foo {\n  baz: bang; }\n".into()));
//!
//! assert_eq!(ctx.path(file), "stdin");
//! assert_eq!(ctx.find_file("stdin"), Some(file));
//! ```

pub mod context;
pub mod sourcemap;
pub mod types;
pub mod utils;

pub use context::{SourceContext, SourceFile};
pub use sourcemap::{Mapping, SourceMap, SourceMapBuilder, SourceMapOptions};
pub use types::{FileId, Location, Range, SourceSpan};
pub use utils::relative_path;
