//! Engine configuration.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! [`EngineOptions`] is a plain struct with defaults and `with_*` builders.
//! It also deserializes from JSON so hosts can pass configuration through
//! a config file; unknown keys are rejected.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SassError};

/// Input syntax of a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Syntax {
    /// Brace-and-semicolon syntax
    #[default]
    #[serde(rename = "scss")]
    Scss,
    /// Whitespace-sensitive syntax (`.sass` files)
    #[serde(rename = "sass", alias = "indented")]
    Indented,
}

impl Syntax {
    /// Syntax implied by a file extension, if it is one we load.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            ext if ext.eq_ignore_ascii_case("scss") => Some(Syntax::Scss),
            ext if ext.eq_ignore_ascii_case("sass") => Some(Syntax::Indented),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Syntax::Scss => "scss",
            Syntax::Indented => "sass",
        }
    }
}

impl FromStr for Syntax {
    type Err = SassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "scss" => Ok(Syntax::Scss),
            "sass" | "indented" => Ok(Syntax::Indented),
            other => Err(SassError::invalid_options(format!("unknown syntax '{other}'"))),
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Formatting of the generated CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Declarations indented under their rule, closing brace on the last
    /// declaration line, nested rules indented under their parent
    #[default]
    Nested,
    /// One declaration per line, closing brace on its own line
    Expanded,
    /// One rule per line
    Compact,
    /// Minimal whitespace
    Compressed,
}

impl FromStr for OutputStyle {
    type Err = SassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nested" => Ok(OutputStyle::Nested),
            "expanded" => Ok(OutputStyle::Expanded),
            "compact" => Ok(OutputStyle::Compact),
            "compressed" => Ok(OutputStyle::Compressed),
            other => Err(SassError::invalid_options(format!(
                "unknown output style '{other}'"
            ))),
        }
    }
}

/// Options controlling one compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Maximum fractional digits in emitted numbers
    pub precision: usize,
    /// Emit `/* line N, origin */` before each rule
    pub line_comments: bool,
    pub syntax: Syntax,
    /// Directories searched for `@import` targets, in order
    pub load_paths: Vec<PathBuf>,
    /// Where the source map is written; also the base for its `sources`
    pub source_map_file: Option<PathBuf>,
    /// Append the source map to the CSS as a base64 data URI
    pub source_map_embed: bool,
    /// Include source texts in the map
    pub source_map_contents: bool,
    pub output_style: OutputStyle,
    /// Path of the main document; `stdin` when unset
    pub filename: Option<PathBuf>,
    /// Skip the `sourceMappingURL` comment for a map written to a file
    pub omit_source_map_url: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            precision: 5,
            line_comments: false,
            syntax: Syntax::Scss,
            load_paths: Vec::new(),
            source_map_file: None,
            source_map_embed: false,
            source_map_contents: false,
            output_style: OutputStyle::Nested,
            filename: None,
            omit_source_map_url: false,
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SassError::invalid_options(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| SassError::invalid_options(e.to_string()))
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_line_comments(mut self, enabled: bool) -> Self {
        self.line_comments = enabled;
        self
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    pub fn with_load_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.load_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_source_map_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_map_file = Some(path.into());
        self
    }

    pub fn with_source_map_embed(mut self, embed: bool) -> Self {
        self.source_map_embed = embed;
        self
    }

    pub fn with_source_map_contents(mut self, contents: bool) -> Self {
        self.source_map_contents = contents;
        self
    }

    pub fn with_output_style(mut self, style: OutputStyle) -> Self {
        self.output_style = style;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_omit_source_map_url(mut self, omit: bool) -> Self {
        self.omit_source_map_url = omit;
        self
    }

    /// True when this compilation produces a source map.
    pub fn wants_source_map(&self) -> bool {
        self.source_map_embed || self.source_map_file.is_some()
    }

    /// Display name of the main document.
    pub fn origin(&self) -> String {
        self.filename
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdin".to_string())
    }
}
