//! Source map v3 generation.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The emitter records one [`Mapping`] per selector and declaration it
//! writes. [`SourceMapBuilder::build`] turns them into the standard JSON
//! shape (`version`, `file`, `sources`, `sourcesContent`, `names`,
//! `mappings`) with base64 VLQ encoded segments.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::context::SourceContext;
use crate::types::{FileId, Location};
use crate::utils::relative_path;

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// One generated position pointing back at an original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// 0-indexed line in the generated CSS
    pub generated_line: usize,
    /// 0-indexed column in the generated CSS
    pub generated_column: usize,
    pub source: FileId,
    pub original: Location,
}

/// Options controlling how the final map is rendered
#[derive(Debug, Clone, Default)]
pub struct SourceMapOptions {
    /// Value of the `file` field (the CSS file the map describes)
    pub file: Option<String>,
    /// Directory that absolute source paths are made relative to
    pub base_dir: Option<PathBuf>,
    /// Embed each source's text in `sourcesContent`
    pub include_contents: bool,
}

/// A rendered source map, in the v3 JSON shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    pub version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(rename = "sourcesContent", skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The map as a `data:` URI suitable for a `sourceMappingURL` comment.
    pub fn to_data_url(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!(
            "data:application/json;base64,{}",
            STANDARD.encode(json.as_bytes())
        ))
    }
}

/// Collects mappings while CSS is being written.
#[derive(Debug, Clone, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Render the collected mappings against every file in `ctx`.
    ///
    /// Source `n` of the map is `FileId(n)`.
    pub fn build(&self, ctx: &SourceContext, options: &SourceMapOptions) -> SourceMap {
        let sources = ctx
            .files()
            .map(|(_, file)| source_name(&file.path, options.base_dir.as_deref()))
            .collect();

        let sources_content = options
            .include_contents
            .then(|| ctx.files().map(|(_, file)| file.content.clone()).collect());

        SourceMap {
            version: 3,
            file: options.file.clone(),
            sources,
            sources_content,
            names: Vec::new(),
            mappings: self.encode_mappings(),
        }
    }

    fn encode_mappings(&self) -> String {
        let mut sorted = self.mappings.clone();
        sorted.sort_by_key(|m| (m.generated_line, m.generated_column));

        let mut out = String::new();
        let mut line = 0;
        let mut prev_column = 0i64;
        let mut prev_source = 0i64;
        let mut prev_orig_line = 0i64;
        let mut prev_orig_column = 0i64;
        let mut first_in_line = true;

        for m in &sorted {
            while line < m.generated_line {
                out.push(';');
                line += 1;
                prev_column = 0;
                first_in_line = true;
            }
            if !first_in_line {
                out.push(',');
            }
            first_in_line = false;

            let column = m.generated_column as i64;
            let source = m.source.0 as i64;
            let orig_line = m.original.row as i64;
            let orig_column = m.original.column as i64;

            encode_vlq(column - prev_column, &mut out);
            encode_vlq(source - prev_source, &mut out);
            encode_vlq(orig_line - prev_orig_line, &mut out);
            encode_vlq(orig_column - prev_orig_column, &mut out);

            prev_column = column;
            prev_source = source;
            prev_orig_line = orig_line;
            prev_orig_column = orig_column;
        }
        out
    }
}

fn source_name(path: &str, base_dir: Option<&Path>) -> String {
    let as_path = Path::new(path);
    match base_dir {
        Some(base) if as_path.is_absolute() => relative_path(base, as_path)
            .to_string_lossy()
            .replace('\\', "/"),
        _ => path.to_string(),
    }
}

/// Append the base64 VLQ encoding of `value`.
pub fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = vlq & 0b11111;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_DIGITS[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vlq(value: i64) -> String {
        let mut out = String::new();
        encode_vlq(value, &mut out);
        out
    }

    #[test]
    fn test_vlq_known_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
    }

    #[test]
    fn test_mappings_are_delta_encoded_per_line() {
        let mut builder = SourceMapBuilder::new();
        builder.add(Mapping {
            generated_line: 0,
            generated_column: 0,
            source: FileId(0),
            original: Location::new(0, 0, 0),
        });
        builder.add(Mapping {
            generated_line: 1,
            generated_column: 2,
            source: FileId(0),
            original: Location::new(9, 1, 2),
        });

        let mut ctx = SourceContext::new();
        ctx.add_file("stdin".into(), Some(".foo {\n  baz: bang; }\n".into()));
        let map = builder.build(&ctx, &SourceMapOptions::default());

        assert_eq!(map.mappings, "AAAA;EACE");
        assert_eq!(map.sources, vec!["stdin".to_string()]);
        assert!(map.sources_content.is_none());
    }

    #[test]
    fn test_contents_and_relative_sources() {
        let mut ctx = SourceContext::new();
        ctx.add_file("/project/styles/main.scss".into(), Some("a { b: c; }".into()));
        let options = SourceMapOptions {
            file: Some("main.css".into()),
            base_dir: Some(PathBuf::from("/project/out")),
            include_contents: true,
        };
        let map = SourceMapBuilder::new().build(&ctx, &options);

        assert_eq!(map.sources, vec!["../styles/main.scss".to_string()]);
        assert_eq!(
            map.sources_content,
            Some(vec![Some("a { b: c; }".to_string())])
        );
        let json = map.to_json().unwrap();
        assert!(json.contains("\"sourcesContent\""));
        assert!(json.contains("\"version\": 3"));
    }

    #[test]
    fn test_data_url_round_trips_through_base64() {
        let mut ctx = SourceContext::new();
        ctx.add_file("stdin".into(), Some("".into()));
        let map = SourceMapBuilder::new().build(&ctx, &SourceMapOptions::default());
        let url = map.to_data_url().unwrap();
        let payload = url
            .strip_prefix("data:application/json;base64,")
            .unwrap();
        let decoded = STANDARD.decode(payload).unwrap();
        let parsed: SourceMap = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(parsed, map);
    }
}
