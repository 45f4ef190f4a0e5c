//! Input text and output CSS, with their character encodings.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fmt;
use std::ops::Deref;

use crate::error::{Result, SassError, SyntaxError};

/// Character encoding carried from the input to the output.
///
/// Compilation happens on Rust strings; the encoding only affects how
/// input bytes are decoded and how output text is encoded back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub enum Encoding {
    #[default]
    Utf8,
    /// US-ASCII
    Ascii,
    /// ISO-8859-1
    Latin1,
    /// Any other label; treated as UTF-8 for decoding
    Other(String),
}

impl Encoding {
    /// Look up an encoding by its label, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Encoding::Utf8,
            "us-ascii" | "ascii" => Encoding::Ascii,
            "iso-8859-1" | "latin1" | "latin-1" | "iso8859-1" => Encoding::Latin1,
            _ => Encoding::Other(label.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Ascii => "US-ASCII",
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Other(label) => label,
        }
    }

    fn can_encode(&self, c: char) -> bool {
        match self {
            Encoding::Ascii => c.is_ascii(),
            Encoding::Latin1 => (c as u32) <= 0xFF,
            Encoding::Utf8 | Encoding::Other(_) => true,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stylesheet's text together with its encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    text: String,
    encoding: Encoding,
}

impl Source {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            encoding: Encoding::Utf8,
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Decode raw bytes in the given encoding.
    pub fn from_bytes(bytes: &[u8], encoding: Encoding) -> Result<Self> {
        let text = match &encoding {
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Encoding::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(decode_error(format!(
                        "Invalid US-ASCII byte 0x{:02X} at offset {pos}.",
                        bytes[pos]
                    )));
                }
                String::from_utf8_lossy(bytes).into_owned()
            }
            Encoding::Utf8 | Encoding::Other(_) => String::from_utf8(bytes.to_vec())
                .map_err(|e| decode_error(format!("Invalid UTF-8: {e}.")))?,
        };
        Ok(Self { text, encoding })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

fn decode_error(message: String) -> SassError {
    SassError::Syntax(SyntaxError::new(message, "stdin"))
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::new(text)
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::new(text)
    }
}

/// Generated CSS, tagged with the encoding of the input it came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Css {
    text: String,
    encoding: Encoding,
}

impl Css {
    pub(crate) fn new(text: String, encoding: Encoding) -> Self {
        Self { text, encoding }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Encode the text in its encoding.
    ///
    /// Characters the encoding cannot represent are written as CSS escapes
    /// (`\E9 `), which every CSS parser reads back as the same character.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.encoding {
            Encoding::Utf8 | Encoding::Other(_) => self.text.as_bytes().to_vec(),
            Encoding::Ascii | Encoding::Latin1 => {
                let mut out = Vec::with_capacity(self.text.len());
                for c in self.text.chars() {
                    if self.encoding.can_encode(c) {
                        out.push(c as u32 as u8);
                    } else {
                        out.extend(format!("\\{:X} ", c as u32).bytes());
                    }
                }
                out
            }
        }
    }
}

impl Deref for Css {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Css {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq<str> for Css {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Css {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_labels() {
        assert_eq!(Encoding::from_label("utf-8"), Encoding::Utf8);
        assert_eq!(Encoding::from_label("ISO-8859-1"), Encoding::Latin1);
        assert_eq!(Encoding::from_label("US-ASCII"), Encoding::Ascii);
        assert_eq!(
            Encoding::from_label("Shift_JIS"),
            Encoding::Other("Shift_JIS".to_string())
        );
        assert_eq!(Encoding::Latin1.to_string(), "ISO-8859-1");
    }

    #[test]
    fn test_latin1_decodes_every_byte() {
        let source = Source::from_bytes(b"a { content: \"caf\xE9\"; }", Encoding::Latin1).unwrap();
        assert_eq!(source.text(), "a { content: \"café\"; }");
        assert_eq!(source.encoding(), &Encoding::Latin1);
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let err = Source::from_bytes(b"a\xFF", Encoding::Utf8).unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert!(Source::from_bytes(b"\xE9", Encoding::Ascii).is_err());
        assert!(Source::from_bytes(b"a{}", Encoding::Ascii).is_ok());
    }

    #[test]
    fn test_css_to_bytes_round_trips_latin1() {
        let css = Css::new("a { content: \"café\"; }".into(), Encoding::Latin1);
        assert_eq!(css.to_bytes(), b"a { content: \"caf\xE9\"; }".to_vec());
    }

    #[test]
    fn test_css_to_bytes_escapes_unencodable() {
        let css = Css::new("x\u{2603}".into(), Encoding::Ascii);
        assert_eq!(css.to_bytes(), b"x\\2603 ".to_vec());
    }

    #[test]
    fn test_css_compares_with_str() {
        let css = Css::new("a".into(), Encoding::Utf8);
        assert_eq!(css, "a");
        assert_eq!(css.len(), 1);
    }
}
