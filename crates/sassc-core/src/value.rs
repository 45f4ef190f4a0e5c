//! Runtime values produced by evaluating expressions.
//!
//! Copyright (c) 2025 Posit, PBC

use crate::number::Number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListSeparator {
    #[default]
    Space,
    Comma,
    /// A `/` kept as CSS text, as in `font: 12px/1.5`
    Slash,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(Number),
    /// A string and the quote character it was written with, if any
    String { text: String, quote: Option<char> },
    List {
        items: Vec<Value>,
        separator: ListSeparator,
    },
}

/// Settings that affect how values print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FormatOptions {
    pub precision: usize,
    pub compressed: bool,
}

impl Value {
    pub fn unquoted(text: impl Into<String>) -> Self {
        Value::String {
            text: text.into(),
            quote: None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// CSS text of the value as a declaration value.
    pub(crate) fn to_css(&self, opts: FormatOptions) -> Result<String, String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Number(n) => n.to_css(opts.precision, opts.compressed),
            Value::String {
                text,
                quote: Some(q),
            } => Ok(format!("{q}{text}{q}")),
            Value::String { text, quote: None } => Ok(text.clone()),
            Value::List { items, separator } => {
                if items.is_empty() {
                    return Err("() isn't a valid CSS value.".to_string());
                }
                let sep = match (separator, opts.compressed) {
                    (ListSeparator::Space, _) => " ",
                    (ListSeparator::Comma, false) => ", ",
                    (ListSeparator::Comma, true) => ",",
                    (ListSeparator::Slash, _) => "/",
                };
                let parts = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| item.to_css(opts))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(parts.join(sep))
            }
        }
    }

    /// Text of the value when interpolated with `#{}`: quotes are removed
    /// and null becomes empty.
    pub(crate) fn to_interpolated(&self, opts: FormatOptions) -> Result<String, String> {
        match self {
            Value::String { text, .. } => Ok(text.clone()),
            Value::List { items, .. } if items.is_empty() => Ok(String::new()),
            other => other.to_css(opts),
        }
    }

    fn operand_text(&self, opts: FormatOptions) -> Result<String, String> {
        match self {
            Value::String { text, .. } => Ok(text.clone()),
            other => other.to_css(opts),
        }
    }

    fn quote(&self) -> Option<char> {
        match self {
            Value::String { quote, .. } => *quote,
            _ => None,
        }
    }

    fn describe(&self, opts: FormatOptions) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::List { items, .. } if items.is_empty() => "()".to_string(),
            other => other
                .to_css(opts)
                .unwrap_or_else(|_| format!("{other:?}")),
        }
    }

    fn undefined(&self, op: &str, other: &Value, opts: FormatOptions) -> String {
        format!(
            "Undefined operation: \"{} {op} {}\".",
            self.describe(opts),
            other.describe(opts)
        )
    }

    /// Join two operands into a string, as Sass does for `+`, `-` and `/`
    /// when either side is not a number.
    fn concat(&self, sep: &str, other: &Value, opts: FormatOptions) -> Result<Value, String> {
        let text = format!(
            "{}{sep}{}",
            self.operand_text(opts)?,
            other.operand_text(opts)?
        );
        let quote = self
            .quote()
            .or_else(|| matches!(self, Value::Number(_)).then(|| other.quote()).flatten());
        Ok(Value::String { text, quote })
    }

    pub(crate) fn add(&self, other: &Value, opts: FormatOptions) -> Result<Value, String> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.add(b)?)),
            (Value::Null, _) | (_, Value::Null) => Err(self.undefined("+", other, opts)),
            (Value::List { .. }, _) | (_, Value::List { .. }) => {
                Err(self.undefined("+", other, opts))
            }
            _ => self.concat("", other, opts),
        }
    }

    pub(crate) fn sub(&self, other: &Value, opts: FormatOptions) -> Result<Value, String> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.sub(b)?)),
            (Value::Null, _) | (_, Value::Null) => Err(self.undefined("-", other, opts)),
            _ => self.concat("-", other, opts).map(|v| match v {
                Value::String { text, .. } => Value::unquoted(text),
                other => other,
            }),
        }
    }

    pub(crate) fn mul(&self, other: &Value, opts: FormatOptions) -> Result<Value, String> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.mul(b))),
            _ => Err(self.undefined("*", other, opts)),
        }
    }

    pub(crate) fn div(&self, other: &Value, opts: FormatOptions) -> Result<Value, String> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.div(b)?)),
            (Value::Null, _) | (_, Value::Null) => Err(self.undefined("/", other, opts)),
            _ => self.concat("/", other, opts).map(|v| match v {
                Value::String { text, .. } => Value::unquoted(text),
                other => other,
            }),
        }
    }

    pub(crate) fn rem(&self, other: &Value, opts: FormatOptions) -> Result<Value, String> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.rem(b)?)),
            _ => Err(self.undefined("%", other, opts)),
        }
    }

    pub(crate) fn neg(&self, opts: FormatOptions) -> Result<Value, String> {
        match self {
            Value::Number(n) => Ok(Value::Number(n.neg())),
            Value::Null => Err("Undefined operation: \"-null\".".to_string()),
            other => Ok(Value::unquoted(format!("-{}", other.operand_text(opts)?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::{Rational, Unit};

    const OPTS: FormatOptions = FormatOptions {
        precision: 5,
        compressed: false,
    };

    fn px(n: i128) -> Value {
        Value::Number(Number::new(Rational::from_integer(n), Unit::parse("px")))
    }

    fn quoted(text: &str) -> Value {
        Value::String {
            text: text.into(),
            quote: Some('"'),
        }
    }

    #[test]
    fn test_quoted_string_keeps_quote() {
        assert_eq!(quoted("a b").to_css(OPTS).unwrap(), "\"a b\"");
        let single = Value::String {
            text: "x".into(),
            quote: Some('\''),
        };
        assert_eq!(single.to_css(OPTS).unwrap(), "'x'");
        assert_eq!(quoted("a b").to_interpolated(OPTS).unwrap(), "a b");
    }

    #[test]
    fn test_list_output() {
        let list = Value::List {
            items: vec![px(1), Value::Null, px(2)],
            separator: ListSeparator::Comma,
        };
        assert_eq!(list.to_css(OPTS).unwrap(), "1px, 2px");

        let slash = Value::List {
            items: vec![px(12), Value::unquoted("normal")],
            separator: ListSeparator::Slash,
        };
        assert_eq!(slash.to_css(OPTS).unwrap(), "12px/normal");
    }

    #[test]
    fn test_empty_list_is_not_css() {
        let empty = Value::List {
            items: vec![],
            separator: ListSeparator::Space,
        };
        assert!(empty.to_css(OPTS).is_err());
        assert_eq!(empty.to_interpolated(OPTS).unwrap(), "");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            quoted("foo").add(&Value::unquoted("bar"), OPTS).unwrap(),
            quoted("foobar")
        );
        assert_eq!(
            Value::unquoted("a").add(&px(1), OPTS).unwrap(),
            Value::unquoted("a1px")
        );
        assert_eq!(
            Value::unquoted("a").sub(&Value::unquoted("b"), OPTS).unwrap(),
            Value::unquoted("a-b")
        );
    }

    #[test]
    fn test_undefined_operations() {
        let err = Value::unquoted("a").mul(&px(2), OPTS).unwrap_err();
        assert_eq!(err, "Undefined operation: \"a * 2px\".");
        assert!(Value::Null.add(&px(1), OPTS).is_err());
    }

    #[test]
    fn test_numeric_ops() {
        assert_eq!(px(1).add(&px(2), OPTS).unwrap(), px(3));
        assert_eq!(px(6).rem(&px(4), OPTS).unwrap(), px(2));
        assert!(px(1).div(&px(0), OPTS).is_err());
    }
}
