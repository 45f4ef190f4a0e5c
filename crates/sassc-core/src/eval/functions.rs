//! Built-in functions.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Only a handful of numeric and string helpers are built in. A call to
//! any other name is printed as a plain CSS function.

use crate::number::{Number, Rational, Unit};
use crate::value::{FormatOptions, Value};

type Builtin = fn(&[Value], FormatOptions) -> Result<Value, String>;

const BUILTINS: &[(&str, Builtin)] = &[
    ("percentage", percentage),
    ("round", round),
    ("ceil", ceil),
    ("floor", floor),
    ("abs", abs),
    ("quote", quote),
    ("unquote", unquote),
];

fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| builtin.eq_ignore_ascii_case(name))
        .map(|(_, f)| *f)
}

pub(crate) fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

/// Call a built-in function. `None` when `name` is not built in.
pub(crate) fn call(name: &str, args: &[Value], opts: FormatOptions) -> Option<Result<Value, String>> {
    lookup(name).map(|f| f(args, opts))
}

fn single<'v>(name: &str, args: &'v [Value]) -> Result<&'v Value, String> {
    match args {
        [arg] => Ok(arg),
        _ => Err(format!(
            "wrong number of arguments ({} for 1) for `{name}'",
            args.len()
        )),
    }
}

fn number_arg<'v>(name: &str, args: &'v [Value], opts: FormatOptions) -> Result<&'v Number, String> {
    match single(name, args)? {
        Value::Number(n) => Ok(n),
        other => Err(format!(
            "argument `$number` of `{name}($number)` must be a number, was \"{}\"",
            other.to_css(opts).unwrap_or_default()
        )),
    }
}

fn percentage(args: &[Value], opts: FormatOptions) -> Result<Value, String> {
    let n = number_arg("percentage", args, opts)?;
    if !n.unit.is_none() {
        return Err(format!(
            "argument `$number` of `percentage($number)` must be a unitless number, was \"{}\"",
            n.to_css(opts.precision, false).unwrap_or_default()
        ));
    }
    Ok(Value::Number(Number::new(
        n.value.mul(Rational::from_integer(100)),
        Unit::parse("%"),
    )))
}

fn map_number(
    name: &str,
    args: &[Value],
    opts: FormatOptions,
    f: fn(Rational) -> Rational,
) -> Result<Value, String> {
    let n = number_arg(name, args, opts)?;
    Ok(Value::Number(n.map_value(f)))
}

fn round(args: &[Value], opts: FormatOptions) -> Result<Value, String> {
    map_number("round", args, opts, Rational::round)
}

fn ceil(args: &[Value], opts: FormatOptions) -> Result<Value, String> {
    map_number("ceil", args, opts, Rational::ceil)
}

fn floor(args: &[Value], opts: FormatOptions) -> Result<Value, String> {
    map_number("floor", args, opts, Rational::floor)
}

fn abs(args: &[Value], opts: FormatOptions) -> Result<Value, String> {
    map_number("abs", args, opts, Rational::abs)
}

fn quote(args: &[Value], opts: FormatOptions) -> Result<Value, String> {
    let text = match single("quote", args)? {
        Value::String { text, .. } => text.clone(),
        other => other.to_css(opts)?,
    };
    Ok(Value::String {
        text,
        quote: Some('"'),
    })
}

fn unquote(args: &[Value], _opts: FormatOptions) -> Result<Value, String> {
    match single("unquote", args)? {
        Value::String { text, .. } => Ok(Value::unquoted(text.clone())),
        other => Ok(other.clone()),
    }
}
