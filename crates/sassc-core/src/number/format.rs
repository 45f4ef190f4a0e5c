//! Decimal formatting of numbers for CSS output.
//!
//! Copyright (c) 2025 Posit, PBC

use super::Rational;
use super::rational::pow10;

/// Format `value` with at most `precision` fractional digits.
///
/// Halves round away from zero, trailing zeros and a bare decimal point are
/// dropped, and a result that rounds to zero prints as `0`, never `-0`.
/// Formatting an already formatted value with the same precision gives
/// back the same text.
pub fn format_number(value: &Rational, precision: usize) -> String {
    let negative = value.is_negative();
    let abs = value.abs();

    let Some((scale, scaled)) =
        pow10(precision).and_then(|scale| Some((scale, abs.numer().checked_mul(scale)?)))
    else {
        return format_approximate(value.to_f64(), precision);
    };

    let denom = abs.denom();
    let mut quotient = scaled / denom;
    let remainder = scaled % denom;
    if remainder >= denom - remainder {
        quotient += 1;
    }

    let int_part = quotient / scale;
    let frac_part = quotient % scale;
    if int_part == 0 && frac_part == 0 {
        return "0".to_string();
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&int_part.to_string());
    if precision > 0 && frac_part != 0 {
        let digits = format!("{frac_part:0precision$}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

fn format_approximate(value: f64, precision: usize) -> String {
    let text = format!("{value:.precision$}");
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };
    if text == "-0" { "0".to_string() } else { text }
}

/// Drop the leading zero of a fraction, for compressed output.
pub fn strip_leading_zero(text: &str) -> String {
    if let Some(rest) = text.strip_prefix("0.") {
        format!(".{rest}")
    } else if let Some(rest) = text.strip_prefix("-0.") {
        format!("-.{rest}")
    } else {
        text.to_string()
    }
}
