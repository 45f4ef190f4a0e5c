//! Exact decimal arithmetic.
//!
//! Copyright (c) 2025 Posit, PBC

use std::cmp::Ordering;
use std::fmt;

/// A reduced fraction with a positive denominator.
///
/// Neither part is ever `i128::MIN`, so negation and `abs` cannot overflow.
/// Arithmetic is exact while it fits in `i128`. Results that overflow fall
/// back to an `f64` approximation re-expressed as a fraction, so evaluation
/// never panics on large literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numer: i128,
    denom: i128,
}

const APPROX_SCALE: i128 = 1_000_000_000_000_000;

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    // only 2^127 does not fit, and that needs an i128::MIN operand
    i128::try_from(a).unwrap_or(1)
}

impl Rational {
    pub const ZERO: Rational = Rational { numer: 0, denom: 1 };
    pub const ONE: Rational = Rational { numer: 1, denom: 1 };

    /// `numer / denom`, reduced. `None` when `denom` is zero or either part
    /// is `i128::MIN`.
    pub fn new(numer: i128, denom: i128) -> Option<Self> {
        if denom == 0 || numer == i128::MIN || denom == i128::MIN {
            return None;
        }
        let g = gcd(numer, denom).max(1);
        let (mut n, mut d) = (numer / g, denom / g);
        if d < 0 {
            n = n.checked_neg()?;
            d = d.checked_neg()?;
        }
        Some(Self { numer: n, denom: d })
    }

    /// `i128::MIN` saturates to `i128::MIN + 1`.
    pub fn from_integer(value: i128) -> Self {
        Self {
            numer: value.max(i128::MIN + 1),
            denom: 1,
        }
    }

    /// Parse an unsigned or signed decimal literal such as `12`, `1.5`,
    /// `.25`, `-3` or `1e3`.
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (mantissa, exponent) = match body.find(['e', 'E']) {
            Some(i) => (&body[..i], body[i + 1..].parse::<i32>().ok()?),
            None => (body, 0),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }

        let digits = format!("{int_part}{frac_part}");
        let value = match digits.trim_start_matches('0') {
            "" => Some(Self::ZERO),
            d => d
                .parse::<i128>()
                .ok()
                .zip(pow10(frac_part.len()))
                .and_then(|(n, scale)| Self::new(n, scale)),
        };
        let value = match value {
            Some(v) => v,
            None => Self::from_f64(text.parse::<f64>().ok()?),
        };
        let value = value.scale_by_pow10(exponent);
        Some(if negative { value.neg() } else { value })
    }

    fn scale_by_pow10(self, exponent: i32) -> Self {
        let factor = pow10(exponent.unsigned_abs() as usize).map(Self::from_integer);
        match (exponent.cmp(&0), factor) {
            (Ordering::Equal, _) => self,
            (Ordering::Greater, Some(f)) => self.mul(f),
            (Ordering::Less, Some(f)) => self.div(f).unwrap_or(Self::ZERO),
            (_, None) => Self::from_f64(self.to_f64() * 10f64.powi(exponent)),
        }
    }

    /// Closest fraction to `value` with a power-of-ten denominator.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return if value.is_nan() {
                Self::ZERO
            } else if value > 0.0 {
                Self::from_integer(i128::MAX)
            } else {
                Self::from_integer(i128::MIN + 1)
            };
        }
        let scaled = value * APPROX_SCALE as f64;
        if scaled.abs() < i128::MAX as f64 {
            Self::new(scaled.round() as i128, APPROX_SCALE).unwrap_or(Self::ZERO)
        } else {
            // saturating float-to-int cast
            Self::from_integer(value.round() as i128)
        }
    }

    pub fn numer(&self) -> i128 {
        self.numer
    }

    pub fn denom(&self) -> i128 {
        self.denom
    }

    pub fn to_f64(&self) -> f64 {
        self.numer as f64 / self.denom as f64
    }

    pub fn is_zero(&self) -> bool {
        self.numer == 0
    }

    pub fn is_negative(&self) -> bool {
        self.numer < 0
    }

    pub fn is_integer(&self) -> bool {
        self.denom == 1
    }

    pub fn neg(self) -> Self {
        match self.numer.checked_neg() {
            Some(numer) => Self {
                numer,
                denom: self.denom,
            },
            None => Self::from_f64(-self.to_f64()),
        }
    }

    pub fn abs(self) -> Self {
        if self.is_negative() { self.neg() } else { self }
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        let g = gcd(self.denom, other.denom).max(1);
        let lhs = self.numer.checked_mul(other.denom / g)?;
        let rhs = other.numer.checked_mul(self.denom / g)?;
        let denom = (self.denom / g).checked_mul(other.denom)?;
        Self::new(lhs.checked_add(rhs)?, denom)
    }

    pub fn checked_mul(self, other: Self) -> Option<Self> {
        let g1 = gcd(self.numer, other.denom).max(1);
        let g2 = gcd(other.numer, self.denom).max(1);
        let numer = (self.numer / g1).checked_mul(other.numer / g2)?;
        let denom = (self.denom / g2).checked_mul(other.denom / g1)?;
        Self::new(numer, denom)
    }

    pub fn add(self, other: Self) -> Self {
        self.checked_add(other)
            .unwrap_or_else(|| Self::from_f64(self.to_f64() + other.to_f64()))
    }

    pub fn sub(self, other: Self) -> Self {
        self.add(other.neg())
    }

    pub fn mul(self, other: Self) -> Self {
        self.checked_mul(other)
            .unwrap_or_else(|| Self::from_f64(self.to_f64() * other.to_f64()))
    }

    /// `None` on division by zero.
    pub fn div(self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        let recip = Self::new(other.denom, other.numer)?;
        Some(self.mul(recip))
    }

    /// Largest integer not greater than `self`.
    pub fn floor(self) -> Self {
        Self::from_integer(self.numer.div_euclid(self.denom))
    }

    /// Smallest integer not less than `self`.
    pub fn ceil(self) -> Self {
        let floor = self.numer.div_euclid(self.denom);
        if self.numer.rem_euclid(self.denom) == 0 {
            Self::from_integer(floor)
        } else {
            Self::from_integer(floor + 1)
        }
    }

    /// Nearest integer, halves rounded away from zero.
    pub fn round(self) -> Self {
        let abs = self.abs();
        let q = abs.numer / abs.denom;
        let r = abs.numer % abs.denom;
        let rounded = if r >= abs.denom - r { q + 1 } else { q };
        let rounded = Self::from_integer(rounded);
        if self.is_negative() { rounded.neg() } else { rounded }
    }
}

/// `10^exp`, or `None` when it doesn't fit.
pub(crate) fn pow10(exp: usize) -> Option<i128> {
    10i128.checked_pow(u32::try_from(exp).ok()?)
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        match (
            self.numer.checked_mul(other.denom),
            other.numer.checked_mul(self.denom),
        ) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.numer)
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i128, d: i128) -> Rational {
        Rational::new(n, d).unwrap()
    }

    #[test]
    fn test_reduction_and_sign() {
        assert_eq!(r(2, 4), r(1, 2));
        assert_eq!(r(1, -2), r(-1, 2));
        assert_eq!(r(-1, 2).denom(), 2);
        assert!(Rational::new(1, 0).is_none());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Rational::parse_decimal("1.5"), Some(r(3, 2)));
        assert_eq!(Rational::parse_decimal(".25"), Some(r(1, 4)));
        assert_eq!(Rational::parse_decimal("-3"), Some(Rational::from_integer(-3)));
        assert_eq!(Rational::parse_decimal("1e3"), Some(Rational::from_integer(1000)));
        assert_eq!(Rational::parse_decimal("25e-2"), Some(r(1, 4)));
        assert_eq!(Rational::parse_decimal("0.000"), Some(Rational::ZERO));
        assert_eq!(Rational::parse_decimal("abc"), None);
        assert_eq!(Rational::parse_decimal("."), None);
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let third = r(1, 3);
        assert_eq!(third.add(third).add(third), Rational::ONE);
        assert_eq!(r(1, 2).sub(r(3, 4)), r(-1, 4));
        assert_eq!(r(2, 3).mul(r(3, 4)), r(1, 2));
        assert_eq!(Rational::ONE.div(r(3, 1)), Some(third));
        assert_eq!(Rational::ONE.div(Rational::ZERO), None);
    }

    #[test]
    fn test_overflow_falls_back_to_approximation() {
        let big = Rational::from_integer(i128::MAX / 2);
        let sum = big.add(big).add(big);
        assert!(sum.to_f64() > 0.0);
    }

    #[test]
    fn test_sum_reaching_i128_min_falls_back() {
        let low = Rational::from_integer(i128::MIN + 1);
        let diff = low.sub(Rational::ONE);
        assert!(diff.is_negative());
        assert_eq!(diff.neg().abs(), diff.abs());
        assert!(Rational::new(i128::MIN, 1).is_none());
        assert!(Rational::new(1, i128::MIN).is_none());
        assert_eq!(Rational::from_integer(i128::MIN), low);
        assert_eq!(gcd(i128::MIN + 1, 3), 1);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(r(5, 2).round(), Rational::from_integer(3));
        assert_eq!(r(-5, 2).round(), Rational::from_integer(-3));
        assert_eq!(r(7, 3).round(), Rational::from_integer(2));
        assert_eq!(r(-7, 2).floor(), Rational::from_integer(-4));
        assert_eq!(r(-7, 2).ceil(), Rational::from_integer(-3));
        assert_eq!(r(7, 2).ceil(), Rational::from_integer(4));
        assert_eq!(Rational::from_integer(4).ceil(), Rational::from_integer(4));
    }

    #[test]
    fn test_ordering() {
        assert!(r(1, 3) < r(1, 2));
        assert!(r(-1, 2) < Rational::ZERO);
    }
}
