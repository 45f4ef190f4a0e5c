//! Numbers with units.
//!
//! Copyright (c) 2025 Posit, PBC

mod format;
mod rational;
mod unit;

use std::fmt;

pub use format::{format_number, strip_leading_zero};
pub use rational::Rational;
pub use unit::{Unit, conversion_factor};

/// A numeric value and its unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number {
    pub value: Rational,
    pub unit: Unit,
}

impl Number {
    pub fn new(value: Rational, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn unitless(value: Rational) -> Self {
        Self::new(value, Unit::none())
    }

    /// Value of `other` expressed in this number's unit, for addition and
    /// comparison.
    fn coerced(&self, other: &Number) -> Result<Rational, String> {
        other
            .unit
            .coerce_factor(&self.unit)
            .map(|factor| other.value.mul(factor))
            .ok_or_else(|| format!("Incompatible units: '{}' and '{}'.", other.unit, self.unit))
    }

    /// The unit a sum carries: the left side's, unless it has none.
    fn sum_unit(&self, other: &Number) -> Unit {
        if self.unit.is_none() {
            other.unit.clone()
        } else {
            self.unit.clone()
        }
    }

    pub fn add(&self, other: &Number) -> Result<Number, String> {
        let unit = self.sum_unit(other);
        if self.unit.is_none() {
            return Ok(Number::new(self.value.add(other.value), unit));
        }
        Ok(Number::new(self.value.add(self.coerced(other)?), unit))
    }

    pub fn sub(&self, other: &Number) -> Result<Number, String> {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Number) -> Number {
        let (unit, factor) = self.unit.multiply(&other.unit);
        Number::new(self.value.mul(other.value).mul(factor), unit)
    }

    pub fn div(&self, other: &Number) -> Result<Number, String> {
        let (unit, factor) = self.unit.divide(&other.unit);
        let quotient = self
            .value
            .div(other.value)
            .ok_or_else(|| "Division by zero.".to_string())?;
        Ok(Number::new(quotient.mul(factor), unit))
    }

    /// Floored modulo: the result takes the sign of the divisor.
    pub fn rem(&self, other: &Number) -> Result<Number, String> {
        let divisor = if self.unit.is_none() {
            other.value
        } else {
            self.coerced(other)?
        };
        let quotient = self
            .value
            .div(divisor)
            .ok_or_else(|| "Division by zero.".to_string())?;
        let value = self.value.sub(divisor.mul(quotient.floor()));
        Ok(Number::new(value, self.sum_unit(other)))
    }

    pub fn neg(&self) -> Number {
        Number::new(self.value.neg(), self.unit.clone())
    }

    pub fn map_value(&self, f: impl FnOnce(Rational) -> Rational) -> Number {
        Number::new(f(self.value), self.unit.clone())
    }

    /// CSS text for this number.
    pub fn to_css(&self, precision: usize, compressed: bool) -> Result<String, String> {
        let digits = format_number(&self.value, precision);
        let digits = if compressed {
            strip_leading_zero(&digits)
        } else {
            digits
        };
        match self.unit.to_css() {
            Some(unit) => Ok(format!("{digits}{unit}")),
            None => Err(format!("{digits}{} isn't a valid CSS value.", self.unit)),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_number(&self.value, 5), self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str, unit: &str) -> Number {
        Number::new(Rational::parse_decimal(text).unwrap(), Unit::parse(unit))
    }

    fn css(n: &Number) -> String {
        n.to_css(5, false).unwrap()
    }

    #[test]
    fn test_add_converts_right_side() {
        assert_eq!(css(&num("1", "in").add(&num("96", "px")).unwrap()), "2in");
        assert_eq!(css(&num("10", "px").add(&num("5", "")).unwrap()), "15px");
        assert_eq!(css(&num("5", "").add(&num("10", "px")).unwrap()), "15px");
    }

    #[test]
    fn test_incompatible_units() {
        let err = num("1", "em").add(&num("1", "px")).unwrap_err();
        assert_eq!(err, "Incompatible units: 'px' and 'em'.");
    }

    #[test]
    fn test_mul_and_div_units() {
        assert_eq!(css(&num("10", "px").mul(&num("2", ""))), "20px");
        assert_eq!(css(&num("10", "px").div(&num("2", "px")).unwrap()), "5");
        assert_eq!(css(&num("1", "").div(&num("3", "")).unwrap()), "0.33333");
        let squared = num("2", "px").mul(&num("3", "px"));
        assert_eq!(
            squared.to_css(5, false).unwrap_err(),
            "6px*px isn't a valid CSS value."
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(num("1", "").div(&num("0", "")).unwrap_err(), "Division by zero.");
        assert!(num("1", "px").rem(&num("0", "")).is_err());
    }

    #[test]
    fn test_floored_modulo() {
        assert_eq!(css(&num("7", "").rem(&num("3", "")).unwrap()), "1");
        assert_eq!(css(&num("-7", "").rem(&num("3", "")).unwrap()), "2");
        assert_eq!(css(&num("7", "").rem(&num("-3", "")).unwrap()), "-2");
        assert_eq!(css(&num("10", "px").rem(&num("3", "px")).unwrap()), "1px");
    }

    #[test]
    fn test_compressed_drops_leading_zero() {
        assert_eq!(num("0.5", "em").to_css(5, true).unwrap(), ".5em");
    }
}
