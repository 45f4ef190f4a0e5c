//! Units of measure and conversions between compatible units.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fmt;

use super::Rational;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Length,
    Angle,
    Time,
    Frequency,
    Resolution,
}

/// Size of one `unit` in the canonical unit of its dimension.
fn canonical_size(unit: &str) -> Option<(Dimension, Rational)> {
    let ratio = |n, d| Rational::new(n, d);
    let (dimension, size) = match unit.to_ascii_lowercase().as_str() {
        "px" => (Dimension::Length, ratio(1, 1)),
        "in" => (Dimension::Length, ratio(96, 1)),
        "cm" => (Dimension::Length, ratio(4800, 127)),
        "mm" => (Dimension::Length, ratio(480, 127)),
        "q" => (Dimension::Length, ratio(120, 127)),
        "pt" => (Dimension::Length, ratio(4, 3)),
        "pc" => (Dimension::Length, ratio(16, 1)),
        "deg" => (Dimension::Angle, ratio(1, 1)),
        "grad" => (Dimension::Angle, ratio(9, 10)),
        "turn" => (Dimension::Angle, ratio(360, 1)),
        "ms" => (Dimension::Time, ratio(1, 1)),
        "s" => (Dimension::Time, ratio(1000, 1)),
        "hz" => (Dimension::Frequency, ratio(1, 1)),
        "khz" => (Dimension::Frequency, ratio(1000, 1)),
        "dpi" => (Dimension::Resolution, ratio(1, 1)),
        "dpcm" => (Dimension::Resolution, ratio(127, 50)),
        "dppx" => (Dimension::Resolution, ratio(96, 1)),
        _ => return None,
    };
    Some((dimension, size?))
}

/// Factor that turns a value in `from` into a value in `to`, when the two
/// units measure the same dimension.
pub fn conversion_factor(from: &str, to: &str) -> Option<Rational> {
    if from == to {
        return Some(Rational::ONE);
    }
    let (from_dim, from_size) = canonical_size(from)?;
    let (to_dim, to_size) = canonical_size(to)?;
    if from_dim != to_dim {
        return None;
    }
    from_size.div(to_size)
}

/// A possibly compound unit: `px`, `px*px`, `px/em`, or none.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unit {
    numer: Vec<String>,
    denom: Vec<String>,
}

impl Unit {
    pub fn none() -> Self {
        Self::default()
    }

    /// A single unit, or no unit for an empty string.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            Self::none()
        } else {
            Self {
                numer: vec![text.to_string()],
                denom: Vec::new(),
            }
        }
    }

    pub fn is_none(&self) -> bool {
        self.numer.is_empty() && self.denom.is_empty()
    }

    /// The unit name when this is exactly one unit in the numerator.
    pub fn single(&self) -> Option<&str> {
        match (self.numer.as_slice(), self.denom.is_empty()) {
            ([unit], true) => Some(unit),
            _ => None,
        }
    }

    /// The unit as written in CSS; `None` for compound units, which have
    /// no CSS spelling.
    pub fn to_css(&self) -> Option<&str> {
        if self.is_none() {
            Some("")
        } else {
            self.single()
        }
    }

    /// Factor converting a value in `self` to a value in `target`.
    ///
    /// A unitless side adopts the other side's unit.
    pub fn coerce_factor(&self, target: &Unit) -> Option<Rational> {
        if self == target || self.is_none() || target.is_none() {
            return Some(Rational::ONE);
        }
        conversion_factor(self.single()?, target.single()?)
    }

    /// Product of two units, with the factor that cancelled units
    /// contribute to the value.
    pub fn multiply(&self, other: &Unit) -> (Unit, Rational) {
        let mut numer: Vec<String> = self.numer.iter().chain(&other.numer).cloned().collect();
        let mut denom: Vec<String> = self.denom.iter().chain(&other.denom).cloned().collect();
        let factor = cancel(&mut numer, &mut denom);
        (Unit { numer, denom }, factor)
    }

    /// Quotient of two units, with the factor from cancellation.
    pub fn divide(&self, other: &Unit) -> (Unit, Rational) {
        let inverse = Unit {
            numer: other.denom.clone(),
            denom: other.numer.clone(),
        };
        self.multiply(&inverse)
    }
}

/// Remove numerator/denominator pairs that measure the same dimension.
fn cancel(numer: &mut Vec<String>, denom: &mut Vec<String>) -> Rational {
    let mut factor = Rational::ONE;
    let mut i = 0;
    while i < numer.len() {
        let found = denom
            .iter()
            .enumerate()
            .find_map(|(j, d)| conversion_factor(&numer[i], d).map(|f| (j, f)));
        match found {
            Some((j, f)) => {
                factor = factor.mul(f);
                numer.remove(i);
                denom.remove(j);
            }
            None => i += 1,
        }
    }
    factor
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.numer.join("*"))?;
        if !self.denom.is_empty() {
            write!(f, "/{}", self.denom.join("*"))?;
        }
        Ok(())
    }
}
