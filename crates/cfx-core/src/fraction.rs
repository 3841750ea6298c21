//! Fractions that accept either a number or a percentage string.
//!
//! Filter descriptors come from user-authored JSON where `opacity: 0.5`
//! and `opacity: "50%"` mean the same thing. [`Fraction`] normalises both
//! at deserialization time so downstream code only ever sees `f64`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// A numeric fraction, usually in `0.0..=1.0`.
///
/// Out-of-range values are kept as given; callers clamp where their
/// semantics require it.
///
/// ```rust
/// use cfx_core::Fraction;
///
/// let f: Fraction = "25%".parse().unwrap();
/// assert_eq!(f.get(), 0.25);
/// let g: Fraction = serde_json::from_str("0.75").unwrap();
/// assert_eq!(g.get(), 0.75);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Fraction(pub f64);

impl Fraction {
    /// Full strength.
    pub const ONE: Fraction = Fraction(1.0);
    /// No strength.
    pub const ZERO: Fraction = Fraction(0.0);

    /// The raw value.
    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    /// The value clamped to `0.0..=1.0`; NaN becomes 0.
    #[inline]
    pub fn unit(self) -> f64 {
        if self.0.is_nan() { 0.0 } else { self.0.clamp(0.0, 1.0) }
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Fraction::ONE
    }
}

impl From<f64> for Fraction {
    fn from(v: f64) -> Self {
        Fraction(v)
    }
}

impl FromStr for Fraction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let parsed = match t.strip_suffix('%') {
            Some(pct) => pct.trim().parse::<f64>().map(|v| v / 100.0),
            None => t.parse::<f64>(),
        };
        parsed.map(Fraction).map_err(|_| Error::InvalidFraction(s.to_string()))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Fraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFraction {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawFraction::deserialize(deserializer)? {
            RawFraction::Number(v) => Ok(Fraction(v)),
            RawFraction::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_percent() {
        assert_relative_eq!("50%".parse::<Fraction>().unwrap().get(), 0.5);
        assert_relative_eq!(" 12.5 % ".parse::<Fraction>().unwrap().get(), 0.125);
        assert_relative_eq!("0.3".parse::<Fraction>().unwrap().get(), 0.3);
        assert!("half".parse::<Fraction>().is_err());
    }

    #[test]
    fn test_deserialize_both_forms() {
        let a: Fraction = serde_json::from_str("\"80%\"").unwrap();
        let b: Fraction = serde_json::from_str("0.8").unwrap();
        assert_relative_eq!(a.get(), b.get());
        let bad: Result<Fraction, _> = serde_json::from_str("\"eighty\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_unit_clamps() {
        assert_eq!(Fraction(1.5).unit(), 1.0);
        assert_eq!(Fraction(-0.5).unit(), 0.0);
        assert_eq!(Fraction(f64::NAN).unit(), 0.0);
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Fraction(0.25)).unwrap(), "0.25");
    }
}
