//! Resource quantities in the orchestration backend's notation (`500m`, `2`, `4Gi`,
//! `1e3`). A bare `E` is the exa suffix; `e`/`E` followed by digits is an exponent.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SUFFIXES: &[(&str, f64)] = &[
    ("n", 1e-9),
    ("u", 1e-6),
    ("m", 1e-3),
    ("", 1.0),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
    ("Ki", 1024.0),
    ("Mi", 1_048_576.0),
    ("Gi", 1_073_741_824.0),
    ("Ti", 1_099_511_627_776.0),
    ("Pi", 1_125_899_906_842_624.0),
    ("Ei", 1_152_921_504_606_846_976.0),
];

#[derive(Debug, Error, PartialEq)]
pub enum QuantityError {
    #[error("malformed quantity: {0:?}")]
    Malformed(String),
    #[error("unknown suffix {suffix:?} in quantity {raw:?}")]
    UnknownSuffix { raw: String, suffix: String },
}

/// A parsed quantity. Keeps the original text so it is sent to the backend unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quantity {
    raw: String,
    value: f64,
}

impl Quantity {
    pub fn zero() -> Self {
        Self {
            raw: "0".to_string(),
            value: 0.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Value in base units (cores, bytes, devices).
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_positive(&self) -> bool {
        self.value > 0.0
    }

    pub fn is_whole(&self) -> bool {
        self.value.fract() == 0.0
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let split = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
            .unwrap_or(raw.len());
        let (number, suffix) = raw.split_at(split);
        let number: f64 = number.parse().map_err(|_| QuantityError::Malformed(s.to_owned()))?;
        if let Some(exponent) = decimal_exponent(suffix) {
            return Ok(Self {
                raw: raw.to_owned(),
                value: number * 10f64.powi(exponent),
            });
        }
        let multiplier = SUFFIXES
            .iter()
            .find(|(candidate, _)| *candidate == suffix)
            .map(|(_, multiplier)| *multiplier)
            .ok_or_else(|| QuantityError::UnknownSuffix {
                raw: s.to_owned(),
                suffix: suffix.to_owned(),
            })?;
        Ok(Self {
            raw: raw.to_owned(),
            value: number * multiplier,
        })
    }
}

fn decimal_exponent(suffix: &str) -> Option<i32> {
    let exponent = suffix.strip_prefix(['e', 'E'])?;
    let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    exponent.parse().ok()
}

impl TryFrom<String> for Quantity {
    type Error = QuantityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quantity> for String {
    fn from(value: Quantity) -> Self {
        value.raw
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_binary_suffixes() {
        let cpu: Quantity = "500m".parse().unwrap();
        assert!((cpu.value() - 0.5).abs() < f64::EPSILON);
        let memory: Quantity = "4Gi".parse().unwrap();
        assert_eq!(memory.value(), 4.0 * 1_073_741_824.0);
        let plain: Quantity = "2".parse().unwrap();
        assert_eq!(plain.value(), 2.0);
        assert_eq!(plain.as_str(), "2");
    }

    #[test]
    fn parses_decimal_exponent() {
        let q: Quantity = "1e3".parse().unwrap();
        assert_eq!(q.value(), 1000.0);
        assert_eq!(q.as_str(), "1e3");
        let q: Quantity = "5E2".parse().unwrap();
        assert_eq!(q.value(), 500.0);
        let q: Quantity = "25e-1".parse().unwrap();
        assert!((q.value() - 2.5).abs() < 1e-12);
        let exa: Quantity = "2E".parse().unwrap();
        assert_eq!(exa.value(), 2e18);
        assert!(matches!(
            "1e3x".parse::<Quantity>(),
            Err(QuantityError::UnknownSuffix { .. })
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!("".parse::<Quantity>(), Err(QuantityError::Malformed(_))));
        assert!(matches!("Gi".parse::<Quantity>(), Err(QuantityError::Malformed(_))));
        assert!(matches!(
            "3Qi".parse::<Quantity>(),
            Err(QuantityError::UnknownSuffix { .. })
        ));
    }

    #[test]
    fn sign_and_wholeness() {
        let negative: Quantity = "-1".parse().unwrap();
        assert!(!negative.is_positive());
        let zero: Quantity = "0".parse().unwrap();
        assert!(!zero.is_positive());
        assert!(zero.is_whole());
        let half: Quantity = "0.5".parse().unwrap();
        assert!(!half.is_whole());
    }

    #[test]
    fn deserializes_from_string() {
        let q: Quantity = serde_json::from_str(r#""10Gi""#).unwrap();
        assert_eq!(q.to_string(), "10Gi");
        assert!(serde_json::from_str::<Quantity>(r#""ten""#).is_err());
    }
}
