//! Currency codes
//!
//! A code is 3-12 alphabetic characters. Input is case-insensitive and
//! normalized to uppercase so that map keys and signatures are canonical.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{InvalidInputKind, PathSearchError, Result};

/// Uppercase alphabetic currency code, 3 to 12 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if trimmed.len() < 3
            || trimmed.len() > 12
            || !trimmed.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(PathSearchError::invalid_input(
                InvalidInputKind::MalformedCurrency,
                format!("currency code must be 3-12 alphabetic characters, got {trimmed:?}"),
            ));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Currency::new(&code).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_to_uppercase() {
        assert_eq!(Currency::new("usd").unwrap().code(), "USD");
        assert_eq!(Currency::new("  Usdt ").unwrap().code(), "USDT");
    }

    #[test]
    fn test_rejects_bad_codes() {
        for bad in ["", "US", "ABCDEFGHIJKLM", "US1", "U-D", "   "] {
            let err = Currency::new(bad).unwrap_err();
            assert_eq!(err.input_kind(), Some(InvalidInputKind::MalformedCurrency), "{bad:?}");
        }
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut codes = vec![
            Currency::new("USDT").unwrap(),
            Currency::new("BTC").unwrap(),
            Currency::new("USD").unwrap(),
        ];
        codes.sort();
        let sorted: Vec<&str> = codes.iter().map(|c| c.code()).collect();
        assert_eq!(sorted, vec!["BTC", "USD", "USDT"]);
    }
}
