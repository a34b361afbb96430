//! Record identifiers.
//!
//! Identifiers are 64-bit integers that travel between services as decimal
//! strings. Parsing is strict: no surrounding whitespace, no sign on positive
//! values, no radix prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A record identifier (user id, relationship id, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(i64);

/// Error returned when a decimal id string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// The id string was empty
    #[error("identifier cannot be empty")]
    Empty,

    /// The id string was not a 64-bit decimal integer
    #[error("invalid identifier format '{value}'")]
    Invalid { value: String },
}

impl Identifier {
    /// Wrap a raw integer id.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The raw integer value.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parse a decimal id string.
    pub fn parse(value: &str) -> Result<Self, IdParseError> {
        if value.is_empty() {
            return Err(IdParseError::Empty);
        }
        if value.starts_with('+') {
            return Err(IdParseError::Invalid {
                value: value.to_string(),
            });
        }
        value
            .parse::<i64>()
            .map(Self)
            .map_err(|_| IdParseError::Invalid {
                value: value.to_string(),
            })
    }
}

impl FromStr for Identifier {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Identifier::parse("42").unwrap(), Identifier::new(42));
        assert_eq!(Identifier::parse("-7").unwrap(), Identifier::new(-7));
        assert_eq!(
            Identifier::parse("9223372036854775807").unwrap().get(),
            i64::MAX
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Identifier::parse(""), Err(IdParseError::Empty));
        for bad in ["abc", " 1", "1 ", "+1", "0x10", "1.0", "9223372036854775808"] {
            assert!(Identifier::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_display_is_decimal() {
        assert_eq!(Identifier::new(1234).to_string(), "1234");
        assert_eq!("1234".parse::<Identifier>().unwrap().to_string(), "1234");
    }
}
