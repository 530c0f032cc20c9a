//! Country vocabulary for the supported registries

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Countries whose business registries firmscan knows how to scrape.
///
/// Stored and serialized as the two-letter code used throughout the
/// record schema (`"IT"`, `"RO"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    /// Italy
    #[serde(rename = "IT")]
    Italy,
    /// Romania
    #[serde(rename = "RO")]
    Romania,
}

impl Country {
    /// Two-letter code as stored on records
    pub fn code(&self) -> &'static str {
        match self {
            Country::Italy => "IT",
            Country::Romania => "RO",
        }
    }

    /// International dialing prefix without the leading `+`
    pub fn dialing_prefix(&self) -> &'static str {
        match self {
            Country::Italy => "39",
            Country::Romania => "40",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IT" => Ok(Country::Italy),
            "RO" => Ok(Country::Romania),
            other => Err(Error::InvalidInput(format!(
                "Unsupported country code: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_round_trip() {
        assert_eq!("IT".parse::<Country>().unwrap(), Country::Italy);
        assert_eq!("ro".parse::<Country>().unwrap(), Country::Romania);
        assert_eq!(Country::Italy.code(), "IT");
        assert_eq!(Country::Romania.to_string(), "RO");
    }

    #[test]
    fn test_unknown_country_rejected() {
        assert!("DE".parse::<Country>().is_err());
        assert!("".parse::<Country>().is_err());
    }
}
