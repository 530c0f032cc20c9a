//! Company record types
//!
//! `RawListing` is the transient bag of strings a fetch strategy extracts
//! from one listing element or API object. Normalization turns it into a
//! `CompanyRecord`, where every validated field is either well-formed or
//! absent; malformed input degrades to `None` instead of erroring.

use chrono::NaiveDate;
use firmscan_common::Country;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// `source_platform` value assigned to records produced by a duplicate merge
pub const MERGED_PLATFORM: &str = "merged";

/// `source_url` value assigned to records produced by a duplicate merge
pub const MULTIPLE_SOURCES: &str = "multiple_sources";

/// Raw field values extracted verbatim from one listing.
///
/// No invariants: fields may be absent, empty, or malformed. Consumed
/// immediately by normalization.
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    pub company_name: Option<String>,
    pub legal_name: Option<String>,
    pub tax_id: Option<String>,
    pub registration_number: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub legal_form: Option<String>,
    pub registration_date: Option<String>,
    pub share_capital: Option<String>,
    pub industry: Option<String>,
    pub industry_codes: Vec<String>,
    pub linkedin_url: Option<String>,
    pub technologies: Vec<String>,
    pub specialties: Vec<String>,
    pub source_platform: String,
    pub source_url: String,
    pub country: Option<Country>,
}

/// National tax identifier, validated against the country pattern.
///
/// Italy: 11-digit partita IVA. Romania: 2-10 digit CUI. The optional
/// country prefix (`IT`/`RO`) is stripped before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    pub fn parse(raw: &str, country: Country) -> Option<Self> {
        let compact: String = raw
            .trim()
            .to_ascii_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let digits = compact.strip_prefix(country.code()).unwrap_or(&compact);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let valid = match country {
            Country::Italy => digits.len() == 11,
            Country::Romania => (2..=10).contains(&digits.len()),
        };
        valid.then(|| TaxId(digits.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Lower-cased email address with a `local@domain.tld` shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        EMAIL_SHAPE.is_match(&lowered).then(|| Email(lowered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digits-only national phone number.
///
/// Formatting characters and the international dialing prefix (`+39`/`39`,
/// `+40`/`40`) are stripped, then the remaining digit count is validated:
/// Italy 10-11 digits, Romania 9-10 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    pub fn parse(raw: &str, country: Country) -> Option<Self> {
        let stripped: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '\t'))
            .collect();
        let prefix = country.dialing_prefix();
        let national = stripped
            .strip_prefix('+')
            .and_then(|rest| rest.strip_prefix(prefix))
            .or_else(|| stripped.strip_prefix(prefix))
            .unwrap_or(&stripped);

        if !national.bytes().all(|b| b.is_ascii_digit()) || national.is_empty() {
            return None;
        }
        let valid = match country {
            Country::Italy => (10..=11).contains(&national.len()),
            Country::Romania => (9..=10).contains(&national.len()),
        };
        valid.then(|| Phone(national.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical company entity, independent of its source format.
///
/// `data_quality_score` is always recomputed from field presence
/// (`normalize::quality`); it is never hand-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_name: String,
    pub legal_name: Option<String>,
    pub tax_id: Option<TaxId>,
    pub registration_number: Option<String>,
    pub website: Option<Url>,
    pub email: Option<Email>,
    pub phone: Option<Phone>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub legal_form: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub share_capital: Option<f64>,
    pub industry: Option<String>,
    pub industry_codes: Vec<String>,
    pub linkedin_url: Option<Url>,
    pub technologies: Vec<String>,
    pub specialties: Vec<String>,
    pub country: Country,
    pub source_platform: String,
    pub source_url: String,
    pub data_quality_score: u8,
}

impl CompanyRecord {
    /// Minimal record with only the required fields populated.
    ///
    /// Mostly useful in tests and as the merge seed; the quality score
    /// starts at zero and must be recomputed by the caller.
    pub fn bare(company_name: impl Into<String>, country: Country) -> Self {
        Self {
            company_name: company_name.into(),
            legal_name: None,
            tax_id: None,
            registration_number: None,
            website: None,
            email: None,
            phone: None,
            address: None,
            city: None,
            description: None,
            legal_form: None,
            registration_date: None,
            share_capital: None,
            industry: None,
            industry_codes: Vec::new(),
            linkedin_url: None,
            technologies: Vec::new(),
            specialties: Vec::new(),
            country,
            source_platform: String::new(),
            source_url: String::new(),
            data_quality_score: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_italian_tax_id() {
        assert_eq!(
            TaxId::parse("IT 12345678901", Country::Italy).unwrap().as_str(),
            "12345678901"
        );
        assert!(TaxId::parse("1234567890", Country::Italy).is_none()); // 10 digits
        assert!(TaxId::parse("1234567890a", Country::Italy).is_none());
    }

    #[test]
    fn test_romanian_tax_id() {
        assert_eq!(TaxId::parse("RO123456", Country::Romania).unwrap().as_str(), "123456");
        assert_eq!(TaxId::parse("42", Country::Romania).unwrap().as_str(), "42");
        assert!(TaxId::parse("1", Country::Romania).is_none());
        assert!(TaxId::parse("12345678901", Country::Romania).is_none()); // 11 digits
    }

    #[test]
    fn test_email_shape() {
        assert_eq!(
            Email::parse(" Info@Example.COM ").unwrap().as_str(),
            "info@example.com"
        );
        assert!(Email::parse("BAD_EMAIL").is_none());
        assert!(Email::parse("a@b").is_none()); // no dot in domain
        assert!(Email::parse("a b@c.d").is_none());
    }

    #[test]
    fn test_phone_digit_counts() {
        assert_eq!(
            Phone::parse("+39 02 12345678", Country::Italy).unwrap().as_str(),
            "0212345678"
        );
        // 9 digits after stripping the prefix: below the Italian 10-11 range
        assert!(Phone::parse("+39 02 1234567", Country::Italy).is_none());
        assert!(Phone::parse("+39 02 123", Country::Italy).is_none());
        assert_eq!(
            Phone::parse("+40 721 234 567", Country::Romania).unwrap().as_str(),
            "721234567"
        );
        assert!(Phone::parse("not-a-phone", Country::Romania).is_none());
    }
}
