//! Industry classification
//!
//! Keyword match over the combined company name and description, in the
//! source language of each country. First matching category wins; anything
//! unmatched defaults to "IT Services".

use firmscan_common::Country;

const ITALIAN_KEYWORDS: &[(&[&str], &str)] = &[
    (&["software", "sviluppo"], "Software Development"),
    (&["consulenza", "consulting"], "IT Consulting"),
    (&["web", "digital"], "Web Development"),
    (&["mobile", "app"], "Mobile Development"),
];

const ROMANIAN_KEYWORDS: &[(&[&str], &str)] = &[
    (&["software", "dezvoltare"], "Software Development"),
    (&["outsourcing", "externalizare"], "IT Outsourcing"),
    (&["consultanta", "consulting"], "IT Consulting"),
    (&["web", "digital"], "Web Development"),
    (&["mobile", "app"], "Mobile Development"),
];

const DEFAULT_INDUSTRY: &str = "IT Services";

/// Classify a company into an industry bucket from its name and description
pub fn classify(name: &str, description: Option<&str>, country: Country) -> &'static str {
    let text = format!("{} {}", name, description.unwrap_or("")).to_lowercase();
    let table = match country {
        Country::Italy => ITALIAN_KEYWORDS,
        Country::Romania => ROMANIAN_KEYWORDS,
    };
    table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(DEFAULT_INDUSTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_italian_categories() {
        assert_eq!(
            classify("Acme Sviluppo Software", None, Country::Italy),
            "Software Development"
        );
        assert_eq!(
            classify("Studio Rossi", Some("consulenza informatica"), Country::Italy),
            "IT Consulting"
        );
        assert_eq!(
            classify("Pixel", Some("web agency digitale"), Country::Italy),
            "Web Development"
        );
        assert_eq!(classify("Generic Firm", None, Country::Italy), "IT Services");
    }

    #[test]
    fn test_romanian_categories() {
        assert_eq!(
            classify("Beta", Some("externalizare servicii IT"), Country::Romania),
            "IT Outsourcing"
        );
        assert_eq!(
            classify("Gamma", Some("aplicatii mobile"), Country::Romania),
            "Mobile Development"
        );
    }

    #[test]
    fn test_first_match_wins() {
        // "software" outranks "web" in the table order
        assert_eq!(
            classify("Web Software House", None, Country::Italy),
            "Software Development"
        );
    }
}
