//! KEGG Orthology identifier format

use once_cell::sync::Lazy;
use regex::Regex;

/// Default pattern: the `K` prefix followed by exactly five digits.
pub const KO_PATTERN: &str = r"^K\d{5}$";

static KO_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(KO_PATTERN).expect("KO_PATTERN is a valid regex"));

/// Trim and uppercase a raw identifier.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Compiled identifier pattern. Matching runs against normalised identifiers.
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    regex: Regex,
}

impl IdentifierPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn is_match(&self, identifier: &str) -> bool {
        self.regex.is_match(identifier)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for IdentifierPattern {
    fn default() -> Self {
        Self {
            regex: KO_REGEX.clone(),
        }
    }
}
