use super::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

lazy_static::lazy_static! {
    /// Shape accepted at the boundary before a UUID parse is attempted.
    static ref BOUNDARY_ID_REGEX: Regex = Regex::new(r"^[0-9a-fA-F-]{32,36}$")
        .expect("Failed to compile boundary ID regex - this is a bug in the code");

    static ref EMBEDDED_ID_REGEX: Regex = Regex::new(
        r"(?:^|[/-])([a-fA-F0-9]{32}|[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})$"
    ).expect("Failed to compile Notion ID regex - this is a bug in the code");
}

/// A Notion object identifier in canonical form: lowercase, hyphenated 8-4-4-4-12.
///
/// Pages, databases and blocks share one id space, so a single type covers
/// all of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotionId(String);

impl NotionId {
    /// Parses hyphenated ids, compact 32-char hex ids and Notion URLs.
    ///
    /// Canonical input comes back unchanged, so parsing is idempotent.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cleaned = input.trim().trim_end_matches('/');

        if let Some(id) = Self::from_bare(cleaned) {
            return Ok(id);
        }

        if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
            return Self::extract_from_url(cleaned);
        }

        Err(ValidationError::InvalidId(format!(
            "Could not parse Notion ID from: {}",
            input
        )))
    }

    /// Strict boundary check for ids supplied by callers.
    ///
    /// The value must be non-blank, match `[0-9a-fA-F-]{32,36}` and survive a
    /// UUID parse. URLs are not accepted here.
    pub fn validate(field: &str, value: &str) -> Result<Self, ValidationError> {
        let candidate = value.trim();
        if candidate.is_empty() {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
            });
        }
        if !BOUNDARY_ID_REGEX.is_match(candidate) {
            return Err(ValidationError::MalformedId {
                field: field.to_string(),
            });
        }
        Uuid::parse_str(&candidate.replace('-', ""))
            .map(|uuid| Self(uuid.hyphenated().to_string()))
            .map_err(|_| ValidationError::MalformedId {
                field: field.to_string(),
            })
    }

    /// Returns the canonical hyphenated id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the id without hyphens, the form Notion uses in page URLs.
    pub fn to_compact(&self) -> String {
        self.0.replace('-', "")
    }

    /// Accepts a bare 32-char or 36-char id and nothing else.
    fn from_bare(candidate: &str) -> Option<Self> {
        let is_bare = match candidate.len() {
            32 => candidate.chars().all(|c| c.is_ascii_hexdigit()),
            36 => candidate.chars().all(|c| c.is_ascii_hexdigit() || c == '-'),
            _ => false,
        };
        if !is_bare {
            return None;
        }
        Uuid::parse_str(candidate)
            .ok()
            .map(|uuid| Self(uuid.hyphenated().to_string()))
    }

    /// Extracts the id from Notion URLs.
    ///
    /// A `p` query parameter (the page opened as a peek) takes precedence
    /// over the path, which otherwise ends in `Title-<id>` or `<id>`.
    fn extract_from_url(input: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(input).map_err(|e| {
            ValidationError::InvalidId(format!("Invalid Notion URL {}: {}", input, e))
        })?;

        if let Some((_, peek)) = url.query_pairs().find(|(key, _)| key == "p") {
            if let Some(id) = Self::from_bare(&peek) {
                return Ok(id);
            }
        }

        let path = url.path().trim_end_matches('/');
        if let Some(captures) = EMBEDDED_ID_REGEX.captures(path) {
            if let Some(id) = captures.get(1).and_then(|m| Self::from_bare(m.as_str())) {
                return Ok(id);
            }
        }

        Err(ValidationError::InvalidId(format!(
            "No valid ID found in URL: {}",
            input
        )))
    }
}

impl fmt::Display for NotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NotionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NotionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NotionId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_id_parsing() {
        let id = NotionId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(id.as_str(), CANONICAL);

        let id = NotionId::parse("550E8400-E29B-41D4-A716-446655440000").unwrap();
        assert_eq!(id.as_str(), CANONICAL);

        let id =
            NotionId::parse("https://www.notion.so/Test-Page-550e8400e29b41d4a716446655440000")
                .unwrap();
        assert_eq!(id.as_str(), CANONICAL);

        let id = NotionId::parse("https://www.notion.so/acme/550e8400e29b41d4a716446655440000/")
            .unwrap();
        assert_eq!(id.as_str(), CANONICAL);
    }

    #[test]
    fn test_peek_parameter_wins_over_path() {
        let id = NotionId::parse(
            "https://www.notion.so/acme/Board-11111111111111111111111111111111?v=2&p=550e8400e29b41d4a716446655440000&pm=s",
        )
        .unwrap();
        assert_eq!(id.as_str(), CANONICAL);
    }

    #[test]
    fn test_canonicalization_is_idempotent() {
        for input in [
            "550e8400e29b41d4a716446655440000",
            CANONICAL,
            "https://www.notion.so/Test-Page-550e8400e29b41d4a716446655440000",
        ] {
            let once = NotionId::parse(input).unwrap();
            let twice = NotionId::parse(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
        assert_eq!(NotionId::parse(CANONICAL).unwrap().as_str(), CANONICAL);
    }

    #[test]
    fn test_invalid_ids() {
        assert!(NotionId::parse("too-short").is_err());
        assert!(NotionId::parse("not-hex-chars-00000000000000000000").is_err());
        assert!(NotionId::parse("").is_err());
        assert!(NotionId::parse("https://www.notion.so/no-id-here").is_err());
    }

    #[test]
    fn test_boundary_validation() {
        let id = NotionId::validate("page_id", " 550e8400e29b41d4a716446655440000 ").unwrap();
        assert_eq!(id.as_str(), CANONICAL);

        assert_eq!(
            NotionId::validate("page_id", "   "),
            Err(ValidationError::MissingField {
                field: "page_id".to_string()
            })
        );
        assert_eq!(
            NotionId::validate("block_id", "zz0e8400e29b41d4a716446655440000"),
            Err(ValidationError::MalformedId {
                field: "block_id".to_string()
            })
        );
        // Right alphabet and length, wrong shape once hyphens are stripped.
        assert!(NotionId::validate("block_id", "550e8400e29b41d4a7164466554400-----").is_err());
        assert!(NotionId::validate(
            "page_id",
            "https://www.notion.so/550e8400e29b41d4a716446655440000"
        )
        .is_err());
    }

    #[test]
    fn test_compact_form() {
        let id = NotionId::parse(CANONICAL).unwrap();
        assert_eq!(id.to_compact(), "550e8400e29b41d4a716446655440000");
    }
}
