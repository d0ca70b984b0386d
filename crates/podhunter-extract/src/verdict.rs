//! Structured model verdict and its response schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

/// Model's self-reported confidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Low confidence.
    Low,
    /// Medium confidence.
    Medium,
    /// High confidence.
    High,
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown confidence '{other}'")),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// What the model reports after scanning a page.
///
/// Parsing is strict: `found` is required and unknown keys are rejected, so
/// a malformed reply falls through to the pattern strategies instead of
/// being half-trusted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionVerdict {
    /// Whether a stream URL was found.
    pub found: bool,
    /// The URL, when found.
    #[serde(default)]
    pub url: Option<String>,
    /// Self-reported confidence.
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

impl ExtractionVerdict {
    /// Parse a raw model reply.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw.trim())
    }

    /// The trimmed URL when the verdict is a usable positive.
    pub fn usable_url(&self) -> Option<&str> {
        if !self.found {
            return None;
        }
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Response schema sent with the extraction prompt.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "found": { "type": "BOOLEAN" },
            "url": { "type": "STRING", "description": "The extracted stream URL" },
            "confidence": { "type": "STRING", "description": "Low, Medium, or High confidence" }
        },
        "required": ["found"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_verdict() {
        let v = ExtractionVerdict::parse(
            r#"{"found": true, "url": " https://cdn/x.mp3 ", "confidence": "High"}"#,
        )
        .unwrap();
        assert_eq!(v.usable_url(), Some("https://cdn/x.mp3"));
        assert_eq!(v.confidence, Some(Confidence::High));
    }

    #[test]
    fn found_is_required() {
        assert!(ExtractionVerdict::parse(r#"{"url": "https://cdn/x.mp3"}"#).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(ExtractionVerdict::parse(r#"{"found": true, "link": "x"}"#).is_err());
    }

    #[test]
    fn wrong_types_rejected() {
        assert!(ExtractionVerdict::parse(r#"{"found": "yes"}"#).is_err());
        assert!(ExtractionVerdict::parse(r#"{"found": true, "confidence": "certain"}"#).is_err());
    }

    #[test]
    fn found_with_blank_url_is_not_usable() {
        let v = ExtractionVerdict::parse(r#"{"found": true, "url": "   "}"#).unwrap();
        assert_eq!(v.usable_url(), None);
        let v = ExtractionVerdict::parse(r#"{"found": false, "url": "https://x.mp3"}"#).unwrap();
        assert_eq!(v.usable_url(), None);
    }

    #[test]
    fn null_url_allowed() {
        let v = ExtractionVerdict::parse(r#"{"found": false, "url": null}"#).unwrap();
        assert!(!v.found);
    }

    #[test]
    fn schema_requires_found() {
        assert_eq!(response_schema()["required"], json!(["found"]));
    }
}
