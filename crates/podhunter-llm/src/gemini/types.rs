//! Gemini `generateContent` wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::{GenerateRequest, RequestPart};

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for `models/{model}:generateContent`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation turns (always a single user turn here).
    pub contents: Vec<GeminiContent>,
    /// Generation settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl From<&GenerateRequest> for GeminiRequest {
    fn from(request: &GenerateRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                RequestPart::Text(text) => GeminiPart::Text {
                    text: text.clone(),
                    thought: None,
                },
                RequestPart::InlineData { mime_type, data } => GeminiPart::InlineData {
                    inline_data: InlineDataContent {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    },
                },
            })
            .collect();

        let generation_config = request.response_schema.as_ref().map(|schema| GenerationConfig {
            response_mime_type: Some("application/json".into()),
            response_schema: Some(schema.clone()),
        });

        Self {
            contents: vec![GeminiContent {
                role: "user".into(),
                parts,
            }],
            generation_config,
        }
    }
}

/// A message in Gemini format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// The role (`user` or `model`).
    pub role: String,
    /// Content parts.
    pub parts: Vec<GeminiPart>,
}

/// A content part in a Gemini message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeminiPart {
    /// Text content.
    Text {
        /// The text content.
        text: String,
        /// Whether this is a thinking block.
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Inline binary data (base64-encoded).
    InlineData {
        /// The inline data details.
        #[serde(rename = "inlineData")]
        inline_data: InlineDataContent,
    },
}

/// Inline data content.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineDataContent {
    /// MIME type (e.g. `audio/mp3`).
    pub mime_type: String,
    /// Base64-encoded data.
    pub data: String,
}

/// Structured-output settings.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Response MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Response schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────────────────────────────────────

/// Response body of `generateContent`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Response candidates.
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Text of the first candidate, thinking parts excluded.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| match part {
                        GeminiPart::Text { text, thought } if *thought != Some(true) => {
                            Some(text.as_str())
                        }
                        _ => None,
                    })
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Finish reason of the first candidate.
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }
}

/// A response candidate.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// The content of this candidate.
    pub content: Option<GeminiCandidateContent>,
    /// Finish reason (e.g. `STOP`, `MAX_TOKENS`, `SAFETY`).
    pub finish_reason: Option<String>,
}

/// Content inside a candidate.
#[derive(Clone, Debug, Deserialize)]
pub struct GeminiCandidateContent {
    /// Content parts.
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Response body of `GET models`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GeminiModelList {
    /// Listed models.
    #[serde(default)]
    pub models: Vec<GeminiModelEntry>,
}

impl GeminiModelList {
    /// Model identifiers without the `models/` prefix.
    pub fn model_ids(&self) -> Vec<String> {
        self.models
            .iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect()
    }
}

/// One listed model.
#[derive(Clone, Debug, Deserialize)]
pub struct GeminiModelEntry {
    /// Resource name, e.g. `models/gemini-2.5-flash`.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_with_schema_sets_json_mime() {
        let req = GenerateRequest::text("find it").with_schema(json!({"type": "OBJECT"}));
        let body = serde_json::to_value(GeminiRequest::from(&req)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "find it");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn inline_data_part_wire_format() {
        let req = GenerateRequest {
            parts: vec![
                RequestPart::InlineData {
                    mime_type: "audio/mp3".into(),
                    data: "AAAA".into(),
                },
                RequestPart::Text("transcribe".into()),
            ],
            response_schema: None,
        };
        let body = serde_json::to_value(GeminiRequest::from(&req)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "audio/mp3");
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["data"], "AAAA");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn response_text_concatenates_parts() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Hello "},
                    {"text": "world"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(resp.text(), "Hello world");
        assert_eq!(resp.finish_reason(), Some("STOP"));
    }

    #[test]
    fn response_without_candidates_is_empty() {
        let resp: GeminiResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(resp.text(), "");
    }
}
