//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use podhunter_settings::GeminiSettings;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, instrument};

use super::types::{GeminiModelList, GeminiRequest, GeminiResponse};
use crate::error_parsing::parse_api_error;
use crate::provider::{
    GenerateRequest, GenerateResponse, ModelBackend, ProviderError, ProviderResult,
};

/// Gemini inference client.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client from settings.
    pub fn new(settings: &GeminiSettings) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    #[instrument(skip_all, fields(model = model))]
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> ProviderResult<GenerateResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| ProviderError::Auth {
            message: "no Gemini API key configured".into(),
        })?;

        let body = GeminiRequest::from(request);
        let response = self
            .client
            .post(self.endpoint(model))
            .header(CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(0, |secs| secs.saturating_mul(1000));
            let body_text = response.text().await.unwrap_or_default();
            let info = parse_api_error(&body_text, status.as_u16());
            error!(
                status = status.as_u16(),
                code = info.code.as_deref().unwrap_or("unknown"),
                retryable = info.retryable,
                "Gemini API error"
            );
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited {
                    retry_after_ms,
                    message: info.message,
                });
            }
            if matches!(status.as_u16(), 401 | 403) {
                return Err(ProviderError::Auth {
                    message: info.message,
                });
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: info.message,
                code: info.code,
                retryable: info.retryable,
            });
        }

        let text = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&text)?;
        let output = parsed.text();
        if output.trim().is_empty() {
            debug!(finish_reason = parsed.finish_reason(), "empty candidate");
            return Err(ProviderError::EmptyResponse {
                model: model.to_string(),
            });
        }

        Ok(GenerateResponse {
            text: output,
            model: model.to_string(),
        })
    }

    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| ProviderError::Auth {
            message: "no Gemini API key configured".into(),
        })?;

        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .query(&[("pageSize", "1000")])
            .header("x-goog-api-key", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let info = parse_api_error(&body_text, status.as_u16());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: info.message,
                code: info.code,
                retryable: info.retryable,
            });
        }

        let list: GeminiModelList = serde_json::from_str(&response.text().await?)?;
        Ok(list.model_ids())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
