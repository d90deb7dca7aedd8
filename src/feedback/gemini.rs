//! Gemini `generateContent` backend for [`LanguageModel`].

use crate::config::FeedbackConfig;
use crate::defaults::GEMINI_API_KEY_ENV;
use crate::error::{PrepcallError, Result};
use crate::feedback::llm::{LanguageModel, StructuredRequest};
use serde_json::{Value, json};
use std::time::Duration;

pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PrepcallError::ModelRequest {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Build from config. The API key must be set, normally through
    /// `GOOGLE_GENERATIVE_AI_API_KEY`.
    pub fn from_config(config: &FeedbackConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PrepcallError::ConfigInvalidValue {
                key: "feedback.api_key".to_string(),
                message: format!("not set (export {GEMINI_API_KEY_ENV})"),
            })?;
        Self::new(
            &config.api_base,
            api_key,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Request body for a JSON-mode generation.
pub fn request_body(request: &StructuredRequest) -> Value {
    json!({
        "systemInstruction": {"parts": [{"text": request.system}]},
        "contents": [{"role": "user", "parts": [{"text": request.prompt}]}],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema,
        },
    })
}

/// Pull the JSON object out of a `generateContent` response.
///
/// Text parts of the first candidate are joined; a Markdown code fence
/// around the JSON is tolerated.
pub fn extract_candidate_json(response: &Value) -> Result<Value> {
    if let Some(reason) = response
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(PrepcallError::ModelResponse {
            message: format!("prompt blocked: {reason}"),
        });
    }

    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| PrepcallError::ModelResponse {
            message: "response has no candidates".to_string(),
        })?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    let body = strip_code_fence(&text);
    if body.is_empty() {
        return Err(PrepcallError::ModelResponse {
            message: "candidate has no text".to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| PrepcallError::ModelResponse {
        message: format!("candidate is not JSON: {e}"),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence.
    let inner = inner.split_once('\n').map_or(inner, |(_, rest)| rest);
    inner.trim_end().trim_end_matches("```").trim()
}

#[async_trait::async_trait]
impl LanguageModel for GeminiClient {
    async fn generate_object(&self, request: &StructuredRequest) -> Result<Value> {
        log::debug!("requesting structured output from {}", self.model);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| PrepcallError::ModelRequest {
                message: format!("{} request failed: {e}", self.model),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PrepcallError::ModelRequest {
                message: format!("failed to read response: {e}"),
            })?;
        if !status.is_success() {
            return Err(PrepcallError::ModelRequest {
                message: format!("{} returned {}: {}", self.model, status, text.trim()),
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| PrepcallError::ModelResponse {
            message: format!("response is not JSON: {e}"),
        })?;
        extract_candidate_json(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
