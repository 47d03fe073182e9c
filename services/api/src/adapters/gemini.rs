//! services/api/src/adapters/gemini.rs
//!
//! Thin HTTP client for the Gemini `generateContent` REST API, shared by the
//! conversation and document-drafting adapters. One request per generation,
//! no streaming, no automatic retry: a failed generation surfaces as a port
//! error and the user resubmits manually.

use std::time::Duration;

use nyaya_core::ports::{PortError, PortResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Base URL for the Gemini generative-language API.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    status: String,
    message: String,
}

//=========================================================================================
// The Client
//=========================================================================================

/// HTTP client for Gemini API communication.
///
/// The API key is optional at construction: a missing key is reported as
/// `PortError::MissingCredential` at the point of the generation call, which
/// is the failure surface the UI expects.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends one `generateContent` request and returns the concatenated text
    /// of the first candidate. An empty candidate list yields an empty
    /// string; callers substitute their own fallback copy.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> PortResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PortError::MissingCredential(
                "GEMINI_API_KEY is not configured; set it in the environment".to_string(),
            )
        })?;

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(model, status = %status, "generateContent response received");

        let body = response
            .text()
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(err) => format!(
                    "Gemini API error ({}): {}",
                    err.error.status, err.error.message
                ),
                Err(_) => format!("Gemini API returned {status}: {body}"),
            };
            return Err(PortError::Unexpected(message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| PortError::Unexpected(format!("failed to parse API response: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new(Some("test-api-key".into()))
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_request() -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Some(Content::text(None, "You are a legal assistant.")),
            contents: vec![Content::text(Some("user"), "What is Section 302 IPC?")],
            generation_config: Some(GenerationConfig { temperature: 0.3 }),
            safety_settings: None,
        }
    }

    #[tokio::test]
    async fn generate_extracts_candidate_text() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "**Section 302 IPC** deals with "}, {"text": "punishment for murder."}]
                }
            }]
        });

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let text = client
            .generate("gemini-2.5-flash", &test_request())
            .await
            .unwrap();
        assert_eq!(text, "**Section 302 IPC** deals with punishment for murder.");
    }

    #[tokio::test]
    async fn generate_maps_api_errors() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted",
                "status": "RESOURCE_EXHAUSTED"
            }
        });

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .generate("gemini-2.5-flash", &test_request())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("RESOURCE_EXHAUSTED"), "got: {msg}");
    }

    #[tokio::test]
    async fn generate_returns_empty_text_for_empty_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let text = client
            .generate("gemini-2.5-flash", &test_request())
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_fails_at_the_call_site() {
        let client = GeminiClient::new(None).unwrap();
        let err = client
            .generate("gemini-2.5-flash", &test_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::MissingCredential(_)));
    }
}
