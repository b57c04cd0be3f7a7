//! Vision understanding: read shipping tags through the Gemini
//! `generateContent` endpoint.
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use tagscan_core::{InlineImage, VisionBackend};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Endpoint and model selection for the Gemini backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub endpoint: String,
    pub model: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

pub struct GeminiVision {
    client: Client,
    api_key: String,
    settings: GeminiSettings,
}

impl GeminiVision {
    pub fn new(api_key: impl Into<String>, settings: GeminiSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            settings,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn request_body(image: &InlineImage, instruction: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [
            { "inlineData": { "mimeType": image.mime_type, "data": image.data } },
            { "text": instruction }
        ]}]
    })
}

/// Concatenated text parts of the first candidate; empty when there is none
/// (e.g. the response was blocked).
fn response_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default()
}

/// Prefer the service's own error message over the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => format!("Gemini returned {}: {}", status, body.trim()),
    }
}

#[async_trait]
impl VisionBackend for GeminiVision {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, image: &InlineImage, instruction: &str) -> Result<String> {
        info!(model = %self.settings.model, bytes = image.data.len(), "[Vision] Reading tag via Gemini");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(image, instruction))
            .send()
            .await
            .context("Gemini HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(error_message(status, &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;
        let text = response_text(parsed);
        debug!(chars = text.len(), "[Vision] Gemini responded");
        Ok(text)
    }
}
