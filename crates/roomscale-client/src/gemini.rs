//! Gemini `generateContent` client.
//!
//! One call to [`GeminiClient::generate`](roomscale_analysis::InferenceService::generate)
//! is exactly one HTTPS POST; nothing is retried or coalesced.
//!
//! Request and response bodies are plain serde types so the wire format
//! can be tested without a network.

use std::fmt;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use roomscale_analysis::prompt::{INSTRUCTION, RESPONSE_MIME_TYPE, response_schema};
use roomscale_analysis::{AnalysisError, AnalysisRequest, InferenceService};

use crate::config::ClientConfig;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of a `generateContent` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

impl<'a> GenerateContentRequest<'a> {
    /// Instruction text first, then the image, then the output schema.
    #[must_use]
    pub fn new(request: &'a AnalysisRequest) -> Self {
        Self {
            contents: [Content {
                parts: [
                    Part::Text { text: INSTRUCTION },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.mime.as_str(),
                            data: &request.image_base64,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
                response_schema: response_schema(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

/// Pull the generated text out of a successful response body.
///
/// Concatenates the text parts of the first candidate.
///
/// # Errors
///
/// Returns [`AnalysisError::Service`] if the body is not a
/// `generateContent` response, the prompt was blocked, or the first
/// candidate carries no text.
pub fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::Service {
            status: None,
            message: format!("unexpected response body: {e}"),
        })?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no reason given".to_owned());
        return Err(AnalysisError::Service {
            status: None,
            message: format!("the model returned no candidates ({reason})"),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "unknown".to_owned());
        return Err(AnalysisError::Service {
            status: None,
            message: format!("the model returned no text (finish reason: {reason})"),
        });
    }
    Ok(text)
}

/// Map a non-success HTTP response to [`AnalysisError::Service`].
///
/// Uses the message from Google's error envelope when present and the
/// raw body otherwise.
#[must_use]
pub fn service_error(status: u16, body: &str) -> AnalysisError {
    let upstream = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_owned());
    let message = match (status, upstream.is_empty()) {
        (401 | 403, true) => format!("authentication failed (HTTP {status})"),
        (429, true) => format!("rate limit exceeded (HTTP {status})"),
        (_, true) => format!("HTTP {status}"),
        (_, false) => upstream,
    };
    AnalysisError::Service {
        status: Some(status),
        message,
    }
}

fn transport_error(e: &reqwest::Error) -> AnalysisError {
    AnalysisError::Service {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    url: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client from injected configuration.
    ///
    /// No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Configuration`] if no API key is
    /// configured or the model name contains characters that are not
    /// valid in a model identifier.
    pub fn new(config: &ClientConfig) -> Result<Self, AnalysisError> {
        Self::with_http_client(config, Client::new())
    }

    /// Like [`new`](Self::new) but reuses an existing `reqwest` client.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_http_client(config: &ClientConfig, http: Client) -> Result<Self, AnalysisError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            AnalysisError::Configuration(
                "API key is not set; define GEMINI_API_KEY (or API_KEY)".into(),
            )
        })?;
        if config.model.is_empty()
            || !config
                .model
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        {
            return Err(AnalysisError::Configuration(format!(
                "invalid model name: {:?}",
                config.model
            )));
        }
        let url = format!("{}/models/{}:generateContent", config.endpoint, config.model);
        Ok(Self { http, api_key, url })
    }

    /// The full request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl InferenceService for GeminiClient {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let body = GenerateContentRequest::new(request);
        let started = web_time::Instant::now();
        tracing::debug!(url = %self.url, mime = %request.mime, "sending inference request");

        let response = self
            .http
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(&e))?;
        let elapsed_ms = started.elapsed().as_millis();

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), elapsed_ms, "inference request failed");
            return Err(service_error(status.as_u16(), &text));
        }
        tracing::info!(status = status.as_u16(), elapsed_ms, "inference request finished");
        extract_text(&text)
    }
}
