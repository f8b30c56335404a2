//! Gemini REST backend.
//!
//! Talks to the Generative Language API directly over HTTP: plain
//! `generateContent` for single-shot stages and `streamGenerateContent`
//! with SSE framing for the narration stage. No SDK dependency.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::agents::base::{BackendError, GenerationBackend, GenerationRequest, TextStream};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// How much of an error body is kept in [`BackendError::Api`].
const ERROR_BODY_CHARS: usize = 300;

/// Client for the Gemini REST API.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (used by tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(request: &GenerationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": [{ "parts": [{ "text": request.prompt() }] }],
        });
        if request.json_mode {
            body["generationConfig"] = serde_json::json!({
                "responseMimeType": "application/json",
            });
        }
        body
    }

    async fn post(
        &self,
        method: &str,
        request: &GenerationRequest,
        sse: bool,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}/models/{}:{}", self.base_url, request.model, method);
        let mut query: Vec<(&str, &str)> = vec![("key", self.api_key.as_str())];
        if sse {
            query.push(("alt", "sse"));
        }

        debug!(stage = %request.stage, model = %request.model, method, "calling Gemini API");
        let response = self
            .client
            .post(&url)
            .query(&query)
            .json(&Self::request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_CHARS).collect(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        let response = self.post("generateContent", request, false).await?;
        let envelope: GenerateResponse = response.json().await?;
        let text = envelope.text();
        if text.is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(text)
    }

    async fn generate_streaming(
        &self,
        request: &GenerationRequest,
    ) -> Result<TextStream, BackendError> {
        let response = self.post("streamGenerateContent", request, true).await?;
        let mut bytes = Box::pin(response.bytes_stream());

        let fragments = async_stream::stream! {
            let mut buffer = String::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(data) => {
                        buffer.push_str(&String::from_utf8_lossy(&data));
                        while let Some(newline) = buffer.find('\n') {
                            let line = buffer[..newline].trim().to_string();
                            buffer.drain(..=newline);
                            let Some(payload) = line.strip_prefix("data:") else {
                                continue;
                            };
                            let payload = payload.trim();
                            if payload.is_empty() || payload == "[DONE]" {
                                continue;
                            }
                            match serde_json::from_str::<GenerateResponse>(payload) {
                                Ok(envelope) => {
                                    let text = envelope.text();
                                    if !text.is_empty() {
                                        yield Ok(text);
                                    }
                                }
                                Err(source) => {
                                    yield Err(BackendError::Envelope(source));
                                    return;
                                }
                            }
                        }
                    }
                    Err(source) => {
                        yield Err(BackendError::Transport(source));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(fragments))
    }
}

/// Response envelope of `generateContent` / one SSE chunk.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenate all text parts of the first candidate.
    fn text(&self) -> String {
        let mut out = String::new();
        if let Some(candidate) = self.candidates.first() {
            for part in &candidate.content.parts {
                if let Some(text) = &part.text {
                    out.push_str(text);
                }
            }
        }
        out
    }
}
