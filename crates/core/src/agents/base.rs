//! Generation backend trait and supporting types.
//!
//! A backend is the external text-generation service behind the pipeline.
//! The core never assumes anything about it beyond this contract: a
//! single-shot call returning text, and a streaming call returning ordered
//! text fragments. Cancellation is dropping the in-flight future.

use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

use sr_protocol::Stage;

/// Ordered fragments of streamed generation output.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

/// One request to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// The stage this request belongs to.
    pub stage: Stage,
    /// Model identifier, e.g. "gemini-2.0-flash".
    pub model: String,
    /// The agent's system prompt.
    pub system_prompt: String,
    /// Stage input: the topic plus the previous stage's validated output.
    pub input: String,
    /// Ask the service for a JSON-only response.
    pub json_mode: bool,
}

impl GenerationRequest {
    /// The full prompt: stage input first, agent instructions after, the
    /// way the generation service expects it.
    pub fn prompt(&self) -> String {
        format!("{}\n\n{}", self.input, self.system_prompt)
    }
}

/// Errors raised by a generation backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The service answered successfully but with no usable text.
    #[error("generation response contained no text")]
    EmptyResponse,

    /// The service's response envelope could not be read.
    #[error("unreadable response envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    /// The backend is not usable at all (missing key, scripted failure).
    #[error("{0}")]
    Unavailable(String),
}

/// The external generation service consumed by the pipeline.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run one non-streaming generation, returning the full text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError>;

    /// Run one streaming generation, returning ordered text fragments.
    async fn generate_streaming(
        &self,
        request: &GenerationRequest,
    ) -> Result<TextStream, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_puts_input_before_instructions() {
        let request = GenerationRequest {
            stage: Stage::Decode,
            model: "test-model".to_string(),
            system_prompt: "You are the DECODE agent.".to_string(),
            input: "TOPIC: port automation".to_string(),
            json_mode: false,
        };
        let prompt = request.prompt();
        let topic_at = prompt.find("TOPIC").unwrap();
        let agent_at = prompt.find("DECODE agent").unwrap();
        assert!(topic_at < agent_at);
    }
}
