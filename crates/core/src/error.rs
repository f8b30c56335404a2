//! Pipeline failure taxonomy.
//!
//! Retries are contained inside the retryable caller; everything that
//! escapes to the orchestrator is one of these. `Cancelled` is a control
//! signal, not a failure: the orchestrator maps it to a clean stop.

use thiserror::Error;

use sr_protocol::Stage;

use crate::agents::base::BackendError;

/// How many characters of a malformed payload are kept for the operator.
pub const RAW_PREVIEW_CHARS: usize = 120;

/// Everything that can end a stage, and therefore a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The generation service rejected or threw after exhausting retries.
    #[error("{label} failed after {attempts} attempt(s): {source}")]
    ExternalCall {
        label: String,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    /// The streaming stage completed without producing any content.
    ///
    /// An empty generation is always a failure, never valid output.
    #[error("streaming stage produced no content")]
    EmptyStream,

    /// A stage's output did not match its expected structure.
    ///
    /// Never auto-repaired; the raw payload head is kept for diagnosis.
    #[error("malformed {stage} output ({reason}): {raw_preview}")]
    MalformedOutput {
        stage: Stage,
        reason: String,
        raw_preview: String,
    },

    /// The operator cancelled the run. Not a failure.
    #[error("run cancelled by operator")]
    Cancelled,
}

impl PipelineError {
    /// Build a [`PipelineError::MalformedOutput`] keeping a bounded head of
    /// the raw payload.
    pub fn malformed(stage: Stage, raw: &str, source: &serde_json::Error) -> Self {
        let raw_preview: String = raw.trim().chars().take(RAW_PREVIEW_CHARS).collect();
        PipelineError::MalformedOutput {
            stage,
            reason: source.to_string(),
            raw_preview,
        }
    }

    /// Whether this is the operator-cancel control signal.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
