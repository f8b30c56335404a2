//! Stage execution engine.
//!
//! A [`StageRunner`] turns one stage invocation into that stage's typed,
//! validated output: it assembles the request from the agent roster,
//! drives the generation backend through the retryable caller, and for
//! the narration stage accumulates the streamed fragments, decodes them
//! strictly and stamps timecodes before returning.

pub mod retry;
pub mod stream;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use sr_protocol::{DraftBlock, Stage, StageOutput};

use crate::agents::base::{GenerationBackend, GenerationRequest};
use crate::agents::roster::AgentRoster;
use crate::error::PipelineError;
use crate::timing::{TimingConfig, TimingEstimator};

pub use retry::{call_with_retry, RetryPolicy};
pub use stream::{accumulate, AccumulateError};

/// Executes single pipeline stages against the generation backend.
pub struct StageRunner {
    backend: Arc<dyn GenerationBackend>,
    roster: AgentRoster,
    retry: RetryPolicy,
    estimator: TimingEstimator,
}

impl StageRunner {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        roster: AgentRoster,
        retry: RetryPolicy,
        timing: TimingConfig,
    ) -> Self {
        Self {
            backend,
            roster,
            retry,
            estimator: TimingEstimator::new(timing),
        }
    }

    pub fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    /// Run one stage to its validated output.
    ///
    /// `carry` is the previous stage's rendered output (possibly replaced
    /// by an operator edit in step mode); empty for the first stage.
    pub async fn run(
        &self,
        stage: Stage,
        topic: &str,
        carry: &str,
    ) -> Result<StageOutput, PipelineError> {
        let request = self.request_for(stage, topic, carry);
        let label = format!("{stage} stage call");

        match stage {
            Stage::Scout => {
                let text = self.call(&request, &label).await?;
                let suggestions = decode_stage_json(stage, &text)?;
                Ok(StageOutput::Scout { suggestions })
            }
            Stage::Decode => {
                let brief = self.call(&request, &label).await?;
                Ok(StageOutput::Decode { brief })
            }
            Stage::Research => {
                let text = self.call(&request, &label).await?;
                let dossier = decode_stage_json(stage, &text)?;
                Ok(StageOutput::Research { dossier })
            }
            Stage::Architect => {
                let blueprint = self.call(&request, &label).await?;
                Ok(StageOutput::Architect { blueprint })
            }
            Stage::Narrate => {
                let fragments = call_with_retry(self.retry, &label, || {
                    self.backend.generate_streaming(&request)
                })
                .await?;

                let text = accumulate(fragments).await.map_err(|error| match error {
                    AccumulateError::Empty => PipelineError::EmptyStream,
                    AccumulateError::Backend(source) => PipelineError::ExternalCall {
                        label,
                        attempts: 1,
                        source,
                    },
                })?;

                let drafts: Vec<DraftBlock> = decode_stage_json(stage, &text)?;
                Ok(StageOutput::Narrate {
                    blocks: self.estimator.estimate(&drafts),
                })
            }
        }
    }

    async fn call(
        &self,
        request: &GenerationRequest,
        label: &str,
    ) -> Result<String, PipelineError> {
        call_with_retry(self.retry, label, || self.backend.generate(request)).await
    }

    fn request_for(&self, stage: Stage, topic: &str, carry: &str) -> GenerationRequest {
        let agent = self.roster.agent(stage);
        let mut input = format!("TOPIC: {topic}");
        if !carry.is_empty() {
            input.push_str("\n\nINPUT FROM PREVIOUS STAGE:\n");
            input.push_str(carry);
        }
        GenerationRequest {
            stage,
            model: self.roster.model_for(stage).to_string(),
            system_prompt: agent.system_prompt.clone(),
            input,
            json_mode: matches!(stage, Stage::Scout | Stage::Research | Stage::Narrate),
        }
    }
}

/// Strict-schema decode of a stage's JSON payload.
///
/// Whitespace is trimmed; nothing else is repaired. Any mismatch with the
/// expected structure surfaces as [`PipelineError::MalformedOutput`].
fn decode_stage_json<T: DeserializeOwned>(stage: Stage, raw: &str) -> Result<T, PipelineError> {
    serde_json::from_str(raw.trim()).map_err(|source| PipelineError::malformed(stage, raw, &source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::MockBackend;
    use sr_protocol::BlockType;
    use std::time::Duration;

    fn runner(backend: MockBackend) -> StageRunner {
        StageRunner::new(
            Arc::new(backend),
            AgentRoster::builtin("mock-model").unwrap(),
            RetryPolicy::new(0, Duration::from_millis(1)),
            TimingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_scout_stage_decodes_suggestions() {
        let backend = MockBackend::scripted();
        let output = runner(backend).run(Stage::Scout, "ports", "").await.unwrap();
        match output {
            StageOutput::Scout { suggestions } => assert_eq!(suggestions.len(), 2),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_stage_passes_text_through() {
        let backend = MockBackend::scripted().with_response(Stage::Decode, "the angle");
        let output = runner(backend).run(Stage::Decode, "ports", "carry").await.unwrap();
        assert!(matches!(output, StageOutput::Decode { brief } if brief == "the angle"));
    }

    #[tokio::test]
    async fn test_narrate_stage_accumulates_decodes_and_times() {
        let backend = MockBackend::scripted();
        let output = runner(backend).run(Stage::Narrate, "ports", "plan").await.unwrap();
        let StageOutput::Narrate { blocks } = output else {
            panic!("expected narrate output");
        };
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].block_type, BlockType::Intro);
        assert_eq!(blocks[0].timecode_start, 0);
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].timecode_end, pair[1].timecode_start);
        }
    }

    #[tokio::test]
    async fn test_narrate_empty_stream_is_its_own_failure() {
        let backend = MockBackend::scripted().with_fragments(vec![]);
        let result = runner(backend).run(Stage::Narrate, "ports", "plan").await;
        assert!(matches!(result, Err(PipelineError::EmptyStream)));
    }

    #[tokio::test]
    async fn test_malformed_json_never_coerced() {
        let backend =
            MockBackend::scripted().with_response(Stage::Research, "not json at all");
        let result = runner(backend).run(Stage::Research, "ports", "brief").await;
        match result {
            Err(PipelineError::MalformedOutput { stage, raw_preview, .. }) => {
                assert_eq!(stage, Stage::Research);
                assert!(raw_preview.contains("not json"));
            }
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failing_backend_surfaces_external_call_failure() {
        let backend = MockBackend::scripted().failing_at(Stage::Architect);
        let result = runner(backend).run(Stage::Architect, "ports", "dossier").await;
        match result {
            Err(PipelineError::ExternalCall { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("expected ExternalCall, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_carries_topic_and_previous_output() {
        let backend = MockBackend::scripted();
        let recorder = backend.clone();
        runner(backend)
            .run(Stage::Decode, "port automation", "PROPOSED ANGLES:\n1. X")
            .await
            .unwrap();

        let requests = recorder.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].input.contains("TOPIC: port automation"));
        assert!(requests[0].input.contains("PROPOSED ANGLES"));
        assert!(!requests[0].json_mode);
    }

    #[tokio::test]
    async fn test_json_mode_set_for_structured_stages() {
        let backend = MockBackend::scripted();
        let recorder = backend.clone();
        let runner = runner(backend);
        runner.run(Stage::Scout, "t", "").await.unwrap();
        runner.run(Stage::Research, "t", "c").await.unwrap();
        runner.run(Stage::Architect, "t", "c").await.unwrap();

        let requests = recorder.recorded_requests();
        assert!(requests[0].json_mode);
        assert!(requests[1].json_mode);
        assert!(!requests[2].json_mode);
    }
}
