//! Scripted mock backend for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sr_protocol::Stage;

use crate::agents::base::{BackendError, GenerationBackend, GenerationRequest, TextStream};

/// A deterministic backend that answers from a script.
///
/// Clones share the recorded-request log, so a test can hand a clone to
/// the orchestrator and assert on the requests afterwards.
#[derive(Clone)]
pub struct MockBackend {
    responses: HashMap<Stage, String>,
    fragments: Vec<String>,
    fail_stages: HashSet<Stage>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockBackend {
    /// A backend scripted with a complete, valid pipeline run.
    pub fn scripted() -> Self {
        Self {
            responses: HashMap::new(),
            fragments: default_fragments(),
            fail_stages: HashSet::new(),
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the response for one stage.
    pub fn with_response(mut self, stage: Stage, response: impl Into<String>) -> Self {
        self.responses.insert(stage, response.into());
        self
    }

    /// Replace the narration stream fragments.
    pub fn with_fragments(mut self, fragments: Vec<String>) -> Self {
        self.fragments = fragments;
        self
    }

    /// Make the given stage fail on every attempt.
    pub fn failing_at(mut self, stage: Stage) -> Self {
        self.fail_stages.insert(stage);
        self
    }

    /// Sleep before answering (and between stream fragments).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request this backend has served, in order.
    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: &GenerationRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
    }

    fn response_for(&self, stage: Stage) -> String {
        if let Some(response) = self.responses.get(&stage) {
            return response.clone();
        }
        match stage {
            Stage::Scout => DEFAULT_SCOUT.to_string(),
            Stage::Decode => DEFAULT_DECODE.to_string(),
            Stage::Research => DEFAULT_RESEARCH.to_string(),
            Stage::Architect => DEFAULT_ARCHITECT.to_string(),
            Stage::Narrate => self.fragments.concat(),
        }
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        self.record(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_stages.contains(&request.stage) {
            return Err(BackendError::Unavailable(format!(
                "scripted failure for {} stage",
                request.stage
            )));
        }
        Ok(self.response_for(request.stage))
    }

    async fn generate_streaming(
        &self,
        request: &GenerationRequest,
    ) -> Result<TextStream, BackendError> {
        self.record(request);
        if self.fail_stages.contains(&request.stage) {
            return Err(BackendError::Unavailable(format!(
                "scripted failure for {} stage",
                request.stage
            )));
        }
        let fragments = self.fragments.clone();
        let delay = self.delay;
        let stream = async_stream::stream! {
            for fragment in fragments {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(fragment);
            }
        };
        Ok(Box::pin(stream))
    }
}

const DEFAULT_SCOUT: &str = r#"[
  {"title": "THE CONTRACT THAT KILLED A PORT", "hook": "A leaked concession agreement surfaced this week", "viralFactor": "Secret/Insider"},
  {"title": "WHY YOUR PACKAGES STOPPED MOVING", "hook": "Forty-seven cranes went idle overnight", "viralFactor": "Justice/Outrage"}
]"#;

const DEFAULT_DECODE: &str = "/// VIRAL ANGLES\nIf the concession leaked, then every delay you saw last month was priced in.\n\n/// CONTRARIAN SNAPBACK\nYou think the port broke down. It was switched off.";

const DEFAULT_RESEARCH: &str = r#"{
  "topic": "The silent port",
  "claims": ["Terminal operator filed for arbitration on March 3, 2025 (Reuters)"],
  "counterClaims": ["Union statement blames software migration (press release, March 5, 2025)"],
  "visualAnchors": ["Satellite photo of 47 idle cranes", "Page 12 of the concession agreement", "Throughput chart, 2019-2025"],
  "dataPoints": [{"label": "Idle cranes", "value": "47"}, {"label": "Daily loss", "value": "$18 million"}]
}"#;

const DEFAULT_ARCHITECT: &str = "1. PACKAGING: title THE CONTRACT THAT KILLED A PORT; thumbnail: a crane silhouette over a signature.\n2. STRUCTURE: high start (hook on the leaked page), context bridge, re-hook on the arbitration filing, synthesis.\n3. CHAIN: the port slowed BUT the machines were fine, THEREFORE someone chose the slowdown.";

fn default_fragments() -> Vec<String> {
    vec![
        r#"[{"blockType": "INTRO", "audioScript": "I found a contract that explains why this port went quiet.", "visualCue": "[HOST] Close-up, holding a printed page.", "overlayText": "PAGE 12"},"#
            .to_string(),
        r#" {"blockType": "BODY", "audioScript": "Look at this clause. It caps throughput at 60 percent, and it was signed in 1999.", "visualCue": "[DOCUMENT] Slow zoom on clause 14.2.", "overlayText": "CLAUSE 14.2"},"#
            .to_string(),
        r#" {"blockType": "OUTRO", "audioScript": "So the cranes were never broken. The question is who benefits.", "visualCue": "[B-ROLL] Idle cranes at dusk, smash cut to black.", "overlayText": ""}]"#
            .to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_protocol::DraftBlock;
    use tokio_stream::StreamExt;

    fn request(stage: Stage) -> GenerationRequest {
        GenerationRequest {
            stage,
            model: "mock".to_string(),
            system_prompt: "prompt".to_string(),
            input: "TOPIC: t".to_string(),
            json_mode: false,
        }
    }

    #[tokio::test]
    async fn test_scripted_responses_parse_as_their_wire_types() {
        let backend = MockBackend::scripted();

        let scout = backend.generate(&request(Stage::Scout)).await.unwrap();
        let suggestions: Vec<sr_protocol::TopicSuggestion> =
            serde_json::from_str(&scout).unwrap();
        assert_eq!(suggestions.len(), 2);

        let research = backend.generate(&request(Stage::Research)).await.unwrap();
        let dossier: sr_protocol::ResearchDossier = serde_json::from_str(&research).unwrap();
        assert_eq!(dossier.data_points.len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_fragments_concatenate_to_valid_drafts() {
        let backend = MockBackend::scripted();
        let stream = backend
            .generate_streaming(&request(Stage::Narrate))
            .await
            .unwrap();
        let fragments: Vec<_> = stream.collect::<Vec<_>>().await;
        let joined: String = fragments
            .into_iter()
            .map(|f| f.unwrap())
            .collect::<Vec<_>>()
            .concat();
        let drafts: Vec<DraftBlock> = serde_json::from_str(&joined).unwrap();
        assert_eq!(drafts.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_stage_rejects() {
        let backend = MockBackend::scripted().failing_at(Stage::Decode);
        let result = backend.generate(&request(Stage::Decode)).await;
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
        // Other stages still answer.
        assert!(backend.generate(&request(Stage::Scout)).await.is_ok());
    }

    #[tokio::test]
    async fn test_requests_are_recorded_across_clones() {
        let backend = MockBackend::scripted();
        let clone = backend.clone();
        clone.generate(&request(Stage::Scout)).await.unwrap();
        clone.generate(&request(Stage::Decode)).await.unwrap();

        let recorded = backend.recorded_requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].stage, Stage::Scout);
        assert_eq!(recorded[1].stage, Stage::Decode);
    }
}
