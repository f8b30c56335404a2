//! Pipeline stage and run-state models.
//!
//! The generation pipeline is a fixed, totally ordered chain of five
//! stages. These types describe where a run currently is and what it has
//! produced so far; all mutation goes through the transition functions in
//! `sr-core`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::script_models::{ResearchDossier, ScriptBlock, StageOutput, TopicSuggestion};

/// Maximum number of log lines retained in a [`PipelineState`].
///
/// Older lines are dropped first once the cap is reached.
pub const MAX_LOG_LINES: usize = 500;

/// One stage of the fixed generation chain.
///
/// Ordering is total and fixed: `Scout → Decode → Research → Architect →
/// Narrate`. The derived `Ord` follows pipeline order.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Scans the information landscape and proposes concrete topic angles.
    Scout,
    /// Decodes the topic into viral angles and a retention strategy.
    Decode,
    /// Compiles a fact dossier: claims, counter-claims, visual anchors.
    Research,
    /// Designs the video structure and hook from the dossier.
    Architect,
    /// Writes the final two-column A/V script, streamed block by block.
    Narrate,
}

impl Stage {
    /// All stages in execution order.
    pub const PIPELINE: [Stage; 5] = [
        Stage::Scout,
        Stage::Decode,
        Stage::Research,
        Stage::Architect,
        Stage::Narrate,
    ];

    /// Stable lowercase identifier, used to key agent definitions.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Scout => "scout",
            Stage::Decode => "decode",
            Stage::Research => "research",
            Stage::Architect => "architect",
            Stage::Narrate => "narrate",
        }
    }

    /// Zero-based position in the pipeline.
    pub fn index(self) -> usize {
        match self {
            Stage::Scout => 0,
            Stage::Decode => 1,
            Stage::Research => 2,
            Stage::Architect => 3,
            Stage::Narrate => 4,
        }
    }

    /// The stage that follows this one, or `None` for the final stage.
    pub fn next(self) -> Option<Stage> {
        Stage::PIPELINE.get(self.index() + 1).copied()
    }

    /// Whether this is the last stage of the chain.
    pub fn is_final(self) -> bool {
        self.next().is_none()
    }

    /// Parse a stage from its stable name.
    pub fn from_name(name: &str) -> Option<Stage> {
        Stage::PIPELINE.into_iter().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the pipeline currently is.
///
/// `Completed` and `Failed` are terminal; `Failed` is reachable from any
/// stage, `Completed` from the final stage or from an operator cancel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum PipelinePhase {
    /// No run has been started yet (or state was reset).
    Idle,
    /// The given stage is the current stage of the active run.
    Stage(Stage),
    /// The run finished, either normally or via operator cancel.
    Completed,
    /// A stage failed; see [`PipelineState::last_error`].
    Failed,
}

impl PipelinePhase {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelinePhase::Completed | PipelinePhase::Failed)
    }

    /// The active stage, if any.
    pub fn stage(self) -> Option<Stage> {
        match self {
            PipelinePhase::Stage(stage) => Some(stage),
            _ => None,
        }
    }
}

/// Step-mode approval status.
///
/// `WaitingForApproval` and `PipelineState::is_processing` are mutually
/// exclusive: while the run waits for the operator, no stage is in flight.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Not in an approval boundary.
    Idle,
    /// Suspended after a stage; waiting for the operator's decision.
    WaitingForApproval,
    /// Approval received; the next stage is being entered.
    Processing,
}

/// Outputs recorded per stage, populated strictly in pipeline order.
///
/// A stage's slot is only ever written after the stage was entered and its
/// call resolved successfully; no slot is populated unless all preceding
/// slots are.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct StageOutputs {
    pub scout: Option<Vec<TopicSuggestion>>,
    pub decode: Option<String>,
    pub research: Option<ResearchDossier>,
    pub architect: Option<String>,
    pub narrate: Option<Vec<ScriptBlock>>,
}

impl StageOutputs {
    /// Record a stage's validated output in its slot.
    pub fn record(&mut self, output: StageOutput) {
        match output {
            StageOutput::Scout { suggestions } => self.scout = Some(suggestions),
            StageOutput::Decode { brief } => self.decode = Some(brief),
            StageOutput::Research { dossier } => self.research = Some(dossier),
            StageOutput::Architect { blueprint } => self.architect = Some(blueprint),
            StageOutput::Narrate { blocks } => self.narrate = Some(blocks),
        }
    }

    /// Whether the given stage has produced an output.
    pub fn contains(&self, stage: Stage) -> bool {
        match stage {
            Stage::Scout => self.scout.is_some(),
            Stage::Decode => self.decode.is_some(),
            Stage::Research => self.research.is_some(),
            Stage::Architect => self.architect.is_some(),
            Stage::Narrate => self.narrate.is_some(),
        }
    }

    /// Whether populated slots form a prefix of the pipeline order.
    pub fn completed_in_order(&self) -> bool {
        let mut seen_gap = false;
        for stage in Stage::PIPELINE {
            if self.contains(stage) {
                if seen_gap {
                    return false;
                }
            } else {
                seen_gap = true;
            }
        }
        true
    }

    /// The final timed script, once the narration stage has completed.
    pub fn blocks(&self) -> Option<&[ScriptBlock]> {
        self.narrate.as_deref()
    }
}

/// The full authoritative state of one pipeline run.
///
/// Owned exclusively by the orchestrator; front-ends receive immutable
/// snapshots through [`crate::ipc::Event::StateChanged`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    /// Current position in the state machine.
    pub phase: PipelinePhase,
    /// True while a stage call is in flight.
    pub is_processing: bool,
    /// True when the operator must approve each stage boundary.
    pub step_mode: bool,
    /// Step-mode approval status.
    pub approval: ApprovalStatus,
    /// The topic the run was started with.
    pub topic: String,
    /// Validated outputs, keyed by stage.
    pub outputs: StageOutputs,
    /// Ordered operator-visible log lines, capped at [`MAX_LOG_LINES`].
    pub logs: Vec<String>,
    /// One human-readable message for the failure that ended the run.
    pub last_error: Option<String>,
}

impl PipelineState {
    /// A fresh idle state with the given step-mode setting.
    pub fn new(step_mode: bool) -> Self {
        Self {
            phase: PipelinePhase::Idle,
            is_processing: false,
            step_mode,
            approval: ApprovalStatus::Idle,
            topic: String::new(),
            outputs: StageOutputs::default(),
            logs: Vec::new(),
            last_error: None,
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order_is_total() {
        for pair in Stage::PIPELINE.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Stage::Narrate.next(), None);
        assert!(Stage::Narrate.is_final());
    }

    #[test]
    fn test_stage_names_round_trip() {
        for stage in Stage::PIPELINE {
            assert_eq!(Stage::from_name(stage.name()), Some(stage));
        }
        assert_eq!(Stage::from_name("writer"), None);
    }

    #[test]
    fn test_phase_terminality() {
        assert!(PipelinePhase::Completed.is_terminal());
        assert!(PipelinePhase::Failed.is_terminal());
        assert!(!PipelinePhase::Idle.is_terminal());
        assert!(!PipelinePhase::Stage(Stage::Scout).is_terminal());
        assert_eq!(PipelinePhase::Stage(Stage::Decode).stage(), Some(Stage::Decode));
    }

    #[test]
    fn test_outputs_record_in_order() {
        let mut outputs = StageOutputs::default();
        assert!(outputs.completed_in_order());

        outputs.record(StageOutput::Scout {
            suggestions: vec![],
        });
        assert!(outputs.contains(Stage::Scout));
        assert!(outputs.completed_in_order());

        outputs.record(StageOutput::Decode {
            brief: "angle".to_string(),
        });
        assert!(outputs.completed_in_order());
    }

    #[test]
    fn test_outputs_gap_detected() {
        let mut outputs = StageOutputs::default();
        outputs.record(StageOutput::Architect {
            blueprint: "plan".to_string(),
        });
        assert!(!outputs.completed_in_order());
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = PipelineState::new(true);
        assert_eq!(state.phase, PipelinePhase::Idle);
        assert!(!state.is_processing);
        assert!(state.step_mode);
        assert_eq!(state.approval, ApprovalStatus::Idle);
        assert!(state.outputs.blocks().is_none());
    }
}
