//! Stage output and script block models.
//!
//! Wire formats mirror what the generation service actually returns per
//! stage: Scout and Research answer in JSON, Decode and Architect in free
//! text, and Narrate streams a JSON array of draft blocks that the core
//! decodes strictly and stamps with timecodes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stage_models::Stage;

/// Format a second count as zero-padded `MM:SS`.
pub fn format_timecode(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// The role a script block plays in the video.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    /// Opening hook, first seconds of the video.
    Intro,
    /// Main investigation / evidence block.
    Body,
    /// Re-hook, pattern interrupt or pivot.
    Transition,
    /// Sponsor integration or call to action.
    Sales,
    /// Final synthesis and smash-cut ending.
    Outro,
}

impl BlockType {
    /// The wire name (`INTRO`, `BODY`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Intro => "INTRO",
            BlockType::Body => "BODY",
            BlockType::Transition => "TRANSITION",
            BlockType::Sales => "SALES",
            BlockType::Outro => "OUTRO",
        }
    }
}

/// One untimed block exactly as emitted by the narration model.
///
/// Decoding is strict: unknown fields are rejected rather than ignored, so
/// a drifting model output surfaces as a malformed-output failure instead
/// of silently losing data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DraftBlock {
    pub block_type: BlockType,
    /// Spoken narration for this block.
    pub audio_script: String,
    /// Production direction for the editor.
    pub visual_cue: String,
    /// On-screen text overlay, if any.
    #[serde(default)]
    pub overlay_text: String,
}

/// One timed unit of the final A/V script.
///
/// Created as an untimed draft by the narration stage, then stamped once
/// with `timecode_start`/`timecode_end` by the timing estimator. Immutable
/// afterwards except for an optional externally attached media reference.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ScriptBlock {
    pub block_type: BlockType,
    /// Spoken narration (the audio column).
    pub raw_text: String,
    /// What the viewer sees while the narration plays.
    pub visual_description: String,
    /// On-screen overlay text (the secondary column).
    pub secondary_text: String,
    /// Inclusive start, in seconds from the top of the video.
    pub timecode_start: u32,
    /// Exclusive end, in seconds from the top of the video.
    pub timecode_end: u32,
    /// Storyboard frame attached by an external tool; never set by the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
}

impl ScriptBlock {
    /// Block length in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.timecode_end.saturating_sub(self.timecode_start)
    }

    /// The display timecode, e.g. `"00:12 - 00:45"`.
    pub fn timecode(&self) -> String {
        format!(
            "{} - {}",
            format_timecode(self.timecode_start),
            format_timecode(self.timecode_end)
        )
    }
}

/// One topic angle proposed by the Scout stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TopicSuggestion {
    /// Provocative headline, under 60 characters.
    pub title: String,
    /// The specific triggering event, one sentence.
    pub hook: String,
    /// Which viral trigger the angle exploits.
    pub viral_factor: String,
}

/// A key metric surfaced by the Research stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(deny_unknown_fields)]
pub struct DataPoint {
    pub label: String,
    pub value: String,
}

/// The Research stage's fact dossier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResearchDossier {
    pub topic: String,
    /// Claims from mainstream sources, each with source and date.
    pub claims: Vec<String>,
    /// Counter-claims from alternative sources.
    pub counter_claims: Vec<String>,
    /// Concrete physical proof that can be shown on screen.
    pub visual_anchors: Vec<String>,
    #[serde(default)]
    pub data_points: Vec<DataPoint>,
}

/// The validated output of one pipeline stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum StageOutput {
    Scout { suggestions: Vec<TopicSuggestion> },
    Decode { brief: String },
    Research { dossier: ResearchDossier },
    Architect { blueprint: String },
    Narrate { blocks: Vec<ScriptBlock> },
}

impl StageOutput {
    /// Which stage produced this output.
    pub fn stage(&self) -> Stage {
        match self {
            StageOutput::Scout { .. } => Stage::Scout,
            StageOutput::Decode { .. } => Stage::Decode,
            StageOutput::Research { .. } => Stage::Research,
            StageOutput::Architect { .. } => Stage::Architect,
            StageOutput::Narrate { .. } => Stage::Narrate,
        }
    }

    /// Render this output as the text input handed to the next stage.
    ///
    /// In step mode the operator may replace this text wholesale before it
    /// propagates; the rendering therefore has to stand alone as prompt
    /// input.
    pub fn render_for_next_stage(&self) -> String {
        match self {
            StageOutput::Scout { suggestions } => {
                let mut out = String::from("PROPOSED ANGLES:\n");
                for (i, s) in suggestions.iter().enumerate() {
                    out.push_str(&format!(
                        "{}. {} - {} [{}]\n",
                        i + 1,
                        s.title,
                        s.hook,
                        s.viral_factor
                    ));
                }
                out
            }
            StageOutput::Decode { brief } => brief.clone(),
            StageOutput::Research { dossier } => {
                let mut out = format!("DOSSIER: {}\n\nCLAIMS:\n", dossier.topic);
                for claim in &dossier.claims {
                    out.push_str(&format!("- {claim}\n"));
                }
                out.push_str("\nCOUNTER-CLAIMS:\n");
                for claim in &dossier.counter_claims {
                    out.push_str(&format!("- {claim}\n"));
                }
                out.push_str("\nVISUAL ANCHORS:\n");
                for anchor in &dossier.visual_anchors {
                    out.push_str(&format!("- {anchor}\n"));
                }
                if !dossier.data_points.is_empty() {
                    out.push_str("\nDATA POINTS:\n");
                    for point in &dossier.data_points {
                        out.push_str(&format!("- {}: {}\n", point.label, point.value));
                    }
                }
                out
            }
            StageOutput::Architect { blueprint } => blueprint.clone(),
            StageOutput::Narrate { blocks } => blocks
                .iter()
                .map(|b| b.raw_text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
