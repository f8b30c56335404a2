//! Deterministic narration timing estimator.
//!
//! Converts the narration stage's untimed draft blocks into timed script
//! blocks. Pure and deterministic: the same drafts always produce the
//! same timecodes, blocks are strictly contiguous, and no block is ever
//! shorter than the configured minimum.

pub mod words;

use serde::{Deserialize, Serialize};

use sr_protocol::{DraftBlock, ScriptBlock};

pub use words::{normalize_spoken, number_to_words};

/// `[timing]`: estimator constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Spoken characters per second of narration.
    pub chars_per_second: u32,
    /// Floor for any block's duration, in seconds.
    pub min_block_secs: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            chars_per_second: 15,
            min_block_secs: 2,
        }
    }
}

/// Stamps draft blocks with contiguous timecodes.
#[derive(Debug, Clone, Copy)]
pub struct TimingEstimator {
    config: TimingConfig,
}

impl TimingEstimator {
    pub fn new(config: TimingConfig) -> Self {
        Self { config }
    }

    /// Estimated duration of one block's narration, in seconds.
    pub fn block_duration_secs(&self, raw_text: &str) -> u32 {
        let spoken_len = normalize_spoken(raw_text).chars().count() as u32;
        let cps = self.config.chars_per_second.max(1);
        spoken_len.div_ceil(cps).max(self.config.min_block_secs)
    }

    /// Convert drafts into timed script blocks.
    ///
    /// Timecodes are assigned cumulatively from zero in input order, so
    /// `blocks[i].timecode_end == blocks[i + 1].timecode_start` always
    /// holds and blocks never overlap.
    pub fn estimate(&self, drafts: &[DraftBlock]) -> Vec<ScriptBlock> {
        let mut running: u32 = 0;
        drafts
            .iter()
            .map(|draft| {
                let duration = self.block_duration_secs(&draft.audio_script);
                let timecode_start = running;
                let timecode_end = running + duration;
                running = timecode_end;
                ScriptBlock {
                    block_type: draft.block_type,
                    raw_text: draft.audio_script.clone(),
                    visual_description: draft.visual_cue.clone(),
                    secondary_text: draft.overlay_text.clone(),
                    timecode_start,
                    timecode_end,
                    media_ref: None,
                }
            })
            .collect()
    }

    /// Total duration of an estimated script, in seconds.
    pub fn total_duration_secs(blocks: &[ScriptBlock]) -> u32 {
        blocks.last().map(|b| b.timecode_end).unwrap_or(0)
    }
}
