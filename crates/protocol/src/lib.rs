//! # sr-protocol
//!
//! Shared protocol definitions for showrunner.
//!
//! This crate defines the data model exchanged between the core pipeline
//! engine and its front-ends:
//!
//! - [`stage_models`]: pipeline stages, phases and run state
//! - [`script_models`]: stage outputs and timed script blocks
//! - [`agent_models`]: agent definitions (`.showrunner/agents/*.md`)
//! - [`history_models`]: persisted run records
//! - [`ipc`]: the Op/Event protocol between UI and core
//!
//! All types derive `serde` and `ts-rs` so the web front-end consumes the
//! same wire format via generated TypeScript bindings.

pub mod agent_models;
pub mod history_models;
pub mod ipc;
pub mod script_models;
pub mod stage_models;

pub use agent_models::AgentDefinition;
pub use history_models::HistoryItem;
pub use ipc::{Event, Op};
pub use script_models::{
    format_timecode, BlockType, DataPoint, DraftBlock, ResearchDossier, ScriptBlock, StageOutput,
    TopicSuggestion,
};
pub use stage_models::{
    ApprovalStatus, PipelinePhase, PipelineState, Stage, StageOutputs, MAX_LOG_LINES,
};
