//! Agent configuration models for `.showrunner/agents/*.md`.
//!
//! Each pipeline stage is driven by an agent defined as a Markdown file
//! with YAML front matter; the file body is the agent's system prompt.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One stage agent's configuration and system prompt.
///
/// # Example
///
/// ```markdown
/// ---
/// name: research
/// description: Compiles the fact dossier with visual anchors
/// model: gemini-2.0-flash
/// color: blue
/// ---
///
/// You are the RESEARCH agent. Verify every claim through search...
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct AgentDefinition {
    /// Stage name this agent drives (`scout`, `decode`, `research`,
    /// `architect` or `narrate`).
    pub name: String,

    /// Human-readable description of the agent's role.
    pub description: String,

    /// Model override for this agent. Falls back to the configured
    /// default model when absent.
    #[serde(default)]
    pub model: Option<String>,

    /// UI color hint for displaying this agent.
    #[serde(default)]
    pub color: String,

    /// The markdown body: the system prompt defining the agent's
    /// behavior. Not part of the front matter.
    #[serde(skip)]
    pub system_prompt: String,
}
