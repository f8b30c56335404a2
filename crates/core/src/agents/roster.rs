//! Per-stage agent resolution.
//!
//! Every stage is driven by exactly one agent definition. Built-in
//! definitions ship embedded in the binary (the same files `showrunner
//! init` scaffolds); a project may override any of them under
//! `.showrunner/agents/`.

use std::collections::HashMap;
use std::path::PathBuf;

use sr_protocol::{AgentDefinition, Stage};

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::loader::parse_agent_definition;
use crate::init::templates::get_template;

/// Resolved agent definitions, one per stage.
#[derive(Debug, Clone)]
pub struct AgentRoster {
    agents: HashMap<Stage, AgentDefinition>,
    default_model: String,
}

impl AgentRoster {
    /// Build the roster from the embedded built-in definitions.
    pub fn builtin(default_model: impl Into<String>) -> ConfigResult<Self> {
        let mut agents = HashMap::new();
        for stage in Stage::PIPELINE {
            let template_path = format!("agents/{}.md", stage.name());
            let content = get_template(&template_path).ok_or_else(|| ConfigError::InvalidConfig {
                path: PathBuf::from(&template_path),
                reason: "built-in agent template missing".to_string(),
            })?;
            let definition = parse_agent_definition(&content, &PathBuf::from(&template_path))?;
            agents.insert(stage, definition);
        }
        Ok(Self {
            agents,
            default_model: default_model.into(),
        })
    }

    /// Apply project-level overrides loaded from `.showrunner/agents/`.
    ///
    /// Each override replaces the built-in definition of the stage named
    /// by its `name` field; names outside the pipeline are rejected.
    pub fn with_overrides(mut self, overrides: Vec<AgentDefinition>) -> ConfigResult<Self> {
        for definition in overrides {
            let Some(stage) = Stage::from_name(&definition.name) else {
                return Err(ConfigError::InvalidConfig {
                    path: PathBuf::from(format!("agents/{}.md", definition.name)),
                    reason: format!("unknown agent name \"{}\"", definition.name),
                });
            };
            self.agents.insert(stage, definition);
        }
        Ok(self)
    }

    /// The definition driving the given stage.
    pub fn agent(&self, stage: Stage) -> &AgentDefinition {
        // The constructor guarantees one definition per stage.
        &self.agents[&stage]
    }

    /// The model for the given stage, falling back to the default.
    pub fn model_for(&self, stage: Stage) -> &str {
        self.agent(stage)
            .model
            .as_deref()
            .unwrap_or(&self.default_model)
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}
