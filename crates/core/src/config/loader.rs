//! Configuration file loader for the `.showrunner/` directory.
//!
//! Loads:
//! - `config.toml`: global settings
//! - `agents/*.md`: agent overrides (YAML front matter + prompt body)
//!
//! Missing directories and files degrade to defaults rather than erroring;
//! files that exist but cannot be parsed are reported with their path.

use gray_matter::engine::YAML;
use gray_matter::Matter;
use std::path::Path;
use walkdir::WalkDir;

use sr_protocol::AgentDefinition;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{AppConfig, GlobalConfig};

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".showrunner";

/// Load all configuration from `<root>/.showrunner/`.
pub fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let dir = root.join(CONFIG_DIR);

    if !dir.exists() {
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&dir)?;
    let agents = load_agents(&dir)?;

    Ok(AppConfig { global, agents })
}

/// Load global settings from `config.toml`.
fn load_global_config(dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path,
        source,
    })
}

/// Load all agent overrides from `agents/*.md`.
fn load_agents(dir: &Path) -> ConfigResult<Vec<AgentDefinition>> {
    let agents_dir = dir.join("agents");

    if !agents_dir.exists() {
        return Ok(Vec::new());
    }

    let mut agents = Vec::new();

    for entry in WalkDir::new(&agents_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: agents_dir.clone(),
            source,
        })?;

        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        agents.push(parse_agent_definition(&content, path)?);
    }

    Ok(agents)
}

/// Parse one agent definition: YAML front matter + prompt body.
pub fn parse_agent_definition(content: &str, path: &Path) -> ConfigResult<AgentDefinition> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let mut agent: AgentDefinition = result
        .data
        .ok_or_else(|| ConfigError::MarkdownParse {
            path: path.to_path_buf(),
            reason: "missing YAML front matter".to_string(),
        })?
        .deserialize()
        .map_err(|e| ConfigError::MarkdownParse {
            path: path.to_path_buf(),
            reason: format!("failed to deserialize front matter: {e}"),
        })?;

    agent.system_prompt = result.content.trim().to_string();
    Ok(agent)
}
