//! Configuration models for `.showrunner/config.toml`.
//!
//! Every section and every field has a default, so a missing file, a
//! missing section or a missing key all degrade to working settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use sr_protocol::AgentDefinition;

use crate::timing::TimingConfig;

/// `[generation]`: how to reach the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model used by agents that do not pin their own.
    pub default_model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// API base URL override (proxies, test servers).
    pub base_url: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
        }
    }
}

/// `[retry]`: backoff schedule for external calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

/// `[history]`: where completed runs are persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory for the JSON history store. When absent, history is
    /// disabled and saving degrades to a no-op.
    pub dir: Option<PathBuf>,
}

/// All settings from `config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub generation: GenerationConfig,
    pub retry: RetrySettings,
    pub timing: TimingConfig,
    pub history: HistoryConfig,
}

/// Unified application configuration loaded from `.showrunner/`.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Settings from `config.toml`.
    pub global: GlobalConfig,
    /// Agent overrides loaded from `agents/*.md`.
    pub agents: Vec<AgentDefinition>,
}
