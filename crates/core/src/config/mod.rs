//! Configuration loading and models.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, parse_agent_definition, CONFIG_DIR};
pub use models::{AppConfig, GenerationConfig, GlobalConfig, HistoryConfig, RetrySettings};
