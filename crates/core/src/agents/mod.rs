//! Generation backends and per-stage agent resolution.

pub mod base;
pub mod gemini;
pub mod mock;
pub mod roster;

use std::sync::Arc;

pub use base::{BackendError, GenerationBackend, GenerationRequest, TextStream};
pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use roster::AgentRoster;

use crate::config::models::GenerationConfig;

/// Choose a backend from configuration.
///
/// Uses the Gemini REST backend when the configured API key variable is
/// set, and degrades to the scripted offline backend otherwise so the
/// pipeline stays runnable without credentials.
pub fn backend_from_config(config: &GenerationConfig) -> Arc<dyn GenerationBackend> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.is_empty() => {
            let mut backend = GeminiBackend::new(key);
            if let Some(base_url) = &config.base_url {
                backend = backend.with_base_url(base_url);
            }
            Arc::new(backend)
        }
        _ => {
            tracing::warn!(
                env = %config.api_key_env,
                "generation API key not set; using the scripted offline backend"
            );
            Arc::new(MockBackend::scripted())
        }
    }
}
