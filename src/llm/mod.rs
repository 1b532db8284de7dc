//! LLM integration for the AI tutor.
//!
//! The quest only needs plain text completions, so the provider surface is a
//! single `complete` call. Gemini is the one hosted backend; a missing API key
//! or a client that fails to build is reported as "no provider" rather than an
//! error.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::QuestConfig;
use crate::error::LlmError;

/// Create the tutor's LLM provider from configuration.
///
/// Returns `None` when no API key is configured or the client cannot be
/// built; either way the quest runs with the tutor disabled.
pub fn create_provider(config: &QuestConfig) -> Option<Arc<dyn LlmProvider>> {
    let Some(api_key) = config.api_key.clone() else {
        tracing::info!("No GEMINI_API_KEY configured; AI tutor disabled");
        return None;
    };

    let provider = usable_provider(GeminiProvider::new(api_key, &config.model))?;
    tracing::info!("Using Gemini (model: {})", config.model);
    Some(provider)
}

fn usable_provider<P>(built: Result<P, LlmError>) -> Option<Arc<dyn LlmProvider>>
where
    P: LlmProvider + 'static,
{
    match built {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build LLM provider; AI tutor disabled");
            None
        }
    }
}
