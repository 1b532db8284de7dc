//! Error types for AI Starter Quest.

use std::time::Duration;

use uuid::Uuid;

/// Top-level error type for the quest service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
///
/// The tutor client classifies failures by looking for "429" or "rate" in the
/// rendered message, so `RateLimited` must keep both in its text.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited (HTTP 429), retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session lifecycle and state machine errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {id} not found")]
    NotFound { id: Uuid },

    #[error("Cannot transition quest stage from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Quest stage {stage} is terminal")]
    AlreadyTerminal { stage: String },
}

/// Email capture validation errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Please enter a valid email: the address is empty.")]
    Empty,

    #[error("Please enter a valid email: the address must contain '@'.")]
    MissingAt,
}

/// Result type alias for the quest service.
pub type Result<T> = std::result::Result<T, Error>;
