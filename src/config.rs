//! Configuration types.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Model used when `QUEST_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Free-tier friendly pause between tutor calls.
pub const DEFAULT_HINT_COOLDOWN: Duration = Duration::from_secs(30);

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 200;

pub const DEFAULT_PORT: u16 = 8080;

/// Sessions untouched for this long are dropped from memory.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Quest service configuration.
///
/// Resolved once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct QuestConfig {
    /// Gemini API key. `None` leaves the AI tutor disabled, which is not an error.
    pub api_key: Option<SecretString>,
    /// Gemini model name.
    pub model: String,
    /// Whether handlers add AI coaching asides after answers.
    pub coaching_enabled: bool,
    /// Minimum interval between two dispatched tutor calls in one session.
    pub hint_cooldown: Duration,
    /// Output length cap for every tutor call.
    pub max_output_tokens: u32,
    /// HTTP listen port.
    pub port: u16,
    /// Idle time after which a session is pruned. Zero disables pruning.
    pub session_idle_timeout: Duration,
    /// Directory for the rolling log file, if any.
    pub log_dir: Option<PathBuf>,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            coaching_enabled: false,
            hint_cooldown: DEFAULT_HINT_COOLDOWN,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            port: DEFAULT_PORT,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            log_dir: None,
        }
    }
}

impl QuestConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let coaching_enabled = match get("QUEST_AI_COACH") {
            Some(v) => parse_bool("QUEST_AI_COACH", &v)?,
            None => defaults.coaching_enabled,
        };
        let hint_cooldown = match get("QUEST_HINT_COOLDOWN_SECS") {
            Some(v) => Duration::from_secs(parse_number("QUEST_HINT_COOLDOWN_SECS", &v)?),
            None => defaults.hint_cooldown,
        };
        let max_output_tokens = match get("QUEST_MAX_OUTPUT_TOKENS") {
            Some(v) => parse_number("QUEST_MAX_OUTPUT_TOKENS", &v)?,
            None => defaults.max_output_tokens,
        };
        let port = match get("QUEST_PORT") {
            Some(v) => parse_number("QUEST_PORT", &v)?,
            None => defaults.port,
        };
        let session_idle_timeout = match get("QUEST_SESSION_IDLE_SECS") {
            Some(v) => Duration::from_secs(parse_number("QUEST_SESSION_IDLE_SECS", &v)?),
            None => defaults.session_idle_timeout,
        };

        Ok(Self {
            api_key: get("GEMINI_API_KEY").map(SecretString::from),
            model: get("QUEST_MODEL").unwrap_or(defaults.model),
            coaching_enabled,
            hint_cooldown,
            max_output_tokens,
            port,
            session_idle_timeout,
            log_dir: get("QUEST_LOG_DIR").map(PathBuf::from),
        })
    }

    /// Whether an API key is available for the AI tutor.
    pub fn ai_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{value}': {e}"),
    })
}
