//! AI tutor client: per-session response cache, call cooldown, and sentinel
//! replies for every degraded path.
//!
//! Sentinel replies start with `(` so callers can layer built-in hints on top.
//! Outcomes of a dispatched call (success or failure) are cached under their
//! key, so a failing prompt is not retried within the session. The
//! "not configured" and "cooling down" sentinels are returned without caching;
//! no call was made, and the same key may succeed later.

use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use super::state::SessionState;
use crate::config::QuestConfig;
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// First character of every sentinel reply.
pub const SENTINEL_MARKER: char = '(';

pub const UNCONFIGURED: &str = "(Hint unavailable: AI tutor key not configured.)";

pub const NO_RESPONSE: &str = "(No response from the AI tutor.)";

pub const RATE_LIMITED: &str = "(Free-tier limit hit; showing a built-in hint.)";

/// Whether a tutor reply is a sentinel rather than generated text.
pub fn is_sentinel(reply: &str) -> bool {
    reply.starts_with(SENTINEL_MARKER)
}

fn cooling_down(wait_secs: i64) -> String {
    format!("(Cooling down {wait_secs}s to respect free-tier limits…)")
}

fn provider_error(err: &LlmError) -> String {
    format!("(AI tutor error: {err})")
}

/// Rate limits are recognized by variant or by the "429"/"rate" markers in
/// the rendered error.
fn is_rate_limit(err: &LlmError) -> bool {
    if matches!(err, LlmError::RateLimited { .. }) {
        return true;
    }
    let text = err.to_string().to_lowercase();
    text.contains("429") || text.contains("rate")
}

/// Source of wall-clock time for cooldown checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic time-based tests.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Wraps the LLM provider with the tutor's caching and pacing policy.
pub struct TutorClient {
    llm: Option<Arc<dyn LlmProvider>>,
    clock: Arc<dyn Clock>,
    cooldown: TimeDelta,
    max_output_tokens: u32,
}

impl TutorClient {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, config: &QuestConfig) -> Self {
        let cooldown = TimeDelta::from_std(config.hint_cooldown).unwrap_or_else(|_| {
            warn!(
                cooldown = ?config.hint_cooldown,
                "Hint cooldown out of range, using default"
            );
            TimeDelta::seconds(30)
        });
        Self {
            llm,
            clock: Arc::new(SystemClock),
            cooldown,
            max_output_tokens: config.max_output_tokens,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether a provider is configured at all.
    pub fn is_ready(&self) -> bool {
        self.llm.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.llm.as_ref().map(|llm| llm.model_name())
    }

    /// Get a tutor reply for `prompt`, cached under `cache_key` (or the prompt
    /// itself). Never fails: degraded paths return sentinel text.
    pub async fn reply(
        &self,
        session: &mut SessionState,
        prompt: &str,
        temperature: f32,
        cache_key: Option<&str>,
    ) -> String {
        let key = cache_key.unwrap_or(prompt);
        if let Some(cached) = session.cached_reply(key) {
            debug!(cache_key = %key, "Tutor cache hit");
            return cached.to_string();
        }

        let llm = match self.llm.as_ref() {
            Some(llm) if session.ai_ready() => llm,
            _ => return UNCONFIGURED.to_string(),
        };

        let now = self.clock.now();
        if let Some(until) = session.cooldown_until() {
            if now < until {
                let wait = (until - now).num_seconds();
                debug!(cache_key = %key, wait_secs = wait, "Tutor call skipped during cooldown");
                return cooling_down(wait);
            }
        }

        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(temperature)
            .with_max_tokens(self.max_output_tokens);

        let text = match llm.complete(request).await {
            Ok(response) => {
                debug!(
                    cache_key = %key,
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    finish_reason = ?response.finish_reason,
                    "Tutor call completed"
                );
                session.set_cooldown_until(now + self.cooldown);
                let trimmed = response.content.trim();
                if trimmed.is_empty() {
                    NO_RESPONSE.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Err(e) if is_rate_limit(&e) => {
                warn!(cache_key = %key, error = %e, "Tutor call rate limited");
                session.set_cooldown_until(now + self.cooldown);
                RATE_LIMITED.to_string()
            }
            Err(e) => {
                warn!(cache_key = %key, error = %e, "Tutor call failed");
                provider_error(&e)
            }
        };

        session.cache_reply(key, text.clone());
        text
    }
}
