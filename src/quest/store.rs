//! Session store: process-local map of learner sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use super::state::SessionState;
use super::tutor::{Clock, SystemClock};
use crate::error::SessionError;

/// A single session, locked for the whole of each request that touches it.
pub type SharedSession = Arc<Mutex<SessionState>>;

struct StoredSession {
    session: SharedSession,
    last_active: DateTime<Utc>,
}

/// In-memory session registry. Nothing survives a process restart.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, StoredSession>>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        })
    }

    /// Register a new session and return its id.
    pub async fn create(&self, state: SessionState) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(state));
        let stored = StoredSession {
            session: Arc::clone(&session),
            last_active: self.clock.now(),
        };
        self.sessions.write().await.insert(id, stored);
        info!(session_id = %id, "Session created");
        (id, session)
    }

    /// Look up a session and mark it active.
    pub async fn get(&self, id: Uuid) -> Result<SharedSession, SessionError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(&id).ok_or(SessionError::NotFound { id })?;
        stored.last_active = now;
        Ok(Arc::clone(&stored.session))
    }

    /// Wipe a session back to its initial state, keeping its id.
    pub async fn reset(&self, id: Uuid) -> Result<SharedSession, SessionError> {
        let session = self.get(id).await?;
        session.lock().await.reset();
        info!(session_id = %id, "Session reset");
        Ok(session)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| info!(session_id = %id, "Session removed"))
            .ok_or(SessionError::NotFound { id })
    }

    /// Drop every session not looked up within `max_idle`. Returns how many
    /// were removed.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let Some(cutoff) = TimeDelta::from_std(max_idle)
            .ok()
            .and_then(|idle| self.clock.now().checked_sub_signed(idle))
        else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.last_active >= cutoff);
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
