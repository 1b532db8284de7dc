//! Quest state machine and per-session state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content;
use super::model::{Badge, QuestMessage};
use crate::error::SessionError;

/// The stages of the quest dialogue.
///
/// Progresses linearly: Welcome → Module1 → Module2 → Module3 → Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStage {
    #[default]
    Welcome,
    Module1,
    Module2,
    Module3,
    Completed,
}

impl QuestStage {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: QuestStage) -> bool {
        use QuestStage::*;
        matches!(
            (self, target),
            (Welcome, Module1) | (Module1, Module2) | (Module2, Module3) | (Module3, Completed)
        )
    }

    /// Whether the dialogue is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Get the next stage in the linear progression, if any.
    pub fn next(&self) -> Option<QuestStage> {
        use QuestStage::*;
        match self {
            Welcome => Some(Module1),
            Module1 => Some(Module2),
            Module2 => Some(Module3),
            Module3 => Some(Completed),
            Completed => None,
        }
    }

    /// Curriculum module index: 0 for welcome, 1-3 for the modules.
    ///
    /// Completing the quest keeps the learner on module 3.
    pub fn module_index(&self) -> u8 {
        match self {
            Self::Welcome => 0,
            Self::Module1 => 1,
            Self::Module2 => 2,
            Self::Module3 | Self::Completed => 3,
        }
    }
}

impl std::fmt::Display for QuestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::Module1 => "module1",
            Self::Module2 => "module2",
            Self::Module3 => "module3",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Everything one learner's session owns.
///
/// Fields are private so progress, badges, stage, and quiz score can only move
/// forward through the methods below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    stage: QuestStage,
    /// Whether the current module's intro has been shown.
    intro_shown: bool,
    progress: u8,
    badges: Vec<String>,
    messages: Vec<QuestMessage>,
    quiz_correct: u32,
    email_captured: bool,
    ai_ready: bool,
    ai_cache: HashMap<String, String>,
    cooldown_until: Option<DateTime<Utc>>,
}

impl SessionState {
    /// A fresh session seeded with the welcome message.
    pub fn new(ai_ready: bool) -> Self {
        Self {
            stage: QuestStage::Welcome,
            intro_shown: false,
            progress: 0,
            badges: Vec::new(),
            messages: vec![QuestMessage::assistant(content::WELCOME)],
            quiz_correct: 0,
            email_captured: false,
            ai_ready,
            ai_cache: HashMap::new(),
            cooldown_until: None,
        }
    }

    /// Drop everything the learner accumulated. AI readiness is configuration,
    /// not progress, so it survives.
    pub fn reset(&mut self) {
        *self = Self::new(self.ai_ready);
    }

    pub fn stage(&self) -> QuestStage {
        self.stage
    }

    pub fn intro_shown(&self) -> bool {
        self.intro_shown
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn badges(&self) -> &[String] {
        &self.badges
    }

    pub fn messages(&self) -> &[QuestMessage] {
        &self.messages
    }

    pub fn quiz_correct(&self) -> u32 {
        self.quiz_correct
    }

    pub fn email_captured(&self) -> bool {
        self.email_captured
    }

    pub fn ai_ready(&self) -> bool {
        self.ai_ready
    }

    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    /// Advance to the next stage. Fails at the terminal stage.
    pub fn advance(&mut self) -> Result<QuestStage, SessionError> {
        let next = self.stage.next().ok_or_else(|| SessionError::AlreadyTerminal {
            stage: self.stage.to_string(),
        })?;
        if !self.stage.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }
        self.stage = next;
        self.intro_shown = false;
        Ok(next)
    }

    pub fn mark_intro_shown(&mut self) {
        self.intro_shown = true;
    }

    /// Raise progress to at least `percent` (capped at 100). Never lowers it.
    pub fn progress_to(&mut self, percent: u8) {
        self.progress = self.progress.max(percent.min(100));
    }

    /// Award a badge once. Returns false if it was already held.
    pub fn award_badge(&mut self, badge: Badge) -> bool {
        let label = badge.label();
        if self.badges.iter().any(|b| b == label) {
            return false;
        }
        self.badges.push(label.to_string());
        true
    }

    pub fn record_correct_answer(&mut self) {
        self.quiz_correct += 1;
    }

    pub fn mark_email_captured(&mut self) {
        self.email_captured = true;
    }

    pub fn push_message(&mut self, message: QuestMessage) {
        self.messages.push(message);
    }

    pub fn cached_reply(&self, key: &str) -> Option<&str> {
        self.ai_cache.get(key).map(String::as_str)
    }

    pub fn cache_reply(&mut self, key: impl Into<String>, reply: impl Into<String>) {
        self.ai_cache.insert(key.into(), reply.into());
    }

    pub fn set_cooldown_until(&mut self, until: DateTime<Utc>) {
        self.cooldown_until = Some(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::model::QuestRole;

    #[test]
    fn valid_transitions() {
        use QuestStage::*;
        let transitions = [
            (Welcome, Module1),
            (Module1, Module2),
            (Module2, Module3),
            (Module3, Completed),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use QuestStage::*;
        // Skip stages
        assert!(!Welcome.can_transition_to(Module2));
        assert!(!Module1.can_transition_to(Module3));
        // Go backward
        assert!(!Module2.can_transition_to(Module1));
        // Terminal
        assert!(!Completed.can_transition_to(Welcome));
        // Self-transition
        assert!(!Module1.can_transition_to(Module1));
    }

    #[test]
    fn module_index_never_exceeds_three() {
        use QuestStage::*;
        let indexes: Vec<u8> = [Welcome, Module1, Module2, Module3, Completed]
            .iter()
            .map(QuestStage::module_index)
            .collect();
        assert_eq!(indexes, vec![0, 1, 2, 3, 3]);
    }

    #[test]
    fn display_matches_serde() {
        use QuestStage::*;
        for stage in [Welcome, Module1, Module2, Module3, Completed] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(
                format!("\"{stage}\""),
                json,
                "Display and serde should match for {stage:?}"
            );
        }
    }

    #[test]
    fn advance_walks_all_stages_and_resets_intro() {
        let mut state = SessionState::new(false);
        let expected = [
            QuestStage::Module1,
            QuestStage::Module2,
            QuestStage::Module3,
            QuestStage::Completed,
        ];
        let mut last_index = state.stage().module_index();
        for stage in expected {
            state.mark_intro_shown();
            let next = state.advance().unwrap();
            assert_eq!(next, stage);
            assert!(!state.intro_shown(), "Intro flag should reset on advance");
            assert!(next.module_index() >= last_index);
            assert!(next.module_index() - last_index <= 1);
            last_index = next.module_index();
        }

        let err = state.advance().unwrap_err();
        assert!(matches!(err, SessionError::AlreadyTerminal { .. }));
    }

    #[test]
    fn progress_only_rises_and_caps_at_hundred() {
        let mut state = SessionState::new(false);
        state.progress_to(40);
        state.progress_to(20);
        assert_eq!(state.progress(), 40);
        state.progress_to(250);
        assert_eq!(state.progress(), 100);
        state.progress_to(95);
        assert_eq!(state.progress(), 100);
    }

    #[test]
    fn badges_are_deduplicated() {
        let mut state = SessionState::new(false);
        assert!(state.award_badge(Badge::ConceptSpark));
        assert!(!state.award_badge(Badge::ConceptSpark));
        assert!(state.award_badge(Badge::PromptExplorer));
        assert_eq!(state.badges().len(), 2);
    }

    #[test]
    fn new_session_is_seeded_with_welcome() {
        let state = SessionState::new(true);
        assert_eq!(state.stage(), QuestStage::Welcome);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, QuestRole::Assistant);
        assert!(state.messages()[0].content.contains("begin"));
        assert!(state.ai_ready());
        assert!(state.cooldown_until().is_none());
    }

    #[test]
    fn reset_clears_progress_but_keeps_ai_readiness() {
        let mut state = SessionState::new(true);
        state.advance().unwrap();
        state.progress_to(50);
        state.award_badge(Badge::ConceptSpark);
        state.record_correct_answer();
        state.mark_email_captured();
        state.cache_reply("hint_m1", "cached");
        state.set_cooldown_until(Utc::now());
        state.push_message(QuestMessage::user("hello"));

        state.reset();

        assert_eq!(state.stage(), QuestStage::Welcome);
        assert_eq!(state.progress(), 0);
        assert!(state.badges().is_empty());
        assert_eq!(state.quiz_correct(), 0);
        assert!(!state.email_captured());
        assert!(state.cached_reply("hint_m1").is_none());
        assert!(state.cooldown_until().is_none());
        assert_eq!(state.messages().len(), 1);
        assert!(state.ai_ready());
    }

    #[test]
    fn state_serde_roundtrip() {
        let mut state = SessionState::new(false);
        state.advance().unwrap();
        state.progress_to(20);
        state.award_badge(Badge::ConceptSpark);

        let json = serde_json::to_string(&state).unwrap();
        let parsed: SessionState = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.stage(), QuestStage::Module1);
        assert_eq!(parsed.progress(), 20);
        assert_eq!(parsed.badges(), state.badges());
    }
}
