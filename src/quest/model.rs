//! Chat log, badge, and snapshot types for a quest session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{QuestStage, SessionState};

/// Who wrote a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestRole {
    User,
    Assistant,
}

/// One entry in the session's chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestMessage {
    pub role: QuestRole,
    pub content: String,
}

impl QuestMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: QuestRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: QuestRole::Assistant,
            content: content.into(),
        }
    }
}

/// Achievements awarded when a module is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    ConceptSpark,
    PromptExplorer,
    AiTinkerer,
}

impl Badge {
    /// Display label, emoji included. Badges are de-duplicated on this string.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConceptSpark => "🏅 Concept Spark",
            Self::PromptExplorer => "🔎 Prompt Explorer",
            Self::AiTinkerer => "🛠️ AI Tinkerer",
        }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Read model the presentation shell renders after every interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub stage: QuestStage,
    /// Module index 0-3 (welcome, then the three modules).
    pub module: u8,
    pub progress: u8,
    pub badges: Vec<String>,
    pub messages: Vec<QuestMessage>,
    pub quiz_correct: u32,
    pub email_captured: bool,
    pub ai_ready: bool,
    /// The hint button is shown once the first module has started.
    pub hints_available: bool,
}

impl SessionSnapshot {
    pub fn new(id: Uuid, state: &SessionState) -> Self {
        Self {
            id,
            stage: state.stage(),
            module: state.stage().module_index(),
            progress: state.progress(),
            badges: state.badges().to_vec(),
            messages: state.messages().to_vec(),
            quiz_correct: state.quiz_correct(),
            email_captured: state.email_captured(),
            ai_ready: state.ai_ready(),
            hints_available: state.stage() != QuestStage::Welcome,
        }
    }
}
