//! Quest system: the three-module conversational onboarding flow.
//!
//! A learner's input goes through `QuestEngine`, which walks a small stage
//! machine (welcome, three modules, completed), tracks progress, badges, and
//! quiz score in the learner's `SessionState`, and optionally asks the AI
//! tutor for hints and coaching asides.

pub mod content;
pub mod engine;
pub mod model;
pub mod routes;
pub mod state;
pub mod store;
pub mod tutor;

pub use engine::QuestEngine;
pub use model::{Badge, QuestMessage, QuestRole, SessionSnapshot};
pub use routes::{QuestRouteState, quest_routes};
pub use state::{QuestStage, SessionState};
pub use store::{SessionStore, SharedSession};
pub use tutor::{Clock, SystemClock, TutorClient};
