//! QuestEngine: routes learner input through the module handlers, mutates
//! session state, and produces the next assistant reply.

use tracing::{debug, info, warn};

use super::content;
use super::model::{Badge, QuestMessage};
use super::state::{QuestStage, SessionState};
use super::tutor::{self, TutorClient};
use crate::config::QuestConfig;
use crate::error::EmailError;

/// Dialogue engine shared by every session.
///
/// Holds no per-learner data; all state lives in the `SessionState` passed to
/// each call.
pub struct QuestEngine {
    tutor: TutorClient,
    coaching_enabled: bool,
}

impl QuestEngine {
    pub fn new(tutor: TutorClient, config: &QuestConfig) -> Self {
        Self {
            tutor,
            coaching_enabled: config.coaching_enabled,
        }
    }

    pub fn tutor(&self) -> &TutorClient {
        &self.tutor
    }

    pub fn coaching_enabled(&self) -> bool {
        self.coaching_enabled
    }

    /// A fresh session whose AI readiness matches this engine's tutor.
    pub fn new_session(&self) -> SessionState {
        SessionState::new(self.tutor.is_ready())
    }

    /// Process one line of learner input.
    ///
    /// Logs the input, runs the handler for the current stage (which may log
    /// tutor asides of its own), then logs and returns the reply.
    pub async fn handle_input(&self, session: &mut SessionState, input: &str) -> String {
        session.push_message(QuestMessage::user(input));
        let reply = self.route(session, input).await;
        session.push_message(QuestMessage::assistant(reply.clone()));
        reply
    }

    async fn route(&self, session: &mut SessionState, input: &str) -> String {
        debug!(stage = %session.stage(), "Routing quest input");
        match session.stage() {
            QuestStage::Welcome => {
                // The first real input is also the first Module 1 command.
                self.transition(session);
                self.module_one(session, input).await
            }
            QuestStage::Module1 => self.module_one(session, input).await,
            QuestStage::Module2 => self.module_two(session, input).await,
            QuestStage::Module3 => self.module_three(session, input).await,
            QuestStage::Completed => completed(session, input),
        }
    }

    /// Module 1: What is AI?
    async fn module_one(&self, session: &mut SessionState, input: &str) -> String {
        let text = input.trim().to_lowercase();

        if content::GREETINGS.contains(&text.as_str()) {
            return content::GREETING_REPLY.to_string();
        }

        if text == "begin" {
            session.progress_to(20);
            award(session, Badge::ConceptSpark);
            return content::MODULE_ONE_INTRO.to_string();
        }

        if content::AI_EXAMPLE_KEYWORDS.iter().any(|k| text.contains(k)) {
            session.progress_to(40);
            self.coach(session, content::COACH_EXAMPLE_PROMPT, 0.4).await;
            return content::MODULE_ONE_QUIZ.to_string();
        }

        match text.as_str() {
            "a" | "b" | "c" => {
                let verdict = if text == "b" {
                    session.record_correct_answer();
                    self.coach(session, content::COACH_PRAISE_PROMPT, 0.3).await;
                    content::MODULE_ONE_CORRECT
                } else {
                    self.coach(session, content::COACH_CORRECTION_PROMPT, 0.3).await;
                    content::MODULE_ONE_INCORRECT
                };
                session.progress_to(50);
                self.transition(session);
                format!("{verdict}\n\n{}", content::MODULE_ONE_TRANSITION)
            }
            _ => content::MODULE_ONE_REPROMPT.to_string(),
        }
    }

    /// Module 2: Prompting Basics.
    async fn module_two(&self, session: &mut SessionState, input: &str) -> String {
        if !session.intro_shown() {
            session.mark_intro_shown();
            session.progress_to(60);
            award(session, Badge::PromptExplorer);
            return content::MODULE_TWO_INTRO.to_string();
        }

        let attempt = input.trim();
        match attempt.to_uppercase().as_str() {
            "" => content::MODULE_TWO_EMPTY.to_string(),
            answer @ ("A" | "B") => {
                let note = if answer == "B" {
                    session.record_correct_answer();
                    content::MODULE_TWO_CORRECT_NOTE
                } else {
                    content::MODULE_TWO_INCORRECT_NOTE
                };
                session.push_message(QuestMessage::assistant(note));
                session.progress_to(85);
                self.transition(session);
                content::MODULE_TWO_TRANSITION.to_string()
            }
            _ => {
                if self.coaching_active(session) {
                    let rubric = content::rubric_prompt(attempt);
                    let review = self.tutor.reply(session, &rubric, 0.3, None).await;
                    session.push_message(QuestMessage::assistant(format!(
                        "**Tutor review:** {review}"
                    )));
                }
                session.progress_to(80);
                content::MODULE_TWO_QUIZ.to_string()
            }
        }
    }

    /// Module 3: Hands-On Practice.
    async fn module_three(&self, session: &mut SessionState, input: &str) -> String {
        if !session.intro_shown() {
            session.mark_intro_shown();
            session.progress_to(90);
            award(session, Badge::AiTinkerer);
            return content::MODULE_THREE_INTRO.to_string();
        }

        let choice = input.trim();
        if let Some(task) = content::exercise_task(choice) {
            session.progress_to(95);
            let tip = if self.coaching_active(session) {
                let prompt = content::exercise_tip_prompt(task);
                Some(self.tutor.reply(session, &prompt, 0.6, None).await)
            } else {
                None
            };
            return content::exercise_reply(task, tip.as_deref());
        }

        if choice.eq_ignore_ascii_case("done") {
            session.progress_to(100);
            self.transition(session);
            info!(quiz_correct = session.quiz_correct(), "Quest completed");
            return content::completion_message(session.quiz_correct());
        }

        content::MODULE_THREE_REPROMPT.to_string()
    }

    /// Hint button: a tutor hint for the current module, with the built-in
    /// hint in front whenever the tutor answers with a sentinel.
    pub async fn hint(&self, session: &mut SessionState) -> String {
        if session.stage() == QuestStage::Welcome {
            return content::HINT_LOCKED.to_string();
        }

        let module = session.stage().module_index();
        let cache_key = format!("hint_m{module}");
        let mut hint = self
            .tutor
            .reply(session, content::hint_prompt(module), 0.7, Some(cache_key.as_str()))
            .await;
        if tutor::is_sentinel(&hint) {
            hint = format!("{} {hint}", content::fallback_hint(module));
        }

        let message = format!("**Hint:** {hint}");
        session.push_message(QuestMessage::assistant(message.clone()));
        message
    }

    /// Record the learner's email. Invalid input leaves the session untouched.
    pub fn capture_email(&self, session: &mut SessionState, email: &str) -> Result<(), EmailError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(EmailError::Empty);
        }
        if !email.contains('@') {
            return Err(EmailError::MissingAt);
        }
        session.mark_email_captured();
        info!("Learner email captured");
        Ok(())
    }

    fn coaching_active(&self, session: &SessionState) -> bool {
        self.coaching_enabled && session.ai_ready()
    }

    /// Log an optional tutor aside before the handler's main reply.
    async fn coach(&self, session: &mut SessionState, prompt: &str, temperature: f32) {
        if !self.coaching_active(session) {
            return;
        }
        let aside = self.tutor.reply(session, prompt, temperature, None).await;
        session.push_message(QuestMessage::assistant(format!("**Tutor:** {aside}")));
    }

    fn transition(&self, session: &mut SessionState) {
        let from = session.stage();
        match session.advance() {
            Ok(to) => info!(
                from = %from,
                to = %to,
                progress = session.progress(),
                "Quest stage advanced"
            ),
            Err(e) => warn!("Failed to advance quest stage: {}", e),
        }
    }
}

fn award(session: &mut SessionState, badge: Badge) {
    if session.award_badge(badge) {
        info!(badge = %badge, "Badge awarded");
    }
}

/// After the quest: `done` replays the report card, anything else points at
/// the remaining actions.
fn completed(session: &mut SessionState, input: &str) -> String {
    if input.trim().eq_ignore_ascii_case("done") {
        session.progress_to(100);
        return content::completion_message(session.quiz_correct());
    }
    content::COMPLETED_REPROMPT.to_string()
}
