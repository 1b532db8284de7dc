//! Fixed curriculum text: module scripts, tutor prompts, fallback hints, and
//! the completion report card.

pub const WELCOME: &str = "Welcome! Type **begin** to start your AI journey. You'll complete 3 quick \
modules, earn badges, and preview your Report Card. Locked Level requires enrollment.";

// ── Module 1: What is AI? ───────────────────────────────────────────────

/// Inputs answered with a nudge towards `begin`.
pub const GREETINGS: &[&str] = &["hi", "hello", "hey", "yo", "hola", "help", "start"];

/// Substrings that count as naming an everyday AI example.
pub const AI_EXAMPLE_KEYWORDS: &[&str] = &[
    "netflix",
    "spotify",
    "recommend",
    "maps",
    "autocorrect",
    "autocomplete",
    "youtube",
];

pub const GREETING_REPLY: &str = "Hi! 👋 Type **begin** to start Module 1.";

pub const MODULE_ONE_INTRO: &str = "### Module 1: What is AI?\n\
AI helps computers perform tasks like pattern recognition, prediction, and content generation.\n\n\
**Checkpoint:** Name one everyday example of AI you've used or seen.";

pub const MODULE_ONE_QUIZ: &str = "Nice! ✅ Recommendation engines (like Netflix/Spotify) are classic AI.\n\n\
**Mini-Quiz:** Which statement is MOST accurate?\n\
A) AI is one algorithm.\n\
B) AI is a field with many methods, such as machine learning.\n\
C) AI is magic.\n\n\
_Reply with A, B, or C._";

pub const MODULE_ONE_CORRECT: &str = "Correct! 🎉";

pub const MODULE_ONE_INCORRECT: &str = "Good try! The best answer is **B**.";

pub const MODULE_ONE_TRANSITION: &str =
    "**Progress saved.** Moving to **Module 2: Prompting Basics**.\nType anything to continue.";

pub const MODULE_ONE_REPROMPT: &str = "Type **begin** to start the course, or say something like \
`Netflix recommendations` for the checkpoint.";

pub const COACH_EXAMPLE_PROMPT: &str = "Explain in one friendly sentence why recommendations \
(e.g., Netflix) are an example of AI, for a non-technical learner.";

pub const COACH_PRAISE_PROMPT: &str = "In one sentence, praise a learner for selecting option B \
(AI is a field) and add a tiny follow-up tip.";

pub const COACH_CORRECTION_PROMPT: &str = "In one sentence, gently correct a learner who picked A \
or C and say why B is best, in plain English.";

// ── Module 2: Prompting Basics ──────────────────────────────────────────

pub const MODULE_TWO_INTRO: &str = "### Module 2: Prompting Basics\n\
Good prompts are **clear**, **contextual**, and **goal-oriented**.\n\n\
**Task:** Rewrite this weak prompt to be specific.\n\
_Weak_: `Write marketing ideas.`\n\
Include audience, tone, and format.";

pub const MODULE_TWO_QUIZ: &str = "**Quick Check:** Which prompt yields structured output?\n\
A) `Write about AI.`\n\
B) `Create a 5-step checklist for starting with AI at a small bakery, numbered list.`\n\n\
_Reply with A or B._";

pub const MODULE_TWO_CORRECT_NOTE: &str = "**Tutor:** Great pick! Numbered steps create structure.";

pub const MODULE_TWO_INCORRECT_NOTE: &str =
    "**Tutor:** Close. Asking for numbered steps (B) yields a tidy result.";

pub const MODULE_TWO_TRANSITION: &str = "Moving to **Module 3: Hands-On**. Type anything to continue.";

pub const MODULE_TWO_EMPTY: &str = "Try adding audience, tone, and format (e.g., Instagram posts, \
friendly tone, bullet list).";

/// Rubric critique of the learner's rewritten prompt.
pub fn rubric_prompt(attempt: &str) -> String {
    format!(
        "Rate this prompt for clarity, context, and format (1-5 each) and give one improvement \
tip in <=30 words:\n\n{attempt}"
    )
}

// ── Module 3: Hands-On Practice ─────────────────────────────────────────

pub const MODULE_THREE_INTRO: &str = "### Module 3: Hands-On Practice\n\
Pick a quick exercise (reply with 1, 2, or 3):\n\
1) Content: 5 product ideas using AI\n\
2) Customer Support: empathetic reply to a delay complaint\n\
3) Data: 3 ways AI can save time in spreadsheets";

pub const MODULE_THREE_REPROMPT: &str =
    "Reply with `1`, `2`, or `3` to pick an exercise, then type `done` when finished.";

/// Task text for an exercise choice.
pub fn exercise_task(choice: &str) -> Option<&'static str> {
    match choice {
        "1" => Some("Generate 5 product ideas for eco-friendly kitchen tools."),
        "2" => Some("Write a brief, empathetic apology for a delayed order; offer options to resolve."),
        "3" => Some("List 3 spreadsheet automations (cleaning, categorizing, summarizing)."),
        _ => None,
    }
}

pub fn exercise_tip_prompt(task: &str) -> String {
    format!("Give one 15-word tip to do this well: {task}")
}

pub fn exercise_reply(task: &str, tip: Option<&str>) -> String {
    let tip = tip
        .map(|t| format!("\n\n**Tutor tip:** {t}"))
        .unwrap_or_default();
    format!("Great choice! Try this: **{task}**{tip}\n\n_When you're done, type `done`._")
}

// ── Completion ──────────────────────────────────────────────────────────

pub const COMPLETED_REPROMPT: &str = "You've finished the free track! 🎓 Type `done` to see your \
report card again, or reset the demo to start over.";

/// Star rating out of five: `min(5, base + bonus)` filled, the rest empty.
pub fn stars(base: u32, bonus: u32) -> String {
    let filled = base.saturating_add(bonus).min(5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Completion message: locked-level upsell plus the report card preview.
pub fn completion_message(quiz_correct: u32) -> String {
    format!(
        "👏 Nicely done. You've completed the free track!\n\n\
## 🔒 Locked Level: Applied AI Playbooks\n\
- 12 advanced prompt frameworks\n- Case studies + templates\n- Certificate + full Report Card\n\n\
👉 **Unlock via the AI Learning Academy:** [Enroll to unlock](https://example.com/enroll)\n\n\
### Report Card (Preview)\n\
- Concepts: {concepts}\n\
- Prompt Craft: {prompt_craft}\n\
- Applied Practice: ★★★☆☆\n\
- Consistency: ★★☆☆☆\n\n\
_Enter your email to receive your badges + preview report & a limited-time coupon._",
        concepts = stars(3, quiz_correct),
        prompt_craft = stars(2, quiz_correct),
    )
}

// ── Hints ───────────────────────────────────────────────────────────────

pub const HINT_LOCKED: &str = "Type **begin** first; hints unlock once Module 1 starts.";

/// Tutor prompt for the hint button on a given module.
pub fn hint_prompt(module: u8) -> &'static str {
    match module {
        0 | 1 => {
            "Give one short hint (<=20 words) to help a beginner name an everyday example of AI they use."
        }
        2 => "Give one short hint (<=20 words) on improving a prompt with audience, tone, and output format.",
        3 => {
            "Give one short hint (<=20 words) for choosing a quick hands-on AI exercise and completing it."
        }
        _ => "Give a concise study hint (<=20 words) for learning basic AI concepts.",
    }
}

/// Built-in hint shown in front of a sentinel when the tutor cannot answer.
pub fn fallback_hint(module: u8) -> &'static str {
    match module.clamp(1, 3) {
        1 => "Think of apps that recommend or autocomplete.",
        2 => "Add audience, tone, and output format.",
        _ => "Pick one short task and try it.",
    }
}
