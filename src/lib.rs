//! AI Starter Quest: gamified AI onboarding with an optional AI tutor.

pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod quest;
