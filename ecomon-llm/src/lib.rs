//! # ecomon-llm — Collaborator layer for EcoMon
//!
//! The companion engine consumes two outside collaborators:
//!   - a **content generator** for in-character chat replies and quizzes
//!   - an **image verifier** that judges eco-action photos
//!
//! This crate defines their contracts, the prompts a model-backed
//! implementation sends, strict parsers for what comes back, quiz scoring,
//! and rule-based fallbacks that need no model at all.
//!
//! ```text
//! Companion ──snapshot──▶ ChatContext ──▶ ContentGenerator ──▶ reply text
//! QuizRequest ──────────────────────────▶ ContentGenerator ──▶ Vec<QuizQuestion> ──score──▶ QuizResult event
//! ImagePayload ─────────────────────────▶ ImageVerifier ────▶ VerificationReport ──▶ VerifiedAction event
//! ```

#![deny(clippy::unwrap_used)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod fallback;
pub mod generator;
pub mod prompt;
pub mod quiz;
pub mod types;

pub use error::LlmError;
pub use fallback::{KeywordVerifier, TemplateGenerator};
pub use generator::{ContentGenerator, ImageVerifier};
pub use quiz::{score_answers, QuizScore};
pub use types::{
    ChatContext, ChatTurn, ImagePayload, QuizCategory, QuizDifficulty, QuizQuestion, QuizRequest,
    VerificationReport,
};
