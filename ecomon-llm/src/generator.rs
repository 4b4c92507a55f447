//! Collaborator contracts.
//!
//! The engine never talks to a model directly. Callers hold a
//! [`ContentGenerator`] and an [`ImageVerifier`], await them outside any
//! companion lock, and feed the results back as engine events.

use std::future::Future;

use crate::error::Result;
use crate::types::{ChatContext, ChatTurn, ImagePayload, QuizQuestion, QuizRequest, VerificationReport};

/// Produces companion dialogue and quiz content.
pub trait ContentGenerator: Send + Sync {
    /// Reply to `message` in character. The reply text is opaque to the engine.
    fn chat_reply(
        &self,
        context: &ChatContext,
        history: &[ChatTurn],
        message: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Generate `request.count` questions. Every question carries exactly
    /// four options and a valid answer index.
    fn quiz_questions(
        &self,
        request: &QuizRequest,
    ) -> impl Future<Output = Result<Vec<QuizQuestion>>> + Send;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Judges whether a photo shows a genuine eco-action.
pub trait ImageVerifier: Send + Sync {
    /// Classify an uploaded photo.
    fn verify(&self, image: &ImagePayload) -> impl Future<Output = Result<VerificationReport>> + Send;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
