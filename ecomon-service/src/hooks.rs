//! Activity hooks.
//!
//! Translate what the outside world reports (chat messages, verifier
//! verdicts, quiz answers, idle time) into engine events. Hooks never touch
//! companion state; the registry applies whatever they return.

use chrono::{DateTime, Utc};
use tracing::debug;

use ecomon_core::config::CorruptionConfig;
use ecomon_core::{CompanionEvent, Guardian};
use ecomon_llm::quiz::{score_answers, QuizScore};
use ecomon_llm::{LlmError, QuizQuestion, VerificationReport};

/// A chat message from the guardian.
#[must_use]
pub fn on_chat(message: &str) -> CompanionEvent {
    CompanionEvent::Chat { message: message.to_string() }
}

/// A verifier verdict. Unverified reports, reports without a known action
/// type, and confidence below `min_confidence` produce no event.
#[must_use]
pub fn on_verification(report: &VerificationReport, min_confidence: f64) -> Option<CompanionEvent> {
    if !report.is_verified {
        debug!(suggestions = ?report.suggestions, "Verification rejected by verifier");
        return None;
    }
    if report.confidence < min_confidence {
        debug!(confidence = report.confidence, min_confidence, "Verification below confidence floor");
        return None;
    }
    let Some(action) = report.action() else {
        debug!(action_type = ?report.action_type, "Verification names no known action");
        return None;
    };
    Some(CompanionEvent::VerifiedAction { action, confidence: report.confidence })
}

/// Quiz answers for a served quiz.
///
/// # Errors
///
/// [`LlmError::InvalidRequest`] for an empty quiz.
pub fn on_quiz_submitted(
    questions: &[QuizQuestion],
    answers: &[Option<usize>],
) -> Result<(QuizScore, CompanionEvent), LlmError> {
    let score = score_answers(questions, answers)?;
    let event = score.to_event();
    Ok((score, event))
}

/// Idle time since the guardian's last activity. Returns an inactivity tick
/// once a full grace period of uncharged idle days has piled up.
pub fn on_idle_check(
    guardian: &mut Guardian,
    now: DateTime<Utc>,
    corruption: &CorruptionConfig,
) -> Option<CompanionEvent> {
    let days = guardian.take_idle_days_at(now, corruption.inactivity_grace_days.max(1));
    (days > 0).then_some(CompanionEvent::Inactivity { days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use ecomon_core::reward::EcoAction;
    use ecomon_core::UserId;

    fn report(verified: bool, confidence: f64, action: Option<&str>) -> VerificationReport {
        VerificationReport {
            is_verified: verified,
            confidence,
            action_type: action.map(str::to_string),
            description: String::new(),
            suggestions: Vec::new(),
            detected_objects: Vec::new(),
        }
    }

    #[test]
    fn verification_gates() {
        assert_eq!(
            on_verification(&report(true, 0.8, Some("plant-tree")), 0.5),
            Some(CompanionEvent::VerifiedAction { action: EcoAction::PlantTree, confidence: 0.8 })
        );
        assert_eq!(on_verification(&report(false, 0.9, Some("plant-tree")), 0.5), None);
        assert_eq!(on_verification(&report(true, 0.4, Some("plant-tree")), 0.5), None);
        assert_eq!(on_verification(&report(true, 0.9, None), 0.5), None);
        assert_eq!(on_verification(&report(true, 0.9, Some("carbon-footprint")), 0.5), None);
    }

    #[test]
    fn quiz_hook_scores() {
        let q = QuizQuestion {
            question: "Q?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 1,
            explanation: String::new(),
            category: ecomon_llm::QuizCategory::Energy,
        };
        let (score, event) = on_quiz_submitted(&[q.clone(), q], &[Some(1), Some(0)]).expect("valid");
        assert_eq!(score.correct, 1);
        assert_eq!(event, CompanionEvent::QuizResult { correct: 1, total: 2 });
    }

    #[test]
    fn idle_check_waits_for_grace() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid date");
        let mut g = Guardian::new_at(UserId::new(), "Ari", start);
        g.record_activity_at(start);
        let config = CorruptionConfig::default();

        assert_eq!(on_idle_check(&mut g, start + Duration::days(2), &config), None);
        assert_eq!(
            on_idle_check(&mut g, start + Duration::days(3), &config),
            Some(CompanionEvent::Inactivity { days: 3 })
        );
        assert_eq!(on_idle_check(&mut g, start + Duration::days(4), &config), None);
    }
}
