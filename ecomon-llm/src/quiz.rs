//! Quiz scoring.
//!
//! Answers are compared to `correct_index` by exact index. A missing or
//! out-of-range answer counts as wrong.

use serde::{Deserialize, Serialize};

use ecomon_core::companion::CompanionEvent;
use ecomon_core::reward::quiz_percentage;

use crate::error::{LlmError, Result};
use crate::types::QuizQuestion;

/// Outcome for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// The guardian's choice, if any.
    pub answer: Option<usize>,
    /// The right option.
    pub correct_index: usize,
    /// Whether they match.
    pub is_correct: bool,
}

/// A scored quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    /// Correct answers.
    pub correct: u32,
    /// Questions asked.
    pub total: u32,
    /// Per-question breakdown, in question order.
    pub results: Vec<QuestionResult>,
}

impl QuizScore {
    /// Rounded percentage.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        quiz_percentage(self.correct, self.total)
    }

    /// Whether every answer was right.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct == self.total
    }

    /// The engine event for this score.
    #[must_use]
    pub fn to_event(&self) -> CompanionEvent {
        CompanionEvent::QuizResult { correct: self.correct, total: self.total }
    }
}

/// Score `answers` against `questions`.
///
/// Short answer lists are padded with "unanswered"; extra answers are ignored.
///
/// # Errors
///
/// [`LlmError::InvalidRequest`] for an empty question list.
pub fn score_answers(questions: &[QuizQuestion], answers: &[Option<usize>]) -> Result<QuizScore> {
    if questions.is_empty() {
        return Err(LlmError::InvalidRequest("cannot score an empty quiz".to_string()));
    }
    let results: Vec<QuestionResult> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let answer = answers.get(i).copied().flatten();
            QuestionResult {
                answer,
                correct_index: q.correct_index,
                is_correct: answer == Some(q.correct_index),
            }
        })
        .collect();

    let correct = results.iter().filter(|r| r.is_correct).count();
    Ok(QuizScore {
        correct: u32::try_from(correct).unwrap_or(u32::MAX),
        total: u32::try_from(results.len()).unwrap_or(u32::MAX),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuizCategory;

    fn question(correct_index: usize) -> QuizQuestion {
        QuizQuestion {
            question: "Q?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index,
            explanation: String::new(),
            category: QuizCategory::General,
        }
    }

    #[test]
    fn exact_index_comparison() {
        let qs = vec![question(0), question(2), question(3)];
        let score = score_answers(&qs, &[Some(0), Some(1), Some(3)]).expect("valid");
        assert_eq!(score.correct, 2);
        assert_eq!(score.total, 3);
        assert_eq!(score.percentage(), 67);
        assert!(!score.results[1].is_correct);
    }

    #[test]
    fn unanswered_counts_as_wrong() {
        let qs = vec![question(0), question(1)];
        let score = score_answers(&qs, &[Some(0)]).expect("valid");
        assert_eq!(score.correct, 1);
        assert_eq!(score.results[1].answer, None);

        let score = score_answers(&qs, &[None, Some(9)]).expect("valid");
        assert_eq!(score.correct, 0);
    }

    #[test]
    fn perfect_score_becomes_event() {
        let qs = vec![question(1); 5];
        let score = score_answers(&qs, &[Some(1); 5]).expect("valid");
        assert!(score.is_perfect());
        assert_eq!(score.to_event(), CompanionEvent::QuizResult { correct: 5, total: 5 });
    }

    #[test]
    fn empty_quiz_rejected() {
        assert!(matches!(score_answers(&[], &[]), Err(LlmError::InvalidRequest(_))));
    }
}
