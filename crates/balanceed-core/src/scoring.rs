//! Scoring of completed exercise attempts.
//!
//! [`score`] is a pure function of the exercise, the collected answers and
//! the elapsed time. Unanswered questions count as incorrect.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::exercise::{Answer, Exercise};

/// The scored outcome of a completed attempt, as posted to
/// `POST /brain-training/submit-result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseResult {
    /// The exercise this result belongs to.
    pub exercise_id: String,
    /// Percentage score, 0–100.
    pub score: u32,
    /// Elapsed seconds.
    pub time_taken: u32,
    /// Number of correct answers.
    pub correct_answers: u32,
    /// Number of questions in the exercise.
    pub total_questions: u32,
}

impl ExerciseResult {
    /// Returns `true` if every question was answered correctly.
    ///
    /// An exercise with no questions is never perfect.
    #[must_use]
    pub const fn is_perfect(&self) -> bool {
        self.total_questions > 0 && self.correct_answers == self.total_questions
    }
}

impl fmt::Display for ExerciseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} correct ({}%) in {}s",
            self.correct_answers, self.total_questions, self.score, self.time_taken
        )
    }
}

/// Scores `answers` against `exercise`.
///
/// Answers are index-aligned with the exercise items; surplus answers are
/// ignored and missing ones are incorrect. The score is
/// `round(100 * correct / total)` with halves rounded up. An exercise with no
/// questions scores 0.
#[must_use]
pub fn score(exercise: &Exercise, answers: &[Answer], time_taken: u32) -> ExerciseResult {
    let total = exercise.question_count();
    let correct = answers
        .iter()
        .take(total)
        .enumerate()
        .filter(|(index, answer)| exercise.is_correct(*index, answer))
        .count();

    let total_questions = u32::try_from(total).unwrap_or(u32::MAX);
    let correct_answers = u32::try_from(correct).unwrap_or(u32::MAX);

    ExerciseResult {
        exercise_id: exercise.id.clone(),
        score: percentage(correct_answers, total_questions),
        time_taken,
        correct_answers,
        total_questions,
    }
}

/// Integer `round(100 * correct / total)`, or 0 when `total` is 0.
const fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = correct as u64;
    let total = total as u64;
    // (200c + t) / 2t == floor(100c/t + 1/2)
    ((200 * correct + total) / (2 * total)) as u32
}
