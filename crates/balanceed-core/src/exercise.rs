//! Brain-training exercise definitions and answers.
//!
//! Exercises are fetched from the API and never mutated locally. The item
//! list is internally tagged by `type`, so a multiple-choice exercise carries
//! `questions` and a calculation exercise carries `problems`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Category
// ============================================================================

/// Subject area of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Arithmetic and number sense.
    Math,
    /// Reading comprehension.
    Reading,
    /// Science facts and reasoning.
    Science,
    /// Recall and pattern memory.
    Memory,
    /// Logic puzzles.
    Logic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Math => "math",
            Self::Reading => "reading",
            Self::Science => "science",
            Self::Memory => "memory",
            Self::Logic => "logic",
        };
        f.pad(s)
    }
}

// ============================================================================
// Items
// ============================================================================

/// A question answered by picking one of several options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceQuestion {
    /// Prompt shown to the user.
    pub question: String,
    /// Options in display order.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct: usize,
}

/// A problem answered with an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// The expression or word problem, e.g. `"7+5"`.
    pub problem: String,
    /// The expected integer answer.
    pub answer: i64,
}

/// The exercise type together with its ordered items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExerciseItems {
    /// Pick-one questions.
    MultipleChoice {
        /// Questions in presentation order.
        questions: Vec<ChoiceQuestion>,
    },
    /// Integer-answer problems.
    Calculation {
        /// Problems in presentation order.
        problems: Vec<Problem>,
    },
}

/// Which kind of input an exercise expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseKind {
    /// Answers are option indices.
    MultipleChoice,
    /// Answers are integers.
    Calculation,
}

// ============================================================================
// Exercise
// ============================================================================

/// A brain-training exercise as served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Exercise identifier.
    pub id: String,

    /// Display title.
    #[serde(default)]
    pub title: String,

    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Subject area.
    pub category: Category,

    /// Type tag and items.
    #[serde(flatten)]
    pub items: ExerciseItems,

    /// Time budget in seconds.
    pub time_limit: u32,

    /// Points awarded for completing the exercise.
    #[serde(default)]
    pub points: u32,
}

impl Exercise {
    /// Returns the kind of answers this exercise expects.
    #[must_use]
    pub const fn kind(&self) -> ExerciseKind {
        match self.items {
            ExerciseItems::MultipleChoice { .. } => ExerciseKind::MultipleChoice,
            ExerciseItems::Calculation { .. } => ExerciseKind::Calculation,
        }
    }

    /// Returns the number of questions or problems.
    #[must_use]
    pub fn question_count(&self) -> usize {
        match &self.items {
            ExerciseItems::MultipleChoice { questions } => questions.len(),
            ExerciseItems::Calculation { problems } => problems.len(),
        }
    }

    /// Returns the prompt of the item at `index`, if any.
    #[must_use]
    pub fn prompt(&self, index: usize) -> Option<&str> {
        match &self.items {
            ExerciseItems::MultipleChoice { questions } => {
                questions.get(index).map(|q| q.question.as_str())
            }
            ExerciseItems::Calculation { problems } => {
                problems.get(index).map(|p| p.problem.as_str())
            }
        }
    }

    /// Returns the options of the item at `index` for multiple-choice exercises.
    #[must_use]
    pub fn options(&self, index: usize) -> Option<&[String]> {
        match &self.items {
            ExerciseItems::MultipleChoice { questions } => {
                questions.get(index).map(|q| q.options.as_slice())
            }
            ExerciseItems::Calculation { .. } => None,
        }
    }

    /// Returns `true` if `answer` is correct for the item at `index`.
    ///
    /// Out-of-range indices and mismatched answer kinds are never correct.
    #[must_use]
    pub fn is_correct(&self, index: usize, answer: &Answer) -> bool {
        match (&self.items, answer) {
            (ExerciseItems::MultipleChoice { questions }, Answer::Choice(choice)) => {
                questions.get(index).is_some_and(|q| q.correct == *choice)
            }
            (ExerciseItems::Calculation { problems }, Answer::Number(value)) => {
                problems.get(index).is_some_and(|p| p.answer == *value)
            }
            _ => false,
        }
    }
}

// ============================================================================
// Answer
// ============================================================================

/// A single submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Index of the chosen option.
    Choice(usize),
    /// Integer answer to a calculation problem.
    Number(i64),
    /// Raw input that could not be interpreted; always incorrect.
    Text(String),
}

impl Answer {
    /// Interprets raw user input for an exercise of the given kind.
    ///
    /// Input is trimmed first. Calculation input parses as an integer, so
    /// `"12"` and `" 12 "` both become `Number(12)`. Multiple-choice input
    /// parses as a zero-based option index.
    #[must_use]
    pub fn from_input(kind: ExerciseKind, input: &str) -> Self {
        let trimmed = input.trim();
        match kind {
            ExerciseKind::Calculation => trimmed
                .parse::<i64>()
                .map_or_else(|_| Self::Text(trimmed.to_string()), Self::Number),
            ExerciseKind::MultipleChoice => trimmed
                .parse::<usize>()
                .map_or_else(|_| Self::Text(trimmed.to_string()), Self::Choice),
        }
    }
}
