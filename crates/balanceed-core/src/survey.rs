//! Registration survey questions.
//!
//! Questions come either from `GET /survey/questions` or from the static set
//! embedded here. Both share one shape: a question kind tagged by `type`
//! (`select`, `multi_select`, `scale`) and an answer type that mirrors it.

use serde::{Deserialize, Serialize};

use crate::error::{BalanceedError, Result};

/// Wizard step that holds the interest questions.
pub const INTERESTS_STEP: usize = 2;
/// Wizard step that holds the goal questions.
pub const GOALS_STEP: usize = 3;

/// The input a survey question expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one of the options.
    Select {
        /// Allowed options.
        options: Vec<String>,
    },
    /// One or more of the options.
    MultiSelect {
        /// Allowed options.
        options: Vec<String>,
    },
    /// An integer rating between `min` and `max` inclusive.
    Scale {
        /// Lowest allowed value.
        min: u8,
        /// Highest allowed value.
        max: u8,
        /// Optional label for the low end.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_label: Option<String>,
        /// Optional label for the high end.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_label: Option<String>,
    },
}

/// A single survey question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyQuestion {
    /// Stable identifier, used as the answer key.
    pub id: String,
    /// Text shown to the user.
    pub question: String,
    /// Wizard step the question belongs to.
    pub step: usize,
    /// Whether an answer is needed before leaving the step.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Kind and constraints.
    #[serde(flatten)]
    pub kind: QuestionKind,
}

const fn default_required() -> bool {
    true
}

/// An answer to a survey question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SurveyAnswer {
    /// Answer to a `select` question.
    Single(String),
    /// Answer to a `multi_select` question.
    Multiple(Vec<String>),
    /// Answer to a `scale` question.
    Scale(u8),
}

impl SurveyQuestion {
    /// Checks that `answer` fits this question.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::InvalidAnswer` if the answer has the wrong
    /// shape, names an unknown option, is empty or lies outside the scale.
    pub fn check(&self, answer: &SurveyAnswer) -> Result<()> {
        match (&self.kind, answer) {
            (QuestionKind::Select { options }, SurveyAnswer::Single(choice)) => {
                if options.contains(choice) {
                    Ok(())
                } else {
                    Err(BalanceedError::invalid_answer(
                        &self.id,
                        format!("'{choice}' is not one of the options"),
                    ))
                }
            }
            (QuestionKind::MultiSelect { options }, SurveyAnswer::Multiple(choices)) => {
                if choices.is_empty() {
                    return Err(BalanceedError::invalid_answer(
                        &self.id,
                        "pick at least one option",
                    ));
                }
                match choices.iter().find(|c| !options.contains(c)) {
                    Some(unknown) => Err(BalanceedError::invalid_answer(
                        &self.id,
                        format!("'{unknown}' is not one of the options"),
                    )),
                    None => Ok(()),
                }
            }
            (QuestionKind::Scale { min, max, .. }, SurveyAnswer::Scale(value)) => {
                if (*min..=*max).contains(value) {
                    Ok(())
                } else {
                    Err(BalanceedError::invalid_answer(
                        &self.id,
                        format!("{value} is outside {min}..={max}"),
                    ))
                }
            }
            (QuestionKind::Select { .. }, _) => Err(BalanceedError::invalid_answer(
                &self.id,
                "expected a single option",
            )),
            (QuestionKind::MultiSelect { .. }, _) => Err(BalanceedError::invalid_answer(
                &self.id,
                "expected a list of options",
            )),
            (QuestionKind::Scale { .. }, _) => Err(BalanceedError::invalid_answer(
                &self.id,
                "expected a number on the scale",
            )),
        }
    }

    /// Parses free-form terminal input into an answer for this question.
    ///
    /// `select` takes an option name or 1-based number, `multi_select` a
    /// comma-separated list of either, `scale` an integer.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::InvalidAnswer` if the input cannot be parsed
    /// or does not fit the question.
    pub fn parse_input(&self, input: &str) -> Result<SurveyAnswer> {
        let input = input.trim();
        let answer = match &self.kind {
            QuestionKind::Select { options } => {
                SurveyAnswer::Single(resolve_option(options, input))
            }
            QuestionKind::MultiSelect { options } => SurveyAnswer::Multiple(
                input
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| resolve_option(options, s))
                    .collect(),
            ),
            QuestionKind::Scale { .. } => SurveyAnswer::Scale(input.parse().map_err(|_| {
                BalanceedError::invalid_answer(&self.id, format!("'{input}' is not a number"))
            })?),
        };
        self.check(&answer)?;
        Ok(answer)
    }
}

/// Maps a 1-based option number to its name; anything else passes through.
fn resolve_option(options: &[String], input: &str) -> String {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .map_or_else(|| input.to_string(), Clone::clone)
}

/// Built-in questions used when the survey endpoint is slow or unavailable.
#[must_use]
pub fn static_questions() -> Vec<SurveyQuestion> {
    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    vec![
        SurveyQuestion {
            id: "learning_style".to_string(),
            question: "How do you learn best?".to_string(),
            step: INTERESTS_STEP,
            required: true,
            kind: QuestionKind::Select {
                options: options(&["Visual", "Hands-on", "Reading", "Listening"]),
            },
        },
        SurveyQuestion {
            id: "interests".to_string(),
            question: "Which areas interest you?".to_string(),
            step: INTERESTS_STEP,
            required: true,
            kind: QuestionKind::MultiSelect {
                options: options(&[
                    "Math",
                    "Science",
                    "Reading",
                    "Technology",
                    "Skilled trades",
                    "Arts",
                    "Health & nutrition",
                ]),
            },
        },
        SurveyQuestion {
            id: "confidence".to_string(),
            question: "How confident do you feel about school right now?".to_string(),
            step: INTERESTS_STEP,
            required: true,
            kind: QuestionKind::Scale {
                min: 1,
                max: 5,
                min_label: Some("Not at all".to_string()),
                max_label: Some("Very".to_string()),
            },
        },
        SurveyQuestion {
            id: "goals".to_string(),
            question: "What do you want to work on?".to_string(),
            step: GOALS_STEP,
            required: true,
            kind: QuestionKind::MultiSelect {
                options: options(&[
                    "Improve grades",
                    "Learn a trade",
                    "Build healthy habits",
                    "Manage stress",
                    "Make friends",
                    "Prepare for college",
                ]),
            },
        },
        SurveyQuestion {
            id: "weekly_hours".to_string(),
            question: "How much time can you spend each week?".to_string(),
            step: GOALS_STEP,
            required: true,
            kind: QuestionKind::Select {
                options: options(&["Under 1 hour", "1-3 hours", "3-5 hours", "5+ hours"]),
            },
        },
        SurveyQuestion {
            id: "mentor".to_string(),
            question: "Would you like to be matched with a mentor?".to_string(),
            step: GOALS_STEP,
            required: false,
            kind: QuestionKind::Select {
                options: options(&["Yes", "No", "Maybe later"]),
            },
        },
    ]
}
