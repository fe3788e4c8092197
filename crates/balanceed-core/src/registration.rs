//! Multi-step registration wizard.
//!
//! The wizard walks five steps: account, profile, interests, goals and
//! review. Moving forward is blocked until the current step's required
//! fields are filled in; moving back is always allowed except from the
//! first step. Survey questions are attached to the interests and goals
//! steps by their `step` field.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::{BalanceedError, Result};
use crate::forms::RegisterProfile;
use crate::survey::{SurveyAnswer, SurveyQuestion};

/// A wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    /// Name, email and password.
    Account,
    /// Role and optional details.
    Profile,
    /// Interest questions.
    Interests,
    /// Goal questions.
    Goals,
    /// Summary before submitting.
    Review,
}

impl Step {
    /// All steps in order.
    pub const ALL: [Self; 5] = [
        Self::Account,
        Self::Profile,
        Self::Interests,
        Self::Goals,
        Self::Review,
    ];

    /// Zero-based position of the step.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Account => "account",
            Self::Profile => "profile",
            Self::Interests => "interests",
            Self::Goals => "goals",
            Self::Review => "review",
        };
        f.write_str(name)
    }
}

/// State of an in-progress registration.
#[derive(Debug, Clone)]
pub struct RegistrationWizard {
    step: Step,
    profile: RegisterProfile,
    questions: Vec<SurveyQuestion>,
    answers: BTreeMap<String, SurveyAnswer>,
}

impl RegistrationWizard {
    /// Starts a wizard on the account step with the given survey questions.
    #[must_use]
    pub fn new(questions: Vec<SurveyQuestion>) -> Self {
        Self {
            step: Step::Account,
            profile: RegisterProfile {
                role: "student".to_string(),
                ..RegisterProfile::default()
            },
            questions,
            answers: BTreeMap::new(),
        }
    }

    /// The current step.
    #[must_use]
    pub const fn step(&self) -> Step {
        self.step
    }

    /// The account and profile fields collected so far.
    #[must_use]
    pub const fn profile(&self) -> &RegisterProfile {
        &self.profile
    }

    /// Mutable access to the account and profile fields.
    pub fn profile_mut(&mut self) -> &mut RegisterProfile {
        &mut self.profile
    }

    /// Survey answers collected so far, keyed by question id.
    #[must_use]
    pub const fn answers(&self) -> &BTreeMap<String, SurveyAnswer> {
        &self.answers
    }

    /// Questions shown on `step`.
    pub fn questions_for(&self, step: Step) -> impl Iterator<Item = &SurveyQuestion> {
        self.questions
            .iter()
            .filter(move |q| q.step == step.index())
    }

    /// Records an answer after checking it against its question.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::InvalidAnswer` if the question is unknown or
    /// the answer does not fit it.
    pub fn set_answer(&mut self, question_id: &str, answer: SurveyAnswer) -> Result<()> {
        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| BalanceedError::invalid_answer(question_id, "unknown question"))?;
        question.check(&answer)?;
        self.answers.insert(question_id.to_string(), answer);
        Ok(())
    }

    /// Required fields of `step` that are still empty.
    #[must_use]
    pub fn missing_fields(&self, step: Step) -> Vec<String> {
        let profile = &self.profile;
        let mut missing = Vec::new();
        match step {
            Step::Account => {
                if profile.name.trim().is_empty() {
                    missing.push("name".to_string());
                }
                if profile.email.trim().is_empty() {
                    missing.push("email".to_string());
                }
                if profile.password.is_empty() {
                    missing.push("password".to_string());
                }
            }
            Step::Profile => {
                if profile.role.trim().is_empty() {
                    missing.push("role".to_string());
                }
            }
            Step::Interests | Step::Goals => {
                missing.extend(
                    self.questions_for(step)
                        .filter(|q| q.required && !self.answers.contains_key(&q.id))
                        .map(|q| q.id.clone()),
                );
            }
            Step::Review => {}
        }
        missing
    }

    /// Advances to the next step.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::MissingFields` if the current step is
    /// incomplete, or `NavigationBlocked` on the review step.
    pub fn next(&mut self) -> Result<Step> {
        let missing = self.missing_fields(self.step);
        if !missing.is_empty() {
            return Err(BalanceedError::MissingFields {
                form: format!("{} step", self.step),
                fields: missing,
            });
        }
        let next = Step::from_index(self.step.index() + 1)
            .ok_or_else(|| BalanceedError::navigation_blocked(self.step.index(), "forward"))?;
        debug!(from = %self.step, to = %next, "Registration step forward");
        self.step = next;
        Ok(next)
    }

    /// Goes back one step.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::NavigationBlocked` on the account step.
    pub fn back(&mut self) -> Result<Step> {
        let previous = self
            .step
            .index()
            .checked_sub(1)
            .and_then(Step::from_index)
            .ok_or_else(|| BalanceedError::navigation_blocked(self.step.index(), "back"))?;
        debug!(from = %self.step, to = %previous, "Registration step back");
        self.step = previous;
        Ok(previous)
    }

    /// Builds the registration document from the review step.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::NavigationBlocked` before the review step,
    /// or `MissingFields` if an earlier step was left incomplete.
    pub fn finish(&self) -> Result<RegisterProfile> {
        if self.step != Step::Review {
            return Err(BalanceedError::navigation_blocked(
                self.step.index(),
                "to submit",
            ));
        }
        for step in Step::ALL {
            let missing = self.missing_fields(step);
            if !missing.is_empty() {
                return Err(BalanceedError::MissingFields {
                    form: format!("{step} step"),
                    fields: missing,
                });
            }
        }
        Ok(RegisterProfile {
            survey: self.answers.clone(),
            ..self.profile.clone()
        })
    }
}
