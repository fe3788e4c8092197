//! Form inputs submitted by the view controllers.
//!
//! Validation here is presence-only: a form is accepted once every required
//! field holds something. Business rules are the server's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BalanceedError, Result};
use crate::survey::SurveyAnswer;

/// A document that can be checked for empty required fields.
pub trait FormInput: Serialize {
    /// Name of the form, used in error messages.
    const FORM: &'static str;

    /// Returns the names of required fields that are empty.
    fn missing_fields(&self) -> Vec<&'static str>;

    /// Fails with `MissingFields` if any required field is empty.
    fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BalanceedError::missing_fields(Self::FORM, &missing))
        }
    }
}

/// Collects `name` into `missing` when `value` is blank.
fn require(missing: &mut Vec<&'static str>, name: &'static str, value: &str) {
    if value.trim().is_empty() {
        missing.push(name);
    }
}

// ============================================================================
// Student log forms
// ============================================================================

/// Body of `POST /student/journal`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Mood from 1 to 10; 0 means not chosen.
    pub mood_rating: u8,
    /// Entry text.
    pub content: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FormInput for JournalEntry {
    const FORM: &'static str = "journal entry";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.mood_rating == 0 {
            missing.push("mood_rating");
        }
        require(&mut missing, "content", &self.content);
        missing
    }
}

/// Body of `POST /student/nutrition`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionLog {
    /// `breakfast`, `lunch`, `dinner` or `snack`.
    pub meal_type: String,
    /// Foods eaten.
    pub foods: Vec<String>,
    /// Optional calorie estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    /// Optional notes.
    #[serde(default)]
    pub notes: String,
}

impl FormInput for NutritionLog {
    const FORM: &'static str = "nutrition log";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, "meal_type", &self.meal_type);
        if self.foods.iter().all(|f| f.trim().is_empty()) {
            missing.push("foods");
        }
        missing
    }
}

/// Body of `POST /student/life-skills`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSkillTask {
    /// Category, e.g. `home_economics`.
    pub skill_category: String,
    /// Task name.
    pub task_name: String,
    /// What the task involves.
    #[serde(default)]
    pub description: String,
    /// Optional notes.
    #[serde(default)]
    pub notes: String,
}

impl FormInput for LifeSkillTask {
    const FORM: &'static str = "life skill";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, "skill_category", &self.skill_category);
        require(&mut missing, "task_name", &self.task_name);
        missing
    }
}

/// Body of `POST /student/progress`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Area, e.g. `academic`.
    pub category: String,
    /// Entry type, e.g. `module_completion`.
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Free-form measurements.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl FormInput for ProgressEntry {
    const FORM: &'static str = "progress entry";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, "category", &self.category);
        require(&mut missing, "type", &self.entry_type);
        require(&mut missing, "title", &self.title);
        missing
    }
}

// ============================================================================
// Public pages
// ============================================================================

/// Body of `POST /donations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationForm {
    /// Donor name.
    pub name: String,
    /// Donor email.
    pub email: String,
    /// Amount in cents.
    pub amount_cents: u64,
    /// Whether the donation repeats monthly.
    #[serde(default)]
    pub recurring: bool,
    /// Optional note.
    #[serde(default)]
    pub message: String,
}

impl FormInput for DonationForm {
    const FORM: &'static str = "donation";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, "name", &self.name);
        require(&mut missing, "email", &self.email);
        if self.amount_cents == 0 {
            missing.push("amount");
        }
        missing
    }
}

/// Body of `POST /contact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    /// Sender name.
    pub name: String,
    /// Reply-to email.
    pub email: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
}

impl FormInput for ContactForm {
    const FORM: &'static str = "contact";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, "name", &self.name);
        require(&mut missing, "email", &self.email);
        require(&mut missing, "subject", &self.subject);
        require(&mut missing, "message", &self.message);
        missing
    }
}

// ============================================================================
// Registration
// ============================================================================

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProfile {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Role, `student` unless chosen otherwise.
    pub role: String,
    /// Institution identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    /// Age in years, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    /// Survey answers keyed by question id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub survey: BTreeMap<String, SurveyAnswer>,
}

impl FormInput for RegisterProfile {
    const FORM: &'static str = "registration";

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, "name", &self.name);
        require(&mut missing, "email", &self.email);
        if self.password.is_empty() {
            missing.push("password");
        }
        require(&mut missing, "role", &self.role);
        missing
    }
}
