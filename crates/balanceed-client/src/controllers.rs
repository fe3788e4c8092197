//! View and form controllers.
//!
//! Each controller borrows the [`ApiClient`], checks required fields, issues
//! one call and hands back the server's answer. There are no retries and no
//! optimistic updates; read-only views fall back to empty data when a fetch
//! fails.

use std::time::Duration;

use balanceed_core::{
    static_questions, ContactForm, DashboardData, DonationForm, Exercise, ExerciseResult,
    FormInput, JournalEntry, LifeSkillTask, NutritionLog, Pathway, ProgressEntry, Result,
    SurveyQuestion, TradeModule, TrainingProgress,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ApiClient;

// ============================================================================
// Dashboard
// ============================================================================

/// Student dashboard.
#[derive(Debug, Clone, Copy)]
pub struct Dashboard<'a> {
    api: &'a ApiClient,
}

impl<'a> Dashboard<'a> {
    /// Wraps an API client.
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /student/dashboard`, or empty data if the fetch fails.
    pub async fn load(&self) -> DashboardData {
        match self.api.get("/student/dashboard").await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Failed to load dashboard");
                DashboardData::default()
            }
        }
    }
}

// ============================================================================
// Brain training
// ============================================================================

/// Brain-training exercises and results.
#[derive(Debug, Clone, Copy)]
pub struct BrainTraining<'a> {
    api: &'a ApiClient,
}

impl<'a> BrainTraining<'a> {
    /// Wraps an API client.
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /brain-training/exercises`.
    pub async fn exercises(&self) -> Result<Vec<Exercise>> {
        self.api.get("/brain-training/exercises").await
    }

    /// Looks up one exercise by id from the catalogue.
    pub async fn exercise(&self, id: &str) -> Result<Option<Exercise>> {
        Ok(self.exercises().await?.into_iter().find(|e| e.id == id))
    }

    /// `GET /brain-training/progress`, or empty progress if the fetch fails.
    pub async fn progress(&self) -> TrainingProgress {
        match self.api.get("/brain-training/progress").await {
            Ok(progress) => progress,
            Err(e) => {
                warn!(error = %e, "Failed to load training progress");
                TrainingProgress::default()
            }
        }
    }

    /// `POST /brain-training/submit-result`.
    pub async fn submit_result(&self, result: &ExerciseResult) -> Result<Value> {
        let response = self.api.post("/brain-training/submit-result", result).await?;
        info!(
            exercise_id = %result.exercise_id,
            score = result.score,
            "Submitted exercise result"
        );
        Ok(response)
    }
}

// ============================================================================
// Trades
// ============================================================================

/// Trade-learning pathways.
#[derive(Debug, Clone, Copy)]
pub struct Pathways<'a> {
    api: &'a ApiClient,
}

impl<'a> Pathways<'a> {
    /// Wraps an API client.
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /trades/pathways`.
    pub async fn list(&self) -> Result<Vec<Pathway>> {
        self.api.get("/trades/pathways").await
    }

    /// `GET /trades/{id}/modules`, in pathway order.
    pub async fn modules(&self, pathway_id: &str) -> Result<Vec<TradeModule>> {
        let mut modules: Vec<TradeModule> = self
            .api
            .get(&format!("/trades/{pathway_id}/modules"))
            .await?;
        modules.sort_by_key(|m| m.order);
        Ok(modules)
    }
}

// ============================================================================
// Student log
// ============================================================================

/// Journal, nutrition, life-skill and progress entries.
#[derive(Debug, Clone, Copy)]
pub struct StudentLog<'a> {
    api: &'a ApiClient,
}

impl<'a> StudentLog<'a> {
    /// Wraps an API client.
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `POST /student/journal`.
    pub async fn journal(&self, entry: &JournalEntry) -> Result<Value> {
        submit(self.api, "/student/journal", entry).await
    }

    /// `POST /student/nutrition`.
    pub async fn nutrition(&self, log: &NutritionLog) -> Result<Value> {
        submit(self.api, "/student/nutrition", log).await
    }

    /// `POST /student/life-skills`.
    pub async fn life_skill(&self, task: &LifeSkillTask) -> Result<Value> {
        submit(self.api, "/student/life-skills", task).await
    }

    /// `PUT /student/life-skills/{id}/complete`.
    pub async fn complete_life_skill(&self, id: &str) -> Result<Value> {
        self.api
            .put_empty(&format!("/student/life-skills/{id}/complete"))
            .await
    }

    /// `POST /student/progress`.
    pub async fn progress(&self, entry: &ProgressEntry) -> Result<Value> {
        submit(self.api, "/student/progress", entry).await
    }
}

// ============================================================================
// Public pages
// ============================================================================

/// Donation page.
#[derive(Debug, Clone, Copy)]
pub struct Donations<'a> {
    api: &'a ApiClient,
}

impl<'a> Donations<'a> {
    /// Wraps an API client.
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `POST /donations`.
    pub async fn donate(&self, form: &DonationForm) -> Result<Value> {
        submit(self.api, "/donations", form).await
    }
}

/// Contact page.
#[derive(Debug, Clone, Copy)]
pub struct Contact<'a> {
    api: &'a ApiClient,
}

impl<'a> Contact<'a> {
    /// Wraps an API client.
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `POST /contact`.
    pub async fn send(&self, form: &ContactForm) -> Result<Value> {
        submit(self.api, "/contact", form).await
    }
}

// ============================================================================
// Survey
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionList {
    Bare(Vec<SurveyQuestion>),
    Wrapped { questions: Vec<SurveyQuestion> },
}

/// Registration survey questions.
#[derive(Debug, Clone, Copy)]
pub struct Survey<'a> {
    api: &'a ApiClient,
    timeout: Duration,
}

impl<'a> Survey<'a> {
    /// Wraps an API client; fetches give up after `timeout`.
    #[must_use]
    pub const fn new(api: &'a ApiClient, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    /// `GET /survey/questions`, or the built-in set if the fetch fails,
    /// times out or returns nothing.
    pub async fn questions(&self) -> Vec<SurveyQuestion> {
        let fetched = tokio::time::timeout(
            self.timeout,
            self.api.get::<QuestionList>("/survey/questions"),
        )
        .await;

        let questions = match fetched {
            Ok(Ok(QuestionList::Bare(questions) | QuestionList::Wrapped { questions })) => {
                questions
            }
            Ok(Err(e)) => {
                debug!(error = %e, "Survey fetch failed, using built-in questions");
                Vec::new()
            }
            Err(_) => {
                debug!(timeout = ?self.timeout, "Survey fetch timed out, using built-in questions");
                Vec::new()
            }
        };

        if questions.is_empty() {
            static_questions()
        } else {
            questions
        }
    }
}

/// Validates `form` and posts it to `path`.
async fn submit<F: FormInput>(api: &ApiClient, path: &str, form: &F) -> Result<Value> {
    form.validate()?;
    let response = api.post(path, form).await?;
    debug!(path, form = F::FORM, "Form submitted");
    Ok(response)
}
