//! Integration tests for the view and form controllers.
//!
//! Drives brain training end to end (fetch, timed attempt, submit), the
//! read-only views and their fallbacks, and every form endpoint.

mod common;

use balanceed_client::{
    BrainTraining, ChatRooms, Contact, Dashboard, Donations, Identity, Pathways, StudentLog,
    Survey,
};
use balanceed_core::{
    static_questions, Answer, BalanceedError, ContactForm, DonationForm, ExerciseRunner,
    JournalEntry, LifeSkillTask, NutritionLog, ProgressEntry,
};
use common::{config_for, spawn_backend, Backend, SurveyMode, DEMO_EMAIL, DEMO_PASSWORD};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Spawns a backend and returns a signed-in identity.
async fn signed_in(backend: Backend) -> (Identity, TempDir) {
    let url = spawn_backend(backend).await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut identity =
        Identity::from_config(&config_for(&url, dir.path())).expect("Failed to build identity");
    identity
        .login(DEMO_EMAIL, DEMO_PASSWORD)
        .await
        .expect("Login failed");
    (identity, dir)
}

// ============================================================================
// Brain training
// ============================================================================

/// Tests fetching an exercise, answering it through the runner and posting
/// the scored result.
#[tokio::test]
async fn test_brain_training_round_trip() {
    let backend = Backend::default();
    let (identity, _dir) = signed_in(backend.clone()).await;
    let training = BrainTraining::new(identity.api());

    let exercises = training.exercises().await.expect("Failed to list exercises");
    assert_eq!(exercises.len(), 2);

    let exercise = training
        .exercise("mc-1")
        .await
        .expect("Failed to fetch exercise")
        .expect("Exercise should exist");
    assert_eq!(exercise.question_count(), 2);

    let (tx, rx) = mpsc::channel(4);
    let run = tokio::spawn(ExerciseRunner::new(exercise).run(rx, |_| {}));
    tx.send(Answer::Choice(1)).await.expect("send");
    tx.send(Answer::Choice(2)).await.expect("send");
    let result = run
        .await
        .expect("Runner panicked")
        .expect("Attempt should complete");

    assert_eq!(result.correct_answers, 1);
    assert_eq!(result.score, 50);

    training
        .submit_result(&result)
        .await
        .expect("Failed to submit result");

    let sent = backend.requests_to("/brain-training/submit-result").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body["exercise_id"], "mc-1");
    assert_eq!(sent[0].body["score"], 50);
    assert_eq!(sent[0].body["correct_answers"], 1);
    assert_eq!(sent[0].body["total_questions"], 2);
    assert!(sent[0].authorization.is_some());
}

/// Tests that calculation answers typed as text score as integers.
#[tokio::test]
async fn test_calculation_exercise_accepts_text_input() {
    let (identity, _dir) = signed_in(Backend::default()).await;
    let exercise = BrainTraining::new(identity.api())
        .exercise("calc-1")
        .await
        .expect("Failed to fetch exercise")
        .expect("Exercise should exist");

    let kind = exercise.kind();
    let (tx, rx) = mpsc::channel(1);
    let run = tokio::spawn(ExerciseRunner::new(exercise).run(rx, |_| {}));
    tx.send(Answer::from_input(kind, " 12 ")).await.expect("send");

    let result = run.await.expect("Runner panicked").expect("Attempt should complete");
    assert_eq!(result.score, 100);
}

/// Tests reading aggregate training progress.
#[tokio::test]
async fn test_training_progress() {
    let (identity, _dir) = signed_in(Backend::default()).await;
    let progress = BrainTraining::new(identity.api()).progress().await;

    assert_eq!(progress.total_exercises, 4);
    assert_eq!(progress.total_points, 40);
    assert_eq!(progress.by_category.len(), 2);
}

// ============================================================================
// Read-only views
// ============================================================================

/// Tests that the dashboard renders the server's data.
#[tokio::test]
async fn test_dashboard_loads() {
    let (identity, _dir) = signed_in(Backend::default()).await;
    let data = Dashboard::new(identity.api()).load().await;

    assert_eq!(data.stats["journal_entries"], 2);
    assert_eq!(data.recent_journals.len(), 2);
    assert_eq!(data.life_skills[0].task_name, "Meal Planning");
}

/// Tests that a failing dashboard fetch yields empty data instead of an error.
#[tokio::test]
async fn test_dashboard_defaults_on_failure() {
    let backend = Backend {
        dashboard_fails: true,
        ..Backend::default()
    };
    let (identity, _dir) = signed_in(backend).await;
    let data = Dashboard::new(identity.api()).load().await;

    assert!(data.user.is_none());
    assert!(data.stats.is_empty());
    assert!(data.life_skills.is_empty());
}

/// Tests pathway listing and module ordering.
#[tokio::test]
async fn test_pathways_and_modules() {
    let (identity, _dir) = signed_in(Backend::default()).await;
    let pathways = Pathways::new(identity.api());

    let list = pathways.list().await.expect("Failed to list pathways");
    assert_eq!(list[0].name, "Electrical");

    let modules = pathways
        .modules("electrical")
        .await
        .expect("Failed to list modules");
    let titles: Vec<&str> = modules.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Safety", "Circuits"]);
}

/// Tests listing chat rooms and capacity.
#[tokio::test]
async fn test_chat_room_listing() {
    let (identity, _dir) = signed_in(Backend::default()).await;
    let rooms = ChatRooms::new(identity.api())
        .list()
        .await
        .expect("Failed to list rooms");

    assert_eq!(rooms.len(), 2);
    assert!(rooms[0].is_full());
    assert!(!rooms[1].is_full());
}

// ============================================================================
// Survey
// ============================================================================

/// Tests that remote survey questions are used when available.
#[tokio::test]
async fn test_survey_uses_remote_questions() {
    let (identity, _dir) = signed_in(Backend::default()).await;
    let questions = Survey::new(identity.api(), std::time::Duration::from_millis(500))
        .questions()
        .await;

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].id, "remote_q");
}

/// Tests the static fallback when the survey endpoint errors.
#[tokio::test]
async fn test_survey_falls_back_on_error() {
    let backend = Backend {
        survey: SurveyMode::Fail,
        ..Backend::default()
    };
    let (identity, _dir) = signed_in(backend).await;
    let questions = Survey::new(identity.api(), std::time::Duration::from_millis(500))
        .questions()
        .await;

    assert_eq!(questions, static_questions());
}

/// Tests the static fallback when the survey endpoint is too slow.
#[tokio::test]
async fn test_survey_falls_back_on_timeout() {
    let backend = Backend {
        survey: SurveyMode::Slow,
        ..Backend::default()
    };
    let (identity, _dir) = signed_in(backend).await;

    let started = tokio::time::Instant::now();
    let questions = Survey::new(identity.api(), std::time::Duration::from_millis(200))
        .questions()
        .await;

    assert_eq!(questions, static_questions());
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}

// ============================================================================
// Forms
// ============================================================================

/// Tests the student log endpoints and their payloads.
#[tokio::test]
async fn test_student_log_forms() {
    let backend = Backend::default();
    let (identity, _dir) = signed_in(backend.clone()).await;
    let log = StudentLog::new(identity.api());

    log.journal(&JournalEntry {
        mood_rating: 8,
        content: "Had a productive day working on math problems.".to_string(),
        tags: vec!["productive".to_string(), "math".to_string()],
    })
    .await
    .expect("Journal failed");

    log.nutrition(&NutritionLog {
        meal_type: "lunch".to_string(),
        foods: vec!["Grilled chicken salad".to_string(), "Apple".to_string()],
        calories: Some(450),
        notes: String::new(),
    })
    .await
    .expect("Nutrition failed");

    log.life_skill(&LifeSkillTask {
        skill_category: "home_economics".to_string(),
        task_name: "Meal Planning and Budgeting".to_string(),
        description: "Plan weekly meals within a budget".to_string(),
        notes: String::new(),
    })
    .await
    .expect("Life skill failed");

    log.complete_life_skill("ls-1")
        .await
        .expect("Complete failed");

    log.progress(&ProgressEntry {
        category: "academic".to_string(),
        entry_type: "module_completion".to_string(),
        title: "Advanced Mathematics Module".to_string(),
        description: "Completed calculus fundamentals".to_string(),
        value: serde_json::json!({ "score": 92 }),
    })
    .await
    .expect("Progress failed");

    let journal = backend.requests_to("/student/journal").await;
    assert_eq!(journal[0].body["mood_rating"], 8);
    assert_eq!(journal[0].body["tags"][1], "math");

    let nutrition = backend.requests_to("/student/nutrition").await;
    assert_eq!(nutrition[0].body["calories"], 450);

    assert_eq!(backend.requests_to("/student/life-skills").await.len(), 1);

    let complete = backend
        .requests_to("/student/life-skills/ls-1/complete")
        .await;
    assert_eq!(complete[0].method, axum::http::Method::PUT);

    let progress = backend.requests_to("/student/progress").await;
    assert_eq!(progress[0].body["type"], "module_completion");
}

/// Tests that incomplete forms are rejected before anything is sent.
#[tokio::test]
async fn test_incomplete_forms_are_not_sent() {
    let backend = Backend::default();
    let (identity, _dir) = signed_in(backend.clone()).await;

    let err = StudentLog::new(identity.api())
        .nutrition(&NutritionLog {
            meal_type: "dinner".to_string(),
            ..NutritionLog::default()
        })
        .await
        .expect_err("Nutrition should be rejected");
    assert!(matches!(err, BalanceedError::MissingFields { .. }));

    let err = Contact::new(identity.api())
        .send(&ContactForm {
            name: "Ada".to_string(),
            ..ContactForm::default()
        })
        .await
        .expect_err("Contact should be rejected");
    assert!(err.to_string().contains("email, subject, message"));

    assert!(backend.requests_to("/student/nutrition").await.is_empty());
    assert!(backend.requests_to("/contact").await.is_empty());
}

/// Tests the public donation and contact pages.
#[tokio::test]
async fn test_donation_and_contact() {
    let backend = Backend::default();
    let url = spawn_backend(backend.clone()).await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let identity =
        Identity::from_config(&config_for(&url, dir.path())).expect("Failed to build identity");

    Donations::new(identity.api())
        .donate(&DonationForm {
            name: "Grace".to_string(),
            email: "grace@example.org".to_string(),
            amount_cents: 2_500,
            recurring: true,
            message: String::new(),
        })
        .await
        .expect("Donation failed");

    Contact::new(identity.api())
        .send(&ContactForm {
            name: "Grace".to_string(),
            email: "grace@example.org".to_string(),
            subject: "Volunteering".to_string(),
            message: "How can I mentor?".to_string(),
        })
        .await
        .expect("Contact failed");

    let donation = backend.requests_to("/donations").await;
    assert_eq!(donation[0].body["amount_cents"], 2_500);
    assert!(donation[0].authorization.is_none());
    assert_eq!(backend.requests_to("/contact").await.len(), 1);
}
