//! Exercise attempt state machine and its timer-driven runner.
//!
//! An [`Attempt`] moves from `Running` to `Completed` exactly once:
//! - `tick` counts the time budget down; reaching zero completes the attempt
//!   with whatever answers were collected.
//! - `submit` appends an answer and advances the cursor, completing on the
//!   last question.
//! - `finish` forces completion and only yields a result the first time.
//!
//! [`ExerciseRunner`] drives an attempt on the tokio runtime, serialising a
//! one-second interval and an answer channel with `tokio::select!`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{BalanceedError, Result};
use crate::exercise::{Answer, Exercise};
use crate::scoring::{score, ExerciseResult};

// ============================================================================
// AttemptStatus
// ============================================================================

/// Lifecycle status of an attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Questions are being answered and the clock is running.
    #[default]
    Running,
    /// The attempt has been scored. Terminal.
    Completed,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Point-in-time view of an attempt, published while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSnapshot {
    /// Index of the question currently shown.
    pub question_index: usize,
    /// Seconds left in the budget.
    pub time_remaining: u32,
    /// Number of answers collected so far.
    pub answered: usize,
    /// Current status.
    pub status: AttemptStatus,
}

// ============================================================================
// Attempt
// ============================================================================

/// One run of a single exercise.
#[derive(Debug, Clone)]
pub struct Attempt {
    exercise: Exercise,
    question_index: usize,
    answers: Vec<Answer>,
    time_remaining: u32,
    status: AttemptStatus,
    result: Option<ExerciseResult>,
}

impl Attempt {
    /// Starts a new attempt at question 0 with the full time budget.
    #[must_use]
    pub fn new(exercise: Exercise) -> Self {
        let time_remaining = exercise.time_limit;
        Self {
            exercise,
            question_index: 0,
            answers: Vec::new(),
            time_remaining,
            status: AttemptStatus::Running,
            result: None,
        }
    }

    /// The exercise being attempted.
    #[must_use]
    pub const fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    /// Index of the current question.
    #[must_use]
    pub const fn question_index(&self) -> usize {
        self.question_index
    }

    /// Answers collected so far, index-aligned with the questions.
    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Seconds left in the budget.
    #[must_use]
    pub const fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    /// Seconds spent so far.
    #[must_use]
    pub const fn elapsed(&self) -> u32 {
        self.exercise.time_limit.saturating_sub(self.time_remaining)
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> AttemptStatus {
        self.status
    }

    /// Returns `true` once the attempt has been scored.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, AttemptStatus::Completed)
    }

    /// The result, once completed.
    #[must_use]
    pub const fn result(&self) -> Option<&ExerciseResult> {
        self.result.as_ref()
    }

    /// Returns a snapshot of the current progress.
    #[must_use]
    pub fn snapshot(&self) -> AttemptSnapshot {
        AttemptSnapshot {
            question_index: self.question_index,
            time_remaining: self.time_remaining,
            answered: self.answers.len(),
            status: self.status,
        }
    }

    /// Advances the clock by one second.
    ///
    /// Returns the result if this tick exhausted the budget. Ticks after
    /// completion do nothing.
    pub fn tick(&mut self) -> Option<ExerciseResult> {
        if self.is_completed() {
            return None;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            debug!(exercise_id = %self.exercise.id, "Time budget exhausted");
            return self.finish();
        }
        None
    }

    /// Records an answer for the current question.
    ///
    /// Returns the result if this was the last question.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::AttemptCompleted` if the attempt is already
    /// scored; the answer is not recorded.
    pub fn submit(&mut self, answer: Answer) -> Result<Option<ExerciseResult>> {
        if self.is_completed() || self.answers.len() >= self.exercise.question_count() {
            return Err(BalanceedError::attempt_completed(&self.exercise.id));
        }

        self.answers.push(answer);
        if self.question_index + 1 < self.exercise.question_count() {
            self.question_index += 1;
            Ok(None)
        } else {
            Ok(self.finish())
        }
    }

    /// Forces completion and scores the collected answers.
    ///
    /// Returns `Some` only on the first call; later calls return `None` so a
    /// result is never produced twice.
    pub fn finish(&mut self) -> Option<ExerciseResult> {
        if self.is_completed() {
            return None;
        }
        let result = score(&self.exercise, &self.answers, self.elapsed());
        self.status = AttemptStatus::Completed;
        self.result = Some(result.clone());
        info!(
            exercise_id = %result.exercise_id,
            score = result.score,
            correct = result.correct_answers,
            total = result.total_questions,
            "Attempt completed"
        );
        Some(result)
    }
}

// ============================================================================
// ExerciseRunner
// ============================================================================

/// Default tick period of the exercise clock.
const TICK: Duration = Duration::from_secs(1);

/// Drives an [`Attempt`] to completion on the tokio runtime.
///
/// # Example
///
/// ```no_run
/// use balanceed_core::{Answer, Exercise, ExerciseRunner};
/// use tokio::sync::mpsc;
///
/// # async fn example(exercise: Exercise) {
/// let (tx, rx) = mpsc::channel(8);
/// let runner = ExerciseRunner::new(exercise);
/// let task = tokio::spawn(runner.run(rx, |result| println!("{result}")));
///
/// tx.send(Answer::Choice(1)).await.ok();
/// let result = task.await.ok().flatten();
/// # }
/// ```
#[derive(Debug)]
pub struct ExerciseRunner {
    attempt: Attempt,
    snapshots: watch::Sender<AttemptSnapshot>,
}

impl ExerciseRunner {
    /// Creates a runner for a fresh attempt at `exercise`.
    #[must_use]
    pub fn new(exercise: Exercise) -> Self {
        let attempt = Attempt::new(exercise);
        let (snapshots, _) = watch::channel(attempt.snapshot());
        Self { attempt, snapshots }
    }

    /// Subscribes to progress snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AttemptSnapshot> {
        self.snapshots.subscribe()
    }

    /// Runs the attempt until it completes or is abandoned.
    ///
    /// `on_complete` is called exactly once with the result when the last
    /// question is answered or the time budget runs out; the clock stops at
    /// that point. If every answer sender is dropped first, the attempt is
    /// abandoned: the callback is not called and `None` is returned. Answers
    /// arriving after completion are never read.
    pub async fn run<F>(mut self, mut answers: mpsc::Receiver<Answer>, on_complete: F) -> Option<ExerciseResult>
    where
        F: FnOnce(&ExerciseResult),
    {
        info!(
            exercise_id = %self.attempt.exercise().id,
            questions = self.attempt.exercise().question_count(),
            time_limit = self.attempt.exercise().time_limit,
            "Starting exercise attempt"
        );

        let immediate = if self.attempt.exercise().question_count() == 0
            || self.attempt.time_remaining() == 0
        {
            self.attempt.finish()
        } else {
            None
        };

        let result = match immediate {
            Some(result) => result,
            None => self.drive(&mut answers).await?,
        };

        self.publish();
        on_complete(&result);
        Some(result)
    }

    async fn drive(&mut self, answers: &mut mpsc::Receiver<Answer>) -> Option<ExerciseResult> {
        let mut clock = interval(TICK);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        clock.tick().await;

        loop {
            tokio::select! {
                biased;

                answer = answers.recv() => {
                    let Some(answer) = answer else {
                        debug!(exercise_id = %self.attempt.exercise().id, "Attempt abandoned");
                        return None;
                    };
                    match self.attempt.submit(answer) {
                        Ok(Some(result)) => return Some(result),
                        Ok(None) => self.publish(),
                        Err(e) => debug!(error = %e, "Ignoring answer"),
                    }
                }

                _ = clock.tick() => {
                    if let Some(result) = self.attempt.tick() {
                        return Some(result);
                    }
                    self.publish();
                }
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.attempt.snapshot());
    }
}
