//! Documents exchanged with the platform API.
//!
//! Response types are lenient: anything the client does not strictly need
//! carries `#[serde(default)]` so a partial document still renders.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Users and authentication
// ============================================================================

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role, e.g. `student` or `mentor`.
    #[serde(default)]
    pub role: String,
    /// Institution the user belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Successful response of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer credential for later requests.
    pub access_token: String,
    /// Profile of the authenticated user.
    pub user: User,
}

/// Response of `POST /demo/setup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoSetup {
    /// Human-readable status.
    #[serde(default)]
    pub message: String,
    /// Profile of the provisioned demo student, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_user: Option<serde_json::Value>,
}

// ============================================================================
// Brain training
// ============================================================================

/// Aggregate brain-training progress from `GET /brain-training/progress`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgress {
    /// Number of exercises completed.
    #[serde(default)]
    pub total_exercises: u32,
    /// Mean score across completed exercises.
    #[serde(default)]
    pub average_score: f64,
    /// Points earned.
    #[serde(default)]
    pub total_points: u32,
    /// Average score per category.
    #[serde(default)]
    pub by_category: BTreeMap<String, f64>,
}

// ============================================================================
// Trades
// ============================================================================

/// A trade-learning pathway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway {
    /// Pathway identifier.
    pub id: String,
    /// Pathway name, e.g. "Electrical".
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Trade category.
    #[serde(default)]
    pub category: String,
    /// Estimated duration, as displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// One module of a pathway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeModule {
    /// Module identifier.
    pub id: String,
    /// Module title.
    pub title: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Position within the pathway.
    #[serde(default)]
    pub order: u32,
    /// Estimated minutes to complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

// ============================================================================
// Chat
// ============================================================================

/// A chat room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    /// Room identifier.
    pub id: String,
    /// Room name.
    pub name: String,
    /// Topic line.
    #[serde(default)]
    pub topic: String,
    /// Room category.
    #[serde(default)]
    pub category: String,
    /// Member user ids.
    #[serde(default)]
    pub participants: Vec<String>,
    /// Capacity.
    #[serde(default)]
    pub max_participants: u32,
}

impl ChatRoom {
    /// Returns `true` if the room has reached capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.max_participants > 0 && self.participants.len() >= self.max_participants as usize
    }
}

/// Body of `POST /chat/rooms`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewChatRoom {
    /// Room name.
    pub name: String,
    /// Topic line.
    pub topic: String,
    /// Room category.
    pub category: String,
    /// Capacity.
    pub max_participants: u32,
}

/// A chat message, both as a realtime frame and as a history entry.
///
/// Realtime frames carry exactly `user_id`, `username` and `message`;
/// history documents may also carry a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender id.
    pub user_id: String,
    /// Sender display name.
    pub username: String,
    /// Message body.
    pub message: String,
    /// Server timestamp, present on history entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================================================
// Dashboard
// ============================================================================

/// Response of `GET /student/dashboard`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardData {
    /// Profile, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Named counters such as `total_progress_entries`.
    #[serde(default)]
    pub stats: BTreeMap<String, serde_json::Value>,
    /// Latest progress entries.
    #[serde(default)]
    pub recent_progress: Vec<serde_json::Value>,
    /// Latest journal entries.
    #[serde(default)]
    pub recent_journals: Vec<serde_json::Value>,
    /// Latest nutrition logs.
    #[serde(default)]
    pub recent_nutrition: Vec<serde_json::Value>,
    /// Life-skill tasks.
    #[serde(default)]
    pub life_skills: Vec<LifeSkill>,
}

/// A life-skill task as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSkill {
    /// Task identifier.
    pub id: String,
    /// Category, e.g. `home_economics`.
    #[serde(default)]
    pub skill_category: String,
    /// Task name.
    #[serde(default)]
    pub task_name: String,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
}
