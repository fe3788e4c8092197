//! In-process mock of the platform API used by the integration tests.
//!
//! The mock records every request it serves so tests can assert on paths,
//! bodies and the bearer credential, and it can be switched into failure
//! modes (failing demo cleanup, failing dashboard, slow or broken survey).

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use balanceed_core::Config;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{broadcast, Mutex};

/// Email of the seeded demo student.
pub const DEMO_EMAIL: &str = "student@demo.com";
/// Password of the seeded demo student.
pub const DEMO_PASSWORD: &str = "demo123";
/// Credential the mock hands out for the demo student.
pub const DEMO_TOKEN: &str = "token-student@demo.com";

/// How the survey endpoint behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SurveyMode {
    /// Returns one remote question.
    #[default]
    Ok,
    /// Returns HTTP 500.
    Fail,
    /// Answers after two seconds.
    Slow,
}

/// A request the mock served.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Shared state of the mock backend.
#[derive(Clone)]
pub struct Backend {
    pub requests: Arc<Mutex<Vec<Recorded>>>,
    pub ws_received: Arc<Mutex<Vec<String>>>,
    pub ws_auth: Arc<Mutex<Vec<Option<String>>>>,
    pub push: broadcast::Sender<String>,
    pub cleanup_fails: bool,
    pub dashboard_fails: bool,
    pub survey: SurveyMode,
}

impl Default for Backend {
    fn default() -> Self {
        let (push, _) = broadcast::channel(16);
        Self {
            requests: Arc::default(),
            ws_received: Arc::default(),
            ws_auth: Arc::default(),
            push,
            cleanup_fails: false,
            dashboard_fails: false,
            survey: SurveyMode::Ok,
        }
    }
}

impl Backend {
    async fn record(&self, method: Method, path: String, headers: &HeaderMap, body: Value) {
        self.requests.lock().await.push(Recorded {
            method,
            path,
            authorization: bearer(headers),
            body,
        });
    }

    /// Requests served so far whose path equals `path`.
    pub async fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Paths served so far, in order.
    pub async fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|r| r.path.clone())
            .collect()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn user_json(email: &str, name: &str) -> Value {
    json!({
        "id": format!("user-{email}"),
        "email": email,
        "name": name,
        "role": "student",
    })
}

// ============================================================================
// Handlers
// ============================================================================

async fn login(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    backend
        .record(Method::POST, "/auth/login".to_string(), &headers, body.clone())
        .await;

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (email, password) {
        (DEMO_EMAIL, DEMO_PASSWORD) => Json(json!({
            "access_token": DEMO_TOKEN,
            "token_type": "bearer",
            "user": user_json(DEMO_EMAIL, "Demo Student"),
        }))
        .into_response(),
        ("broken@example.org", _) => Json(json!({ "token_type": "bearer" })).into_response(),
        _ => detail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    backend
        .record(Method::POST, "/auth/register".to_string(), &headers, body.clone())
        .await;

    let email = body["email"].as_str().unwrap_or_default().to_string();
    if email == "taken@example.org" {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let name = body["name"].as_str().unwrap_or_default();
    Json(json!({
        "access_token": format!("token-{email}"),
        "token_type": "bearer",
        "user": user_json(&email, name),
    }))
    .into_response()
}

async fn demo_cleanup(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .record(Method::POST, "/demo/cleanup".to_string(), &headers, Value::Null)
        .await;
    if backend.cleanup_fails {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "cleanup exploded");
    }
    Json(json!({ "message": "Demo data cleaned" })).into_response()
}

async fn demo_setup(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .record(Method::POST, "/demo/setup".to_string(), &headers, Value::Null)
        .await;
    Json(json!({
        "message": "Demo data created successfully",
        "demo_user": { "email": DEMO_EMAIL, "password": DEMO_PASSWORD },
    }))
    .into_response()
}

async fn dashboard(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .record(Method::GET, "/student/dashboard".to_string(), &headers, Value::Null)
        .await;
    if bearer(&headers) != Some(format!("Bearer {DEMO_TOKEN}")) {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    if backend.dashboard_fails {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    Json(json!({
        "user": user_json(DEMO_EMAIL, "Demo Student"),
        "stats": { "total_progress_entries": 3, "journal_entries": 2 },
        "recent_progress": [{ "title": "Advanced Mathematics Module" }],
        "recent_journals": [{ "mood_rating": 8 }, { "mood_rating": 6 }],
        "recent_nutrition": [],
        "life_skills": [
            { "id": "ls-1", "skill_category": "home_economics", "task_name": "Meal Planning", "completed": false }
        ],
    }))
    .into_response()
}

async fn exercises(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .record(Method::GET, "/brain-training/exercises".to_string(), &headers, Value::Null)
        .await;
    Json(json!([
        {
            "id": "mc-1",
            "title": "Pattern Logic",
            "category": "logic",
            "type": "multiple_choice",
            "questions": [
                { "question": "2, 4, 8, ?", "options": ["10", "16", "12"], "correct": 1 },
                { "question": "A, C, E, ?", "options": ["G", "F", "H"], "correct": 0 }
            ],
            "time_limit": 60,
            "points": 10
        },
        {
            "id": "calc-1",
            "title": "Quick Sums",
            "category": "math",
            "type": "calculation",
            "problems": [ { "problem": "7+5", "answer": 12 } ],
            "time_limit": 30,
            "points": 5
        }
    ]))
    .into_response()
}

async fn training_progress(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .record(Method::GET, "/brain-training/progress".to_string(), &headers, Value::Null)
        .await;
    Json(json!({
        "total_exercises": 4,
        "average_score": 82.5,
        "total_points": 40,
        "by_category": { "math": 90.0, "logic": 75.0 },
    }))
    .into_response()
}

async fn survey(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .record(Method::GET, "/survey/questions".to_string(), &headers, Value::Null)
        .await;
    match backend.survey {
        SurveyMode::Ok => Json(json!({
            "questions": [
                { "id": "remote_q", "question": "Remote question", "step": 2,
                  "type": "select", "options": ["a", "b"] }
            ]
        }))
        .into_response(),
        SurveyMode::Fail => detail(StatusCode::INTERNAL_SERVER_ERROR, "survey unavailable"),
        SurveyMode::Slow => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!([])).into_response()
        }
    }
}

/// Echoes the posted body back with an id after recording it.
async fn accept(
    State(backend): State<Backend>,
    method: Method,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Response {
    let path = uri.path().trim_start_matches("/api").to_string();
    let body = body.map(|Json(b)| b).unwrap_or(Value::Null);
    backend.record(method, path, &headers, body.clone()).await;
    Json(json!({ "id": "created-1", "message": "ok", "data": body })).into_response()
}

async fn rooms(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .record(Method::GET, "/chat/rooms".to_string(), &headers, Value::Null)
        .await;
    Json(json!([
        { "id": "room-1", "name": "Study Hall", "topic": "Homework help", "category": "academic",
          "participants": ["a", "b"], "max_participants": 2 },
        { "id": "room-2", "name": "Trades Talk", "topic": "Apprenticeships", "category": "trades",
          "participants": [], "max_participants": 20 }
    ]))
    .into_response()
}

async fn history(
    State(backend): State<Backend>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    backend
        .record(Method::GET, format!("/chat/rooms/{room_id}/messages"), &headers, Value::Null)
        .await;
    Json(json!([
        { "user_id": "u-9", "username": "Mentor Maya", "message": "Welcome!",
          "timestamp": chrono::Utc::now().to_rfc3339() }
    ]))
    .into_response()
}

async fn room_socket(
    State(backend): State<Backend>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    backend.ws_auth.lock().await.push(bearer(&headers));
    ws.on_upgrade(move |socket| serve_socket(socket, backend))
}

async fn serve_socket(socket: WebSocket, backend: Backend) {
    let (mut sender, mut receiver) = socket.split();
    let mut pushes = backend.push.subscribe();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => backend.ws_received.lock().await.push(text),
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            frame = pushes.recv() => {
                let Ok(frame) = frame else { break };
                if sender.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

fn router(backend: Backend) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/demo/cleanup", post(demo_cleanup))
        .route("/demo/setup", post(demo_setup))
        .route("/student/dashboard", get(dashboard))
        .route("/student/journal", post(accept))
        .route("/student/nutrition", post(accept))
        .route("/student/life-skills", post(accept))
        .route("/student/life-skills/:id/complete", put(accept))
        .route("/student/progress", post(accept))
        .route("/brain-training/exercises", get(exercises))
        .route("/brain-training/progress", get(training_progress))
        .route("/brain-training/submit-result", post(accept))
        .route("/trades/pathways", get(|| async {
            Json(json!([
                { "id": "electrical", "name": "Electrical", "description": "Wiring basics",
                  "category": "construction" }
            ]))
        }))
        .route("/trades/:id/modules", get(|| async {
            Json(json!([
                { "id": "m2", "title": "Circuits", "order": 2 },
                { "id": "m1", "title": "Safety", "order": 1, "duration_minutes": 30 }
            ]))
        }))
        .route("/chat/rooms", get(rooms).post(accept))
        .route("/chat/rooms/:id/join", post(accept))
        .route("/chat/rooms/:id/messages", get(history))
        .route("/chat/rooms/:id/ws", get(room_socket))
        .route("/survey/questions", get(survey))
        .route("/donations", post(accept))
        .route("/contact", post(accept));

    Router::new().nest("/api", api).with_state(backend)
}

/// Spawns the mock backend and returns its API base URL.
pub async fn spawn_backend(backend: Backend) -> String {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    let app = router(backend);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://{addr}/api")
}

/// Client configuration pointed at `api_base_url`, persisting under `session_dir`.
pub fn config_for(api_base_url: &str, session_dir: &std::path::Path) -> Config {
    Config {
        api_base_url: api_base_url.to_string(),
        session_dir: session_dir.to_string_lossy().into_owned(),
        request_timeout_secs: 5,
        survey_timeout_ms: 300,
        ..Config::default()
    }
}

/// Polls `check` until it holds or five seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
