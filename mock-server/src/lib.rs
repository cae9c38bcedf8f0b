use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "demo-pass";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct System {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub system_a: Uuid,
    pub system_b: Uuid,
    pub direction: String,
    pub status: String,
    pub schedule_enabled: bool,
    pub schedule_interval: Option<u32>,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub role: String,
    pub parent_email: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_a: Uuid,
    pub system_b: Uuid,
    pub direction: String,
    #[serde(default)]
    pub schedule_enabled: bool,
    pub schedule_interval: Option<u32>,
}

#[derive(Default)]
pub struct Backend {
    pub users: HashMap<String, User>,
    pub sessions: HashMap<String, String>,
    pub systems_a: Vec<System>,
    pub systems_b: Vec<System>,
    pub tasks: Vec<Task>,
    pub courses: Vec<Value>,
}

/// Shared backend state. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct AppState {
    inner: Arc<RwLock<Backend>>,
}

impl AppState {
    /// A demo user, two systems on each side, one course, no tasks.
    pub fn seeded() -> Self {
        let mut backend = Backend::default();
        backend.users.insert(
            DEMO_USERNAME.to_string(),
            User {
                id: 1,
                username: DEMO_USERNAME.to_string(),
                email: "demo@example.com".to_string(),
                role: "instructor".to_string(),
                password: DEMO_PASSWORD.to_string(),
            },
        );
        for (side, list) in [("A", &mut backend.systems_a), ("B", &mut backend.systems_b)] {
            for n in 1..=2 {
                list.push(System {
                    id: Uuid::new_v4(),
                    name: format!("System {side}{n}"),
                    description: String::new(),
                });
            }
        }
        backend.courses.push(json!({"id": 1, "title": "Intro to Rust", "lessons": 12}));
        Self {
            inner: Arc::new(RwLock::new(backend)),
        }
    }

    /// Invalidates every issued access token.
    pub async fn revoke_sessions(&self) {
        self.inner.write().await.sessions.clear();
    }

    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Id of the first system on side A and on side B.
    pub async fn first_systems(&self) -> Option<(Uuid, Uuid)> {
        let backend = self.inner.read().await;
        Some((backend.systems_a.first()?.id, backend.systems_b.first()?.id))
    }
}

pub fn app() -> Router {
    app_with_state(AppState::seeded())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/api/health/", get(health))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/register/", post(register))
        .route("/api/tasks/", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}/", get(get_task))
        .route("/api/system-a/", get(list_systems_a))
        .route("/api/system-b/", get(list_systems_b))
        .route("/api/courses/", get(list_courses))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn unauthorized(detail: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response()
}

/// Resolves the bearer token in `headers` to a username.
async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String, Response> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Authentication credentials were not provided."))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Authorization header must use the Bearer scheme."))?;
    let username = state.inner.read().await.sessions.get(token).cloned();
    username.ok_or_else(|| {
        tracing::debug!("rejected unknown bearer token");
        unauthorized("Given token not valid for any token type")
    })
}

async fn issue_tokens(state: &AppState, user: &User) -> Value {
    let access = Uuid::new_v4().to_string();
    let refresh = Uuid::new_v4().to_string();
    state
        .inner
        .write()
        .await
        .sessions
        .insert(access.clone(), user.username.clone());
    json!({
        "user": user,
        "tokens": { "access": access, "refresh": refresh },
    })
}

async fn health() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "ok")
}

async fn login(State(state): State<AppState>, Json(input): Json<LoginInput>) -> Response {
    let user = state.inner.read().await.users.get(&input.username).cloned();
    match user {
        Some(user) if user.password == input.password => {
            tracing::info!(username = %user.username, "login accepted");
            Json(issue_tokens(&state, &user).await).into_response()
        }
        _ => {
            tracing::info!(username = %input.username, "login rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response()
        }
    }
}

async fn register(State(state): State<AppState>, Json(input): Json<RegisterInput>) -> Response {
    if input.password != input.password2 {
        return bad_request(json!({ "password": ["Passwords do not match."] }));
    }
    if input.role == "student" && input.parent_email.is_none() {
        return bad_request(json!({ "parent_email": ["Required for students."] }));
    }

    let user = {
        let mut backend = state.inner.write().await;
        if backend.users.contains_key(&input.username) {
            return bad_request(json!({ "username": ["A user with that username already exists."] }));
        }
        let user = User {
            id: backend.users.len() as u32 + 1,
            username: input.username.clone(),
            email: input.email,
            role: input.role,
            password: input.password,
        };
        backend.users.insert(input.username, user.clone());
        user
    };
    (StatusCode::CREATED, Json(issue_tokens(&state, &user).await)).into_response()
}

fn bad_request(errors: Value) -> Response {
    (StatusCode::BAD_REQUEST, Json(errors)).into_response()
}

async fn list_tasks(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    Json(state.inner.read().await.tasks.clone()).into_response()
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateTask>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    if !matches!(input.direction.as_str(), "a_to_b" | "b_to_a" | "bidirectional") {
        return bad_request(json!({ "direction": ["Not a valid choice."] }));
    }

    let mut backend = state.inner.write().await;
    if !backend.systems_a.iter().any(|s| s.id == input.system_a) {
        return bad_request(json!({ "system_a": ["Object does not exist."] }));
    }
    if !backend.systems_b.iter().any(|s| s.id == input.system_b) {
        return bad_request(json!({ "system_b": ["Object does not exist."] }));
    }
    let task = Task {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
        system_a: input.system_a,
        system_b: input.system_b,
        direction: input.direction,
        status: "pending".to_string(),
        schedule_enabled: input.schedule_enabled,
        schedule_interval: input.schedule_interval,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    // Newest first.
    backend.tasks.insert(0, task.clone());
    (StatusCode::CREATED, Json(task)).into_response()
}

async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    let backend = state.inner.read().await;
    match backend.tasks.iter().find(|t| t.id == id) {
        Some(task) => Json(task.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

fn envelope(items: &[System]) -> Value {
    json!({
        "count": items.len(),
        "next": null,
        "previous": null,
        "results": items,
    })
}

async fn list_systems_a(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    Json(envelope(&state.inner.read().await.systems_a)).into_response()
}

async fn list_systems_b(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    Json(envelope(&state.inner.read().await.systems_b)).into_response()
}

async fn list_courses(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    Json(state.inner.read().await.courses.clone()).into_response()
}
