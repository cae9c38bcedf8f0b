//! DTOs for the backend's auth and integration-task endpoints.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently so
//! the integration tests catch drift between the two crates. Fields the
//! backend adds over time are ignored on decode; the generic façade calls
//! return `serde_json::Value` and these types are opt-in via
//! [`crate::Payload::into_json`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Body of `POST auth/login/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST auth/register/`. `password2` must repeat `password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Successful login or registration. `user` is passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub tokens: AuthTokens,
    #[serde(default)]
    pub user: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    AToB,
    BToA,
    Bidirectional,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// An external system a task synchronizes (`system-a` / `system-b`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct System {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// An integration task as returned by `tasks/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_a: Uuid,
    pub system_b: Uuid,
    pub direction: Direction,
    pub status: TaskStatus,
    #[serde(default)]
    pub schedule_enabled: bool,
    #[serde(default)]
    pub schedule_interval: Option<u32>,
    pub created_at: String,
}

/// Request payload for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_a: Uuid,
    pub system_b: Uuid,
    pub direction: Direction,
    #[serde(default)]
    pub schedule_enabled: bool,
    /// Minutes between scheduled runs.
    pub schedule_interval: Option<u32>,
}
