// Request/response bodies and route paths of the remote API.

use serde::{Deserialize, Serialize};

use crate::types::{Source, UserProfile};

// ── Routes ─────────────────────────────────────────────────────────

/// Endpoint paths as segment lists, relative to the API base URL.
///
/// Identifiers are passed through unescaped; the gateway percent-encodes
/// each segment when it joins them onto the base. A trailing empty segment
/// keeps the trailing slash the server routes expect.
pub mod routes {
    pub const LOGIN: &[&str] = &["auth", "login"];
    pub const REGISTER: &[&str] = &["auth", "register"];
    pub const ME: &[&str] = &["auth", "me"];
    pub const WORKSPACES: &[&str] = &["workspaces", ""];
    pub const STATS: &[&str] = &["stats", ""];
    pub const HEALTH: &[&str] = &["health"];

    pub fn workspace(workspace_id: &str) -> [&str; 2] {
        ["workspaces", workspace_id]
    }

    pub fn documents(workspace_id: &str) -> [&str; 2] {
        ["documents", workspace_id]
    }

    pub fn upload(workspace_id: &str) -> [&str; 3] {
        ["documents", workspace_id, "upload"]
    }

    pub fn document<'a>(workspace_id: &'a str, doc_id: &'a str) -> [&'a str; 3] {
        ["documents", workspace_id, doc_id]
    }

    pub fn chat(workspace_id: &str) -> [&str; 2] {
        ["chat", workspace_id]
    }

    pub fn chat_history(workspace_id: &str) -> [&str; 3] {
        ["chat", workspace_id, "history"]
    }
}

/// Multipart field name carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

// ── Auth ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Response of both login and register.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(flatten)]
    pub user: UserProfile,
}

// ── Workspaces ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Body returned by delete endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteAck {
    #[serde(default)]
    pub deleted: bool,
}

// ── Chat ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatQueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatAnswer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
}
