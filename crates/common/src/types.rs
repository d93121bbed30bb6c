// Core domain types shared across all ragdesk crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp::{self, null_as_default};

/// Profile of the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(alias = "user_id")]
    pub id: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
}

/// A workspace is a named collection of documents with its own chat context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Number of documents that finished indexing.
    #[serde(default, deserialize_with = "null_as_default")]
    pub doc_count: u64,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Indexing lifecycle of an uploaded document.
///
/// `uploading` is a client-side state: the server only ever reports
/// `processing`, `ready` or `error`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

impl DocumentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Whether a document currently in `self` may be observed in `next`.
    ///
    /// Terminal states never go back to `uploading` or `processing`, and
    /// `processing` never goes back to `uploading`.
    pub const fn can_transition_to(self, next: DocumentStatus) -> bool {
        match (self, next) {
            (Self::Uploading, _) => true,
            (Self::Processing, Self::Uploading) => false,
            (Self::Processing, _) => true,
            (Self::Ready | Self::Error, next) => next.is_terminal(),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document within a workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunk_count: u64,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn is_processing(&self) -> bool {
        self.status == DocumentStatus::Processing
    }

    pub fn is_ready(&self) -> bool {
        self.status == DocumentStatus::Ready
    }

    /// Human-readable size, e.g. `12.5KB`. Empty when the size is unknown.
    pub fn size_label(&self) -> String {
        match self.file_size {
            Some(bytes) if bytes > 0 => format!("{:.1}KB", bytes as f64 / 1024.0),
            _ => String::new(),
        }
    }
}

/// A citation attached to an assistant answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    /// Relevance score reported by retrieval; higher is closer.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub preview: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    Error,
}

/// One entry of a chat transcript. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into(), sources: Vec::new(), duration_ms: None }
    }

    pub fn assistant(
        content: impl Into<String>,
        sources: Vec<Source>,
        duration_ms: Option<f64>,
    ) -> Self {
        Self { role: ChatRole::Assistant, content: content.into(), sources, duration_ms }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Error, content: content.into(), sources: Vec::new(), duration_ms: None }
    }
}

/// Per-user usage overview.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Stats {
    pub total_workspaces: u64,
    pub total_docs: u64,
    pub total_queries: u64,
    pub avg_duration_ms: f64,
    pub recent_queries: Vec<RecentQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentQuery {
    pub query: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A past query in a workspace, as recorded by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryLogEntry {
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources_count: u64,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Extended profile returned by `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_queries: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_docs: u64,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, with = "timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_transitions_are_monotonic() {
        use DocumentStatus::*;

        assert!(Uploading.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Ready));
        assert!(Processing.can_transition_to(Error));
        assert!(Processing.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Uploading));
        for terminal in [Ready, Error] {
            assert!(!terminal.can_transition_to(Processing));
            assert!(!terminal.can_transition_to(Uploading));
            assert!(terminal.can_transition_to(terminal));
        }
    }

    #[test]
    fn document_decodes_server_listing_row() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d1",
            "filename": "guide.pdf",
            "file_type": "pdf",
            "file_size": 12800,
            "chunk_count": null,
            "status": "processing",
            "error_message": null,
            "created_at": "2025-03-01T10:15:30.123456"
        }))
        .unwrap();

        assert!(doc.is_processing());
        assert_eq!(doc.chunk_count, 0);
        assert_eq!(doc.size_label(), "12.5KB");
        assert!(doc.created_at.is_some());
    }

    #[test]
    fn upload_receipt_decodes_as_document() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d2",
            "filename": "notes.md",
            "status": "processing",
            "created_at": "2025-03-01T10:15:30Z"
        }))
        .unwrap();

        assert_eq!(doc.file_size, None);
        assert_eq!(doc.size_label(), "");
    }

    #[test]
    fn user_profile_accepts_user_id_alias() {
        let user: UserProfile = serde_json::from_value(json!({
            "user_id": "u1",
            "email": "a@example.com",
            "full_name": null
        }))
        .unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(user.full_name, "");
    }

    #[test]
    fn chat_message_omits_empty_sources() {
        let value = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(value, json!({ "role": "user", "content": "hi" }));
    }

    #[test]
    fn stats_tolerates_missing_fields() {
        let stats: Stats = serde_json::from_value(json!({ "total_queries": 4 })).unwrap();
        assert_eq!(stats.total_queries, 4);
        assert!(stats.recent_queries.is_empty());
    }
}
