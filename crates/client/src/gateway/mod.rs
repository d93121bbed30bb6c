// Remote API access.
//
// `RemoteApi` is the seam every component talks through. `ApiGateway` is
// the HTTP implementation; tests substitute an in-memory fake.

mod error;
mod http;

use std::future::Future;
use std::path::Path;

use ragdesk_common::protocol::{
    AuthResponse, ChatAnswer, ChatQueryRequest, CreateWorkspaceRequest, LoginRequest,
    RegisterRequest,
};
use ragdesk_common::types::{
    AccountSummary, Document, HealthStatus, QueryLogEntry, Stats, Workspace,
};

pub use error::{extract_detail, ApiError};
pub use http::ApiGateway;

/// A file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { filename: filename.into(), bytes: bytes.into() }
    }

    /// Read a file from disk, keeping only its final path component as the name.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Every call the engine makes against the remote service.
///
/// All methods return `Send` futures so components can drive them from
/// spawned tasks. `token` is the bearer token of the current session.
pub trait RemoteApi: Send + Sync + 'static {
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    fn me(&self, token: &str) -> impl Future<Output = Result<AccountSummary, ApiError>> + Send;

    fn list_workspaces(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Workspace>, ApiError>> + Send;

    fn create_workspace(
        &self,
        token: &str,
        request: &CreateWorkspaceRequest,
    ) -> impl Future<Output = Result<Workspace, ApiError>> + Send;

    fn delete_workspace(
        &self,
        token: &str,
        workspace_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn list_documents(
        &self,
        token: &str,
        workspace_id: &str,
    ) -> impl Future<Output = Result<Vec<Document>, ApiError>> + Send;

    fn upload_document(
        &self,
        token: &str,
        workspace_id: &str,
        file: &UploadFile,
    ) -> impl Future<Output = Result<Document, ApiError>> + Send;

    fn delete_document(
        &self,
        token: &str,
        workspace_id: &str,
        doc_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn query(
        &self,
        token: &str,
        workspace_id: &str,
        request: &ChatQueryRequest,
    ) -> impl Future<Output = Result<ChatAnswer, ApiError>> + Send;

    fn chat_history(
        &self,
        token: &str,
        workspace_id: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<QueryLogEntry>, ApiError>> + Send;

    fn stats(&self, token: &str) -> impl Future<Output = Result<Stats, ApiError>> + Send;

    fn health(&self) -> impl Future<Output = Result<HealthStatus, ApiError>> + Send;
}
