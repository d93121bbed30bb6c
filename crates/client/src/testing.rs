// In-memory `RemoteApi` for component tests.
//
// Each endpoint has a response queue. The last queued response repeats
// once the queue is down to one entry, so a test can script "fail once,
// then succeed forever" with two pushes. Gates let a test hold a call
// in flight until it releases a permit.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;

use ragdesk_common::protocol::{
    AuthResponse, ChatAnswer, ChatQueryRequest, CreateWorkspaceRequest, LoginRequest,
    RegisterRequest,
};
use ragdesk_common::types::{
    AccountSummary, Document, DocumentStatus, HealthStatus, QueryLogEntry, Stats, UserProfile,
    Workspace,
};

use crate::gateway::{ApiError, RemoteApi, UploadFile};
use crate::session::SessionContext;

struct Responses<T> {
    queue: VecDeque<Result<T, ApiError>>,
}

impl<T> Default for Responses<T> {
    fn default() -> Self {
        Self { queue: VecDeque::new() }
    }
}

impl<T: Clone> Responses<T> {
    fn push(&mut self, response: Result<T, ApiError>) {
        self.queue.push_back(response);
    }

    fn next(&mut self, endpoint: &str) -> Result<T, ApiError> {
        if self.queue.len() > 1 {
            if let Some(response) = self.queue.pop_front() {
                return response;
            }
        }
        match self.queue.front() {
            Some(response) => response.clone(),
            None => Err(ApiError::Transport(format!("no scripted response for {endpoint}"))),
        }
    }
}

#[derive(Default)]
struct Script {
    auth: Responses<AuthResponse>,
    me: Responses<AccountSummary>,
    workspaces: Responses<Vec<Workspace>>,
    create_workspace: Responses<Workspace>,
    delete_workspace: Responses<()>,
    documents: Responses<Vec<Document>>,
    upload_failures: HashMap<String, ApiError>,
    delete_document: Responses<()>,
    query: Responses<ChatAnswer>,
    history: Responses<Vec<QueryLogEntry>>,
    stats: Responses<Stats>,
    health: Responses<HealthStatus>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
    tokens: Mutex<Vec<String>>,
    auth_gate: Mutex<Option<Arc<Semaphore>>>,
    query_gate: Mutex<Option<Arc<Semaphore>>>,
    listing_gate: Mutex<Option<Arc<Semaphore>>>,
    uploads_in_flight: AtomicUsize,
    max_uploads_in_flight: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // ── Scripting ───────────────────────────────────────────────────

    pub(crate) fn push_auth(&self, response: Result<AuthResponse, ApiError>) {
        lock(&self.script).auth.push(response);
    }

    pub(crate) fn push_me(&self, response: Result<AccountSummary, ApiError>) {
        lock(&self.script).me.push(response);
    }

    pub(crate) fn push_workspaces(&self, response: Result<Vec<Workspace>, ApiError>) {
        lock(&self.script).workspaces.push(response);
    }

    pub(crate) fn push_create_workspace(&self, response: Result<Workspace, ApiError>) {
        lock(&self.script).create_workspace.push(response);
    }

    pub(crate) fn push_delete_workspace(&self, response: Result<(), ApiError>) {
        lock(&self.script).delete_workspace.push(response);
    }

    pub(crate) fn push_documents(&self, response: Result<Vec<Document>, ApiError>) {
        lock(&self.script).documents.push(response);
    }

    pub(crate) fn fail_upload(&self, filename: &str, error: ApiError) {
        lock(&self.script).upload_failures.insert(filename.to_string(), error);
    }

    pub(crate) fn push_delete_document(&self, response: Result<(), ApiError>) {
        lock(&self.script).delete_document.push(response);
    }

    pub(crate) fn push_query(&self, response: Result<ChatAnswer, ApiError>) {
        lock(&self.script).query.push(response);
    }

    pub(crate) fn push_history(&self, response: Result<Vec<QueryLogEntry>, ApiError>) {
        lock(&self.script).history.push(response);
    }

    pub(crate) fn push_stats(&self, response: Result<Stats, ApiError>) {
        lock(&self.script).stats.push(response);
    }

    pub(crate) fn push_health(&self, response: Result<HealthStatus, ApiError>) {
        lock(&self.script).health.push(response);
    }

    // ── Gates ───────────────────────────────────────────────────────

    /// Block login/register until the returned semaphore gets permits.
    pub(crate) fn hold_auth(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.auth_gate) = Some(gate.clone());
        gate
    }

    pub(crate) fn hold_queries(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.query_gate) = Some(gate.clone());
        gate
    }

    pub(crate) fn hold_listings(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.listing_gate) = Some(gate.clone());
        gate
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub(crate) fn count(&self, endpoint: &str) -> usize {
        lock(&self.calls).iter().filter(|call| call.split(':').next() == Some(endpoint)).count()
    }

    pub(crate) fn tokens(&self) -> Vec<String> {
        lock(&self.tokens).clone()
    }

    pub(crate) fn max_concurrent_uploads(&self) -> usize {
        self.max_uploads_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: impl Into<String>, token: Option<&str>) {
        lock(&self.calls).push(call.into());
        if let Some(token) = token {
            lock(&self.tokens).push(token.to_string());
        }
    }

    async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = lock(gate).clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

impl RemoteApi for FakeApi {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.record("login", None);
        Self::pass(&self.auth_gate).await;
        lock(&self.script).auth.next("login")
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.record("register", None);
        Self::pass(&self.auth_gate).await;
        lock(&self.script).auth.next("register")
    }

    async fn me(&self, token: &str) -> Result<AccountSummary, ApiError> {
        self.record("me", Some(token));
        lock(&self.script).me.next("me")
    }

    async fn list_workspaces(&self, token: &str) -> Result<Vec<Workspace>, ApiError> {
        self.record("list_workspaces", Some(token));
        lock(&self.script).workspaces.next("list_workspaces")
    }

    async fn create_workspace(
        &self,
        token: &str,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        self.record(format!("create_workspace:{}", request.name), Some(token));
        lock(&self.script).create_workspace.next("create_workspace")
    }

    async fn delete_workspace(&self, token: &str, workspace_id: &str) -> Result<(), ApiError> {
        self.record(format!("delete_workspace:{workspace_id}"), Some(token));
        lock(&self.script).delete_workspace.next("delete_workspace")
    }

    async fn list_documents(
        &self,
        token: &str,
        _workspace_id: &str,
    ) -> Result<Vec<Document>, ApiError> {
        self.record("list_documents", Some(token));
        let response = lock(&self.script).documents.next("list_documents");
        Self::pass(&self.listing_gate).await;
        response
    }

    async fn upload_document(
        &self,
        token: &str,
        _workspace_id: &str,
        file: &UploadFile,
    ) -> Result<Document, ApiError> {
        self.record(format!("upload:{}", file.filename), Some(token));
        let now = self.uploads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_uploads_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.uploads_in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = lock(&self.script).upload_failures.get(&file.filename).cloned();
        match failure {
            Some(error) => Err(error),
            None => Ok(document(&format!("doc-{}", file.filename), &file.filename, DocumentStatus::Processing)),
        }
    }

    async fn delete_document(
        &self,
        token: &str,
        _workspace_id: &str,
        doc_id: &str,
    ) -> Result<(), ApiError> {
        self.record(format!("delete_document:{doc_id}"), Some(token));
        lock(&self.script).delete_document.next("delete_document")
    }

    async fn query(
        &self,
        token: &str,
        _workspace_id: &str,
        request: &ChatQueryRequest,
    ) -> Result<ChatAnswer, ApiError> {
        self.record(format!("query:{}", request.query), Some(token));
        Self::pass(&self.query_gate).await;
        lock(&self.script).query.next("query")
    }

    async fn chat_history(
        &self,
        token: &str,
        _workspace_id: &str,
        limit: u32,
    ) -> Result<Vec<QueryLogEntry>, ApiError> {
        self.record(format!("chat_history:{limit}"), Some(token));
        lock(&self.script).history.next("chat_history")
    }

    async fn stats(&self, token: &str) -> Result<Stats, ApiError> {
        self.record("stats", Some(token));
        lock(&self.script).stats.next("stats")
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.record("health", None);
        lock(&self.script).health.next("health")
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub(crate) fn user() -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        email: "ada@example.com".to_string(),
        full_name: "Ada Lovelace".to_string(),
    }
}

pub(crate) fn auth_response(token: &str) -> AuthResponse {
    AuthResponse { access_token: token.to_string(), token_type: Some("bearer".to_string()), user: user() }
}

pub(crate) fn workspace(id: &str, name: &str) -> Workspace {
    Workspace { id: id.to_string(), name: name.to_string(), description: None, doc_count: 0, created_at: None }
}

pub(crate) fn document(id: &str, filename: &str, status: DocumentStatus) -> Document {
    Document {
        id: id.to_string(),
        filename: filename.to_string(),
        status,
        file_size: Some(1024),
        chunk_count: 0,
        file_type: None,
        error_message: None,
        created_at: None,
    }
}

pub(crate) fn signed_in() -> SessionContext {
    SessionContext::with_token("tok", user())
}

pub(crate) fn status_error(status: u16, detail: &str) -> ApiError {
    ApiError::Status { status, detail: Some(detail.to_string()) }
}
