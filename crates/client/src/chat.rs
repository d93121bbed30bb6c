// Chat transcript of one workspace and its single-flight query guard.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use ragdesk_common::protocol::{ChatAnswer, ChatQueryRequest};
use ragdesk_common::types::{ChatMessage, ChatRole, QueryLogEntry};

use crate::gateway::{ApiError, RemoteApi};
use crate::session::SessionContext;

const QUERY_FAILED: &str = "Query failed";

/// Why a send did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Blank after trimming.
    EmptyQuery,
    /// Another query is still waiting for its answer.
    Busy,
}

/// Proof that a query was begun. Consumed by [`Transcript::resolve`].
#[derive(Debug, PartialEq, Eq)]
pub struct PendingTicket {
    id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Answered(ChatAnswer),
    /// Human-readable reason shown as an error entry.
    Failed(String),
}

/// Append-only list of messages with at most one open query.
///
/// `begin` appends the user's message right away and opens the pending
/// slot; `resolve` closes it by appending the answer or the error.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    pending: Option<(u64, String)>,
    issued: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, query: &str) -> Result<PendingTicket, IgnoreReason> {
        let query = query.trim();
        if query.is_empty() {
            return Err(IgnoreReason::EmptyQuery);
        }
        if self.pending.is_some() {
            return Err(IgnoreReason::Busy);
        }
        self.issued += 1;
        self.messages.push(ChatMessage::user(query));
        self.pending = Some((self.issued, query.to_string()));
        Ok(PendingTicket { id: self.issued })
    }

    /// Close the pending slot. Returns the appended message, or `None` when
    /// the ticket does not belong to the open slot.
    pub fn resolve(&mut self, ticket: PendingTicket, resolution: Resolution) -> Option<&ChatMessage> {
        match &self.pending {
            Some((id, _)) if *id == ticket.id => {}
            _ => return None,
        }
        self.pending = None;
        let message = match resolution {
            Resolution::Answered(answer) => {
                ChatMessage::assistant(answer.answer, answer.sources, answer.duration_ms)
            }
            Resolution::Failed(reason) => ChatMessage::error(reason),
        };
        self.messages.push(message);
        self.messages.last()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn pending_query(&self) -> Option<&str> {
        self.pending.as_ref().map(|(_, query)| query.as_str())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum SendOutcome {
    Ignored(IgnoreReason),
    Answered(ChatMessage),
    Failed(ChatMessage),
}

pub struct ChatSession<A: RemoteApi> {
    api: Arc<A>,
    session: SessionContext,
    workspace_id: String,
    transcript: Mutex<Transcript>,
}

impl<A: RemoteApi> ChatSession<A> {
    pub fn new(api: Arc<A>, session: SessionContext, workspace_id: impl Into<String>) -> Self {
        Self { api, session, workspace_id: workspace_id.into(), transcript: Mutex::default() }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// Ask a question. Blank input and input arriving while another query
    /// is in flight are dropped.
    pub async fn send(&self, query: &str) -> SendOutcome {
        let query = query.trim().to_string();
        let begun = self.lock().begin(&query);
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(reason) => {
                debug!(workspace = %self.workspace_id, ?reason, "query ignored");
                return SendOutcome::Ignored(reason);
            }
        };

        let pending = PendingQuery { chat: self, ticket: Some(ticket) };
        let resolution = match self.ask(&query).await {
            Ok(answer) => Resolution::Answered(answer),
            Err(error) => {
                warn!(workspace = %self.workspace_id, error = %error, "query failed");
                Resolution::Failed(error.detail_or(QUERY_FAILED))
            }
        };
        pending.finish(resolution)
    }

    async fn ask(&self, query: &str) -> Result<ChatAnswer, ApiError> {
        let token = self.session.bearer()?;
        let request = ChatQueryRequest { query: query.to_string() };
        self.api.query(&token, &self.workspace_id, &request).await
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock().messages().to_vec()
    }

    pub fn is_querying(&self) -> bool {
        self.lock().is_pending()
    }

    pub fn pending_query(&self) -> Option<String> {
        self.lock().pending_query().map(ToOwned::to_owned)
    }

    /// Past queries recorded by the server. Leaves the transcript alone.
    pub async fn history(&self, limit: u32) -> Vec<QueryLogEntry> {
        match self.fetch_history(limit).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(workspace = %self.workspace_id, error = %error, "failed to load chat history");
                Vec::new()
            }
        }
    }

    pub async fn fetch_history(&self, limit: u32) -> Result<Vec<QueryLogEntry>, ApiError> {
        let token = self.session.bearer()?;
        self.api.chat_history(&token, &self.workspace_id, limit).await
    }

    fn lock(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Open slot of an in-flight `send`. If the future is dropped before the
/// answer arrives, the slot is closed with a failure entry so the session
/// accepts the next query.
struct PendingQuery<'a, A: RemoteApi> {
    chat: &'a ChatSession<A>,
    ticket: Option<PendingTicket>,
}

impl<A: RemoteApi> PendingQuery<'_, A> {
    fn finish(mut self, resolution: Resolution) -> SendOutcome {
        let Some(ticket) = self.ticket.take() else {
            return SendOutcome::Ignored(IgnoreReason::Busy);
        };
        let mut transcript = self.chat.lock();
        match transcript.resolve(ticket, resolution).cloned() {
            Some(message) if message.role == ChatRole::Error => SendOutcome::Failed(message),
            Some(message) => SendOutcome::Answered(message),
            None => SendOutcome::Ignored(IgnoreReason::Busy),
        }
    }
}

impl<A: RemoteApi> Drop for PendingQuery<'_, A> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            debug!(workspace = %self.chat.workspace_id, "query abandoned before an answer");
            self.chat.lock().resolve(ticket, Resolution::Failed(QUERY_FAILED.to_string()));
        }
    }
}

/// Prompt shown before the first message.
pub fn empty_state_message(ready_docs: usize) -> String {
    if ready_docs == 0 {
        return "Upload documents first, then come back to ask questions.".to_string();
    }
    let plural = if ready_docs == 1 { "" } else { "s" };
    format!("Chat with your {ready_docs} indexed document{plural}. Ask questions and get AI-powered answers.")
}
