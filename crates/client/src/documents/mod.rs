// Per-workspace document list: sequential uploads and indexing status.
//
// A tracker belongs to one open workspace view. `close()` (or dropping the
// tracker) stops its poll loop; nothing it fetches afterwards is applied.

mod poll;
mod upload;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use ragdesk_common::types::{Document, DocumentStatus};

use crate::config::ClientConfig;
use crate::gateway::{ApiError, RemoteApi, UploadFile};
use crate::session::SessionContext;

use poll::PollHandle;
pub use poll::merge_monotonic;
pub use upload::{UploadFailure, UploadPolicy, UploadReport};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum spacing between status fetches.
    pub poll_interval: Duration,
    pub upload: UploadPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, upload: UploadPolicy::default() }
    }
}

impl TrackerConfig {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            upload: UploadPolicy::from_config(&config.upload),
        }
    }
}

#[derive(Default)]
struct TrackerState {
    documents: Vec<Document>,
    uploading: Vec<Document>,
    /// Bumped whenever a poll loop is started or cancelled.
    epoch: u64,
    closed: bool,
    poll: Option<PollHandle>,
}

/// State shared between the tracker and its poll loop.
struct Shared<A: RemoteApi> {
    api: Arc<A>,
    session: SessionContext,
    workspace_id: String,
    poll_interval: Duration,
    state: Mutex<TrackerState>,
    polling: watch::Sender<bool>,
}

impl<A: RemoteApi> Shared<A> {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(&self) -> Result<Vec<Document>, ApiError> {
        let token = self.session.bearer()?;
        self.api.list_documents(&token, &self.workspace_id).await
    }

    /// Merge a listing into the current state. `epoch` is the loop that
    /// produced it, `None` for a direct refresh.
    ///
    /// Returns whether anything is still processing, or `None` when the
    /// listing was discarded.
    fn apply(&self, epoch: Option<u64>, fresh: Vec<Document>) -> Option<bool> {
        let mut state = self.lock();
        if state.closed || epoch.is_some_and(|epoch| epoch != state.epoch) {
            return None;
        }
        let merged = merge_monotonic(&state.documents, fresh);
        state.documents = merged;
        Some(state.documents.iter().any(Document::is_processing))
    }

    fn start_polling(self: &Arc<Self>) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.epoch += 1;
        let epoch = state.epoch;
        if let Some(previous) = state.poll.take() {
            previous.cancel();
        }
        state.poll = Some(poll::spawn(self.clone(), epoch));
        self.polling.send_replace(true);
        debug!(workspace = %self.workspace_id, epoch, "poll loop started");
    }

    fn stop_polling(&self) {
        let mut state = self.lock();
        if state.poll.take().is_some() {
            state.epoch += 1;
            debug!(workspace = %self.workspace_id, "poll loop stopped");
        }
        self.polling.send_replace(false);
    }

    /// Called by a loop that ended on its own.
    fn finish_polling(&self, epoch: u64) {
        let mut state = self.lock();
        if state.epoch == epoch {
            state.poll = None;
            self.polling.send_replace(false);
        }
    }

    fn set_uploading(&self, placeholder: Option<Document>) {
        self.lock().uploading = placeholder.into_iter().collect();
    }
}

/// Documents of one workspace and their indexing progress.
pub struct DocumentTracker<A: RemoteApi> {
    shared: Arc<Shared<A>>,
    policy: UploadPolicy,
    /// Serializes batches so two uploads never overlap.
    batch: tokio::sync::Mutex<()>,
}

impl<A: RemoteApi> DocumentTracker<A> {
    pub fn new(
        api: Arc<A>,
        session: SessionContext,
        workspace_id: impl Into<String>,
        config: TrackerConfig,
    ) -> Self {
        let (polling, _) = watch::channel(false);
        let shared = Shared {
            api,
            session,
            workspace_id: workspace_id.into(),
            poll_interval: config.poll_interval,
            state: Mutex::new(TrackerState::default()),
            polling,
        };
        Self { shared: Arc::new(shared), policy: config.upload, batch: tokio::sync::Mutex::new(()) }
    }

    pub fn workspace_id(&self) -> &str {
        &self.shared.workspace_id
    }

    /// Fetch the list, then start polling if anything is processing or stop
    /// an active loop if nothing is. A failed fetch keeps the previous list.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let fresh = match self.shared.fetch().await {
            Ok(fresh) => fresh,
            Err(error) => {
                warn!(workspace = %self.shared.workspace_id, error = %error, "failed to load documents");
                return Err(error);
            }
        };
        match self.shared.apply(None, fresh) {
            Some(true) => self.shared.start_polling(),
            Some(false) => self.shared.stop_polling(),
            None => {}
        }
        Ok(())
    }

    /// Send `files` one at a time, then refresh once.
    ///
    /// A file that fails (locally or remotely) is recorded in the report and
    /// the batch moves on.
    pub async fn upload(&self, files: Vec<UploadFile>) -> UploadReport {
        let mut report = UploadReport::default();
        if files.is_empty() {
            return report;
        }
        let _batch = self.batch.lock().await;
        let workspace = &self.shared.workspace_id;

        for file in files {
            if let Err(reason) = self.policy.check(&file) {
                warn!(%workspace, file = %file.filename, %reason, "upload rejected locally");
                report.failed.push(UploadFailure { filename: file.filename, reason });
                continue;
            }

            self.shared.set_uploading(Some(placeholder(&file)));
            let result = self.upload_one(&file).await;
            self.shared.set_uploading(None);

            match result {
                Ok(doc) => {
                    debug!(%workspace, file = %file.filename, document = %doc.id, "uploaded");
                    report.uploaded.push(file.filename);
                }
                Err(error) => {
                    let reason = error.detail_or(&format!("Failed to upload {}", file.filename));
                    warn!(%workspace, file = %file.filename, error = %error, "upload failed");
                    report.failed.push(UploadFailure { filename: file.filename, reason });
                }
            }
        }

        info!(
            %workspace,
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            "upload batch finished"
        );
        // Errors are logged by refresh; the report stands either way.
        let _ = self.refresh().await;
        report
    }

    async fn upload_one(&self, file: &UploadFile) -> Result<Document, ApiError> {
        let token = self.shared.session.bearer()?;
        self.shared.api.upload_document(&token, &self.shared.workspace_id, file).await
    }

    /// Delete a document. The caller is responsible for confirmation; the
    /// list changes only on success.
    pub async fn delete(&self, doc_id: &str) -> Result<(), ApiError> {
        let token = self.shared.session.bearer()?;
        let workspace = &self.shared.workspace_id;
        if let Err(error) = self.shared.api.delete_document(&token, workspace, doc_id).await {
            warn!(%workspace, document = %doc_id, error = %error, "failed to delete document");
            return Err(error);
        }
        info!(%workspace, document = %doc_id, "document deleted");
        self.shared.lock().documents.retain(|doc| doc.id != doc_id);
        Ok(())
    }

    /// Stop polling for good. Later fetches are discarded.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.epoch += 1;
        state.poll = None;
        self.shared.polling.send_replace(false);
        debug!(workspace = %self.shared.workspace_id, "document tracker closed");
    }

    pub fn documents(&self) -> Vec<Document> {
        self.shared.lock().documents.clone()
    }

    /// Placeholder rows for files currently being sent.
    pub fn uploading(&self) -> Vec<Document> {
        self.shared.lock().uploading.clone()
    }

    pub fn ready_count(&self) -> usize {
        self.shared.lock().documents.iter().filter(|doc| doc.is_ready()).count()
    }

    pub fn is_polling(&self) -> bool {
        *self.shared.polling.borrow()
    }

    pub fn subscribe_polling(&self) -> watch::Receiver<bool> {
        self.shared.polling.subscribe()
    }

    /// Resolve once no poll loop is running.
    pub async fn wait_until_indexed(&self) {
        let mut polling = self.subscribe_polling();
        // The sender lives as long as `self`.
        let _ = polling.wait_for(|active| !*active).await;
    }
}

impl<A: RemoteApi> Drop for DocumentTracker<A> {
    fn drop(&mut self) {
        self.close();
    }
}

fn placeholder(file: &UploadFile) -> Document {
    Document {
        id: format!("pending:{}", file.filename),
        filename: file.filename.clone(),
        status: DocumentStatus::Uploading,
        file_size: Some(file.size()),
        chunk_count: 0,
        file_type: None,
        error_message: None,
        created_at: None,
    }
}
