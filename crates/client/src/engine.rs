// Wires the components together for one process.

use std::sync::Arc;

use thiserror::Error;

use ragdesk_common::types::{HealthStatus, Stats};

use crate::chat::ChatSession;
use crate::config::ClientConfig;
use crate::documents::{DocumentTracker, TrackerConfig};
use crate::gateway::{ApiError, ApiGateway, RemoteApi};
use crate::session::{persistence_from_config, PersistenceError, SessionPersistence, SessionStore};
use crate::stats;
use crate::workspaces::WorkspaceRegistry;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Everything a workspace screen needs. Dropping it stops document polling.
pub struct WorkspaceView<A: RemoteApi> {
    pub tracker: DocumentTracker<A>,
    pub chat: ChatSession<A>,
}

pub struct Engine<A: RemoteApi> {
    config: ClientConfig,
    api: Arc<A>,
    session: SessionStore<A>,
    workspaces: WorkspaceRegistry<A>,
}

impl Engine<ApiGateway> {
    /// HTTP gateway and the configured session backend. The saved session,
    /// if any, is restored.
    pub fn from_config(config: ClientConfig) -> Result<Self, EngineError> {
        let api = Arc::new(ApiGateway::from_config(&config)?);
        let persistence = persistence_from_config(&config.session)?;
        Ok(Self::new(config, api, persistence))
    }
}

impl<A: RemoteApi> Engine<A> {
    pub fn new(config: ClientConfig, api: Arc<A>, persistence: Box<dyn SessionPersistence>) -> Self {
        let session = SessionStore::new(api.clone(), persistence);
        session.restore();
        let workspaces = WorkspaceRegistry::new(api.clone(), session.context());
        Self { config, api, session, workspaces }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn session(&self) -> &SessionStore<A> {
        &self.session
    }

    pub fn workspaces(&self) -> &WorkspaceRegistry<A> {
        &self.workspaces
    }

    pub fn open_workspace(&self, workspace_id: &str) -> WorkspaceView<A> {
        let context = self.session.context();
        WorkspaceView {
            tracker: DocumentTracker::new(
                self.api.clone(),
                context.clone(),
                workspace_id,
                TrackerConfig::from_config(&self.config),
            ),
            chat: ChatSession::new(self.api.clone(), context, workspace_id),
        }
    }

    pub async fn stats(&self) -> Option<Stats> {
        stats::fetch_stats(self.api.as_ref(), &self.session.context()).await
    }

    pub async fn try_stats(&self) -> Result<Stats, ApiError> {
        stats::try_fetch_stats(self.api.as_ref(), &self.session.context()).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        stats::check_health(self.api.as_ref()).await
    }
}
