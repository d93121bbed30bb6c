// Cached list of the user's workspaces and CRUD against the remote API.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{info, warn};

use ragdesk_common::protocol::CreateWorkspaceRequest;
use ragdesk_common::types::Workspace;

use crate::gateway::{ApiError, RemoteApi};
use crate::session::SessionContext;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    /// Rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct WorkspaceRegistry<A: RemoteApi> {
    api: Arc<A>,
    session: SessionContext,
    cache: Mutex<Vec<Workspace>>,
}

impl<A: RemoteApi> WorkspaceRegistry<A> {
    pub fn new(api: Arc<A>, session: SessionContext) -> Self {
        Self { api, session, cache: Mutex::new(Vec::new()) }
    }

    /// Fetch the list and replace the cache. On failure the cache is kept and
    /// an empty list is returned.
    pub async fn list(&self) -> Vec<Workspace> {
        match self.try_list().await {
            Ok(workspaces) => workspaces,
            Err(error) => {
                warn!(error = %error, "failed to list workspaces");
                Vec::new()
            }
        }
    }

    /// Like [`list`](Self::list) but hands the failure to the caller.
    pub async fn try_list(&self) -> Result<Vec<Workspace>, ApiError> {
        let token = self.session.bearer()?;
        let workspaces = self.api.list_workspaces(&token).await?;
        *self.cache() = workspaces.clone();
        Ok(workspaces)
    }

    /// Create a workspace and put it at the front of the cached list.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Workspace, WorkspaceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkspaceError::Validation("workspace name must not be empty".to_string()));
        }
        let description =
            description.map(str::trim).filter(|d| !d.is_empty()).map(ToOwned::to_owned);

        let token = self.session.bearer()?;
        let request = CreateWorkspaceRequest { name: name.to_string(), description };
        let created = match self.api.create_workspace(&token, &request).await {
            Ok(created) => created,
            Err(error) => {
                warn!(name, error = %error, "failed to create workspace");
                return Err(error.into());
            }
        };

        info!(workspace = %created.id, name = %created.name, "workspace created");
        self.cache().insert(0, created.clone());
        Ok(created)
    }

    /// Delete a workspace. The caller is responsible for confirmation.
    pub async fn delete(&self, workspace_id: &str) -> Result<(), WorkspaceError> {
        let token = self.session.bearer()?;
        if let Err(error) = self.api.delete_workspace(&token, workspace_id).await {
            warn!(workspace = %workspace_id, error = %error, "failed to delete workspace");
            return Err(error.into());
        }
        info!(workspace = %workspace_id, "workspace deleted");
        self.cache().retain(|ws| ws.id != workspace_id);
        Ok(())
    }

    pub fn get(&self, workspace_id: &str) -> Option<Workspace> {
        self.cache().iter().find(|ws| ws.id == workspace_id).cloned()
    }

    pub fn workspaces(&self) -> Vec<Workspace> {
        self.cache().clone()
    }

    fn cache(&self) -> MutexGuard<'_, Vec<Workspace>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
