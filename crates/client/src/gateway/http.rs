use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use ragdesk_common::protocol::{
    routes, AuthResponse, ChatAnswer, ChatQueryRequest, CreateWorkspaceRequest, DeleteAck,
    LoginRequest, RegisterRequest, UPLOAD_FIELD,
};
use ragdesk_common::types::{
    AccountSummary, Document, HealthStatus, QueryLogEntry, Stats, Workspace,
};

use super::{ApiError, RemoteApi, UploadFile};
use crate::config::ClientConfig;

/// HTTP implementation of [`RemoteApi`].
#[derive(Debug, Clone)]
pub struct ApiGateway {
    base_url: Url,
    client: Client,
}

impl ApiGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Join `segments` onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "api request");
        let builder = self.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        response.json::<T>().await.map_err(|error| ApiError::Decode(error.to_string()))
    }

    async fn send_delete(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let ack: DeleteAck = self.send(request).await?;
        if !ack.deleted {
            debug!("delete acknowledged without `deleted: true`");
        }
        Ok(())
    }
}

impl RemoteApi for ApiGateway {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.send(self.request(Method::POST, routes::LOGIN, None)?.json(request)).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.send(self.request(Method::POST, routes::REGISTER, None)?.json(request)).await
    }

    async fn me(&self, token: &str) -> Result<AccountSummary, ApiError> {
        self.send(self.request(Method::GET, routes::ME, Some(token))?).await
    }

    async fn list_workspaces(&self, token: &str) -> Result<Vec<Workspace>, ApiError> {
        self.send(self.request(Method::GET, routes::WORKSPACES, Some(token))?).await
    }

    async fn create_workspace(
        &self,
        token: &str,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        self.send(self.request(Method::POST, routes::WORKSPACES, Some(token))?.json(request)).await
    }

    async fn delete_workspace(&self, token: &str, workspace_id: &str) -> Result<(), ApiError> {
        let path = routes::workspace(workspace_id);
        self.send_delete(self.request(Method::DELETE, &path, Some(token))?).await
    }

    async fn list_documents(
        &self,
        token: &str,
        workspace_id: &str,
    ) -> Result<Vec<Document>, ApiError> {
        let path = routes::documents(workspace_id);
        self.send(self.request(Method::GET, &path, Some(token))?).await
    }

    async fn upload_document(
        &self,
        token: &str,
        workspace_id: &str,
        file: &UploadFile,
    ) -> Result<Document, ApiError> {
        let part = Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
        let form = Form::new().part(UPLOAD_FIELD, part);
        let path = routes::upload(workspace_id);
        self.send(self.request(Method::POST, &path, Some(token))?.multipart(form)).await
    }

    async fn delete_document(
        &self,
        token: &str,
        workspace_id: &str,
        doc_id: &str,
    ) -> Result<(), ApiError> {
        let path = routes::document(workspace_id, doc_id);
        self.send_delete(self.request(Method::DELETE, &path, Some(token))?).await
    }

    async fn query(
        &self,
        token: &str,
        workspace_id: &str,
        request: &ChatQueryRequest,
    ) -> Result<ChatAnswer, ApiError> {
        let path = routes::chat(workspace_id);
        self.send(self.request(Method::POST, &path, Some(token))?.json(request)).await
    }

    async fn chat_history(
        &self,
        token: &str,
        workspace_id: &str,
        limit: u32,
    ) -> Result<Vec<QueryLogEntry>, ApiError> {
        let path = routes::chat_history(workspace_id);
        let request = self.request(Method::GET, &path, Some(token))?.query(&[("limit", limit)]);
        self.send(request).await
    }

    async fn stats(&self, token: &str) -> Result<Stats, ApiError> {
        self.send(self.request(Method::GET, routes::STATS, Some(token))?).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.send(self.request(Method::GET, routes::HEALTH, None)?).await
    }
}

fn validate_base_url(raw: &str) -> Result<Url, ApiError> {
    let parsed = Url::parse(raw.trim()).map_err(|_| ApiError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(ApiError::InvalidUrl(raw.to_string())),
    }
    if parsed.host_str().is_none() {
        return Err(ApiError::InvalidUrl(raw.to_string()));
    }
    Ok(parsed)
}

fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Transport("request timed out".to_string())
    } else if error.is_decode() {
        ApiError::Decode(error.to_string())
    } else {
        ApiError::Transport(error.to_string())
    }
}
