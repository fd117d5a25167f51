//! Typed HTTP wrappers for the uptime backend's REST API.
//!
//! Pure request/response: no retry or backoff beyond what the transport
//! provides. All business logic (uptime computation, certificate expiry
//! evaluation, metrics aggregation) happens server-side; these calls only
//! move typed snapshots across the wire.

use crate::live_store::DataProvider;
use crate::types::{AlertIncident, MonitorGroup, NamespaceMetric, NodeMetric};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status} for {url}")]
    Status { status: u16, url: String },
}

/// Explicit session context for authenticated calls.
///
/// Passed into the client instead of living in ambient global state; the
/// token itself is an opaque input (refresh-on-401 belongs to whoever mints
/// the session, not here).
#[derive(Debug, Clone, Default)]
pub struct Session {
    bearer_token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { bearer_token: None }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }
}

/// Client for the monitoring backend.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(FetchError::Status {
                status: resp.status().as_u16(),
                url: resp.url().to_string(),
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let resp = self
            .authorize(self.http.get(self.url(path)).query(query))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, FetchError> {
        let resp = self
            .authorize(self.http.request(method, self.url(path)).json(body))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<(), FetchError> {
        let resp = self
            .authorize(self.http.delete(self.url(path)).query(query))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Monitor groups with their monitors and aggregate uptime, optionally
    /// scoped to one environment.
    pub async fn monitor_groups(
        &self,
        environment: Option<i32>,
    ) -> Result<Vec<MonitorGroup>, FetchError> {
        let mut query = Vec::new();
        if let Some(env) = environment {
            query.push(("environment", env.to_string()));
        }
        self.get_json("/api/monitor/groups", &query).await
    }

    /// Alert incidents for the trailing day window.
    pub async fn alert_incidents(
        &self,
        environment: Option<i32>,
        days: u32,
    ) -> Result<Vec<AlertIncident>, FetchError> {
        let mut query = vec![("days", days.to_string())];
        if let Some(env) = environment {
            query.push(("environment", env.to_string()));
        }
        self.get_json("/api/alerts", &query).await
    }

    /// Bulk-deletes alert history for an environment. Irreversible; callers
    /// must confirm with the user before reaching this.
    pub async fn delete_alert_incidents(
        &self,
        environment: i32,
        days: u32,
    ) -> Result<(), FetchError> {
        self.delete(
            "/api/alerts",
            &[
                ("environment", environment.to_string()),
                ("days", days.to_string()),
            ],
        )
        .await
    }

    /// Node resource samples for a cluster over the trailing window.
    pub async fn node_metrics(
        &self,
        cluster: &str,
        hours: u32,
    ) -> Result<Vec<NodeMetric>, FetchError> {
        self.get_json(
            "/api/metrics/nodes",
            &[("cluster", cluster.to_string()), ("hours", hours.to_string())],
        )
        .await
    }

    /// Pod/container samples, optionally narrowed to one namespace.
    pub async fn namespace_metrics(
        &self,
        cluster: &str,
        namespace: Option<&str>,
        hours: u32,
    ) -> Result<Vec<NamespaceMetric>, FetchError> {
        let mut query = vec![("cluster", cluster.to_string()), ("hours", hours.to_string())];
        if let Some(ns) = namespace {
            query.push(("namespace", ns.to_string()));
        }
        self.get_json("/api/metrics/namespaces", &query).await
    }

    pub async fn create_monitor(
        &self,
        monitor: &serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        self.send_json(reqwest::Method::POST, "/api/monitor", monitor)
            .await
    }

    pub async fn update_monitor(
        &self,
        id: i64,
        monitor: &serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        self.send_json(reqwest::Method::PUT, &format!("/api/monitor/{id}"), monitor)
            .await
    }

    pub async fn delete_monitor(&self, id: i64) -> Result<(), FetchError> {
        self.delete(&format!("/api/monitor/{id}"), &[]).await
    }

    pub async fn create_group(&self, name: &str) -> Result<MonitorGroup, FetchError> {
        self.send_json(
            reqwest::Method::POST,
            "/api/monitor/groups",
            &serde_json::json!({ "name": name }),
        )
        .await
    }

    pub async fn delete_group(&self, id: i64) -> Result<(), FetchError> {
        self.delete(&format!("/api/monitor/groups/{id}"), &[]).await
    }

    /// Notification channel CRUD. Payload shape is backend-owned, so it
    /// stays an opaque JSON value here.
    pub async fn create_notification(
        &self,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        self.send_json(reqwest::Method::POST, "/api/notifications", payload)
            .await
    }

    pub async fn update_notification(
        &self,
        id: i64,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/api/notifications/{id}"),
            payload,
        )
        .await
    }

    pub async fn delete_notification(&self, id: i64) -> Result<(), FetchError> {
        self.delete(&format!("/api/notifications/{id}"), &[]).await
    }

    /// Full JSON snapshot of the backend's configuration for backup.
    pub async fn export_backup(&self) -> Result<serde_json::Value, FetchError> {
        self.get_json("/api/backup", &[]).await
    }

    /// Uploads a backup file and performs a destructive full replace of the
    /// backend's configuration. Explicitly irreversible; the caller is
    /// responsible for an explicit confirmation step first.
    pub async fn import_backup(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<(), FetchError> {
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("application/json")
            .map_err(FetchError::Transport)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .authorize(self.http.post(self.url("/api/backup/import")).multipart(form))
            .send()
            .await?;
        Self::check(resp).await?;
        info!("Backup import accepted by backend");
        Ok(())
    }
}

/// Adapts a [`BackendClient`] to the Live Data Store's provider interface,
/// fixing the environment scope and alert day window for a page's lifetime.
pub struct BackendDataProvider {
    client: Arc<BackendClient>,
    environment: Option<i32>,
    alert_days: u32,
}

impl BackendDataProvider {
    pub fn new(client: Arc<BackendClient>, environment: Option<i32>, alert_days: u32) -> Self {
        debug!(?environment, alert_days, "data provider configured");
        Self {
            client,
            environment,
            alert_days,
        }
    }
}

impl DataProvider for BackendDataProvider {
    fn monitor_groups(&self) -> BoxFuture<'_, Result<Vec<MonitorGroup>, FetchError>> {
        Box::pin(async move { self.client.monitor_groups(self.environment).await })
    }

    fn alerts(&self) -> BoxFuture<'_, Result<Vec<AlertIncident>, FetchError>> {
        Box::pin(async move {
            self.client
                .alert_incidents(self.environment, self.alert_days)
                .await
        })
    }
}
