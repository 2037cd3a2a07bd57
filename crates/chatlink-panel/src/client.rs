//! Panel API boundary: the trait the engine polls through, plus the HTTP
//! implementation.
//!
//! `HttpPanel` talks to the control panel's JSON API with a lazily
//! established per-instance session. An unauthorized response invalidates
//! the cached token and retries once; a second failure surfaces as
//! [`PanelError::Auth`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

use chatlink_core::types::RawLogEntry;

use crate::error::PanelError;
use crate::session::SessionStore;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// One instance as the panel lists it.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceRef {
    pub name: String,
    pub instance_id: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub running: bool,
}

/// The remote-management operations the engine depends on.
#[async_trait]
pub trait PanelApi: Send + Sync {
    /// Current live instances, for registry refresh.
    async fn list_instances(&self) -> Result<Vec<InstanceRef>, PanelError>;

    /// Incremental console window for one instance. May legitimately
    /// return entries that overlap previous calls.
    async fn get_updates(&self, instance: &str) -> Result<Vec<RawLogEntry>, PanelError>;

    /// Fire a raw text command at an instance's console.
    async fn send_console(&self, instance: &str, command: &str) -> Result<(), PanelError>;

    /// Names of players currently connected to an instance.
    async fn active_users(&self, instance: &str) -> Result<Vec<String>, PanelError>;

    /// Discard any cached authentication state for an instance, forcing a
    /// re-login on next use. Never fails.
    async fn invalidate_session(&self, instance: &str);
}

// ─── HTTP implementation ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PanelCredentials {
    pub username: String,
    pub password: String,
}

pub struct HttpPanel {
    base_url: String,
    credentials: PanelCredentials,
    sessions: SessionStore,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstancesResponse {
    #[serde(default)]
    instances: Vec<InstanceRef>,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    console_entries: Vec<RawLogEntry>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    active_users: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl HttpPanel {
    pub fn new(
        base_url: impl Into<String>,
        credentials: PanelCredentials,
        request_timeout: Duration,
    ) -> Result<Self, PanelError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(PanelError::from_reqwest)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            credentials,
            sessions: SessionStore::new(),
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    async fn login(&self, instance: &str) -> Result<String, PanelError> {
        let resp = self
            .client
            .post(self.api_url("login"))
            .json(&json!({
                "username": self.credentials.username,
                "password": self.credentials.password,
                "instance": instance,
            }))
            .send()
            .await
            .map_err(PanelError::from_reqwest)?;

        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            return Err(PanelError::Auth(format!(
                "login rejected for instance {instance:?}"
            )));
        }
        let body: LoginResponse = resp.json().await.map_err(PanelError::from_reqwest)?;
        match body.session_id {
            Some(token) => {
                self.sessions.set(instance, token.clone()).await;
                Ok(token)
            }
            None => Err(PanelError::Auth(
                body.error.unwrap_or_else(|| "login returned no session".to_owned()),
            )),
        }
    }

    async fn session_for(&self, instance: &str) -> Result<String, PanelError> {
        match self.sessions.get(instance).await {
            Some(token) => Ok(token),
            None => self.login(instance).await,
        }
    }

    /// POST an authenticated call, retrying once through a fresh login when
    /// the cached session has expired.
    async fn call<T>(&self, instance: &str, path: &str, mut body: Value) -> Result<T, PanelError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut retried = false;
        loop {
            let token = self.session_for(instance).await?;
            if let Value::Object(map) = &mut body {
                map.insert("session_id".to_owned(), Value::String(token));
            }
            let resp = self
                .client
                .post(self.api_url(path))
                .json(&body)
                .send()
                .await
                .map_err(PanelError::from_reqwest)?;

            if resp.status() == StatusCode::UNAUTHORIZED {
                if retried {
                    return Err(PanelError::Auth(format!(
                        "session rejected twice for instance {instance:?}"
                    )));
                }
                tracing::debug!("panel session for {instance:?} expired, re-logging in");
                self.sessions.invalidate(instance).await;
                retried = true;
                continue;
            }
            if !resp.status().is_success() {
                return Err(PanelError::Protocol(format!(
                    "{path} returned {}",
                    resp.status()
                )));
            }
            return resp.json().await.map_err(PanelError::from_reqwest);
        }
    }
}

#[async_trait]
impl PanelApi for HttpPanel {
    async fn list_instances(&self) -> Result<Vec<InstanceRef>, PanelError> {
        let resp: InstancesResponse = self
            .call(SessionStore::CONTROLLER, "instances", json!({}))
            .await?;
        Ok(resp.instances)
    }

    async fn get_updates(&self, instance: &str) -> Result<Vec<RawLogEntry>, PanelError> {
        let resp: UpdatesResponse = self
            .call(instance, &format!("{instance}/updates"), json!({}))
            .await?;
        Ok(resp.console_entries)
    }

    async fn send_console(&self, instance: &str, command: &str) -> Result<(), PanelError> {
        let resp: AckResponse = self
            .call(
                instance,
                &format!("{instance}/console"),
                json!({ "command": command }),
            )
            .await?;
        if resp.success {
            Ok(())
        } else {
            Err(PanelError::Protocol(
                resp.error
                    .unwrap_or_else(|| "console command rejected".to_owned()),
            ))
        }
    }

    async fn active_users(&self, instance: &str) -> Result<Vec<String>, PanelError> {
        let resp: StatusResponse = self
            .call(instance, &format!("{instance}/status"), json!({}))
            .await?;
        let mut users = resp.active_users;
        users.sort();
        Ok(users)
    }

    async fn invalidate_session(&self, instance: &str) {
        if self.sessions.invalidate(instance).await {
            tracing::info!("cleared panel session for {instance} to force re-login");
        }
    }
}
