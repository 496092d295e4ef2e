//! HTTP gateway backend.
//!
//! Sessions and contact operations go through a lookup gateway that fronts
//! the platform API. Opening a session is a challenge flow: the gateway may
//! ask for a login code and then a two-factor password, both pulled through
//! the [`CredentialProvider`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use checker_core::traits::Connector;
use checker_core::{Account, CredentialProvider, Profile, Session, SessionError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

#[derive(Deserialize)]
struct SessionState {
    /// "authorized", "code_required" or "password_required".
    status: String,
    token: String,
}

#[derive(Deserialize)]
struct ImportResponse {
    user_ids: Vec<i64>,
}

pub struct HttpGateway {
    client: Client,
    base: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpGateway {
    pub fn new(base: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    async fn open_session(&self, account: &Account) -> Result<SessionState> {
        let resp = self
            .client
            .post(format!("{}/sessions", self.base))
            .json(&json!({
                "phone_number": account.phone_number,
                "api_id": account.api_id,
                "api_hash": account.api_hash,
                "session_name": account.session_name(),
            }))
            .send()
            .await
            .context("gateway unreachable")?
            .error_for_status()
            .context("gateway rejected session open")?;
        resp.json().await.context("invalid session response")
    }

    async fn sign_in(&self, token: &str, body: serde_json::Value) -> Result<SessionState> {
        let resp = self
            .client
            .post(format!("{}/sessions/{}/sign-in", self.base, token))
            .json(&body)
            .send()
            .await
            .context("gateway unreachable")?
            .error_for_status()
            .context("sign-in rejected")?;
        resp.json().await.context("invalid sign-in response")
    }
}

#[async_trait]
impl Connector for HttpGateway {
    async fn connect(&self, account: &Account) -> Result<Arc<dyn Session>, SessionError> {
        let connect_err = |e: &anyhow::Error| SessionError::ConnectFailed {
            account: account.phone_number.clone(),
            reason: format!("{e:#}"),
        };
        let auth_err = |reason: String| SessionError::NotAuthorized {
            account: account.phone_number.clone(),
            reason,
        };

        let mut state = self
            .open_session(account)
            .await
            .map_err(|e| connect_err(&e))?;

        if state.status == "code_required" {
            let code = self
                .credentials
                .login_code(&account.phone_number)
                .map_err(|e| auth_err(format!("{e:#}")))?;
            state = self
                .sign_in(&state.token, json!({ "code": code }))
                .await
                .map_err(|e| auth_err(format!("{e:#}")))?;
        }
        if state.status == "password_required" {
            let password = self
                .credentials
                .two_factor_password(&account.phone_number)
                .map_err(|e| auth_err(format!("{e:#}")))?;
            state = self
                .sign_in(&state.token, json!({ "password": password }))
                .await
                .map_err(|e| auth_err(format!("{e:#}")))?;
        }
        if state.status != "authorized" {
            return Err(auth_err(format!("unexpected session state '{}'", state.status)));
        }

        Ok(Arc::new(HttpSession {
            client: self.client.clone(),
            base: self.base.clone(),
            token: state.token,
            alive: AtomicBool::new(true),
        }))
    }
}

pub struct HttpSession {
    client: Client,
    base: String,
    token: String,
    alive: AtomicBool,
}

impl HttpSession {
    fn note_transport_error(&self, e: &reqwest::Error) {
        // A refused or timed-out connection means the session is gone;
        // protocol-level errors leave it usable.
        if e.is_connect() || e.is_timeout() {
            self.alive.store(false, Ordering::SeqCst);
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        body: serde_json::Value,
    ) -> Result<T> {
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| self.note_transport_error(e))
            .with_context(|| format!("request to {url} failed"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("request to {url} rejected"))?;
        resp.json()
            .await
            .with_context(|| format!("invalid response from {url}"))
    }
}

#[async_trait]
impl Session for HttpSession {
    fn is_connected(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn import_contact(&self, phone: &str, first_name: &str) -> Result<Vec<i64>> {
        let resp: ImportResponse = self
            .post_json(
                format!("{}/sessions/{}/contacts/import", self.base, self.token),
                json!({ "phone": phone, "first_name": first_name }),
            )
            .await?;
        Ok(resp.user_ids)
    }

    async fn delete_contact(&self, user_id: i64) -> Result<Profile> {
        self.post_json(
            format!(
                "{}/sessions/{}/contacts/{}/delete",
                self.base, self.token, user_id
            ),
            json!({}),
        )
        .await
    }

    async fn disconnect(&self) -> Result<()> {
        self.alive.store(false, Ordering::SeqCst);
        let url = format!("{}/sessions/{}", self.base, self.token);
        if let Err(e) = self.client.delete(&url).send().await {
            warn!("Session close request failed: {e:#}");
        }
        Ok(())
    }
}
