use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

use crate::app::{Result, SmartmarkError};
use crate::auth::callback::CallbackListener;
use crate::auth::pkce::PkcePair;
use crate::auth::session_file::SessionFile;
use crate::auth::{OAuthProvider, SessionBus, SessionEvent, SessionProvider, SessionSubscription};
use crate::config::SupabaseConfig;
use crate::domain::{Identity, Session};

/// Refresh access tokens that expire within this window.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Session provider backed by the hosted auth service (GoTrue REST API).
pub struct SupabaseAuth {
    client: Client,
    config: SupabaseConfig,
    file: SessionFile,
    session: Mutex<Option<Session>>,
    bus: SessionBus,
    login_timeout: Duration,
}

impl SupabaseAuth {
    /// Restores any session persisted in `file`.
    pub fn new(client: Client, config: SupabaseConfig, file: SessionFile, login_timeout: Duration) -> Self {
        let session = file.load();
        if let Some(ref s) = session {
            info!("Restored session for {}", s.user.display_email());
        }
        Self {
            client,
            config,
            file,
            session: Mutex::new(session),
            bus: SessionBus::new(),
            login_timeout,
        }
    }

    pub fn authorize_url(&self, provider: OAuthProvider, redirect_to: &str, challenge: &str) -> Result<Url> {
        let mut url = self.config.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }

    fn token_url(&self, grant_type: &str) -> Result<Url> {
        let mut url = self.config.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.token_url("pkce")?)
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({
                "auth_code": code,
                "code_verifier": verifier,
            }))
            .send()
            .await?;
        read_session(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.token_url("refresh_token")?)
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        read_session(response).await
    }

    async fn revoke(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.config.endpoint("auth/v1/logout")?)
            .header("apikey", &self.config.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SmartmarkError::Auth(auth_error_message(status.as_u16(), &body)))
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.file.save(session) {
            warn!("Failed to persist session to {}: {}", self.file.path().display(), e);
        }
    }

    fn forget(&self) {
        if let Err(e) = self.file.clear() {
            warn!("Failed to remove session file {}: {}", self.file.path().display(), e);
        }
    }
}

#[async_trait]
impl SessionProvider for SupabaseAuth {
    async fn current_session(&self) -> Result<Option<Session>> {
        // Held across the refresh so concurrent callers refresh once.
        let mut guard = self.session.lock().await;
        let Some(session) = guard.clone() else {
            return Ok(None);
        };

        if !session.expires_within(Utc::now(), chrono::Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Ok(Some(session));
        }

        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                info!("Refreshed access token for {}", fresh.user.display_email());
                self.persist(&fresh);
                *guard = Some(fresh.clone());
                self.bus.publish(SessionEvent::token_refreshed(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(SmartmarkError::Auth(reason)) => {
                warn!("Refresh token rejected, signing out: {}", reason);
                *guard = None;
                self.forget();
                self.bus.publish(SessionEvent::signed_out());
                Ok(None)
            }
            // Transport failures keep the session for the next attempt.
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        self.bus.subscribe()
    }

    async fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> Result<()> {
        let listener = CallbackListener::bind(redirect_to).await?;
        let pkce = PkcePair::generate();
        let url = self.authorize_url(provider, redirect_to, &pkce.challenge)?;

        info!("Opening browser for {} sign-in", provider.display_name());
        if let Err(e) = open::that(url.as_str()) {
            warn!("Could not open a browser ({}); visit {} to sign in", e, url);
        }

        let code = listener.wait_for_code(self.login_timeout).await?;
        let session = self.exchange_code(&code, &pkce.verifier).await?;
        info!("Signed in as {}", session.user.display_email());

        self.persist(&session);
        *self.session.lock().await = Some(session.clone());
        self.bus.publish(SessionEvent::signed_in(session));
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        let previous = self.session.lock().await.take();
        self.forget();

        // Local state is cleared and announced even if revocation fails.
        let revoked = match previous {
            Some(session) => self.revoke(&session.access_token).await,
            None => Ok(()),
        };
        self.bus.publish(SessionEvent::signed_out());
        revoked
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| Utc::now() + chrono::Duration::seconds(self.expires_in));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

async fn read_session(response: Response) -> Result<Session> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(SmartmarkError::Auth(auth_error_message(status.as_u16(), &body)));
    }
    let token: TokenResponse = serde_json::from_str(&body)?;
    Ok(token.into_session())
}

/// The auth API reports errors as `error_description`, `msg` or `message`
/// depending on the endpoint.
fn auth_error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(String::from))
        })
        .unwrap_or_else(|| body.trim().to_string());
    format!("{}: {}", status, detail)
}
