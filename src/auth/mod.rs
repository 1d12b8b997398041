//! Session provider seam and the session-change notification channel.
//!
//! ```text
//! SupabaseAuth ──publish──▶ SessionBus ──▶ SessionSubscription ──▶ BookmarkView
//! ```

pub mod callback;
pub mod pkce;
pub mod session_file;
pub mod supabase;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::app::Result;
use crate::domain::{Identity, Session};

pub use supabase::SupabaseAuth;

const BUS_CAPACITY: usize = 16;

/// OAuth identity providers understood by the hosted auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
    Gitlab,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
            OAuthProvider::Gitlab => "gitlab",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            OAuthProvider::Google => "Google",
            OAuthProvider::Github => "GitHub",
            OAuthProvider::Gitlab => "GitLab",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Notification emitted whenever the authentication state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session: Option<Session>,
}

impl SessionEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: SessionEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: SessionEventKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: SessionEventKind::TokenRefreshed,
            session: Some(session),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// Fan-out of session events to every live subscription.
#[derive(Debug, Clone)]
pub struct SessionBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn publish(&self, event: SessionEvent) {
        // No receivers is fine: nobody is mounted yet.
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!("Session event delivered to {} subscribers", delivered);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration for session-change notifications.
///
/// Dropping the subscription releases it; `release` makes the release point
/// explicit.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Wait for the next notification. `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Session subscription lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take a pending notification without waiting.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Session subscription lagged, skipped {} events", skipped);
                }
                Err(_) => return None,
            }
        }
    }

    pub fn release(self) {
        debug!("Session subscription released");
    }
}

/// Source of the current identity and of identity changes.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, refreshed if its access token is about to expire.
    async fn current_session(&self) -> Result<Option<Session>>;

    fn subscribe(&self) -> SessionSubscription;

    /// Run the OAuth sign-in flow. Completion is reported through a
    /// `SignedIn` notification, not through local state.
    async fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;
}
