//! The bookmark view: session lifecycle plus the four user intents.
//!
//! ```text
//! mount ──▶ subscribe ──▶ current_session ──▶ reload
//!             │
//!             └─ SignedIn, TokenRefreshed (new user) ─▶ set identity, reload
//!                TokenRefreshed (same user)          ─▶ set identity
//!                SignedOut                           ─▶ clear locally
//! ```
//!
//! Every successful mutation is followed by a full reload; nothing is
//! inserted or removed optimistically. Authorization is the store's job
//! (row-level security). The view only scopes its queries and deletes to
//! the current identity.

#[cfg(test)]
pub(crate) mod fakes;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::app::{Result, ValidationError};
use crate::auth::{
    OAuthProvider, SessionEvent, SessionEventKind, SessionProvider, SessionSubscription,
};
use crate::domain::NewBookmark;
use crate::store::BookmarkStore;

pub use state::{ReloadTicket, ViewMode, ViewState};

/// Blocking, user-visible message raised by the add intent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to add bookmark")]
    AddFailed,
}

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub provider: OAuthProvider,
    /// OAuth redirect target: the client's own origin.
    pub redirect_to: String,
}

pub struct BookmarkView {
    sessions: Arc<dyn SessionProvider>,
    store: Arc<dyn BookmarkStore>,
    options: ViewOptions,
    state: ViewState,
    subscription: Option<SessionSubscription>,
}

impl BookmarkView {
    /// Subscribe to session changes, then load the current session (if any)
    /// and its bookmarks.
    pub async fn mount(
        sessions: Arc<dyn SessionProvider>,
        store: Arc<dyn BookmarkStore>,
        options: ViewOptions,
    ) -> Self {
        let subscription = sessions.subscribe();
        let mut view = Self {
            sessions,
            store,
            options,
            state: ViewState::new(),
            subscription: Some(subscription),
        };

        let session = match view.sessions.current_session().await {
            Ok(session) => session,
            Err(e) => {
                error!("Session check error: {}", e);
                None
            }
        };

        if let Some(session) = session {
            info!("Mounted with session for {}", session.user.display_email());
            let owner_id = session.user.id.clone();
            view.state.set_identity(session.user);
            view.reload_for(&owner_id).await;
        }
        view.state.loading = false;
        view
    }

    /// Release the session subscription and discard the view state.
    pub fn unmount(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
        debug!("Bookmark view unmounted");
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn mode(&self) -> ViewMode<'_> {
        self.state.mode()
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn input(&self) -> &str {
        &self.state.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.state.input = input.into();
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.state.input
    }

    /// Reload the list for the current identity. No-op when signed out.
    pub async fn reload(&mut self) {
        if let Some(owner_id) = self.state.owner_id().map(String::from) {
            self.reload_for(&owner_id).await;
        }
    }

    async fn reload_for(&mut self, owner_id: &str) {
        let ticket = self.state.begin_reload(owner_id);
        let result = self.store.list(ticket.owner_id()).await;
        self.state.finish_reload(ticket, result);
    }

    /// A token refresh for the identity already shown keeps the list; rows
    /// are owned by the user, not the token.
    pub async fn handle_session_event(&mut self, event: SessionEvent) {
        debug!("Session event: {:?}", event.kind);
        let same_user_refresh = event.kind == SessionEventKind::TokenRefreshed
            && event.identity().map(|i| i.id.as_str()) == self.state.owner_id();
        match event.session {
            Some(session) if same_user_refresh => self.state.set_identity(session.user),
            Some(session) => {
                let owner_id = session.user.id.clone();
                self.state.set_identity(session.user);
                self.reload_for(&owner_id).await;
            }
            None => self.state.clear_session(),
        }
    }

    /// Apply every notification already queued, without waiting.
    pub async fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.subscription.as_mut().and_then(|s| s.try_recv()) {
            self.handle_session_event(event).await;
            handled += 1;
        }
        handled
    }

    /// Wait for the next notification and apply it. `None` once the provider
    /// has gone away or the view is unmounted.
    pub async fn next_session_event(&mut self) -> Option<()> {
        let event = self.subscription.as_mut()?.recv().await?;
        self.handle_session_event(event).await;
        Some(())
    }

    pub async fn add_bookmark(&mut self) -> std::result::Result<(), Alert> {
        let owner_id = self
            .state
            .owner_id()
            .map(String::from)
            .ok_or(ValidationError::NotLoggedIn)?;

        let url = self.state.input.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl.into());
        }

        let row = NewBookmark::new(owner_id.clone(), url);
        if let Err(e) = self.store.insert(&row).await {
            error!("Add error: {}", e);
            return Err(Alert::AddFailed);
        }

        info!("Added bookmark {}", row.url);
        self.state.input.clear();
        self.reload_for(&owner_id).await;
        Ok(())
    }

    /// Failures are logged only; the list stays as it was.
    pub async fn delete_bookmark(&mut self, id: &str) {
        let Some(owner_id) = self.state.owner_id().map(String::from) else {
            return;
        };

        match self.store.delete(id, &owner_id).await {
            Ok(()) => {
                info!("Deleted bookmark {}", id);
                self.reload_for(&owner_id).await;
            }
            Err(e) => error!("Delete error: {}", e),
        }
    }

    /// Start the provider's sign-in flow. The returned future owns its
    /// captures so it can be spawned; the state transition arrives later as a
    /// session notification.
    pub fn login(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let sessions = Arc::clone(&self.sessions);
        let provider = self.options.provider;
        let redirect_to = self.options.redirect_to.clone();
        async move { sessions.sign_in_with_oauth(provider, &redirect_to).await }
    }

    /// Sign out, then clear identity and list without waiting for the
    /// resulting notification.
    pub async fn logout(&mut self) {
        if let Err(e) = self.sessions.sign_out().await {
            error!("Logout error: {}", e);
        }
        self.state.clear_session();
    }
}
