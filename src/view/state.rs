use tracing::{debug, error, warn};

use crate::app::Result;
use crate::domain::{Bookmark, Identity};

/// Which screen the renderer shows. Evaluated in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode<'a> {
    Loading,
    Unauthenticated,
    Authenticated {
        identity: &'a Identity,
        bookmarks: &'a [Bookmark],
    },
}

/// Handle for one in-flight reload. Only the most recently issued ticket may
/// replace the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadTicket {
    token: u64,
    owner_id: String,
}

impl ReloadTicket {
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

/// Local, per-view state mirrored from the session provider and the store.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub identity: Option<Identity>,
    pub bookmarks: Vec<Bookmark>,
    pub input: String,
    pub loading: bool,
    latest_reload: u64,
}

impl ViewState {
    /// A freshly mounted view is loading until the first session query settles.
    pub fn new() -> Self {
        Self {
            identity: None,
            bookmarks: Vec::new(),
            input: String::new(),
            loading: true,
            latest_reload: 0,
        }
    }

    pub fn mode(&self) -> ViewMode<'_> {
        if self.loading {
            return ViewMode::Loading;
        }
        match &self.identity {
            None => ViewMode::Unauthenticated,
            Some(identity) => ViewMode::Authenticated {
                identity,
                bookmarks: &self.bookmarks,
            },
        }
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.id.as_str())
    }

    pub fn begin_reload(&mut self, owner_id: &str) -> ReloadTicket {
        self.latest_reload += 1;
        self.loading = true;
        ReloadTicket {
            token: self.latest_reload,
            owner_id: owner_id.to_string(),
        }
    }

    /// Settle a reload. Returns false when a newer reload (or a sign-out) has
    /// superseded `ticket`; its result is then dropped untouched.
    pub fn finish_reload(&mut self, ticket: ReloadTicket, result: Result<Vec<Bookmark>>) -> bool {
        if ticket.token != self.latest_reload {
            debug!(
                "Discarding stale reload {} (latest is {})",
                ticket.token, self.latest_reload
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(mut rows) => {
                let before = rows.len();
                rows.retain(|b| b.user_id == ticket.owner_id);
                if rows.len() != before {
                    warn!(
                        "Store returned {} rows not owned by {}",
                        before - rows.len(),
                        ticket.owner_id
                    );
                }
                self.bookmarks = rows;
            }
            Err(e) => error!("Load bookmarks error: {}", e),
        }
        true
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    /// Drop identity and list, and invalidate any reload still in flight.
    pub fn clear_session(&mut self) {
        self.identity = None;
        self.bookmarks.clear();
        self.latest_reload += 1;
        self.loading = false;
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}
