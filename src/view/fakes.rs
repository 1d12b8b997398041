//! In-memory collaborators for exercising the view without a network.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::app::{Result, SmartmarkError};
use crate::auth::{OAuthProvider, SessionBus, SessionEvent, SessionProvider, SessionSubscription};
use crate::domain::{Bookmark, Identity, NewBookmark, Session};

pub fn identity(id: &str, email: &str) -> Identity {
    Identity {
        id: id.into(),
        email: Some(email.into()),
    }
}

pub fn session_for(user: Identity) -> Session {
    Session {
        access_token: format!("token-{}", user.id),
        refresh_token: "refresh".into(),
        expires_at: Utc::now() + Duration::hours(1),
        user,
    }
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, minute, 0).unwrap()
}

pub fn bookmark(id: &str, owner: &str, url: &str, created_at: DateTime<Utc>) -> Bookmark {
    Bookmark {
        id: id.into(),
        user_id: owner.into(),
        url: url.into(),
        title: Some(url.into()),
        created_at,
    }
}

fn failure(what: &str) -> SmartmarkError {
    SmartmarkError::Store {
        status: 500,
        message: format!("{} failed", what),
    }
}

#[derive(Default)]
pub struct FakeSessions {
    pub bus: SessionBus,
    pub session: Mutex<Option<Session>>,
    pub fail_current: AtomicBool,
    pub fail_sign_out: AtomicBool,
    pub sign_ins: Mutex<Vec<(OAuthProvider, String)>>,
    pub sign_outs: AtomicUsize,
}

impl FakeSessions {
    pub fn signed_in(user: Identity) -> Self {
        let fake = Self::default();
        *fake.session.lock().unwrap() = Some(session_for(user));
        fake
    }

    pub fn emit(&self, event: SessionEvent) {
        *self.session.lock().unwrap() = event.session.clone();
        self.bus.publish(event);
    }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    async fn current_session(&self) -> Result<Option<Session>> {
        if self.fail_current.load(Ordering::SeqCst) {
            return Err(SmartmarkError::Auth("session lookup failed".into()));
        }
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> SessionSubscription {
        self.bus.subscribe()
    }

    async fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> Result<()> {
        self.sign_ins
            .lock()
            .unwrap()
            .push((provider, redirect_to.to_string()));
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(SmartmarkError::Auth("revocation failed".into()));
        }
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List(String),
    Insert(NewBookmark),
    Delete { id: String, owner_id: String },
}

#[derive(Default)]
pub struct FakeStore {
    pub rows: Mutex<Vec<Bookmark>>,
    pub calls: Mutex<Vec<StoreCall>>,
    pub fail_list: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_delete: AtomicBool,
    inserted: AtomicUsize,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<Bookmark>) -> Self {
        let store = Self::default();
        *store.rows.lock().unwrap() = rows;
        store
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::List(_)))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl crate::store::BookmarkStore for FakeStore {
    async fn list(&self, owner_id: &str) -> Result<Vec<Bookmark>> {
        self.record(StoreCall::List(owner_id.to_string()));
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(failure("list"));
        }
        let mut rows: Vec<Bookmark> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, row: &NewBookmark) -> Result<()> {
        self.record(StoreCall::Insert(row.clone()));
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(failure("insert"));
        }
        let n = self.inserted.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().push(Bookmark {
            id: format!("new-{}", n),
            user_id: row.user_id.clone(),
            url: row.url.clone(),
            title: Some(row.title.clone()),
            created_at: Utc::now() + Duration::seconds(n as i64),
        });
        Ok(())
    }

    async fn delete(&self, id: &str, owner_id: &str) -> Result<()> {
        self.record(StoreCall::Delete {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
        });
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(failure("delete"));
        }
        self.rows
            .lock()
            .unwrap()
            .retain(|b| !(b.id == id && b.user_id == owner_id));
        Ok(())
    }
}
