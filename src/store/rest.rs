use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;
use url::Url;

use crate::app::{Result, SmartmarkError};
use crate::auth::SessionProvider;
use crate::config::SupabaseConfig;
use crate::domain::{Bookmark, NewBookmark};
use crate::store::BookmarkStore;

pub const TABLE: &str = "bookmarks";

/// Bookmark table served over the hosted PostgREST API.
///
/// Requests carry the signed-in user's access token so the table's
/// row-level security policies apply; without a session the anon key is sent.
pub struct RestStore {
    client: Client,
    table_url: Url,
    anon_key: String,
    sessions: Arc<dyn SessionProvider>,
}

impl RestStore {
    pub fn new(client: Client, config: &SupabaseConfig, sessions: Arc<dyn SessionProvider>) -> Result<Self> {
        Ok(Self {
            client,
            table_url: config.endpoint(&format!("rest/v1/{}", TABLE))?,
            anon_key: config.anon_key.clone(),
            sessions,
        })
    }

    pub(crate) fn list_url(&self, owner_id: &str) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{}", owner_id))
            .append_pair("order", "created_at.desc");
        url
    }

    pub(crate) fn delete_url(&self, id: &str, owner_id: &str) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id))
            .append_pair("user_id", &format!("eq.{}", owner_id));
        url
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = match self.sessions.current_session().await? {
            Some(session) => session.access_token,
            None => self.anon_key.clone(),
        };
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| SmartmarkError::Auth(format!("unusable access token: {}", e)))?;
        Ok(request.header("apikey", &self.anon_key).header(AUTHORIZATION, bearer))
    }
}

#[async_trait]
impl BookmarkStore for RestStore {
    async fn list(&self, owner_id: &str) -> Result<Vec<Bookmark>> {
        let request = self.authorized(self.client.get(self.list_url(owner_id))).await?;
        let response = check_status(request.send().await?).await?;
        let body = response.text().await?;
        let rows: Vec<Bookmark> = serde_json::from_str(&body)?;
        debug!("Loaded {} bookmarks", rows.len());
        Ok(rows)
    }

    async fn insert(&self, row: &NewBookmark) -> Result<()> {
        let request = self
            .authorized(self.client.post(self.table_url.clone()))
            .await?
            .header("Prefer", "return=minimal")
            .json(&[row]);
        check_status(request.send().await?).await?;
        Ok(())
    }

    async fn delete(&self, id: &str, owner_id: &str) -> Result<()> {
        let request = self
            .authorized(self.client.delete(self.delete_url(id, owner_id)))
            .await?;
        check_status(request.send().await?).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(store_error(status.as_u16(), &body))
}

/// PostgREST errors are `{"code", "message", "details", "hint"}` objects.
fn store_error(status: u16, body: &str) -> SmartmarkError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string());
    SmartmarkError::Store { status, message }
}
