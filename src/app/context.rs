use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::app::error::{Result, SmartmarkError};
use crate::auth::session_file::SessionFile;
use crate::auth::{SessionProvider, SupabaseAuth};
use crate::config::Config;
use crate::store::{BookmarkStore, RestStore};
use crate::view::{BookmarkView, ViewOptions};

pub struct AppContext {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionProvider>,
    pub store: Arc<dyn BookmarkStore>,
}

impl AppContext {
    /// Wire the hosted auth and store clients from `config`.
    pub fn new(config: Config) -> Result<Self> {
        config
            .supabase
            .validate()
            .map_err(|e| SmartmarkError::Config(e.to_string()))?;

        let client = http_client()?;
        let sessions: Arc<dyn SessionProvider> = Arc::new(SupabaseAuth::new(
            client.clone(),
            config.supabase.clone(),
            SessionFile::new(SessionFile::default_path()?),
            Duration::from_secs(config.auth.login_timeout_secs),
        ));
        let store: Arc<dyn BookmarkStore> =
            Arc::new(RestStore::new(client, &config.supabase, sessions.clone())?);

        Ok(Self {
            config: Arc::new(config),
            sessions,
            store,
        })
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            provider: self.config.auth.provider,
            redirect_to: self.config.auth.redirect_origin(),
        }
    }

    pub async fn mount_view(&self) -> BookmarkView {
        BookmarkView::mount(self.sessions.clone(), self.store.clone(), self.view_options()).await
    }
}

/// Shared HTTP client for the auth and REST endpoints.
pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .gzip(true)
        .brotli(true)
        .user_agent(concat!("smartmark/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
