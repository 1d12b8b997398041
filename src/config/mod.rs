//! Configuration management for smartmark.
//!
//! Configuration is read from `~/.config/smartmark/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! `SUPABASE_URL` and `SUPABASE_ANON_KEY` override the `[supabase]` section.

pub mod colors;
pub mod keybindings;

pub use colors::ColorConfig;
pub use keybindings::KeybindingConfig;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::auth::OAuthProvider;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub supabase: SupabaseConfig,
    pub auth: AuthConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

/// Location and public key of the hosted project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.url = url;
        }
        if let Some(key) = anon_key.filter(|k| !k.trim().is_empty()) {
            self.anon_key = key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("supabase.url"));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::Missing("supabase.anon_key"));
        }
        Url::parse(self.url.trim()).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            source: e,
        })?;
        Ok(())
    }

    /// `<url>/<path>`, tolerating a trailing slash on the project url.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}",
            self.url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub provider: OAuthProvider,
    /// Loopback port receiving the OAuth redirect. Must be listed in the
    /// project's allowed redirect URLs.
    pub callback_port: u16,
    pub login_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: OAuthProvider::Google,
            callback_port: 54321,
            login_timeout_secs: 300,
        }
    }
}

impl AuthConfig {
    /// The client's origin, used as the OAuth redirect target.
    pub fn redirect_origin(&self) -> String {
        format!("http://127.0.0.1:{}", self.callback_port)
    }
}

impl Config {
    /// Load configuration from the default path, then apply env overrides.
    ///
    /// Missing fields in the config file use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::default_config_path()?)?;
        config.supabase.apply_overrides(
            std::env::var("SUPABASE_URL").ok(),
            std::env::var("SUPABASE_ANON_KEY").ok(),
        );
        Ok(config)
    }

    /// Read `path`, writing the commented default first if it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("smartmark").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, Self::default_config_content()).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn default_config_content() -> &'static str {
        r##"# smartmark configuration

[supabase]
# Project URL and anon (public) key from the project's API settings.
# SUPABASE_URL / SUPABASE_ANON_KEY take precedence when set.
url = ""
anon_key = ""

[auth]
# OAuth provider: google, github or gitlab
provider = "google"
# Add http://127.0.0.1:<port> to the project's redirect allow list
callback_port = 54321
login_timeout_secs = 300

[colors]
# Named colors (Black, Red, Cyan, DarkGray, LightBlue, ...) or "#RRGGBB" / "#RGB"
border = "DarkGray"
input_border = "Cyan"
selection_bg = "Cyan"
selection_fg = "Black"
heading = "White"
email = "Yellow"
link = "Blue"
muted = "DarkGray"
alert_border = "Red"
status_fg = "White"
status_bg = "DarkGray"

[keybindings]
# Single characters, special keys (Enter, Delete, Up, ...) and modifiers ("Ctrl+c")
quit = ["q", "Ctrl+c"]
move_up = ["k", "Up"]
move_down = ["j", "Down"]
edit_url = ["a", "i"]
open_bookmark = ["o", "Enter"]
delete_bookmark = ["d", "Delete"]
reload = ["R"]
login = ["l"]
logout = ["L"]
"##
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing required setting `{0}` (set it in config.toml or the environment)")]
    Missing(&'static str),

    #[error("Invalid Supabase url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}
