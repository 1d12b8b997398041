use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmartmarkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error ({status}): {message}")]
    Store { status: u16, message: String },

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Client-side precondition failures. Raised before any network call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("You are not logged in")]
    NotLoggedIn,

    #[error("Enter a URL")]
    EmptyUrl,
}

pub type Result<T> = std::result::Result<T, SmartmarkError>;
