use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user record handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn display_email(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }
}

/// An authenticated session: tokens plus the identity they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

impl Session {
    /// True when the access token expires within `margin` from `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at <= now + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at,
            user: Identity {
                id: "u1".into(),
                email: Some("a@b.com".into()),
            },
        }
    }

    #[test]
    fn test_expires_within_margin() {
        let now = Utc::now();
        let s = session(now + Duration::seconds(30));
        assert!(s.expires_within(now, Duration::seconds(60)));
        assert!(!s.expires_within(now, Duration::seconds(10)));
    }

    #[test]
    fn test_display_email_missing() {
        let identity = Identity {
            id: "u1".into(),
            email: None,
        };
        assert_eq!(identity.display_email(), "");
    }
}
