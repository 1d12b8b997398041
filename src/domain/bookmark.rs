use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// A stored URL row owned by exactly one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub user_id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.url,
        }
    }
}

/// Row sent to the store on insert. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBookmark {
    pub user_id: String,
    pub url: String,
    pub title: String,
}

impl NewBookmark {
    /// Build a row whose title defaults to the url.
    pub fn new(user_id: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            user_id: user_id.into(),
            title: url.clone(),
            url,
        }
    }
}

/// Tables keyed by `bigint` serialize ids as JSON numbers, `uuid` tables as
/// strings. Both end up as an opaque string.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    match RawId::deserialize(deserializer) {
        Ok(RawId::Text(s)) => Ok(s),
        Ok(RawId::Number(n)) => Ok(n.to_string()),
        Err(_) => Err(de::Error::custom("bookmark id must be a string or integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bookmark_title_defaults_to_url() {
        let row = NewBookmark::new("u1", "https://z.com");
        assert_eq!(row.user_id, "u1");
        assert_eq!(row.url, "https://z.com");
        assert_eq!(row.title, "https://z.com");
    }

    #[test]
    fn test_deserialize_postgrest_row_with_uuid_id() {
        let json = r#"{
            "id": "8c1f4a8e-2b7a-4a51-9a55-3f1c4d8e9b10",
            "user_id": "u1",
            "url": "https://x.com",
            "title": "https://x.com",
            "created_at": "2024-05-01T10:15:30.123456+00:00"
        }"#;
        let bookmark: Bookmark = serde_json::from_str(json).unwrap();
        assert_eq!(bookmark.id, "8c1f4a8e-2b7a-4a51-9a55-3f1c4d8e9b10");
        assert_eq!(bookmark.created_at.to_rfc3339(), "2024-05-01T10:15:30.123456+00:00");
    }

    #[test]
    fn test_deserialize_numeric_id() {
        let json = r#"{"id": 42, "user_id": "u1", "url": "https://x.com", "created_at": "2024-05-01T10:15:30Z"}"#;
        let bookmark: Bookmark = serde_json::from_str(json).unwrap();
        assert_eq!(bookmark.id, "42");
        assert_eq!(bookmark.title, None);
    }

    #[test]
    fn test_deserialize_rejects_bool_id() {
        let json = r#"{"id": true, "user_id": "u1", "url": "https://x.com", "created_at": "2024-05-01T10:15:30Z"}"#;
        assert!(serde_json::from_str::<Bookmark>(json).is_err());
    }

    #[test]
    fn test_display_title_falls_back_to_url() {
        let json = r#"{"id": "1", "user_id": "u1", "url": "https://x.com", "title": "", "created_at": "2024-05-01T10:15:30Z"}"#;
        let bookmark: Bookmark = serde_json::from_str(json).unwrap();
        assert_eq!(bookmark.display_title(), "https://x.com");
    }
}
