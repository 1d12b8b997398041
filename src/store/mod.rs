pub mod rest;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Bookmark, NewBookmark};

pub use rest::RestStore;

/// Remote table of bookmark rows.
///
/// Every call may fail with a transport or authorization error; an `Err` is
/// never folded into an empty result. Tenant isolation is enforced by the
/// store's row-level security, not by callers of this trait.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// All rows owned by `owner_id`, newest `created_at` first.
    async fn list(&self, owner_id: &str) -> Result<Vec<Bookmark>>;

    async fn insert(&self, row: &NewBookmark) -> Result<()>;

    /// Delete the row with `id`, scoped to rows owned by `owner_id`.
    async fn delete(&self, id: &str, owner_id: &str) -> Result<()>;
}
