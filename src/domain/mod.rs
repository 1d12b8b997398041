pub mod bookmark;
pub mod identity;

pub use bookmark::{Bookmark, NewBookmark};
pub use identity::{Identity, Session};
