//! # smartmark
//!
//! A terminal bookmark manager backed by a hosted Supabase project.
//!
//! ## Architecture
//!
//! ```text
//! SessionProvider ──notifications──▶ BookmarkView ◀──rows── BookmarkStore
//!                                        │
//!                                   TUI / CLI
//! ```
//!
//! The hosted service owns every durable concern: sign-in, the `bookmarks`
//! table and its row-level security. This crate mirrors the current session
//! and the signed-in user's rows into a small view state and renders it.
//!
//! ## Quick Start
//!
//! ```bash
//! export SUPABASE_URL=https://<project>.supabase.co
//! export SUPABASE_ANON_KEY=<anon key>
//!
//! smartmark login
//! smartmark add https://blog.rust-lang.org
//! smartmark list
//! smartmark            # TUI
//! ```

/// Application context and error types.
pub mod app;

/// Session provider seam and the hosted auth client.
///
/// - [`SessionProvider`](auth::SessionProvider): current session, change
///   notifications, OAuth sign-in and sign-out
/// - [`SupabaseAuth`](auth::SupabaseAuth): PKCE sign-in through the browser,
///   persisted session with token refresh
pub mod auth;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/smartmark/config.toml`.
pub mod config;

/// Identity, session and bookmark records.
pub mod domain;

/// Bookmark persistence.
///
/// - [`BookmarkStore`](store::BookmarkStore): select / insert / delete seam
/// - [`RestStore`](store::RestStore): PostgREST implementation
pub mod store;

/// Terminal user interface built with ratatui.
pub mod tui;

/// Session-driven view state and the add / delete / login / logout intents.
pub mod view;
