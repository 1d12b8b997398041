pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "smartmark")]
#[command(about = "Personal bookmarks in your terminal, stored in Supabase", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the TUI (default)
    Tui,
    /// Sign in through the browser
    Login,
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List your bookmarks, newest first
    List,
    /// Add a bookmark
    Add {
        /// URL to bookmark
        url: String,
    },
    /// Delete a bookmark by id
    Delete {
        /// Bookmark id as shown by `list`
        id: String,
    },
}

impl Commands {
    pub fn is_tui(command: &Option<Commands>) -> bool {
        matches!(command, None | Some(Commands::Tui))
    }
}
