pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tidings")]
#[command(about = "Paged news headlines with local bookmarks", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/tidings/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API key for the headlines service
    #[arg(long, env = "TIDINGS_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show top headlines
    Feed {
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// Keep running and reload when the connection comes back
        #[arg(short, long)]
        follow: bool,

        /// Treat the network as unavailable (the feed is still attempted)
        #[arg(long)]
        offline: bool,
    },
    /// Bookmark a headline by its URL
    Save {
        /// URL of the article
        url: String,

        /// How many feed pages to search for the article
        #[arg(long, default_value_t = 3)]
        search_pages: u32,
    },
    /// Manage bookmarks
    Bookmarks {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Show connectivity and storage status
    Status,
}

#[derive(Subcommand)]
pub enum BookmarkAction {
    /// List saved articles, newest first
    List,
    /// Remove a bookmark
    Remove {
        /// URL of the bookmarked article
        url: String,
    },
    /// Remove every bookmark
    Clear,
}
