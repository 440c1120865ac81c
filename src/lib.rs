//! # Tidings
//!
//! A paged news headlines client that keeps working when the network
//! doesn't, with bookmarks stored locally.
//!
//! ## Architecture
//!
//! Three independent inputs feed one aggregating loop:
//!
//! ```text
//! NewsSource → RemotePager ─┐
//! BookmarkStore ────────────┼→ FeedAggregator → FeedState
//! ConnectivityMonitor ──────┘
//! ```
//!
//! - [`remote`]: HTTP headlines source and the stateless page loader
//! - [`normalizer`]: Maps, filters and dedupes raw entries
//! - [`store`]: SQLite bookmark persistence with a change stream
//! - [`connectivity`]: Network status monitors
//! - [`feed`]: The aggregator, its gate pacing and the command handle
//!
//! ## Quick Start
//!
//! ```bash
//! # Show the first two pages of headlines
//! TIDINGS_API_KEY=... tidings feed --pages 2
//!
//! # Bookmark one of them
//! tidings save https://example.com/story
//!
//! # List bookmarks
//! tidings bookmarks list
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the bookmark
/// store, the pager and the connectivity monitor.
pub mod app;

/// Command-line interface using clap.
///
/// - `feed [--pages N] [--follow] [--offline]` - Show top headlines
/// - `save <url>` - Bookmark a headline
/// - `bookmarks list|remove|clear` - Manage bookmarks
/// - `status` - Connectivity and storage status
pub mod cli;

/// Configuration loaded from `~/.config/tidings/config.toml`.
pub mod config;

pub mod connectivity;

/// Core domain models.
///
/// - [`Article`](domain::Article): A headline, keyed by url
/// - [`Page`](domain::Page): One cleaned page plus its cursors
/// - [`FeedState`](domain::FeedState): What the UI renders
pub mod domain;

pub mod feed;

/// Raw entry mapping, filtering and deduplication.
pub mod normalizer;

pub mod remote;

/// SQLite persistence layer.
///
/// - [`BookmarkStore`](store::BookmarkStore): Trait defining bookmark operations
/// - [`SqliteBookmarkStore`](store::SqliteBookmarkStore): SQLite implementation
pub mod store;
