use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::app::Result;
use crate::domain::{Article, FeedState};
use crate::store::BookmarkStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    LoadMore,
    RetryInitial,
    RetryAppend,
    Refresh,
}

/// What to remove from the bookmarks: an article or a bare url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkTarget {
    Article(Article),
    Url(String),
}

impl BookmarkTarget {
    fn url(&self) -> Option<&str> {
        match self {
            BookmarkTarget::Article(article) => article.key(),
            BookmarkTarget::Url(url) => Some(url.trim()).filter(|u| !u.is_empty()),
        }
    }
}

impl From<Article> for BookmarkTarget {
    fn from(article: Article) -> Self {
        BookmarkTarget::Article(article)
    }
}

impl From<&Article> for BookmarkTarget {
    fn from(article: &Article) -> Self {
        BookmarkTarget::Article(article.clone())
    }
}

impl From<String> for BookmarkTarget {
    fn from(url: String) -> Self {
        BookmarkTarget::Url(url)
    }
}

impl From<&str> for BookmarkTarget {
    fn from(url: &str) -> Self {
        BookmarkTarget::Url(url.to_string())
    }
}

/// Observer and command surface of a running feed.
///
/// Clones share the same subscription. Feed commands are fire-and-forget
/// and never block; bookmark writes go straight to the store and the
/// resulting membership change reaches [`FeedState::bookmarked`] through
/// the store's change stream.
#[derive(Clone)]
pub struct FeedHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<FeedState>,
    store: Arc<dyn BookmarkStore>,
}

impl FeedHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        state: watch::Receiver<FeedState>,
        store: Arc<dyn BookmarkStore>,
    ) -> Self {
        Self {
            commands,
            state,
            store,
        }
    }

    /// Latest state.
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// The current state followed by every later one. Intermediate states
    /// may be skipped when the consumer lags; the latest is never lost.
    pub fn stream(&self) -> impl Stream<Item = FeedState> + Send + 'static {
        let rx = self.state.clone();
        futures::stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first {
                rx.changed().await.ok()?;
            }
            let state = rx.borrow_and_update().clone();
            Some((state, (rx, false)))
        })
    }

    /// Advance to the next page. Ignored while a load is running, after an
    /// append failure or at the end of the feed.
    pub fn load_more(&self) {
        self.send(Command::LoadMore);
    }

    pub fn retry_initial(&self) {
        self.send(Command::RetryInitial);
    }

    /// Reload the page that failed, with the same cursor.
    pub fn retry_append(&self) {
        self.send(Command::RetryAppend);
    }

    /// Start over from the first page.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Save `article`; fails with `NotPersistable` when it has no url.
    pub fn bookmark(&self, article: &Article) -> Result<()> {
        self.store.upsert(article).map_err(|e| {
            warn!("Bookmark failed: {}", e);
            e
        })
    }

    /// Remove a bookmark. Removing something that is not saved is a no-op.
    pub fn unbookmark(&self, target: impl Into<BookmarkTarget>) -> Result<()> {
        let target = target.into();
        let Some(url) = target.url() else {
            debug!("Nothing to unbookmark: no url");
            return Ok(());
        };
        self.store.delete_by_url(url)
    }

    /// Flip the bookmark for `article`, returning whether it is now saved.
    pub fn toggle_bookmark(&self, article: &Article) -> Result<bool> {
        self.store.toggle(article).map_err(|e| {
            warn!("Bookmark toggle failed: {}", e);
            e
        })
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Feed stopped, dropping {:?}", command);
        }
    }
}
