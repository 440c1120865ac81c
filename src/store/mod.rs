pub mod sqlite;

use tokio::sync::watch;

use crate::app::Result;
use crate::domain::Article;

pub use sqlite::SqliteBookmarkStore;

/// Durable, url-keyed set of bookmarked articles.
///
/// Implementations serialize writers internally; every committed change
/// publishes the full snapshot to [`BookmarkStore::observe_all`] receivers.
/// A failed write leaves the last good snapshot in place.
pub trait BookmarkStore: Send + Sync {
    /// Insert or fully replace the record with the same url.
    ///
    /// Fails with `NotPersistable` when the article has no url.
    fn upsert(&self, article: &Article) -> Result<()>;

    /// Remove the record for `url`; missing keys are not an error.
    fn delete_by_url(&self, url: &str) -> Result<()>;

    /// Save `article` if absent, remove it if present, as one write.
    /// Returns whether it is saved afterwards.
    fn toggle(&self, article: &Article) -> Result<bool>;

    fn get_all(&self) -> Result<Vec<Article>>;
    fn contains(&self, url: &str) -> Result<bool>;

    /// Remove everything, returning how many records were deleted.
    fn clear(&self) -> Result<usize>;

    /// Current snapshot, newest bookmark first, and every change after it.
    fn observe_all(&self) -> watch::Receiver<Vec<Article>>;
}
