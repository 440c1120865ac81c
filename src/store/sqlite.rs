use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, Row, Transaction};
use rusqlite_migration::{Migrations, M};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::app::{Result, TidingsError};
use crate::domain::{Article, Source};
use crate::store::BookmarkStore;

const SELECT_ALL: &str = "SELECT source_id, source_name, author, title, description, url,
        image_url, published_at, content
 FROM bookmarks ORDER BY id DESC";

pub struct SqliteBookmarkStore {
    conn: Mutex<Connection>,
    snapshot: watch::Sender<Vec<Article>>,
}

impl SqliteBookmarkStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        Self::run_migrations(&mut conn)?;
        let initial = Self::query_all(&conn)?;
        let (snapshot, _rx) = watch::channel(initial);
        Ok(Self {
            conn: Mutex::new(conn),
            snapshot,
        })
    }

    fn run_migrations(conn: &mut Connection) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);
        migrations.to_latest(conn)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(TidingsError::lock_poisoned)
    }

    /// Run `write` in a transaction, then publish the committed snapshot.
    ///
    /// The lock is held until the snapshot is read, so published snapshots
    /// follow commit order.
    fn write<T>(&self, write: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        let out = write(&tx)?;
        tx.commit()?;

        match Self::query_all(&conn) {
            Ok(snapshot) => {
                self.snapshot.send_if_modified(|current| {
                    if *current == snapshot {
                        false
                    } else {
                        *current = snapshot;
                        true
                    }
                });
            }
            Err(e) => warn!("Bookmark snapshot refresh failed: {}", e),
        }

        Ok(out)
    }

    fn query_all(conn: &Connection) -> Result<Vec<Article>> {
        let mut stmt = conn.prepare(SELECT_ALL)?;
        let articles = stmt
            .query_map([], Self::article_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(articles)
    }

    fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
        let source_id: Option<String> = row.get(0)?;
        let source_name: Option<String> = row.get(1)?;
        let source = match (source_id, source_name) {
            (None, None) => None,
            (id, name) => Some(Source { id, name }),
        };

        Ok(Article {
            source,
            author: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            url: row.get(5)?,
            image_url: row.get(6)?,
            published_at: row.get(7)?,
            content: row.get(8)?,
        })
    }

    /// Insert or fully replace the row for `url`, keeping its position.
    fn save(tx: &Transaction<'_>, url: &str, article: &Article) -> rusqlite::Result<usize> {
        let source = article.source.as_ref();
        tx.execute(
            "INSERT INTO bookmarks (url, source_id, source_name, author, title, description,
                                    image_url, published_at, content, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(url) DO UPDATE SET
                source_id = excluded.source_id,
                source_name = excluded.source_name,
                author = excluded.author,
                title = excluded.title,
                description = excluded.description,
                image_url = excluded.image_url,
                published_at = excluded.published_at,
                content = excluded.content,
                saved_at = excluded.saved_at",
            params![
                url,
                source.and_then(|s| s.id.as_deref()),
                source.and_then(|s| s.name.as_deref()),
                article.author,
                article.title,
                article.description,
                article.image_url,
                article.published_at,
                article.content,
                Utc::now().to_rfc3339(),
            ],
        )
    }
}

impl BookmarkStore for SqliteBookmarkStore {
    fn upsert(&self, article: &Article) -> Result<()> {
        let url = article.key().ok_or(TidingsError::NotPersistable)?;
        self.write(|tx| {
            Self::save(tx, url, article)?;
            Ok(())
        })?;

        info!("Bookmarked {}", url);
        Ok(())
    }

    fn toggle(&self, article: &Article) -> Result<bool> {
        let url = article.key().ok_or(TidingsError::NotPersistable)?;
        let saved = self.write(|tx| {
            let removed = tx.execute("DELETE FROM bookmarks WHERE url = ?1", params![url])?;
            if removed > 0 {
                return Ok(false);
            }
            Self::save(tx, url, article)?;
            Ok(true)
        })?;

        if saved {
            info!("Bookmarked {}", url);
        } else {
            info!("Removed bookmark {}", url);
        }
        Ok(saved)
    }

    fn delete_by_url(&self, url: &str) -> Result<()> {
        let url = url.trim();
        let deleted = self.write(|tx| {
            Ok(tx.execute("DELETE FROM bookmarks WHERE url = ?1", params![url])?)
        })?;

        if deleted > 0 {
            info!("Removed bookmark {}", url);
        } else {
            debug!("No bookmark for {}", url);
        }
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Article>> {
        let conn = self.lock()?;
        Self::query_all(&conn)
    }

    fn contains(&self, url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bookmarks WHERE url = ?1",
            params![url.trim()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn clear(&self) -> Result<usize> {
        let deleted = self.write(|tx| Ok(tx.execute("DELETE FROM bookmarks", [])?))?;
        info!("Cleared {} bookmarks", deleted);
        Ok(deleted)
    }

    fn observe_all(&self) -> watch::Receiver<Vec<Article>> {
        self.snapshot.subscribe()
    }
}
