use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, TidingsError};
use crate::config::Config;
use crate::connectivity::{
    ConnectivityMonitor, ConnectivityStatus, ManualConnectivity, ProbeConnectivity,
};
use crate::feed::{FeedAggregator, FeedHandle, FeedSettings};
use crate::remote::{FeedQuery, HttpNewsSource, NewsSource, RemotePager};
use crate::store::sqlite::SqliteBookmarkStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteBookmarkStore>,
    pub pager: Arc<RemotePager>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match &config.storage.database_path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };
        let store = Arc::new(SqliteBookmarkStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteBookmarkStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteBookmarkStore>) -> Result<Self> {
        let source: Arc<dyn NewsSource + Send + Sync> = Arc::new(HttpNewsSource::new(&config.api)?);
        let query = FeedQuery {
            country: config.api.country.clone(),
            category: config.api.category.clone(),
        };
        let pager = Arc::new(RemotePager::new(source, query, config.feed.max_page_size));

        Ok(Self {
            config,
            store,
            pager,
        })
    }

    /// Probe-backed monitor, or one pinned to `Unavailable` when offline.
    pub async fn connectivity(&self, offline: bool) -> Arc<dyn ConnectivityMonitor> {
        if offline {
            Arc::new(ManualConnectivity::new(ConnectivityStatus::Unavailable))
        } else {
            Arc::new(ProbeConnectivity::start(self.config.connectivity.clone()).await)
        }
    }

    /// Start a feed subscription. Must be called inside a tokio runtime.
    pub fn feed(&self, connectivity: Arc<dyn ConnectivityMonitor>) -> FeedHandle {
        FeedAggregator::new(
            self.pager.clone(),
            self.store.clone(),
            connectivity,
            FeedSettings::from(&self.config.feed),
        )
        .spawn()
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TidingsError::Config("Could not find data directory".into()))?;
        let tidings_dir = data_dir.join("tidings");
        std::fs::create_dir_all(&tidings_dir)?;
        Ok(tidings_dir.join("tidings.db"))
    }
}
