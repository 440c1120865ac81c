use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::gate::{GateState, GateTransition};
use super::handle::{Command, FeedHandle};
use super::paging::{FetchRequest, PageEvent, Paging};
use crate::config::FeedConfig;
use crate::connectivity::{ConnectivityMonitor, ConnectivityStatus};
use crate::domain::{Article, FeedState};
use crate::remote::RemotePager;
use crate::store::BookmarkStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSettings {
    /// Nominal page size; also the gate boundary.
    pub page_size: usize,
    pub gate_delay: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            gate_delay: Duration::from_millis(3000),
        }
    }
}

impl From<&FeedConfig> for FeedSettings {
    fn from(config: &FeedConfig) -> Self {
        // Gate boundaries follow the size the pager actually requests.
        Self {
            page_size: config.page_size.clamp(1, config.max_page_size.max(1)),
            gate_delay: config.gate_delay(),
        }
    }
}

/// Combines pages, bookmarks and connectivity into one [`FeedState`].
pub struct FeedAggregator {
    pager: Arc<RemotePager>,
    store: Arc<dyn BookmarkStore>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    settings: FeedSettings,
}

impl FeedAggregator {
    pub fn new(
        pager: Arc<RemotePager>,
        store: Arc<dyn BookmarkStore>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            pager,
            store,
            connectivity,
            settings,
        }
    }

    /// Start the subscription on the current runtime and begin loading the
    /// first page.
    ///
    /// The returned handle already holds a complete state built from the
    /// current connectivity and bookmark snapshots. The background loop runs
    /// until every handle and state receiver is dropped.
    pub fn spawn(self) -> FeedHandle {
        let mut bookmarks_rx = self.store.observe_all();
        let mut connectivity_rx = self.connectivity.observe();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let bookmarked = urls(&bookmarks_rx.borrow_and_update());
        let connectivity = *connectivity_rx.borrow_and_update();
        let (state_tx, state_rx) = watch::channel(FeedState::new(connectivity));

        let mut feed = FeedLoop {
            pager: self.pager,
            settings: self.settings,
            paging: Paging::new(),
            gate: GateState::new(self.settings.page_size),
            gate_deadline: None,
            bookmarked,
            connectivity,
            state_tx,
            results_tx,
        };

        if let Some(request) = feed.paging.begin_initial() {
            feed.dispatch(request);
        }
        feed.publish();

        info!(
            "Feed started (page size {}, connectivity {})",
            self.settings.page_size, connectivity
        );
        tokio::spawn(feed.run(commands_rx, results_rx, bookmarks_rx, connectivity_rx));

        FeedHandle::new(commands_tx, state_rx, self.store)
    }
}

/// The single owner of all feed state.
struct FeedLoop {
    pager: Arc<RemotePager>,
    settings: FeedSettings,
    paging: Paging,
    gate: GateState,
    gate_deadline: Option<Instant>,
    bookmarked: BTreeSet<String>,
    connectivity: ConnectivityStatus,
    state_tx: watch::Sender<FeedState>,
    results_tx: mpsc::UnboundedSender<PageEvent>,
}

impl FeedLoop {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut results: mpsc::UnboundedReceiver<PageEvent>,
        mut bookmarks: watch::Receiver<Vec<Article>>,
        mut connectivity: watch::Receiver<ConnectivityStatus>,
    ) {
        let mut commands_open = true;
        let mut bookmarks_open = true;
        let mut connectivity_open = true;

        loop {
            let deadline = self.gate_deadline;

            tokio::select! {
                _ = self.state_tx.closed() => {
                    debug!("No feed observers left, stopping");
                    break;
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        commands_open = false;
                        continue;
                    }
                },
                Some(event) = results.recv() => {
                    if !self.apply(event) {
                        continue;
                    }
                }
                changed = bookmarks.changed(), if bookmarks_open => match changed {
                    Ok(()) => self.bookmarked = urls(&bookmarks.borrow_and_update()),
                    Err(_) => {
                        warn!("Bookmark stream closed; keeping last snapshot");
                        bookmarks_open = false;
                        continue;
                    }
                },
                changed = connectivity.changed(), if connectivity_open => match changed {
                    Ok(()) => self.connectivity = *connectivity.borrow_and_update(),
                    Err(_) => {
                        warn!("Connectivity stream closed; keeping {}", self.connectivity);
                        connectivity_open = false;
                        continue;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.expire_gate();
                }
            }

            self.publish();
        }
    }

    fn handle_command(&mut self, command: Command) {
        debug!("Feed command: {:?}", command);
        let request = match command {
            Command::LoadMore => self.paging.begin_append(),
            Command::RetryAppend => self.paging.retry_append(),
            Command::RetryInitial => self.paging.retry_initial(),
            Command::Refresh => {
                self.paging.reset();
                self.gate.reset();
                self.gate_deadline = None;
                self.paging.begin_initial()
            }
        };
        if let Some(request) = request {
            self.dispatch(request);
        }
    }

    fn apply(&mut self, event: PageEvent) -> bool {
        if let Err(e) = &event.result {
            warn!("{:?} load of page {:?} failed: {}", event.phase, event.key, e);
        }
        if !self.paging.apply(event) {
            return false;
        }

        let total = self.paging.items().len();
        if self.gate.observe_count(total) == GateTransition::Started {
            info!(
                "Gate closed at {} items, showing {}",
                total,
                self.gate.last_boundary()
            );
            self.gate_deadline = Some(Instant::now() + self.settings.gate_delay);
        }
        true
    }

    fn expire_gate(&mut self) {
        match self.gate.expire() {
            GateTransition::Restarted => {
                info!("Gate advanced to {} items", self.gate.last_boundary());
                self.gate_deadline = Some(Instant::now() + self.settings.gate_delay);
            }
            GateTransition::Released => {
                info!("Gate opened at {} items", self.gate.last_boundary());
                self.gate_deadline = None;
            }
            GateTransition::Started | GateTransition::Unchanged => {
                self.gate_deadline = None;
            }
        }
    }

    /// Run the load off the loop and deliver the result back as an event.
    fn dispatch(&self, request: FetchRequest) {
        let pager = Arc::clone(&self.pager);
        let results = self.results_tx.clone();
        let page_size = self.settings.page_size;

        tokio::spawn(async move {
            let result = pager.load(request.key, page_size).await;
            if results.send(PageEvent::new(request, result)).is_err() {
                debug!("Feed gone, discarding page {:?}", request.key);
            }
        });
    }

    fn snapshot(&self) -> FeedState {
        let items = self.paging.items();
        let visible = self.gate.visible_count(items.len());

        FeedState {
            items: items[..visible].to_vec(),
            total_loaded: items.len(),
            pages_loaded: self.paging.pages_loaded(),
            connectivity: self.connectivity,
            is_offline: self.connectivity.is_offline(),
            gate_active: self.gate.is_active(),
            refresh: self.paging.refresh().clone(),
            append: self.paging.append().clone(),
            end_of_feed: self.paging.end_of_feed(),
            bookmarked: self.bookmarked.clone(),
            error: self.paging.error().cloned(),
        }
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }
}

fn urls(articles: &[Article]) -> BTreeSet<String> {
    articles
        .iter()
        .filter_map(Article::key)
        .map(str::to_string)
        .collect()
}
