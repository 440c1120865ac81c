use std::collections::HashSet;

use tracing::debug;

use crate::app::Result;
use crate::domain::{Article, ErrorInfo, LoadState, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First page, blocking.
    Initial,
    /// Next page, non-blocking.
    Append,
}

/// A page load the owner must dispatch to the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub phase: Phase,
    pub key: Option<u32>,
}

/// Outcome of a dispatched [`FetchRequest`].
#[derive(Debug)]
pub struct PageEvent {
    pub generation: u64,
    pub phase: Phase,
    pub key: Option<u32>,
    pub result: Result<Page>,
}

impl PageEvent {
    pub fn new(request: FetchRequest, result: Result<Page>) -> Self {
        Self {
            generation: request.generation,
            phase: request.phase,
            key: request.key,
            result,
        }
    }
}

/// Accumulated pages of one feed subscription.
///
/// Only one request is ever outstanding, so pages are applied in cursor
/// order. Every `reset` bumps the generation; events from an older
/// generation are dropped on arrival.
#[derive(Debug)]
pub struct Paging {
    items: Vec<Article>,
    seen: HashSet<String>,
    refresh: LoadState,
    append: LoadState,
    next_key: Option<u32>,
    end_of_feed: bool,
    in_flight: Option<Phase>,
    failed_key: Option<u32>,
    pages_loaded: u32,
    generation: u64,
}

impl Default for Paging {
    fn default() -> Self {
        Self::new()
    }
}

impl Paging {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            refresh: LoadState::Loading,
            append: LoadState::Ready,
            next_key: None,
            end_of_feed: false,
            in_flight: None,
            failed_key: None,
            pages_loaded: 0,
            generation: 0,
        }
    }

    pub fn items(&self) -> &[Article] {
        &self.items
    }

    pub fn refresh(&self) -> &LoadState {
        &self.refresh
    }

    pub fn append(&self) -> &LoadState {
        &self.append
    }

    pub fn end_of_feed(&self) -> bool {
        self.end_of_feed
    }

    /// Pages applied since the last reset.
    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The error that currently blocks progress, if any.
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.refresh.error().or_else(|| self.append.error())
    }

    /// Forget everything loaded so far.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self::new();
        self.generation = generation;
    }

    pub fn begin_initial(&mut self) -> Option<FetchRequest> {
        if self.in_flight == Some(Phase::Initial) {
            debug!("First page already loading");
            return None;
        }
        self.refresh = LoadState::Loading;
        self.in_flight = Some(Phase::Initial);
        Some(self.request(Phase::Initial, None))
    }

    pub fn retry_initial(&mut self) -> Option<FetchRequest> {
        if self.refresh.error().is_none() {
            debug!("Ignoring initial retry: first page did not fail");
            return None;
        }
        self.begin_initial()
    }

    /// Request the next page, if there is one and nothing blocks it.
    pub fn begin_append(&mut self) -> Option<FetchRequest> {
        if self.in_flight.is_some() {
            debug!("Ignoring load more: a request is already in flight");
            return None;
        }
        if self.refresh != LoadState::Ready {
            debug!("Ignoring load more: first page not loaded");
            return None;
        }
        if self.append.error().is_some() {
            debug!("Ignoring load more: last append failed, retry instead");
            return None;
        }
        let Some(key) = self.next_key else {
            debug!("Ignoring load more: end of feed");
            return None;
        };
        Some(self.start_append(key))
    }

    /// Request the page that failed last, with the same cursor.
    pub fn retry_append(&mut self) -> Option<FetchRequest> {
        if self.in_flight.is_some() || self.append.error().is_none() {
            debug!("Ignoring append retry: nothing to retry");
            return None;
        }
        let key = self.failed_key?;
        Some(self.start_append(key))
    }

    /// Apply a finished load. Returns `false` for stale events.
    pub fn apply(&mut self, event: PageEvent) -> bool {
        if event.generation != self.generation {
            debug!(
                "Discarding page {:?} from generation {} (current {})",
                event.key, event.generation, self.generation
            );
            return false;
        }
        self.in_flight = None;

        match (event.phase, event.result) {
            (Phase::Initial, Ok(page)) => {
                self.items.clear();
                self.seen.clear();
                self.extend(page.items);
                self.set_next(page.next_key);
                self.refresh = LoadState::Ready;
                self.append = LoadState::Ready;
                self.failed_key = None;
                self.pages_loaded = 1;
            }
            (Phase::Initial, Err(e)) => {
                self.refresh = LoadState::Error(e.info());
            }
            (Phase::Append, Ok(page)) => {
                self.extend(page.items);
                self.set_next(page.next_key);
                self.append = LoadState::Ready;
                self.failed_key = None;
                self.pages_loaded += 1;
            }
            (Phase::Append, Err(e)) => {
                self.append = LoadState::Error(e.info());
                self.failed_key = event.key;
            }
        }
        true
    }

    fn start_append(&mut self, key: u32) -> FetchRequest {
        self.append = LoadState::Loading;
        self.in_flight = Some(Phase::Append);
        self.request(Phase::Append, Some(key))
    }

    fn request(&self, phase: Phase, key: Option<u32>) -> FetchRequest {
        FetchRequest {
            generation: self.generation,
            phase,
            key,
        }
    }

    fn set_next(&mut self, next_key: Option<u32>) {
        self.next_key = next_key;
        self.end_of_feed = next_key.is_none();
    }

    /// Append, keeping the first occurrence of every url.
    fn extend(&mut self, articles: Vec<Article>) {
        for article in articles {
            match article.key() {
                Some(url) if !self.seen.insert(url.to_string()) => {
                    debug!("Skipping duplicate {}", url);
                }
                _ => self.items.push(article),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::TidingsError;
    use crate::domain::ErrorKind;

    fn page(number: u32, urls: std::ops::Range<u32>, next_key: Option<u32>) -> Page {
        Page {
            number,
            items: urls
                .map(|i| Article::new(format!("https://example.com/{i}"), format!("Story {i}")))
                .collect(),
            prev_key: number.checked_sub(1).filter(|p| *p > 0),
            next_key,
        }
    }

    fn loaded(paging: &mut Paging, first: Page) {
        let request = paging.begin_initial().unwrap();
        assert!(paging.apply(PageEvent::new(request, Ok(first))));
    }

    #[test]
    fn test_initial_load_then_ready() {
        let mut paging = Paging::new();
        let request = paging.begin_initial().unwrap();
        assert_eq!(request.key, None);
        assert_eq!(request.phase, Phase::Initial);
        assert!(paging.refresh().is_loading());

        paging.apply(PageEvent::new(request, Ok(page(1, 0..5, Some(2)))));
        assert_eq!(paging.refresh(), &LoadState::Ready);
        assert_eq!(paging.items().len(), 5);
        assert!(!paging.end_of_feed());
    }

    #[test]
    fn test_initial_failure_blocks_until_retry() {
        let mut paging = Paging::new();
        let request = paging.begin_initial().unwrap();
        paging.apply(PageEvent::new(request, Err(TidingsError::protocol(Some(500), "down"))));

        assert_eq!(paging.error().map(|e| e.kind), Some(ErrorKind::Protocol));
        assert!(paging.begin_append().is_none());

        let retry = paging.retry_initial().unwrap();
        assert_eq!(retry.key, None);
        assert!(paging.refresh().is_loading());
    }

    #[test]
    fn test_retry_initial_ignored_when_not_failed() {
        let mut paging = Paging::new();
        loaded(&mut paging, page(1, 0..5, Some(2)));
        assert!(paging.retry_initial().is_none());
    }

    #[test]
    fn test_single_forward_request() {
        let mut paging = Paging::new();
        loaded(&mut paging, page(1, 0..20, Some(2)));

        let request = paging.begin_append().unwrap();
        assert_eq!(request.key, Some(2));
        assert!(paging.begin_append().is_none());
        assert!(paging.is_busy());

        paging.apply(PageEvent::new(request, Ok(page(2, 20..40, Some(3)))));
        assert_eq!(paging.pages_loaded(), 2);
        assert_eq!(paging.begin_append().unwrap().key, Some(3));
    }

    #[test]
    fn test_append_failure_keeps_items_and_retries_same_key() {
        let mut paging = Paging::new();
        loaded(&mut paging, page(1, 0..20, Some(2)));

        let request = paging.begin_append().unwrap();
        paging.apply(PageEvent::new(request, Err(TidingsError::Other("timeout".into()))));

        assert_eq!(paging.items().len(), 20);
        assert_eq!(paging.pages_loaded(), 1);
        assert!(paging.append().error().is_some());
        assert_eq!(paging.refresh(), &LoadState::Ready);
        assert!(paging.begin_append().is_none());

        let retry = paging.retry_append().unwrap();
        assert_eq!(retry.key, Some(2));
        assert!(paging.append().is_loading());
    }

    #[test]
    fn test_dedup_across_pages_first_wins() {
        let mut paging = Paging::new();
        loaded(&mut paging, page(1, 0..10, Some(2)));

        let request = paging.begin_append().unwrap();
        let mut second = page(2, 5..15, None);
        second.items[0].title = Some("Changed".into());
        paging.apply(PageEvent::new(request, Ok(second)));

        assert_eq!(paging.items().len(), 15);
        assert_eq!(paging.items()[5].display_title(), "Story 5");
        assert!(paging.end_of_feed());
    }

    #[test]
    fn test_end_of_feed_blocks_load_more() {
        let mut paging = Paging::new();
        loaded(&mut paging, page(1, 0..3, None));
        assert!(paging.end_of_feed());
        assert!(paging.begin_append().is_none());
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut paging = Paging::new();
        loaded(&mut paging, page(1, 0..20, Some(2)));
        let stale = paging.begin_append().unwrap();

        paging.reset();
        let fresh = paging.begin_initial().unwrap();
        assert_ne!(stale.generation, fresh.generation);

        assert!(!paging.apply(PageEvent::new(stale, Ok(page(2, 20..40, Some(3))))));
        assert!(paging.items().is_empty());
        assert!(paging.refresh().is_loading());

        assert!(paging.apply(PageEvent::new(fresh, Ok(page(1, 100..105, None)))));
        assert_eq!(paging.items().len(), 5);
        assert_eq!(paging.pages_loaded(), 1);
    }
}
