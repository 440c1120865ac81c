use std::sync::Arc;

use tracing::{info, warn};

use crate::app::{Result, TidingsError};
use crate::domain::{Page, FIRST_PAGE};
use crate::normalizer::Normalizer;
use crate::remote::{FeedQuery, NewsSource, PageRequest};

/// Stateless page loader: `(cursor, size hint) -> Page`.
///
/// Never retries and never surfaces partial data; retry policy belongs to
/// the caller.
pub struct RemotePager {
    source: Arc<dyn NewsSource + Send + Sync>,
    normalizer: Normalizer,
    query: FeedQuery,
    max_page_size: usize,
}

impl RemotePager {
    pub fn new(
        source: Arc<dyn NewsSource + Send + Sync>,
        query: FeedQuery,
        max_page_size: usize,
    ) -> Self {
        Self {
            source,
            normalizer: Normalizer::new(),
            query,
            max_page_size: max_page_size.max(1),
        }
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    /// Load the page at `key` (`None` is the first page).
    pub async fn load(&self, key: Option<u32>, page_size_hint: usize) -> Result<Page> {
        let number = key.unwrap_or(FIRST_PAGE).max(FIRST_PAGE);
        let page_size = page_size_hint.clamp(1, self.max_page_size);

        let request = PageRequest {
            query: self.query.clone(),
            page: number,
            page_size,
        };

        let response = match self.source.top_headlines(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Loading page {} failed: {}", number, e);
                return Err(e);
            }
        };

        if response.is_error() {
            let message = response
                .message
                .or(response.code)
                .unwrap_or_else(|| "unknown upstream error".to_string());
            warn!("Page {} rejected upstream: {}", number, message);
            return Err(TidingsError::protocol(None, message));
        }

        let raw = response.articles.unwrap_or_default();
        let raw_len = raw.len();
        let items = self.normalizer.normalize(raw);

        let next_key = next_key(number, page_size, response.total_results, raw_len);
        let prev_key = prev_key(number);

        info!(
            "Loaded page {} ({} of {} entries kept, next: {:?})",
            number,
            items.len(),
            raw_len,
            next_key
        );

        Ok(Page {
            number,
            items,
            prev_key,
            next_key,
        })
    }
}

/// With a declared total the last page is `ceil(total / page_size)`.
/// Without one, a short raw batch (counted before filtering) ends the feed.
/// That can stop one page early when a full page is filtered away; it is
/// accepted rather than fetching ahead.
pub fn next_key(page: u32, page_size: usize, total_results: Option<u64>, raw_len: usize) -> Option<u32> {
    let exhausted = match total_results {
        Some(total) => u64::from(page) >= total.div_ceil(page_size as u64),
        None => raw_len < page_size,
    };
    if exhausted {
        None
    } else {
        Some(page + 1)
    }
}

pub fn prev_key(page: u32) -> Option<u32> {
    if page <= FIRST_PAGE {
        None
    } else {
        Some(page - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::remote::HeadlinesResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns the same canned response for every page and records requests.
    struct CannedSource {
        response: std::result::Result<HeadlinesResponse, u16>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl CannedSource {
        fn ok(response: HeadlinesResponse) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(response),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                response: Err(status),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NewsSource for CannedSource {
        async fn top_headlines(&self, request: &PageRequest) -> Result<HeadlinesResponse> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.response {
                Ok(response) => Ok(response.clone()),
                Err(status) => Err(TidingsError::protocol(Some(*status), "boom")),
            }
        }
    }

    fn entries(n: usize) -> Vec<serde_json::Value> {
        (0..n)
            .map(|i| json!({"title": format!("Story {i}"), "url": format!("https://example.com/{i}")}))
            .collect()
    }

    fn response(total: Option<u64>, articles: Vec<serde_json::Value>) -> HeadlinesResponse {
        HeadlinesResponse {
            status: Some("ok".into()),
            total_results: total,
            articles: Some(articles),
            ..Default::default()
        }
    }

    fn pager(source: Arc<CannedSource>) -> RemotePager {
        RemotePager::new(source, FeedQuery::country("us"), 100)
    }

    #[test]
    fn test_next_key_with_total_results() {
        // 45 results at 20 per page: pages 1 and 2 continue, page 3 ends.
        assert_eq!(next_key(1, 20, Some(45), 20), Some(2));
        assert_eq!(next_key(2, 20, Some(45), 20), Some(3));
        assert_eq!(next_key(3, 20, Some(45), 5), None);
        assert_eq!(next_key(4, 20, Some(45), 0), None);
    }

    #[test]
    fn test_next_key_exact_multiple_total() {
        assert_eq!(next_key(1, 20, Some(40), 20), Some(2));
        assert_eq!(next_key(2, 20, Some(40), 20), None);
    }

    #[test]
    fn test_next_key_zero_total_ends_immediately() {
        assert_eq!(next_key(1, 20, Some(0), 0), None);
    }

    #[test]
    fn test_next_key_size_heuristic_uses_raw_count() {
        assert_eq!(next_key(1, 20, None, 20), Some(2));
        assert_eq!(next_key(1, 20, None, 19), None);
        assert_eq!(next_key(5, 20, None, 0), None);
    }

    #[test]
    fn test_prev_key() {
        assert_eq!(prev_key(1), None);
        assert_eq!(prev_key(2), Some(1));
        assert_eq!(prev_key(7), Some(6));
    }

    #[tokio::test]
    async fn test_first_page_defaults_and_cursors() {
        let source = CannedSource::ok(response(Some(45), entries(20)));
        let page = pager(source.clone()).load(None, 20).await.unwrap();

        assert_eq!(page.number, 1);
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.prev_key, None);
        assert_eq!(page.next_key, Some(2));

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0].page, 1);
        assert_eq!(requests[0].page_size, 20);
        assert_eq!(requests[0].query.country, "us");
    }

    #[tokio::test]
    async fn test_third_page_of_45_is_last() {
        let source = CannedSource::ok(response(Some(45), entries(5)));
        let page = pager(source).load(Some(3), 20).await.unwrap();
        assert_eq!(page.prev_key, Some(2));
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_page_size_hint_is_capped() {
        let source = CannedSource::ok(response(None, entries(3)));
        let pager = RemotePager::new(source.clone(), FeedQuery::country("us"), 50);

        pager.load(None, 500).await.unwrap();
        pager.load(None, 0).await.unwrap();

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0].page_size, 50);
        assert_eq!(requests[1].page_size, 1);
    }

    #[tokio::test]
    async fn test_fully_filtered_page_ends_feed_without_total() {
        // A full raw page of noise keeps paging; a short one ends it even if
        // everything in it was dropped.
        let noise: Vec<_> = (0..20)
            .map(|i| json!({"title": "[Removed]", "url": format!("https://removed.com/{i}")}))
            .collect();
        let source = CannedSource::ok(response(None, noise));
        let page = pager(source).load(Some(2), 20).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_key, Some(3));

        let short_noise: Vec<_> = (0..19)
            .map(|i| json!({"title": "[Removed]", "url": format!("https://removed.com/{i}")}))
            .collect();
        let source = CannedSource::ok(response(None, short_noise));
        let page = pager(source).load(Some(2), 20).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_key, None);
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_protocol_error() {
        let source = CannedSource::ok(HeadlinesResponse {
            status: Some("error".into()),
            code: Some("apiKeyInvalid".into()),
            message: Some("Your API key is invalid".into()),
            ..Default::default()
        });
        let err = pager(source).load(None, 20).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("Your API key is invalid"));
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let source = CannedSource::failing(503);
        let err = pager(source).load(Some(2), 20).await.unwrap_err();
        assert!(matches!(err, TidingsError::Protocol { status: Some(503), .. }));
    }

    #[tokio::test]
    async fn test_missing_articles_is_empty_last_page() {
        let source = CannedSource::ok(HeadlinesResponse {
            status: Some("ok".into()),
            ..Default::default()
        });
        let page = pager(source).load(None, 20).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.is_last());
    }
}
