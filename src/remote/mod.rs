//! Remote headlines: the wire types, the transport seam and the pager.

pub mod http;
pub mod pager;

use async_trait::async_trait;
use serde::Deserialize;

use crate::app::Result;

pub use http::HttpNewsSource;
pub use pager::RemotePager;

/// Which feed to page through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub country: String,
    pub category: Option<String>,
}

impl FeedQuery {
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            category: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub query: FeedQuery,
    pub page: u32,
    pub page_size: usize,
}

/// Body of a headlines response. Entries stay raw so that one bad entry
/// can be dropped without failing the page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlinesResponse {
    pub status: Option<String>,
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Option<Vec<serde_json::Value>>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl HeadlinesResponse {
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}

/// Transport seam for fetching one page of headlines.
///
/// Implementations report transport failures and non-2xx responses as
/// errors; they never retry.
#[async_trait]
pub trait NewsSource {
    async fn top_headlines(&self, request: &PageRequest) -> Result<HeadlinesResponse>;
}
