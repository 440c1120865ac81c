use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Client;
use url::Url;

use crate::app::{Result, TidingsError};
use crate::config::ApiConfig;
use crate::remote::{HeadlinesResponse, NewsSource, PageRequest};

const API_KEY_HEADER: &str = "X-Api-Key";

pub struct HttpNewsSource {
    client: Client,
    base_url: Url,
    api_key: Option<HeaderValue>,
}

impl HttpNewsSource {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("tidings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // `Url::join` drops the last path segment unless it ends with a slash.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let api_key = match config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Some(
                HeaderValue::from_str(key)
                    .map_err(|_| TidingsError::Config("API key is not a valid header value".into()))?,
            ),
            None => None,
        };

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn endpoint(&self, request: &PageRequest) -> Result<Url> {
        let mut url = self.base_url.join("top-headlines")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("country", &request.query.country);
            if let Some(category) = &request.query.category {
                query.append_pair("category", category);
            }
            query.append_pair("page", &request.page.to_string());
            query.append_pair("pageSize", &request.page_size.to_string());
        }
        Ok(url)
    }
}

#[async_trait]
impl NewsSource for HttpNewsSource {
    async fn top_headlines(&self, request: &PageRequest) -> Result<HeadlinesResponse> {
        let mut builder = self.client.get(self.endpoint(request)?);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<HeadlinesResponse>(&body)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(TidingsError::protocol(Some(status.as_u16()), message));
        }

        serde_json::from_slice(&body).map_err(|e| {
            TidingsError::protocol(Some(status.as_u16()), format!("malformed body: {}", e))
        })
    }
}
