use std::collections::HashSet;

use html_escape::decode_html_entities;
use serde::Deserialize;
use tracing::debug;

use crate::app::{Result, TidingsError};
use crate::domain::{Article, Source};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceDto {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleDto {
    source: Option<SourceDto>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

/// Turns raw headline entries into clean, unique articles.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Map, filter and dedupe one batch.
    ///
    /// Entries that fail to decode, have no usable title or have no url are
    /// dropped; of several entries with the same url the first one wins.
    pub fn normalize(&self, entries: Vec<serde_json::Value>) -> Vec<Article> {
        let mut seen = HashSet::new();
        let mut articles = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let article = match self.map_entry(entry) {
                Ok(article) => article,
                Err(e) => {
                    debug!("Dropping entry {}: {}", index, e);
                    continue;
                }
            };

            if !article.has_valid_title() {
                debug!("Dropping entry {}: placeholder or blank title", index);
                continue;
            }

            let Some(key) = article.key() else {
                debug!("Dropping entry {}: no url", index);
                continue;
            };

            if seen.insert(key.to_string()) {
                articles.push(article);
            } else {
                debug!("Dropping entry {}: duplicate url {}", index, key);
            }
        }

        articles
    }

    pub fn map_entry(&self, entry: serde_json::Value) -> Result<Article> {
        let dto: ArticleDto =
            serde_json::from_value(entry).map_err(|e| TidingsError::Mapping(e.to_string()))?;

        let source = dto
            .source
            .map(|s| Source {
                id: clean(s.id),
                name: clean(s.name),
            })
            .filter(|s| s.id.is_some() || s.name.is_some());

        Ok(Article {
            source,
            author: clean(dto.author),
            title: clean(dto.title),
            description: clean(dto.description),
            url: trimmed(dto.url),
            image_url: trimmed(dto.url_to_image),
            published_at: trimmed(dto.published_at),
            content: clean(dto.content),
        })
    }
}

/// Decode HTML entities and drop empty strings.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| decode_html_entities(&v).trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
