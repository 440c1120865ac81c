use chrono::{DateTime, Utc};

/// Upstream placeholder title for articles pulled by the publisher.
pub const REMOVED_TITLE: &str = "[Removed]";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A news article. Every field is optional because upstream data is
/// inconsistently populated; `url` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Article {
    pub source: Option<Source>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

impl Article {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Identity key, if the article has a usable one.
    pub fn key(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn is_persistable(&self) -> bool {
        self.key().is_some()
    }

    /// False for blank titles and the `[Removed]` placeholder.
    pub fn has_valid_title(&self) -> bool {
        match self.title.as_deref().map(str::trim) {
            None | Some("") | Some(REMOVED_TITLE) => false,
            Some(_) => true,
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        let raw = self.published_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_requires_non_blank_url() {
        let mut article = Article::new("https://example.com/a", "A");
        assert_eq!(article.key(), Some("https://example.com/a"));

        article.url = Some("   ".into());
        assert_eq!(article.key(), None);
        assert!(!article.is_persistable());

        article.url = None;
        assert!(!article.is_persistable());
    }

    #[test]
    fn test_removed_and_blank_titles_are_invalid() {
        let mut article = Article::new("https://example.com/a", "[Removed]");
        assert!(!article.has_valid_title());

        article.title = Some("  ".into());
        assert!(!article.has_valid_title());

        article.title = None;
        assert!(!article.has_valid_title());

        article.title = Some("Markets rally".into());
        assert!(article.has_valid_title());
    }

    #[test]
    fn test_display_title_without_title() {
        let article = Article::default();
        assert_eq!(article.display_title(), "(Untitled)");
    }

    #[test]
    fn test_published_parses_rfc3339() {
        let mut article = Article::new("https://example.com/a", "A");
        article.published_at = Some("2024-01-01T08:30:00Z".into());
        let published = article.published().unwrap();
        assert_eq!(published.to_rfc3339(), "2024-01-01T08:30:00+00:00");

        article.published_at = Some("yesterday".into());
        assert!(article.published().is_none());
    }
}
