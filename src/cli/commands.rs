use futures::StreamExt;

use crate::app::{AppContext, Result, TidingsError};
use crate::connectivity::ConnectivityStatus;
use crate::domain::{Article, FeedView, Footer, FIRST_PAGE};
use crate::store::BookmarkStore;

/// Print the feed as pages become visible.
///
/// Without `follow` this returns once `pages` pages are shown, the feed
/// ends or a load fails. With `follow` it keeps watching and reloads from
/// the first page whenever connectivity comes back.
pub async fn show_feed(ctx: &AppContext, pages: u32, follow: bool, offline: bool) -> Result<()> {
    let connectivity = ctx.connectivity(offline).await;
    let handle = ctx.feed(connectivity);
    let mut states = Box::pin(handle.stream());

    let mut printed = 0;
    let mut requested_after: Option<u32> = None;
    let mut last_status: Option<ConnectivityStatus> = None;

    loop {
        let state = tokio::select! {
            state = states.next() => match state {
                Some(state) => state,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        if last_status != Some(state.connectivity) {
            let was_offline = last_status.map(ConnectivityStatus::is_offline);
            if state.is_offline {
                eprintln!("-- Offline ({}) --", state.connectivity);
            } else if was_offline == Some(true) {
                eprintln!("-- Back online --");
                if follow {
                    printed = 0;
                    requested_after = None;
                    handle.refresh();
                }
            }
            last_status = Some(state.connectivity);
        }

        match state.view() {
            FeedView::Loading => {}
            FeedView::Error { error, .. } => {
                eprintln!("Could not load headlines: {}", error.message);
                if !follow {
                    break;
                }
            }
            FeedView::Empty => {
                println!("No headlines");
                if !follow {
                    break;
                }
            }
            FeedView::List { items, footer } => {
                for (index, article) in items.iter().enumerate().skip(printed) {
                    print_article(index + 1, article, state.is_bookmarked(article));
                }
                printed = printed.max(items.len());

                match footer {
                    Footer::Gate | Footer::AppendLoading => {}
                    Footer::AppendError(error) => {
                        eprintln!("Could not load more: {}", error.message);
                        if !follow {
                            break;
                        }
                    }
                    Footer::EndOfFeed => {
                        println!("End of feed");
                        if !follow {
                            break;
                        }
                    }
                    Footer::None if state.pages_loaded < pages => {
                        if request_once(&mut requested_after, state.pages_loaded) {
                            handle.load_more();
                        }
                    }
                    Footer::None => {
                        if !follow {
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Whether to ask for the page after `pages_loaded`. States published
/// before the append starts loading must not ask again.
fn request_once(requested_after: &mut Option<u32>, pages_loaded: u32) -> bool {
    if *requested_after == Some(pages_loaded) {
        return false;
    }
    *requested_after = Some(pages_loaded);
    true
}

/// Find `url` in the first `search_pages` pages of the feed and bookmark it.
pub async fn save(ctx: &AppContext, url: &str, search_pages: u32) -> Result<()> {
    let url = url.trim();
    let page_size = ctx.config.feed.page_size;
    let mut key = Some(FIRST_PAGE);

    while let Some(page) = key.filter(|k| *k < FIRST_PAGE + search_pages) {
        let loaded = ctx.pager.load(Some(page), page_size).await?;
        if let Some(article) = loaded.items.iter().find(|a| a.key() == Some(url)) {
            ctx.store.upsert(article)?;
            println!("Saved: {}", article.display_title());
            return Ok(());
        }
        key = loaded.next_key;
    }

    Err(TidingsError::Other(format!(
        "{} not found in the first {} pages",
        url, search_pages
    )))
}

pub fn list_bookmarks(ctx: &AppContext) -> Result<()> {
    let articles = ctx.store.get_all()?;

    if articles.is_empty() {
        println!("No bookmarks");
        return Ok(());
    }

    for (index, article) in articles.iter().enumerate() {
        print_article(index + 1, article, true);
    }

    Ok(())
}

pub fn remove_bookmark(ctx: &AppContext, url: &str) -> Result<()> {
    if !ctx.store.contains(url)? {
        println!("Not bookmarked: {}", url);
        return Ok(());
    }
    ctx.store.delete_by_url(url)?;
    println!("Removed bookmark: {}", url);
    Ok(())
}

pub fn clear_bookmarks(ctx: &AppContext) -> Result<()> {
    let removed = ctx.store.clear()?;
    println!("Removed {} bookmarks", removed);
    Ok(())
}

pub async fn status(ctx: &AppContext) -> Result<()> {
    let connectivity = ctx.connectivity(false).await;
    let current = *connectivity.observe().borrow();
    let saved = ctx.store.get_all()?.len();

    println!("Endpoint:     {}", ctx.config.api.base_url);
    println!(
        "API key:      {}",
        if ctx.config.api.api_key.is_some() { "set" } else { "missing" }
    );
    println!("Connectivity: {}", current);
    println!("Bookmarks:    {}", saved);
    Ok(())
}

fn print_article(index: usize, article: &Article, bookmarked: bool) {
    let marker = if bookmarked { "*" } else { " " };
    let date = article
        .published()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "          ".to_string());
    let source = article
        .source_name()
        .map(|s| format!(" [{}]", s))
        .unwrap_or_default();

    println!(
        "{}{:>3}. {} {}{}\n       {}",
        marker,
        index,
        date,
        article.display_title(),
        source,
        article.key().unwrap_or_default()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_once_per_loaded_page() {
        let mut requested_after = None;

        assert!(request_once(&mut requested_after, 1));
        assert!(!request_once(&mut requested_after, 1));
        assert!(!request_once(&mut requested_after, 1));

        assert!(request_once(&mut requested_after, 2));
        assert!(!request_once(&mut requested_after, 2));
    }

    #[test]
    fn test_request_once_after_reset() {
        let mut requested_after = None;
        assert!(request_once(&mut requested_after, 1));

        requested_after = None;
        assert!(request_once(&mut requested_after, 1));
    }
}
