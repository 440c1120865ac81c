use std::collections::BTreeSet;
use std::fmt;

use super::Article;
use crate::connectivity::ConnectivityStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Mapping,
    NotPersistable,
    Storage,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Mapping => "mapping",
            ErrorKind::NotPersistable => "not-persistable",
            ErrorKind::Storage => "storage",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Cloneable description of a failure, as carried in [`FeedState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

/// Load status of one pagination direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Error(ErrorInfo),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            LoadState::Error(info) => Some(info),
            LoadState::Loading | LoadState::Ready => None,
        }
    }
}

/// Which command recovers from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    RetryInitial,
    RetryAppend,
}

/// The single UI-facing state of a feed subscription.
///
/// Rebuilt from scratch on every input event, never patched in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    /// Visible articles: unique by url, in arrival order, truncated while gated.
    pub items: Vec<Article>,
    /// Articles loaded so far, including ones held back by the gate.
    pub total_loaded: usize,
    /// Pages loaded since the last (re)load of the first page.
    pub pages_loaded: u32,
    pub connectivity: ConnectivityStatus,
    pub is_offline: bool,
    pub gate_active: bool,
    /// First-page load.
    pub refresh: LoadState,
    /// Forward (next page) load.
    pub append: LoadState,
    pub end_of_feed: bool,
    /// Urls currently present in the bookmark store.
    pub bookmarked: BTreeSet<String>,
    pub error: Option<ErrorInfo>,
}

impl FeedState {
    pub fn new(connectivity: ConnectivityStatus) -> Self {
        Self {
            items: Vec::new(),
            total_loaded: 0,
            pages_loaded: 0,
            connectivity,
            is_offline: connectivity.is_offline(),
            gate_active: false,
            refresh: LoadState::Loading,
            append: LoadState::Ready,
            end_of_feed: false,
            bookmarked: BTreeSet::new(),
            error: None,
        }
    }

    pub fn is_bookmarked(&self, article: &Article) -> bool {
        article
            .key()
            .is_some_and(|url| self.bookmarked.contains(url))
    }

    pub fn footer(&self) -> Footer {
        if self.gate_active {
            return Footer::Gate;
        }
        match &self.append {
            LoadState::Loading => Footer::AppendLoading,
            LoadState::Error(info) => Footer::AppendError(info.clone()),
            LoadState::Ready if self.end_of_feed => Footer::EndOfFeed,
            LoadState::Ready => Footer::None,
        }
    }

    /// Projection used by list renderers.
    pub fn view(&self) -> FeedView<'_> {
        match &self.refresh {
            LoadState::Loading => FeedView::Loading,
            LoadState::Error(info) => FeedView::Error {
                error: info,
                retry: RetryAction::RetryInitial,
            },
            LoadState::Ready if self.items.is_empty() && !self.gate_active => FeedView::Empty,
            LoadState::Ready => FeedView::List {
                items: &self.items,
                footer: self.footer(),
            },
        }
    }
}

/// What a list screen should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedView<'a> {
    /// Blocking placeholder while the first page loads.
    Loading,
    /// Blocking full-screen error.
    Error {
        error: &'a ErrorInfo,
        retry: RetryAction,
    },
    Empty,
    List {
        items: &'a [Article],
        footer: Footer,
    },
}

/// Trailing row under the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Footer {
    None,
    /// Pacing indicator shown instead of the append indicators.
    Gate,
    AppendLoading,
    /// Inline error; retry with [`RetryAction::RetryAppend`].
    AppendError(ErrorInfo),
    EndOfFeed,
}

impl Footer {
    pub fn retry(&self) -> Option<RetryAction> {
        match self {
            Footer::AppendError(_) => Some(RetryAction::RetryAppend),
            Footer::None | Footer::Gate | Footer::AppendLoading | Footer::EndOfFeed => None,
        }
    }
}
