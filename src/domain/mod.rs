pub mod article;
pub mod feed_state;
pub mod page;

pub use article::{Article, Source, REMOVED_TITLE};
pub use feed_state::{ErrorInfo, ErrorKind, FeedState, FeedView, Footer, LoadState, RetryAction};
pub use page::{Page, FIRST_PAGE};
