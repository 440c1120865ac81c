//! The feed subscription: one loop that owns paging, gate pacing and the
//! latest bookmark and connectivity values, and publishes a fresh
//! [`FeedState`](crate::domain::FeedState) after every input.

pub mod aggregator;
pub mod gate;
pub mod handle;
pub mod paging;

pub use aggregator::{FeedAggregator, FeedSettings};
pub use gate::{GateState, GateTransition};
pub use handle::{BookmarkTarget, FeedHandle};
pub use paging::{FetchRequest, PageEvent, Paging, Phase};
