use super::Article;

/// Page numbers are 1-based.
pub const FIRST_PAGE: u32 = 1;

/// One cleaned page of articles plus the cursors around it.
///
/// `next_key == None` is the authoritative end-of-feed signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub items: Vec<Article>,
    pub prev_key: Option<u32>,
    pub next_key: Option<u32>,
}

impl Page {
    pub fn is_last(&self) -> bool {
        self.next_key.is_none()
    }
}
