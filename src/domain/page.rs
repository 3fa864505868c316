use super::ContentItem;

/// Parameters for one page request against the content source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: usize,
    pub offset: usize,
    pub topic_id: Option<String>,
}

impl PageQuery {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit,
            offset,
            topic_id: None,
        }
    }

    pub fn with_topic(mut self, topic_id: Option<String>) -> Self {
        self.topic_id = topic_id;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPage {
    pub items: Vec<ContentItem>,
    /// Item count as reported by the server
    pub count: usize,
}

impl ContentPage {
    pub fn new(items: Vec<ContentItem>) -> Self {
        let count = items.len();
        Self { items, count }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
