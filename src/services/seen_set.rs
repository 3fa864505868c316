use std::collections::HashSet;

use crate::domain::ContentItem;

/// Identifiers already appended to the feed in the current session.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from an ordered feed (or a cached snapshot of one)
    pub fn from_items(items: &[ContentItem]) -> Self {
        Self {
            ids: items.iter().map(|i| i.id.clone()).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns true if the id was not seen before
    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keep items not yet seen, in source order. Repeats inside `items`
    /// collapse to their first occurrence. Does not record anything.
    pub fn filter_new(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        let mut batch: HashSet<String> = HashSet::new();
        items
            .into_iter()
            .filter(|item| !self.contains(&item.id) && batch.insert(item.id.clone()))
            .collect()
    }
}
