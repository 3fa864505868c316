use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub id: String,
}

/// A saved-content row as listed by the server. The content id has shipped
/// under three different shapes over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedContentRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<ContentRef>,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub contents: Option<ContentRef>,
}

impl SavedContentRecord {
    pub fn new(saved_id: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            id: Some(saved_id.into()),
            content: None,
            content_id: Some(content_id.into()),
            contents: None,
        }
    }

    pub fn saved_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|s| !s.is_empty())
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content
            .as_ref()
            .map(|c| c.id.as_str())
            .or(self.content_id.as_deref())
            .or(self.contents.as_ref().map(|c| c.id.as_str()))
            .filter(|s| !s.is_empty())
    }
}
