use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Like,
    Dislike,
    Save,
    Skip,
    Partial,
    Interested,
    Engaged,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Like => "like",
            InteractionKind::Dislike => "dislike",
            InteractionKind::Save => "save",
            InteractionKind::Skip => "skip",
            InteractionKind::Partial => "partial",
            InteractionKind::Interested => "interested",
            InteractionKind::Engaged => "engaged",
        }
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(InteractionKind::View),
            "like" => Ok(InteractionKind::Like),
            "dislike" => Ok(InteractionKind::Dislike),
            "save" => Ok(InteractionKind::Save),
            "skip" => Ok(InteractionKind::Skip),
            "partial" => Ok(InteractionKind::Partial),
            "interested" => Ok(InteractionKind::Interested),
            "engaged" => Ok(InteractionKind::Engaged),
            _ => Err(format!("Unknown interaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (content, kind, value) event reported to the content source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub content_id: String,
    pub kind: InteractionKind,
    pub value: i64,
}

impl Interaction {
    pub fn new(content_id: impl Into<String>, kind: InteractionKind) -> Self {
        Self {
            content_id: content_id.into(),
            kind,
            value: 1,
        }
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }
}
