use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Reel,
    Carousel,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Reel => "reel",
            ContentKind::Carousel => "carousel",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ContentKind::Text),
            "reel" | "video" => Ok(ContentKind::Reel),
            "carousel" => Ok(ContentKind::Carousel),
            _ => Err(format!("Unknown content kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselSlide {
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub slide_index: u32,
}

/// A unit of feed content. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(alias = "hook", default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(alias = "fullContent", default, deserialize_with = "null_as_default")]
    pub full_content: String,
    #[serde(alias = "image", default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(alias = "sourceUrl", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(alias = "readTime", default, deserialize_with = "null_as_default")]
    pub estimated_read_time: u32,
    #[serde(
        alias = "contentType",
        default,
        deserialize_with = "lenient_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<ContentKind>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub slides: Vec<CarouselSlide>,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: String::new(),
            full_content: String::new(),
            media_url: None,
            video_url: None,
            topic: String::new(),
            tags: Vec::new(),
            source_url: None,
            estimated_read_time: 0,
            content_type: None,
            slides: Vec::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_media_url(mut self, url: Option<String>) -> Self {
        self.media_url = url;
        self
    }

    pub fn with_video_url(mut self, url: Option<String>) -> Self {
        self.video_url = url;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_kind(mut self, kind: Option<ContentKind>) -> Self {
        self.content_type = kind;
        self
    }

    pub fn with_slides(mut self, slides: Vec<CarouselSlide>) -> Self {
        self.slides = slides;
        self
    }

    /// Explicit kind from the server, otherwise inferred from the media
    pub fn kind(&self) -> ContentKind {
        self.content_type.unwrap_or_else(|| self.inferred_kind())
    }

    fn inferred_kind(&self) -> ContentKind {
        let has_video = self.video_url.as_deref().is_some_and(|u| !u.trim().is_empty())
            || self.media_url.as_deref().is_some_and(is_video_url);

        if has_video {
            ContentKind::Reel
        } else {
            ContentKind::Text
        }
    }

    /// Pin the kind and normalize slides: ordered by index for carousels,
    /// dropped for every other kind.
    pub fn resolve_kind(mut self) -> Self {
        let kind = self.kind();
        self.content_type = Some(kind);

        if kind == ContentKind::Carousel {
            self.slides.sort_by_key(|s| s.slide_index);
        } else {
            self.slides.clear();
        }

        self
    }

    /// Media reference to render: the video for reels, the image otherwise
    pub fn primary_media(&self) -> Option<&str> {
        match self.kind() {
            ContentKind::Reel => self.video_url.as_deref().or(self.media_url.as_deref()),
            ContentKind::Carousel => self
                .slides
                .first()
                .map(|s| s.image_url.as_str())
                .or(self.media_url.as_deref()),
            ContentKind::Text => self.media_url.as_deref(),
        }
    }
}

/// True for URLs whose path ends in a known video container/playlist extension
pub fn is_video_url(url: &str) -> bool {
    static VIDEO_EXT: OnceLock<Regex> = OnceLock::new();
    let re = VIDEO_EXT.get_or_init(|| {
        Regex::new(r"(?i)\.(mp4|mov|m4v|webm|m3u8)$").expect("video extension pattern is valid")
    });

    let path = url.split(['?', '#']).next().unwrap_or(url);
    re.is_match(path)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<ContentKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_inferred_from_video_url() {
        let item = ContentItem::new("1", "Octopus hearts")
            .with_video_url(Some("https://cdn.example.com/octopus".to_string()));
        assert_eq!(item.kind(), ContentKind::Reel);
    }

    #[test]
    fn test_kind_inferred_from_media_extension() {
        let item = ContentItem::new("1", "Clip")
            .with_media_url(Some("https://cdn.example.com/clip.MP4?token=abc".to_string()));
        assert_eq!(item.kind(), ContentKind::Reel);

        let image = ContentItem::new("2", "Photo")
            .with_media_url(Some("https://cdn.example.com/photo.jpg".to_string()));
        assert_eq!(image.kind(), ContentKind::Text);
    }

    #[test]
    fn test_explicit_kind_wins() {
        let item = ContentItem::new("1", "Clip")
            .with_video_url(Some("https://cdn.example.com/clip.mp4".to_string()))
            .with_kind(Some(ContentKind::Text));
        assert_eq!(item.kind(), ContentKind::Text);
    }

    #[test]
    fn test_resolve_orders_carousel_slides() {
        let slide = |id: &str, idx| CarouselSlide {
            id: id.to_string(),
            image_url: format!("https://cdn.example.com/{}.png", id),
            slide_index: idx,
        };
        let item = ContentItem::new("c", "Planets")
            .with_kind(Some(ContentKind::Carousel))
            .with_slides(vec![slide("b", 1), slide("c", 2), slide("a", 0)])
            .resolve_kind();

        let ids: Vec<&str> = item.slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(item.primary_media(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_resolve_drops_slides_for_non_carousel() {
        let item = ContentItem::new("t", "Text")
            .with_slides(vec![CarouselSlide {
                id: "s".to_string(),
                image_url: "https://cdn.example.com/s.png".to_string(),
                slide_index: 0,
            }])
            .resolve_kind();
        assert_eq!(item.content_type, Some(ContentKind::Text));
        assert!(item.slides.is_empty());
    }

    #[test]
    fn test_deserialize_app_field_names() {
        let json = r#"{
            "id": "42",
            "hook": "Honey never spoils",
            "summary": "Archaeologists found edible honey.",
            "fullContent": "Long form text",
            "image": "https://cdn.example.com/honey.jpg",
            "topic": "history",
            "sourceUrl": "https://example.com/honey",
            "readTime": 2,
            "tags": null
        }"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.title, "Honey never spoils");
        assert_eq!(item.full_content, "Long form text");
        assert_eq!(item.estimated_read_time, 2);
        assert!(item.tags.is_empty());
        assert_eq!(item.kind(), ContentKind::Text);
    }

    #[test]
    fn test_unknown_content_type_falls_back_to_inference() {
        let json = r#"{"id": "1", "title": "x", "content_type": "article", "video_url": "https://v/x"}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.content_type, None);
        assert_eq!(item.kind(), ContentKind::Reel);
    }
}
