//! Source video metadata.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::youtube_thumbnail_url;

/// Where a metadata record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// YouTube Data API
    Api,
    /// Public watch page
    Scrape,
    /// Nothing found
    Placeholder,
}

impl MetadataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataSource::Api => "api",
            MetadataSource::Scrape => "scrape",
            MetadataSource::Placeholder => "placeholder",
        }
    }
}

/// Best-effort metadata for a YouTube video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: Option<String>,
    pub thumbnail: String,
    /// Seconds
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    pub source: MetadataSource,
}

impl VideoMetadata {
    /// Record used when neither the API nor the watch page yielded anything.
    pub fn placeholder(video_id: impl Into<String>) -> Self {
        let video_id = video_id.into();
        Self {
            thumbnail: youtube_thumbnail_url(&video_id),
            video_id,
            title: None,
            duration: None,
            channel_title: None,
            source: MetadataSource::Placeholder,
        }
    }

    /// Title to persist on a job, falling back to a generic label.
    pub fn title_or_placeholder(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("YouTube Video ({})", self.video_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let meta = VideoMetadata::placeholder("abc123");
        assert_eq!(meta.source, MetadataSource::Placeholder);
        assert_eq!(meta.thumbnail, "https://i.ytimg.com/vi/abc123/maxresdefault.jpg");
        assert_eq!(meta.title_or_placeholder(), "YouTube Video (abc123)");

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["source"], "placeholder");
        assert!(json["title"].is_null());
    }
}
