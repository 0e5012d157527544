//! YouTube metadata lookup.
//!
//! Lookups try the Data API, then the public watch page, then settle for a
//! placeholder. They never fail.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use clipgen_models::{youtube_thumbnail_url, MetadataSource, VideoMetadata};

use super::http_client;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_WATCH_BASE_URL: &str = "https://www.youtube.com";

#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub watch_base_url: String,
    pub timeout: Duration,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            watch_base_url: DEFAULT_WATCH_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl YoutubeConfig {
    /// The API key is resolved separately since it may live in SSM.
    pub fn from_env(api_key: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_base_url: std::env::var("YOUTUBE_API_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            watch_base_url: std::env::var("YOUTUBE_WATCH_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.watch_base_url),
            timeout: std::env::var("YOUTUBE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[derive(Debug, Error)]
pub enum YoutubeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("No video in response")]
    NotFound,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: Option<Snippet>,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    standard: Option<Thumbnail>,
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    fn best(&self) -> Option<&str> {
        [&self.maxres, &self.standard, &self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.as_str())
            .next()
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

pub struct YoutubeClient {
    http: reqwest::Client,
    config: YoutubeConfig,
}

impl YoutubeClient {
    pub fn new(config: YoutubeConfig) -> reqwest::Result<Self> {
        Ok(Self {
            http: http_client(config.timeout)?,
            config,
        })
    }

    /// Best-effort metadata for `video_id`.
    pub async fn video_details(&self, video_id: &str) -> VideoMetadata {
        if self.config.api_key.is_some() {
            match self.fetch_from_api(video_id).await {
                Ok(meta) => return meta,
                Err(e) => warn!(video_id, "YouTube API lookup failed, scraping: {}", e),
            }
        } else {
            debug!(video_id, "No YouTube API key configured, scraping");
        }

        match self.scrape_watch_page(video_id).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(video_id, "Watch page scrape failed: {}", e);
                VideoMetadata::placeholder(video_id)
            }
        }
    }

    async fn fetch_from_api(&self, video_id: &str) -> Result<VideoMetadata, YoutubeError> {
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let response = self
            .http
            .get(format!("{}/videos", self.config.api_base_url))
            .query(&[("part", "snippet,contentDetails"), ("id", video_id), ("key", key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(YoutubeError::Status(response.status().as_u16()));
        }

        let body: VideosResponse = response.json().await?;
        let item = body.items.into_iter().next().ok_or(YoutubeError::NotFound)?;
        let snippet = item.snippet;

        Ok(VideoMetadata {
            video_id: video_id.to_string(),
            title: snippet.as_ref().and_then(|s| s.title.clone()),
            thumbnail: snippet
                .as_ref()
                .and_then(|s| s.thumbnails.best())
                .map(str::to_string)
                .unwrap_or_else(|| youtube_thumbnail_url(video_id)),
            duration: item
                .content_details
                .and_then(|c| c.duration)
                .and_then(|d| parse_iso8601_duration(&d)),
            channel_title: snippet.and_then(|s| s.channel_title),
            source: MetadataSource::Api,
        })
    }

    async fn scrape_watch_page(&self, video_id: &str) -> Result<VideoMetadata, YoutubeError> {
        let response = self
            .http
            .get(format!("{}/watch", self.config.watch_base_url))
            .query(&[("v", video_id)])
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(YoutubeError::Status(response.status().as_u16()));
        }

        let html = response.text().await?;
        let title = scrape_title(&html).ok_or(YoutubeError::NotFound)?;

        Ok(VideoMetadata {
            video_id: video_id.to_string(),
            title: Some(title),
            thumbnail: youtube_thumbnail_url(video_id),
            duration: capture(&LENGTH_SECONDS_RE, &html).and_then(|s| s.parse().ok()),
            channel_title: capture(&OWNER_CHANNEL_RE, &html).map(|s| decode_html_entities(&s)),
            source: MetadataSource::Scrape,
        })
    }
}

static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("valid duration pattern")
});

static META_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="title"\s+content="([^"]*)""#).expect("valid meta title pattern")
});

static OG_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+property="og:title"\s+content="([^"]*)""#)
        .expect("valid og title pattern")
});

static TITLE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<title>(.*?)</title>").expect("valid title tag pattern")
});

static LENGTH_SECONDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""lengthSeconds":"(\d+)""#).expect("valid length pattern"));

static OWNER_CHANNEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""ownerChannelName":"([^"]*)""#).expect("valid channel pattern")
});

static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid entity pattern"));

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse an ISO-8601 duration such as `PT1H2M3S` into seconds.
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    let caps = ISO_DURATION_RE.captures(value)?;
    [(1, 86_400u64), (2, 3_600), (3, 60), (4, 1)]
        .into_iter()
        .try_fold(0u64, |total, (group, unit)| {
            let value: u64 = match caps.get(group) {
                Some(m) => m.as_str().parse().ok()?,
                None => 0,
            };
            total.checked_add(value.checked_mul(unit)?)
        })
}

/// Title from a watch page, trying the meta tag, og:title, then `<title>`.
fn scrape_title(html: &str) -> Option<String> {
    let raw = capture(&META_TITLE_RE, html)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| capture(&OG_TITLE_RE, html).filter(|t| !t.trim().is_empty()))
        .or_else(|| {
            capture(&TITLE_TAG_RE, html).map(|t| t.trim().trim_end_matches("- YouTube").to_string())
        })?;

    let title = decode_html_entities(raw.trim());
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

pub fn decode_html_entities(input: &str) -> String {
    let named = input
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");

    let numeric = NUMERIC_ENTITY_RE.replace_all(&named, |caps: &regex::Captures| {
        let code = &caps[1];
        let parsed = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        parsed
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // Last so "&amp;lt;" decodes to "&lt;" rather than "<"
    numeric.replace("&amp;", "&")
}
