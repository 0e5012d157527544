//! URL helpers and timestamps shared across crates.

use url::Url;

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Which YouTube host a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YoutubeHost {
    Short,
    Main,
}

/// Parse a URL, accepting the scheme-less form users paste.
fn parse_lenient(url: &str) -> Option<Url> {
    Url::parse(url)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| Url::parse(&format!("https://{}", url)).ok())
}

fn youtube_host(url: &Url) -> Option<YoutubeHost> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    // The url crate lowercases domain hosts
    let host = url.host_str()?.trim_end_matches('.');
    if host == "youtu.be" {
        Some(YoutubeHost::Short)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        Some(YoutubeHost::Main)
    } else {
        None
    }
}

/// Check if a URL points at a YouTube host.
pub fn is_youtube_url(url: &str) -> bool {
    parse_lenient(url.trim())
        .as_ref()
        .and_then(youtube_host)
        .is_some()
}

/// Extract a YouTube video id from a URL.
///
/// Supported forms:
/// - `youtube.com/watch?v=ID`
/// - `youtu.be/ID`
/// - `youtube.com/embed/ID`
/// - `youtube.com/v/ID`
/// - `youtube.com/shorts/ID`
///
/// The host decides where the id lives: the first path segment on
/// `youtu.be`, the `v` query parameter on `/watch`. The id is the leading
/// run of `[A-Za-z0-9_-]`. Returns `None` for non-YouTube URLs or when the
/// run is empty.
pub fn extract_youtube_video_id(url: &str) -> Option<String> {
    let parsed = parse_lenient(url.trim())?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    match youtube_host(&parsed)? {
        YoutubeHost::Short => segments.next().and_then(extract_id_from_segment),
        YoutubeHost::Main => match segments.next()? {
            "watch" => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .and_then(|(_, value)| extract_id_from_segment(&value)),
            "embed" | "v" | "shorts" => segments.next().and_then(extract_id_from_segment),
            _ => None,
        },
    }
}

/// Take the leading id characters of a segment.
fn extract_id_from_segment(segment: &str) -> Option<String> {
    let end = segment
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(segment.len());
    let id = &segment[..end];
    (!id.is_empty()).then(|| id.to_string())
}

/// Default thumbnail for a video id.
pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_short_link() {
        assert_eq!(
            extract_youtube_video_id("https://youtu.be/abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_youtube_video_id("https://youtu.be/dQw4w9WgXcQ?t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_watch_link() {
        assert_eq!(
            extract_youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_youtube_video_id("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ#t=1"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_path_forms() {
        for url in [
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ?version=3",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_youtube_video_id(url), Some("dQw4w9WgXcQ".to_string()), "{url}");
        }
    }

    #[test]
    fn test_extract_rejects_other_hosts() {
        assert_eq!(extract_youtube_video_id("https://vimeo.com/12345"), None);
        assert_eq!(extract_youtube_video_id("https://example.com/watch?v=abc"), None);
        assert_eq!(extract_youtube_video_id("not a url"), None);
    }

    #[test]
    fn test_extract_empty_id() {
        assert_eq!(extract_youtube_video_id("https://youtu.be/"), None);
        assert_eq!(extract_youtube_video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(extract_youtube_video_id("https://www.youtube.com/"), None);
    }

    #[test]
    fn test_thumbnail_url() {
        assert_eq!(
            youtube_thumbnail_url("abc123"),
            "https://i.ytimg.com/vi/abc123/maxresdefault.jpg"
        );
    }

    #[test]
    fn test_extract_ignores_host_case() {
        assert_eq!(extract_youtube_video_id("https://YOUTU.BE/abc123"), Some("abc123".to_string()));
        assert_eq!(
            extract_youtube_video_id("HTTPS://WWW.YouTube.COM/watch?v=AbC_12-x"),
            Some("AbC_12-x".to_string())
        );
        assert!(is_youtube_url("https://M.YOUTUBE.COM/shorts/abc123"));
    }

    #[test]
    fn test_extract_uses_location_for_host() {
        assert_eq!(
            extract_youtube_video_id("https://youtu.be/abc123?v=zzz"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_youtube_video_id("https://www.youtube.com/embed/abc123?v=zzz"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_youtube_video_id("youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_rejects_lookalike_hosts() {
        assert_eq!(extract_youtube_video_id("https://notyoutube.com/watch?v=abc123"), None);
        assert_eq!(extract_youtube_video_id("https://example.com/youtu.be/abc123"), None);
        assert!(!is_youtube_url("https://evil.example/?u=youtube.com/watch"));
    }
}
