//! Input validation and sanitization.

use std::net::{Ipv4Addr, Ipv6Addr};

use tracing::warn;
use url::{Host, Url};

/// Maximum URL length accepted from clients.
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum preset name length.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum preset description length.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Whether a host is loopback, private, link-local or a metadata service.
///
/// Works on the parsed host, so userinfo, numeric IPv4 spellings and
/// IPv4-mapped IPv6 are already normalised.
fn is_internal_host(host: Host<&str>) -> bool {
    match host {
        Host::Ipv4(ip) => is_internal_ipv4(ip),
        Host::Ipv6(ip) => is_internal_ipv6(ip),
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost"
                || domain.ends_with(".localhost")
                || domain == "metadata"
                || domain.starts_with("metadata.")
        }
    }
}

fn is_internal_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.octets()[0] == 0
}

fn is_internal_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_internal_ipv4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // unique local fc00::/7
        || (first & 0xfe00) == 0xfc00
        // link local fe80::/10
        || (first & 0xffc0) == 0xfe80
}

/// Validate a source video URL handed to the pipeline.
///
/// Only http(s) URLs with a host are accepted, and internal or metadata
/// endpoints are rejected. Returns the trimmed URL.
pub fn validate_source_url(url: &str) -> Result<String, String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("URL is required".to_string());
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(format!("URL exceeds maximum length of {} characters", MAX_URL_LENGTH));
    }

    let parsed = Url::parse(url).map_err(|e| format!("Invalid URL format: {}", e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!(
            "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
            parsed.scheme()
        ));
    }
    let host = parsed
        .host()
        .ok_or_else(|| "URL must have a valid host".to_string())?;

    if is_internal_host(host) {
        warn!(url = %url, "Blocked source URL");
        return Err("URL appears to target an internal or restricted endpoint".to_string());
    }

    Ok(url.to_string())
}

/// Parse an Origin header into a redirect base. Only http(s) origins qualify.
pub fn normalize_origin(origin: &str) -> Option<String> {
    let parsed = Url::parse(origin.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

/// Strip control characters and trim to `max` characters.
pub fn sanitize_text(input: &str, max: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_public_urls() {
        assert_eq!(
            validate_source_url("  https://youtu.be/abc123 ").unwrap(),
            "https://youtu.be/abc123"
        );
        assert!(validate_source_url("https://cdn.example.com/user-uploads/u1/a.mp4").is_ok());
        assert!(validate_source_url("http://8.8.8.8/video.mp4").is_ok());
        assert!(validate_source_url("https://metadata-tools.example.com/v.mp4").is_ok());
    }

    #[test]
    fn test_rejects_internal_targets() {
        for url in [
            "http://127.0.0.1/admin",
            "http://localhost:8080",
            "http://169.254.169.254/latest/meta-data",
            "http://192.168.1.1/",
            "http://172.16.0.4/",
            "http://[::1]/",
            "http://LOCALHOST/",
            "http://user@127.0.0.1/admin",
            "http://x@169.254.169.254/latest/meta-data",
            "http://2130706433/",
            "http://0x7f.0.0.1/",
            "http://0/",
            "http://[::ffff:127.0.0.1]/",
            "http://[::ffff:a9fe:a9fe]/",
            "http://[fc00::1]/",
            "http://[fd12:3456::1]/",
            "http://[fe80::1]/",
            "http://10.1.2.3:9000/",
            "http://metadata.google.internal/computeMetadata/v1/",
            "http://app.localhost./",
        ] {
            assert!(validate_source_url(url).is_err(), "{url}");
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(validate_source_url("   ").unwrap_err(), "URL is required");
        assert!(validate_source_url("ftp://example.com/video.mp4").is_err());
        assert!(validate_source_url("not a url").is_err());
        let long = format!("https://youtube.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(validate_source_url(&long).is_err());
    }

    #[test]
    fn test_normalize_origin() {
        assert_eq!(
            normalize_origin("https://app.example.com"),
            Some("https://app.example.com".to_string())
        );
        assert_eq!(
            normalize_origin("http://localhost:3000/"),
            Some("http://localhost:3000".to_string())
        );
        assert_eq!(normalize_origin("javascript:alert(1)"), None);
        assert_eq!(normalize_origin("null"), None);
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  Bold\u{0007} captions ", 100), "Bold captions");
        assert_eq!(sanitize_text("abcdef", 3), "abc");
    }
}
