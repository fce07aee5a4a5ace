//! URL path type for type-safe path handling.
//!
//! - Internal representation: always decoded (human-readable)
//! - Request boundary: decode on input, encode on output

use std::borrow::Borrow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Decoded URL path (internal representation)
///
/// Invariants:
/// - Always decoded (no percent-encoding)
/// - Always starts with `/`
/// - Canonical request paths end with `/`; stored permalinks may not
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlPath(Arc<str>);

impl UrlPath {
    /// Create from a raw request path (decode percent-encoding, strip query
    /// string) and normalize to the canonical trailing-slash form.
    pub fn from_request(encoded: &str) -> Self {
        use percent_encoding::percent_decode_str;
        let path = encoded.split(['?', '#']).next().unwrap_or(encoded);
        let decoded = percent_decode_str(path)
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| path.to_string());
        Self::from_page(&decoded)
    }

    /// Create a canonical page path (leading and trailing slash).
    pub fn from_page(decoded: &str) -> Self {
        let trimmed = decoded.trim();

        if trimmed.is_empty() || trimmed == "/" {
            return Self(Arc::from("/"));
        }

        let path = Self::strip_query_fragment(trimmed);

        let with_leading = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };

        let normalized = if with_leading.ends_with('/') {
            with_leading
        } else {
            format!("{}/", with_leading)
        };

        Self(Arc::from(normalized))
    }

    /// Create a stored permalink path (leading slash only, trailing slash
    /// preserved exactly as compiled).
    pub fn from_pathname(decoded: &str) -> Self {
        let trimmed = decoded.trim();

        if trimmed.is_empty() {
            return Self(Arc::from("/"));
        }

        let normalized = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };

        Self(Arc::from(normalized))
    }

    /// Strip query string and fragment from a path using the url crate.
    fn strip_query_fragment(path: &str) -> String {
        use percent_encoding::percent_decode_str;

        static BASE: std::sync::OnceLock<url::Url> = std::sync::OnceLock::new();
        let base = BASE.get_or_init(|| url::Url::parse("http://x").expect("static base url"));

        match base.join(path) {
            Ok(parsed) => percent_decode_str(parsed.path())
                .decode_utf8()
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| parsed.path().to_string()),
            Err(_) => path.split(['?', '#']).next().unwrap_or(path).to_string(),
        }
    }

    /// Get the decoded URL path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode for the browser (percent-encode non-ASCII and special characters).
    pub fn to_encoded(&self) -> String {
        use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
        self.0
            .split('/')
            .map(|segment| utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Check if path starts with the given prefix.
    #[inline]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Check if this is the site root (`/`).
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.as_ref() == "/"
    }

    /// Iterate the non-empty path segments.
    ///
    /// `/tag/tag-1/` -> `["tag", "tag-1"]`, `/` -> `[]`
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Compare ignoring trailing slash.
    pub fn matches_ignoring_trailing_slash(&self, other: &str) -> bool {
        let self_trimmed = self.0.trim_end_matches('/');
        let other_trimmed = other.trim_end_matches('/');

        if self_trimmed.is_empty() && other_trimmed.is_empty() {
            return true;
        }
        self_trimmed == other_trimmed
    }
}

impl std::fmt::Display for UrlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for UrlPath {
    fn default() -> Self {
        Self::from_page("/")
    }
}

impl AsRef<str> for UrlPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UrlPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UrlPath {
    fn from(s: &str) -> Self {
        Self::from_page(s)
    }
}

impl PartialEq<str> for UrlPath {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for UrlPath {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for UrlPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UrlPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_pathname(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request_decodes() {
        let url = UrlPath::from_request("/tag/caf%C3%A9/");
        assert_eq!(url.as_str(), "/tag/café/");
    }

    #[test]
    fn test_from_request_strips_query() {
        let url = UrlPath::from_request("/about?ref=home");
        assert_eq!(url.as_str(), "/about/");
    }

    #[test]
    fn test_from_page_adds_slashes() {
        assert_eq!(UrlPath::from_page("about").as_str(), "/about/");
        assert_eq!(UrlPath::from_page("/about").as_str(), "/about/");
        assert_eq!(UrlPath::from_page("/about/").as_str(), "/about/");
    }

    #[test]
    fn test_from_page_root() {
        assert_eq!(UrlPath::from_page("").as_str(), "/");
        assert_eq!(UrlPath::from_page("/").as_str(), "/");
        assert!(UrlPath::from_page("/").is_root());
    }

    #[test]
    fn test_from_pathname_preserves_trailing() {
        assert_eq!(UrlPath::from_pathname("/tag/tag-1").as_str(), "/tag/tag-1");
        assert_eq!(UrlPath::from_pathname("/0th-post/").as_str(), "/0th-post/");
        assert_eq!(UrlPath::from_pathname("tag/tag-1").as_str(), "/tag/tag-1");
    }

    #[test]
    fn test_segments() {
        let url = UrlPath::from_page("/tag/tag-1/");
        let segments: Vec<_> = url.segments().collect();
        assert_eq!(segments, vec!["tag", "tag-1"]);
        assert_eq!(UrlPath::from_page("/").segments().count(), 0);
    }

    #[test]
    fn test_matches_ignoring_trailing_slash() {
        let url = UrlPath::from_page("/0th-post/");
        assert!(url.matches_ignoring_trailing_slash("/0th-post"));
        assert!(url.matches_ignoring_trailing_slash("/0th-post/"));
        assert!(!url.matches_ignoring_trailing_slash("/1st-post"));
    }

    #[test]
    fn test_to_encoded() {
        let url = UrlPath::from_page("/tag/café/");
        assert_eq!(url.to_encoded(), "/tag/caf%C3%A9/");
    }

    #[test]
    fn test_serialize_deserialize() {
        let url = UrlPath::from_pathname("/tag/tag-1");
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, r#""/tag/tag-1""#);

        let parsed: UrlPath = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, url);
    }
}
