//! URL-safe slugification for canonical-path redirects.
//!
//! A request for `/Category-2/Pedro` must redirect permanently to
//! `/category-2/pedro/`; this module computes the safe form that decision
//! is based on.

use deunicode::deunicode;

/// Slugify a single path segment.
///
/// Transliterates to ASCII, lowercases, and collapses every run of
/// non-alphanumeric characters into a single `-`.
///
/// # Examples
/// ```ignore
/// assert_eq!(slugify("Category-2"), "category-2");
/// assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
/// ```
pub fn slugify(segment: &str) -> String {
    let ascii = deunicode(segment);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

/// Slugify every segment of a path, preserving the segment structure.
///
/// Returns `None` when the path is already in slug form (the common case,
/// letting callers skip the redirect).
pub fn slugify_segments(segments: &[&str]) -> Option<Vec<String>> {
    let slugged: Vec<String> = segments.iter().map(|s| slugify(s)).collect();
    let changed = segments
        .iter()
        .zip(&slugged)
        .any(|(orig, slug)| *orig != slug);
    changed.then_some(slugged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases() {
        assert_eq!(slugify("Category-2"), "category-2");
        assert_eq!(slugify("Pedro"), "pedro");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("hello   world"), "hello-world");
        assert_eq!(slugify("a--b__c"), "a-b-c");
        assert_eq!(slugify("-trimmed-"), "trimmed");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("中文"), "zhong-wen");
    }

    #[test]
    fn test_slugify_segments_unchanged() {
        assert_eq!(slugify_segments(&["tag", "tag-1"]), None);
    }

    #[test]
    fn test_slugify_segments_changed() {
        assert_eq!(
            slugify_segments(&["Category-2", "Pedro"]),
            Some(vec!["category-2".to_string(), "pedro".to_string()])
        );
    }
}
