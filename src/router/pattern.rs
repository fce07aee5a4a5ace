//! Path comparison and pagination-suffix handling.

/// Compare two paths ignoring trailing slashes.
///
/// `/about/` == `/about`, `/` == `/`.
pub fn paths_equal(a: &str, b: &str) -> bool {
    let a = a.trim_end_matches('/');
    let b = b.trim_end_matches('/');
    if a.is_empty() && b.is_empty() {
        return true;
    }
    a == b
}

/// Split a trailing pagination suffix off a canonical request path.
///
/// Returns the base (with its trailing slash) and the 1-based page number:
/// `/tag/tag-1/page/2/` -> `("/tag/tag-1/", 2)`, `/page/3/` -> `("/", 3)`.
/// Page `0` is not a page.
pub fn split_page(path: &str) -> Option<(&str, usize)> {
    let trimmed = path.trim_end_matches('/');
    let (rest, number) = trimmed.rsplit_once('/')?;
    let (base, keyword) = rest.rsplit_once('/')?;

    if keyword != "page" {
        return None;
    }
    let page: usize = number.parse().ok()?;
    if page == 0 {
        return None;
    }

    // Base keeps its trailing slash: "" -> "/", "/tag/tag-1" -> "/tag/tag-1/"
    Some((&path[..base.len() + 1], page))
}

/// Render the pagination path for a base, matching [`split_page`] in
/// reverse: base `/` page 2 -> `/page/2`.
pub fn page_path(base: &str, page: usize) -> String {
    let base = base.trim_end_matches('/');
    format!("{base}/page/{page}")
}

/// Total pagination pages for a post count and page size.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    count.div_ceil(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_equal() {
        assert!(paths_equal("/about/", "/about"));
        assert!(paths_equal("/", "/"));
        assert!(paths_equal("/", ""));
        assert!(!paths_equal("/about", "/about/us"));
    }

    #[test]
    fn test_split_page_root() {
        assert_eq!(split_page("/page/3/"), Some(("/", 3)));
        assert_eq!(split_page("/page/3"), Some(("/", 3)));
    }

    #[test]
    fn test_split_page_nested() {
        assert_eq!(split_page("/tag/tag-1/page/2/"), Some(("/tag/tag-1/", 2)));
        assert_eq!(split_page("/blog/page/12/"), Some(("/blog/", 12)));
    }

    #[test]
    fn test_split_page_rejects() {
        assert!(split_page("/about/").is_none());
        assert!(split_page("/page/").is_none());
        assert!(split_page("/page/x/").is_none());
        assert!(split_page("/page/0/").is_none());
        assert!(split_page("/").is_none());
    }

    #[test]
    fn test_page_path_inverts_split() {
        assert_eq!(page_path("/", 1), "/page/1");
        assert_eq!(page_path("/tag/tag-1", 2), "/tag/tag-1/page/2");
        assert_eq!(page_path("/blog/", 2), "/blog/page/2");

        let rendered = page_path("/tag/tag-1", 2);
        let canonical = crate::core::UrlPath::from_page(&rendered);
        assert_eq!(split_page(canonical.as_str()), Some(("/tag/tag-1/", 2)));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(10, 5), 2);
        assert_eq!(total_pages(11, 5), 3);
        assert_eq!(total_pages(4, 5), 1);
        assert_eq!(total_pages(0, 5), 0);
    }
}
