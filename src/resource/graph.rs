//! The in-memory resource graph and its atomically replaceable handle.
//!
//! A [`ResourceGraph`] is built wholesale by a collect pass and then only
//! read. [`SharedGraph`] wraps it in an `arc-swap` cell so a collect in
//! progress can never be observed half-written: readers hold the previous
//! graph until `publish` swaps in the finished one.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::resource::{Resource, ResourceId, ResourceKind};

/// Normalize a URL for index lookups (trailing-slash-insensitive).
fn url_key(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

// ============================================================================
// ResourceGraph
// ============================================================================

/// The full typed resource set of one collect pass, with lookup indexes.
///
/// Insertion order is preserved and meaningful: enumeration walks resources
/// in the order the content source returned them.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    resources: Vec<Resource>,
    by_id: FxHashMap<ResourceId, usize>,
    by_kind_slug: FxHashMap<(ResourceKind, String), usize>,
    by_url: FxHashMap<String, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, indexing id, `(kind, slug)`, and URL.
    ///
    /// A resource at an already-indexed id (same relative path) replaces
    /// the earlier record's index entries; the earlier record stays in the
    /// iteration order slot it claimed first.
    pub fn insert(&mut self, resource: Resource) {
        let index = self.resources.len();
        self.by_id.insert(resource.id(), index);
        if let Some(slug) = resource.slug() {
            self.by_kind_slug
                .insert((resource.kind(), slug.to_string()), index);
        }
        if let Some(url) = resource.url_pathname() {
            self.by_url.insert(url_key(url.as_str()).to_string(), index);
        }
        self.resources.push(resource);
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate all resources in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Iterate resources of one kind, in insertion order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind() == kind)
    }

    /// Iterate all posts, in insertion order.
    pub fn posts(&self) -> impl Iterator<Item = &Resource> {
        self.of_kind(ResourceKind::Post)
    }

    /// Look up by id.
    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.by_id.get(&id).map(|&i| &self.resources[i])
    }

    /// Look up by kind and slug.
    pub fn by_slug(&self, kind: ResourceKind, slug: &str) -> Option<&Resource> {
        self.by_kind_slug
            .get(&(kind, slug.to_string()))
            .map(|&i| &self.resources[i])
    }

    /// Look up by URL pathname, ignoring trailing slashes.
    pub fn by_url(&self, path: &str) -> Option<&Resource> {
        self.by_url.get(url_key(path)).map(|&i| &self.resources[i])
    }

    /// Count resources of one kind.
    pub fn count_of_kind(&self, kind: ResourceKind) -> usize {
        self.of_kind(kind).count()
    }
}

// ============================================================================
// SharedGraph
// ============================================================================

/// Atomically replaceable handle to the current resource graph.
///
/// Constructed by the caller and passed into collect/handle/resolve_paths
/// explicitly; there is no ambient global graph.
#[derive(Debug, Default)]
pub struct SharedGraph {
    inner: ArcSwap<ResourceGraph>,
}

impl SharedGraph {
    /// Create a handle holding an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the current graph. The returned `Arc` stays valid across any
    /// concurrent `publish`.
    pub fn load(&self) -> Arc<ResourceGraph> {
        self.inner.load_full()
    }

    /// Atomically replace the current graph.
    pub fn publish(&self, graph: ResourceGraph) {
        self.inner.store(Arc::new(graph));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UrlPath;
    use crate::resource::{EntryResource, Locator, ResourceCore, TermResource};
    use smallvec::SmallVec;

    fn term(kind: ResourceKind, slug: &str, url: &str) -> Resource {
        let relative_path = format!("{}s/{slug}.json", kind.as_str());
        let record = TermResource {
            core: ResourceCore {
                id: crate::utils::hash::compute(&relative_path),
                filename: format!("{slug}.json"),
                filepath: format!("/content/{relative_path}"),
                relative_path,
            },
            locator: Locator {
                slug: slug.to_string(),
                year: "2024".to_string(),
                month: "01".to_string(),
                day: "01".to_string(),
                primary_tag: "all".to_string(),
                primary_author: "all".to_string(),
                url_pathname: Some(UrlPath::from_pathname(url)),
                filters: Vec::new(),
            },
            name: None,
        };
        match kind {
            ResourceKind::Tag => Resource::Tag(record),
            ResourceKind::Author => Resource::Author(record),
            _ => panic!("not a term kind"),
        }
    }

    fn post(slug: &str, url: &str) -> Resource {
        let relative_path = format!("posts/{slug}.md");
        Resource::Post(EntryResource {
            core: ResourceCore {
                id: crate::utils::hash::compute(&relative_path),
                filename: format!("{slug}.md"),
                filepath: format!("/content/{relative_path}"),
                relative_path,
            },
            locator: Locator {
                slug: slug.to_string(),
                year: "2024".to_string(),
                month: "01".to_string(),
                day: "01".to_string(),
                primary_tag: "all".to_string(),
                primary_author: "all".to_string(),
                url_pathname: Some(UrlPath::from_pathname(url)),
                filters: Vec::new(),
            },
            relationships: SmallVec::new(),
            title: None,
        })
    }

    #[test]
    fn test_lookups() {
        let mut graph = ResourceGraph::new();
        graph.insert(post("0th-post", "/0th-post/"));
        graph.insert(term(ResourceKind::Tag, "tag-1", "/tag/tag-1"));

        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.by_slug(ResourceKind::Tag, "tag-1").unwrap().slug(),
            Some("tag-1")
        );
        assert!(graph.by_slug(ResourceKind::Author, "tag-1").is_none());

        // URL lookup ignores trailing slashes in both directions
        assert!(graph.by_url("/0th-post").is_some());
        assert!(graph.by_url("/0th-post/").is_some());
        assert!(graph.by_url("/tag/tag-1/").is_some());
        assert!(graph.by_url("/missing/").is_none());
    }

    #[test]
    fn test_of_kind_preserves_order() {
        let mut graph = ResourceGraph::new();
        graph.insert(post("b-post", "/b-post/"));
        graph.insert(term(ResourceKind::Tag, "tag-1", "/tag/tag-1"));
        graph.insert(post("a-post", "/a-post/"));

        let slugs: Vec<_> = graph.posts().filter_map(Resource::slug).collect();
        assert_eq!(slugs, vec!["b-post", "a-post"]);
        assert_eq!(graph.count_of_kind(ResourceKind::Tag), 1);
    }

    #[test]
    fn test_shared_graph_swap() {
        let shared = SharedGraph::new();
        assert!(shared.load().is_empty());

        let before = shared.load();

        let mut graph = ResourceGraph::new();
        graph.insert(post("0th-post", "/0th-post/"));
        shared.publish(graph);

        // Old readers keep their snapshot; new loads see the replacement.
        assert!(before.is_empty());
        assert_eq!(shared.load().len(), 1);
    }
}
