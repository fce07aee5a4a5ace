//! Static path enumeration - every canonical URL the site serves.
//!
//! Walks the router chain in the same precedence order as resolution and
//! concatenates each router's paths. Post ownership is re-derived here
//! against a mutable pool: collections claim posts in declaration order and
//! claimed posts leave the pool permanently, so a post that *matches*
//! several collections' filters still appears in exactly one enumerated
//! list. (Resolution instead relies on the ownership collect pre-computed;
//! both apply the same first-match rule, which is what keeps
//! resolve ∘ enumerate an identity.)

use rustc_hash::FxHashSet;

use crate::log;
use crate::resource::{Resource, ResourceGraph, ResourceId, ResourceKind};
use crate::router::pattern::{page_path, total_pages};
use crate::router::{Router, RouterChain};

/// Enumerate every canonical path, in chain order. Invoked once per build.
pub fn resolve_paths(chain: &RouterChain, graph: &ResourceGraph) -> Vec<String> {
    // The ownership pool: every post starts unclaimed. Owned by this call,
    // drained by the collection walk below.
    let mut pool: FxHashSet<ResourceId> = graph.posts().map(Resource::id).collect();
    let mut paths = Vec::new();

    for router in chain.routers() {
        match router {
            Router::Admin => paths.push("/admin".to_string()),

            Router::StaticRoute(router) => {
                let def = &router.def;
                paths.push(display_path(&def.path));
                if let Some(channel) = &def.controller {
                    let count = graph
                        .posts()
                        .filter(|post| match &channel.filter {
                            Some(filter) => post.satisfies_filter(filter),
                            None => true,
                        })
                        .count();
                    push_pagination(&mut paths, &def.path, count, channel.page_size());
                }
            }

            Router::Collection(router) => {
                let def = &router.def;
                paths.push(display_path(&def.path));

                let mut claimed = 0usize;
                for post in graph.posts() {
                    if !pool.contains(&post.id()) {
                        continue;
                    }
                    let matches = match &def.filter {
                        Some(filter) => post.satisfies_filter(filter),
                        None => true,
                    };
                    if !matches {
                        continue;
                    }
                    pool.remove(&post.id());
                    claimed += 1;
                    if let Some(url) = post.url_pathname() {
                        paths.push(url.as_str().to_string());
                    }
                }

                push_pagination(&mut paths, &def.path, claimed, def.page_size());
            }

            Router::Taxonomy(router) => {
                let def = &router.def;
                for term in graph.of_kind(def.kind.term_kind()) {
                    let Some(slug) = term.slug() else { continue };
                    if chain
                        .redirect_owner(def.kind.term_kind(), slug, None)
                        .is_some()
                    {
                        continue;
                    }
                    let Some(url) = term.url_pathname() else {
                        continue;
                    };
                    paths.push(url.as_str().to_string());

                    let filter = def.filter_for(slug);
                    let count = graph
                        .posts()
                        .filter(|post| post.satisfies_filter(&filter))
                        .count();
                    push_pagination(&mut paths, url.as_str(), count, def.page_size());
                }
            }

            Router::StaticPages => {
                for page in graph.of_kind(ResourceKind::Page) {
                    let Some(slug) = page.slug() else { continue };
                    if chain
                        .redirect_owner(ResourceKind::Page, slug, None)
                        .is_some()
                    {
                        continue;
                    }
                    if let Some(url) = page.url_pathname() {
                        paths.push(url.as_str().to_string());
                    }
                }
            }
        }
    }

    log!("router"; "enumerated {} canonical paths", paths.len());
    paths
}

/// Router roots render without a trailing slash, except the site root.
fn display_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pagination paths `page/1..=n`, emitted only when the view actually
/// spans more than one page.
fn push_pagination(paths: &mut Vec<String>, base: &str, count: usize, page_size: usize) {
    let pages = total_pages(count, page_size);
    if pages > 1 {
        for page in 1..=pages {
            paths.push(page_path(base, page));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path() {
        assert_eq!(display_path("/"), "/");
        assert_eq!(display_path("/blog/"), "/blog");
        assert_eq!(display_path("/blog"), "/blog");
    }

    #[test]
    fn test_push_pagination_single_page_is_silent() {
        let mut paths = Vec::new();
        push_pagination(&mut paths, "/tag/tag-1", 5, 5);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_push_pagination_multi_page() {
        let mut paths = Vec::new();
        push_pagination(&mut paths, "/", 10, 5);
        assert_eq!(paths, vec!["/page/1", "/page/2"]);
    }
}
