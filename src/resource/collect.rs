//! The resource graph builder.
//!
//! `collect` turns the raw content-node graph into typed resources with
//! derived locator fields, computes each resource's filter set, resolves
//! post ownership across collections, and persists the result - one
//! transactional replace of the cache and the shared graph.
//!
//! Failure anywhere (fetch, node parse, permalink compile, mandatory
//! filter) aborts the whole pass and leaves the previous cache and graph
//! untouched: the path enumerator depends on a complete, consistent graph,
//! so there is no partial success.

use anyhow::Context;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value as JsonValue;
use smallvec::SmallVec;

use crate::config::{RoutesConfig, TaxonomyKind};
use crate::core::{RouteError, UrlPath};
use crate::filter::Filter;
use crate::log;
use crate::resource::graph::{ResourceGraph, SharedGraph};
use crate::resource::node::{ContentNode, EntryNode, NodeLocation, TermNode, TermRef};
use crate::resource::permalink::Permalink;
use crate::resource::{
    ConfigResource, EntryResource, Locator, Resource, ResourceCore, ResourceId, ResourceKind,
    TermResource, entry_view, term_view,
};
use crate::debug;
use crate::store::{META_KEY, MetaStamp, ResourceStore};
use crate::utils::date::CivilDate;
use crate::utils::hash;

/// The backing content store, out of scope for the router itself.
///
/// Each fetch returns the full node set of one kind and may fail; any
/// failure fails the whole collect (no partial graph).
pub trait ContentSource: Sync {
    fn fetch_config(&self) -> anyhow::Result<Vec<ContentNode>>;
    fn fetch_posts(&self) -> anyhow::Result<Vec<ContentNode>>;
    fn fetch_pages(&self) -> anyhow::Result<Vec<ContentNode>>;
    fn fetch_authors(&self) -> anyhow::Result<Vec<ContentNode>>;
    fn fetch_tags(&self) -> anyhow::Result<Vec<ContentNode>>;
}

/// Build the resource graph from the content source and publish it.
///
/// On success the store holds one JSON entry per resource (keyed by id)
/// plus a freshness stamp under [`META_KEY`], the shared graph is swapped
/// to the new set, and the full resource list is returned.
pub fn collect(
    source: &dyn ContentSource,
    store: &dyn ResourceStore,
    shared: &SharedGraph,
    config: &RoutesConfig,
) -> Result<Vec<Resource>, RouteError> {
    // Fan out the five fetches, then join. Results come back in fetch
    // order so the graph's insertion order is the source's order.
    let kinds = [
        ResourceKind::Config,
        ResourceKind::Post,
        ResourceKind::Page,
        ResourceKind::Author,
        ResourceKind::Tag,
    ];
    let fetched: Vec<(ResourceKind, anyhow::Result<Vec<ContentNode>>)> = kinds
        .par_iter()
        .map(|&kind| {
            let result = match kind {
                ResourceKind::Config => source.fetch_config(),
                ResourceKind::Post => source.fetch_posts(),
                ResourceKind::Page => source.fetch_pages(),
                ResourceKind::Author => source.fetch_authors(),
                ResourceKind::Tag => source.fetch_tags(),
            };
            (kind, result)
        })
        .collect();

    let mut nodes = Vec::new();
    for (kind, result) in fetched {
        let batch = result.with_context(|| format!("fetching {kind} nodes"))?;
        nodes.extend(batch);
    }
    let node_count = nodes.len();

    let builder = GraphBuilder::new(config)?;
    let (resources, views) = builder.derive(&nodes)?;
    let mut resources = builder.apply_filters(resources, &views);
    builder.assign_ownership(&mut resources, &views)?;

    // All derivation succeeded: only now touch the store, so an aborted
    // pass keeps the last-known-good cache.
    store.clear().map_err(anyhow_to_route)?;
    for resource in &resources {
        let value = serde_json::to_value(resource)
            .with_context(|| format!("serializing resource `{}`", resource.core().relative_path))?;
        store
            .set(&resource.id().to_string(), value)
            .map_err(anyhow_to_route)?;
    }
    let stamp = serde_json::to_value(MetaStamp::new(resources.len()))
        .context("serializing meta stamp")?;
    store.set(META_KEY, stamp).map_err(anyhow_to_route)?;

    let mut graph = ResourceGraph::new();
    for resource in &resources {
        graph.insert(resource.clone());
    }
    shared.publish(graph);

    log!("collect"; "built {} resources from {} nodes", resources.len(), node_count);
    Ok(resources)
}

fn anyhow_to_route(err: anyhow::Error) -> RouteError {
    RouteError::Other(err)
}

// ============================================================================
// GraphBuilder
// ============================================================================

/// One collect pass's derivation state: parsed taxonomy permalinks and the
/// compiled filter pools.
struct GraphBuilder<'a> {
    config: &'a RoutesConfig,
    tag_permalink: Option<Permalink>,
    author_permalink: Option<Permalink>,
}

impl<'a> GraphBuilder<'a> {
    fn new(config: &'a RoutesConfig) -> Result<Self, RouteError> {
        let parse = |kind: TaxonomyKind| {
            config
                .taxonomy(kind)
                .map(|t| Permalink::parse(&t.permalink))
                .transpose()
        };
        Ok(Self {
            config,
            tag_permalink: parse(TaxonomyKind::Tag)?,
            author_permalink: parse(TaxonomyKind::Author)?,
        })
    }

    /// Normalize every node into a typed resource (steps 4-5), plus the
    /// denormalized views the filter passes evaluate against.
    fn derive(
        &self,
        nodes: &[ContentNode],
    ) -> Result<(Vec<Resource>, FxHashMap<ResourceId, JsonValue>), RouteError> {
        // Prepass: term slug -> id, for entry relationship lists.
        let mut tag_ids: FxHashMap<&str, ResourceId> = FxHashMap::default();
        let mut author_ids: FxHashMap<&str, ResourceId> = FxHashMap::default();
        for node in nodes {
            let id = hash::compute(&node.location().relative_path);
            match node {
                ContentNode::Tag(term) => {
                    tag_ids.insert(&term.slug, id);
                }
                ContentNode::Author(term) => {
                    author_ids.insert(&term.slug, id);
                }
                _ => {}
            }
        }

        let mut resources = Vec::with_capacity(nodes.len());
        let mut views = FxHashMap::default();

        for node in nodes {
            let core = derive_core(node.location());
            let id = core.id;

            let resource = match node {
                ContentNode::Config(_) => Resource::Config(ConfigResource { core }),
                ContentNode::Post(entry) => {
                    views.insert(id, entry_view(entry));
                    Resource::Post(self.derive_entry(core, entry, None, &tag_ids, &author_ids)?)
                }
                ContentNode::Page(entry) => {
                    views.insert(id, entry_view(entry));
                    let url = format!("/{}", entry.slug);
                    Resource::Page(self.derive_entry(
                        core,
                        entry,
                        Some(url),
                        &tag_ids,
                        &author_ids,
                    )?)
                }
                ContentNode::Author(term) => {
                    views.insert(id, term_view(term));
                    Resource::Author(self.derive_term(core, term, &self.author_permalink)?)
                }
                ContentNode::Tag(term) => {
                    views.insert(id, term_view(term));
                    Resource::Tag(self.derive_term(core, term, &self.tag_permalink)?)
                }
            };
            resources.push(resource);
        }

        Ok((resources, views))
    }

    fn derive_entry(
        &self,
        core: ResourceCore,
        entry: &EntryNode,
        url: Option<String>,
        tag_ids: &FxHashMap<&str, ResourceId>,
        author_ids: &FxHashMap<&str, ResourceId>,
    ) -> Result<EntryResource, RouteError> {
        let locator = derive_locator(
            &core,
            &entry.slug,
            entry.date.as_deref(),
            &entry.tags,
            &entry.authors,
            url,
        )?;

        // Tags first, then authors; unresolvable references are dropped.
        let mut relationships: SmallVec<[ResourceId; 4]> = SmallVec::new();
        relationships.extend(entry.tags.iter().filter_map(|t| tag_ids.get(t.slug.as_str())).copied());
        relationships.extend(
            entry
                .authors
                .iter()
                .filter_map(|a| author_ids.get(a.slug.as_str()))
                .copied(),
        );

        Ok(EntryResource {
            core,
            locator,
            relationships,
            title: entry.title.clone(),
        })
    }

    fn derive_term(
        &self,
        core: ResourceCore,
        term: &TermNode,
        permalink: &Option<Permalink>,
    ) -> Result<TermResource, RouteError> {
        let mut locator = derive_locator(&core, &term.slug, None, &[], &[], None)?;
        if let Some(permalink) = permalink {
            let url = permalink.compile_with(core.id, &locator);
            locator.url_pathname = Some(UrlPath::from_pathname(&url));
        }
        Ok(TermResource {
            core,
            locator,
            name: term.name.clone(),
        })
    }

    /// Step 6: compute each resource's filter set.
    ///
    /// The general pool (channel and collection filters) applies to every
    /// locator resource; taxonomy filters, instantiated per term slug,
    /// join the post pool only. One bad filter never poisons the rest:
    /// compile and evaluation failures count as non-matches here.
    fn apply_filters(
        &self,
        mut resources: Vec<Resource>,
        views: &FxHashMap<ResourceId, JsonValue>,
    ) -> Vec<Resource> {
        let mut general: Vec<Filter> = Vec::new();
        let mut candidates: Vec<&str> = Vec::new();
        for route in &self.config.routes {
            if let Some(channel) = &route.controller {
                candidates.extend(channel.filter.as_deref());
            }
        }
        candidates.extend(self.config.collections.iter().filter_map(|c| c.filter.as_deref()));
        for expression in candidates {
            match Filter::compile(expression) {
                Ok(filter) => general.push(filter),
                Err(err) => debug!("collect"; "skipping filter `{expression}`: {err}"),
            }
        }

        let mut taxonomy_pool: Vec<Filter> = Vec::new();
        for taxonomy in &self.config.taxonomies {
            for term in resources
                .iter()
                .filter(|r| r.kind() == taxonomy.kind.term_kind())
            {
                let Some(slug) = term.slug() else { continue };
                let expression = taxonomy.filter_for(slug);
                match Filter::compile(&expression) {
                    Ok(filter) => taxonomy_pool.push(filter),
                    Err(err) => debug!("collect"; "skipping filter `{expression}`: {err}"),
                }
            }
        }

        for resource in &mut resources {
            let id = resource.id();
            let is_post = resource.is_post();
            let Some(view) = views.get(&id) else { continue };

            let mut matched = Vec::new();
            let mut seen = FxHashSet::default();
            let pools = general
                .iter()
                .chain(taxonomy_pool.iter().filter(|_| is_post));
            for filter in pools {
                if filter.matches(view).unwrap_or(false) && seen.insert(filter.source()) {
                    matched.push(filter.source().to_string());
                }
            }

            match resource {
                Resource::Post(r) | Resource::Page(r) => r.locator.filters = matched,
                Resource::Author(r) | Resource::Tag(r) => r.locator.filters = matched,
                Resource::Config(_) => {}
            }
        }

        resources
    }

    /// Step 7: resolve each post's owning collection in declaration order
    /// and compile its final permalink. Filter failures here are hard
    /// errors (mandatory single-filter match).
    fn assign_ownership(
        &self,
        resources: &mut [Resource],
        views: &FxHashMap<ResourceId, JsonValue>,
    ) -> Result<(), RouteError> {
        let collections: Vec<(Option<Filter>, Permalink)> = self
            .config
            .collections
            .iter()
            .map(|c| {
                let filter = c.filter.as_deref().map(Filter::compile).transpose()?;
                let permalink = Permalink::parse(&c.permalink)?;
                Ok::<_, RouteError>((filter, permalink))
            })
            .collect::<Result<_, _>>()?;

        for resource in resources.iter_mut() {
            let Resource::Post(post) = resource else {
                continue;
            };
            let view = views.get(&post.core.id);

            let mut owner: Option<&Permalink> = None;
            for (filter, permalink) in &collections {
                let claimed = match (filter, view) {
                    (None, _) => true,
                    (Some(filter), Some(view)) => filter.matches(view)?,
                    (Some(_), None) => false,
                };
                if claimed {
                    owner = Some(permalink);
                    break;
                }
            }

            let url = match owner {
                Some(permalink) => permalink.compile_with(post.core.id, &post.locator),
                // No collection claims this post: fallback path.
                None => format!("/{}", post.core.id),
            };
            post.locator.url_pathname = Some(UrlPath::from_pathname(&url));
        }

        Ok(())
    }
}

// ============================================================================
// Derivation helpers
// ============================================================================

fn derive_core(location: &NodeLocation) -> ResourceCore {
    ResourceCore {
        id: hash::compute(&location.relative_path),
        filename: location.filename.clone(),
        filepath: location.path.clone(),
        relative_path: location.relative_path.clone(),
    }
}

fn derive_locator(
    core: &ResourceCore,
    slug: &str,
    date: Option<&str>,
    tags: &[TermRef],
    authors: &[TermRef],
    url: Option<String>,
) -> Result<Locator, RouteError> {
    if slug.is_empty() {
        return Err(RouteError::Parse {
            node: core.relative_path.clone(),
            message: "empty slug".to_string(),
        });
    }

    let date = match date {
        Some(raw) => CivilDate::parse(raw).ok_or_else(|| RouteError::Parse {
            node: core.relative_path.clone(),
            message: format!("unparseable date `{raw}`"),
        })?,
        None => CivilDate::now(),
    };

    let primary = |terms: &[TermRef]| {
        terms
            .first()
            .map_or_else(|| "all".to_string(), |t| t.slug.clone())
    };

    Ok(Locator {
        slug: slug.to_string(),
        year: date.year_str(),
        month: date.month_str(),
        day: date.day_str(),
        primary_tag: primary(tags),
        primary_author: primary(authors),
        url_pathname: url.map(|u| UrlPath::from_pathname(&u)),
        filters: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    /// Content source over fixed node lists, with an optional failing kind.
    struct StubSource {
        posts: Vec<ContentNode>,
        pages: Vec<ContentNode>,
        authors: Vec<ContentNode>,
        tags: Vec<ContentNode>,
        fail_posts: bool,
    }

    fn post_node(slug: &str, date: &str, tags: &[&str], authors: &[&str]) -> ContentNode {
        serde_json::from_value(json!({
            "type": "post",
            "id": format!("post-{slug}"),
            "filename": format!("{slug}.md"),
            "path": format!("/content/posts/{slug}.md"),
            "relativePath": format!("posts/{slug}.md"),
            "title": slug,
            "slug": slug,
            "date": date,
            "tags": tags.iter().map(|t| json!({"slug": t})).collect::<Vec<_>>(),
            "authors": authors.iter().map(|a| json!({"slug": a})).collect::<Vec<_>>(),
        }))
        .unwrap()
    }

    fn page_node(slug: &str) -> ContentNode {
        serde_json::from_value(json!({
            "type": "page",
            "id": format!("page-{slug}"),
            "filename": format!("{slug}.md"),
            "path": format!("/content/pages/{slug}.md"),
            "relativePath": format!("pages/{slug}.md"),
            "slug": slug,
        }))
        .unwrap()
    }

    fn term_node(kind: &str, slug: &str) -> ContentNode {
        serde_json::from_value(json!({
            "type": kind,
            "id": format!("{kind}-{slug}"),
            "filename": format!("{slug}.json"),
            "path": format!("/content/{kind}s/{slug}.json"),
            "relativePath": format!("{kind}s/{slug}.json"),
            "slug": slug,
        }))
        .unwrap()
    }

    impl StubSource {
        fn simple() -> Self {
            Self {
                posts: vec![
                    post_node("first", "2024-01-10", &["tag-1"], &["pedro"]),
                    post_node("second", "2024-01-20", &["tag-2"], &["pedro"]),
                ],
                pages: vec![page_node("about")],
                authors: vec![term_node("author", "pedro")],
                tags: vec![term_node("tag", "tag-1"), term_node("tag", "tag-2")],
                fail_posts: false,
            }
        }
    }

    impl ContentSource for StubSource {
        fn fetch_config(&self) -> anyhow::Result<Vec<ContentNode>> {
            Ok(vec![serde_json::from_value(json!({
                "type": "config",
                "id": "cfg",
                "filename": "config.json",
                "path": "/content/config.json",
                "relativePath": "config.json",
            }))
            .unwrap()])
        }
        fn fetch_posts(&self) -> anyhow::Result<Vec<ContentNode>> {
            if self.fail_posts {
                anyhow::bail!("content store unavailable");
            }
            Ok(self.posts.clone())
        }
        fn fetch_pages(&self) -> anyhow::Result<Vec<ContentNode>> {
            Ok(self.pages.clone())
        }
        fn fetch_authors(&self) -> anyhow::Result<Vec<ContentNode>> {
            Ok(self.authors.clone())
        }
        fn fetch_tags(&self) -> anyhow::Result<Vec<ContentNode>> {
            Ok(self.tags.clone())
        }
    }

    #[test]
    fn test_collect_derives_urls() {
        let source = StubSource::simple();
        let store = MemoryStore::new();
        let shared = SharedGraph::new();
        let config = RoutesConfig::default();

        let resources = collect(&source, &store, &shared, &config).unwrap();
        // config + 2 posts + 1 page + 1 author + 2 tags
        assert_eq!(resources.len(), 7);

        let graph = shared.load();
        let post = graph.by_slug(ResourceKind::Post, "first").unwrap();
        assert_eq!(post.url_pathname().unwrap().as_str(), "/first/");

        let page = graph.by_slug(ResourceKind::Page, "about").unwrap();
        assert_eq!(page.url_pathname().unwrap().as_str(), "/about");

        let tag = graph.by_slug(ResourceKind::Tag, "tag-1").unwrap();
        assert_eq!(tag.url_pathname().unwrap().as_str(), "/tag/tag-1");

        let author = graph.by_slug(ResourceKind::Author, "pedro").unwrap();
        assert_eq!(author.url_pathname().unwrap().as_str(), "/author/pedro");
    }

    #[test]
    fn test_collect_filter_sets() {
        let source = StubSource::simple();
        let store = MemoryStore::new();
        let shared = SharedGraph::new();

        collect(&source, &store, &shared, &RoutesConfig::default()).unwrap();
        let graph = shared.load();

        let first = graph.by_slug(ResourceKind::Post, "first").unwrap();
        assert!(first.satisfies_filter("tag:tag-1"));
        assert!(first.satisfies_filter("author:pedro"));
        assert!(!first.satisfies_filter("tag:tag-2"));

        // Taxonomy filters join the post pool only.
        let page = graph.by_slug(ResourceKind::Page, "about").unwrap();
        assert!(!page.satisfies_filter("tag:tag-1"));
    }

    #[test]
    fn test_collect_relationships_tags_then_authors() {
        let source = StubSource::simple();
        let store = MemoryStore::new();
        let shared = SharedGraph::new();

        collect(&source, &store, &shared, &RoutesConfig::default()).unwrap();
        let graph = shared.load();

        let first = graph.by_slug(ResourceKind::Post, "first").unwrap();
        let tag_1 = graph.by_slug(ResourceKind::Tag, "tag-1").unwrap();
        let pedro = graph.by_slug(ResourceKind::Author, "pedro").unwrap();
        assert_eq!(first.relationships().unwrap(), &[tag_1.id(), pedro.id()]);
    }

    #[test]
    fn test_collect_ownership_order_and_fallback() {
        let source = StubSource::simple();
        let store = MemoryStore::new();
        let shared = SharedGraph::new();

        let mut config = RoutesConfig::default();
        config.collections = vec![crate::config::CollectionDef {
            path: "/themed/".to_string(),
            permalink: "/themed/:slug/".to_string(),
            templates: Vec::new(),
            filter: Some("tag:tag-1".to_string()),
            limit: None,
            order: None,
        }];

        collect(&source, &store, &shared, &config).unwrap();
        let graph = shared.load();

        let first = graph.by_slug(ResourceKind::Post, "first").unwrap();
        assert_eq!(first.url_pathname().unwrap().as_str(), "/themed/first/");

        // `second` matches no collection and keeps the id fallback.
        let second = graph.by_slug(ResourceKind::Post, "second").unwrap();
        assert_eq!(
            second.url_pathname().unwrap().as_str(),
            format!("/{}", second.id())
        );
    }

    #[test]
    fn test_collect_persists_store_with_meta() {
        let source = StubSource::simple();
        let store = MemoryStore::new();
        let shared = SharedGraph::new();

        let resources = collect(&source, &store, &shared, &RoutesConfig::default()).unwrap();
        assert_eq!(store.keys().unwrap().len(), resources.len());
        assert_eq!(store.meta().unwrap().resource_count, resources.len());

        let id = resources[1].id().to_string();
        let cached = store.get(&[id.as_str()]).unwrap();
        assert_eq!(cached[0].as_ref().unwrap()["resourceType"], "post");
    }

    #[test]
    fn test_fetch_failure_keeps_previous_cache() {
        let store = MemoryStore::new();
        let shared = SharedGraph::new();
        let config = RoutesConfig::default();

        collect(&StubSource::simple(), &store, &shared, &config).unwrap();
        let keys_before = store.keys().unwrap();

        let failing = StubSource {
            fail_posts: true,
            ..StubSource::simple()
        };
        let err = collect(&failing, &store, &shared, &config).unwrap_err();
        assert!(matches!(err, RouteError::Other(_)));

        // Last-known-good cache and graph are untouched.
        assert_eq!(store.keys().unwrap(), keys_before);
        assert!(!shared.load().is_empty());
    }

    #[test]
    fn test_bad_date_is_parse_error() {
        let mut source = StubSource::simple();
        source.posts.push(post_node("broken", "01/02/2024", &[], &[]));
        let err = collect(
            &source,
            &MemoryStore::new(),
            &SharedGraph::new(),
            &RoutesConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::Parse { .. }));
    }

    #[test]
    fn test_undated_post_defaults_to_now() {
        let mut source = StubSource::simple();
        source.posts = vec![serde_json::from_value(json!({
            "type": "post",
            "id": "p",
            "filename": "undated.md",
            "path": "/content/posts/undated.md",
            "relativePath": "posts/undated.md",
            "slug": "undated",
        }))
        .unwrap()];

        let shared = SharedGraph::new();
        collect(
            &source,
            &MemoryStore::new(),
            &shared,
            &RoutesConfig::default(),
        )
        .unwrap();

        let graph = shared.load();
        let post = graph.by_slug(ResourceKind::Post, "undated").unwrap();
        let locator = post.locator().unwrap();
        assert_eq!(locator.year.len(), 4);
        assert_eq!(locator.primary_tag, "all");
        assert_eq!(locator.primary_author, "all");
    }
}
