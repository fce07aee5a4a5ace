//! The router chain: ordered resolution of request paths.
//!
//! An explicit ordered sequence of router nodes, compiled once from the
//! routing configuration (no self-referential `next` links, no per-request
//! state). Highest precedence first:
//!
//! 1. Admin (fixed, unconditional)
//! 2. one static-route router per `routes` entry, declaration order
//! 3. one collection router per `collections` entry, declaration order
//! 4. one taxonomy router per taxonomy kind
//! 5. static pages (fixed fallback: any single remaining segment)
//!
//! Resolution gives *every* router a turn and records a parallel array of
//! per-router outcomes; consumers scan for the first actionable entry
//! while tests inspect the near-misses.

use rustc_hash::FxHashMap;

use crate::config::{ChannelDef, CollectionDef, RouteDef, RoutesConfig, TaxonomyDef};
use crate::core::{RouteError, UrlPath};
use crate::debug;
use crate::filter::Filter;
use crate::resource::permalink::{Permalink, PermalinkMatcher};
use crate::resource::{Resource, ResourceGraph, ResourceId, ResourceKind};
use crate::router::context::{Redirect, RequestInfo, Resolution, RoutingContext};
use crate::router::pattern::{paths_equal, split_page};
use crate::utils::slug::slugify_segments;

// ============================================================================
// Router nodes
// ============================================================================

/// One node of the chain. A closed variant set dispatched by `match`;
/// every kind is stateless across requests.
#[derive(Debug)]
pub enum Router {
    /// Unconditional `/admin` -> internal.
    Admin,
    /// A named static route, optionally a channel.
    StaticRoute(StaticRouteRouter),
    /// A collection: root view, pagination, and single-post reads.
    Collection(CollectionRouter),
    /// A taxonomy kind: term channels with pagination.
    Taxonomy(TaxonomyRouter),
    /// Terminal fallback: any single remaining segment as a page slug.
    StaticPages,
}

#[derive(Debug)]
pub struct StaticRouteRouter {
    pub(crate) def: RouteDef,
}

#[derive(Debug)]
pub struct CollectionRouter {
    pub(crate) def: CollectionDef,
    pub(crate) permalink: Permalink,
    matcher: PermalinkMatcher,
}

#[derive(Debug)]
pub struct TaxonomyRouter {
    pub(crate) def: TaxonomyDef,
    matcher: PermalinkMatcher,
}

impl CollectionRouter {
    /// Whether the pre-computed ownership from collect assigned this
    /// post's permalink to this collection.
    pub(crate) fn owns(&self, post: &Resource) -> bool {
        let Some(url) = post.url_pathname() else {
            return false;
        };
        match self.permalink.compile(post) {
            Ok(compiled) => paths_equal(url.as_str(), &compiled),
            Err(_) => false,
        }
    }

    /// Matching posts for the collection index, in graph order.
    pub(crate) fn members<'g>(&self, graph: &'g ResourceGraph) -> Vec<&'g Resource> {
        graph
            .posts()
            .filter(|post| match &self.def.filter {
                Some(filter) => post.satisfies_filter(filter),
                None => true,
            })
            .collect()
    }
}

impl TaxonomyRouter {
    /// Posts carrying this term's substituted filter, in graph order.
    pub(crate) fn members<'g>(&self, graph: &'g ResourceGraph, slug: &str) -> Vec<&'g Resource> {
        let filter = self.def.filter_for(slug);
        graph
            .posts()
            .filter(|post| post.satisfies_filter(&filter))
            .collect()
    }
}

// ============================================================================
// RouterChain
// ============================================================================

/// The compiled chain plus the redirect-ownership index.
#[derive(Debug)]
pub struct RouterChain {
    routers: Vec<Router>,
    /// `(kind, slug)` -> canonical route path, from `data` bindings marked
    /// `redirect: true`. Baked in at construction.
    redirects: FxHashMap<(ResourceKind, String), UrlPath>,
}

impl RouterChain {
    /// Compile the chain from a routing configuration.
    ///
    /// Any malformed permalink or filter expression is a fatal
    /// configuration error: the whole build fails.
    pub fn build(config: &RoutesConfig) -> Result<Self, RouteError> {
        let mut routers = vec![Router::Admin];

        for def in &config.routes {
            if let Some(channel) = &def.controller
                && let Some(expression) = &channel.filter
            {
                Filter::compile(expression)?;
            }
            routers.push(Router::StaticRoute(StaticRouteRouter { def: def.clone() }));
        }

        for def in &config.collections {
            if let Some(expression) = &def.filter {
                Filter::compile(expression)?;
            }
            let permalink = Permalink::parse(&def.permalink)?;
            let matcher = permalink.matcher()?;
            routers.push(Router::Collection(CollectionRouter {
                def: def.clone(),
                permalink,
                matcher,
            }));
        }

        for def in &config.taxonomies {
            Filter::compile(&def.filter_for("probe"))?;
            let matcher = Permalink::parse(&def.permalink)?.matcher()?;
            routers.push(Router::Taxonomy(TaxonomyRouter {
                def: def.clone(),
                matcher,
            }));
        }

        routers.push(Router::StaticPages);

        let mut redirects = FxHashMap::default();
        for def in &config.routes {
            for binding in def.redirect_bindings() {
                redirects.insert(
                    (binding.kind, binding.slug.clone()),
                    UrlPath::from_page(&def.path),
                );
            }
        }

        Ok(Self { routers, redirects })
    }

    /// The chain in precedence order.
    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    /// The dominant router's canonical path for `(kind, slug)`, unless it
    /// is `own_path` itself (a router never redirects to itself).
    pub(crate) fn redirect_owner(
        &self,
        kind: ResourceKind,
        slug: &str,
        own_path: Option<&str>,
    ) -> Option<&UrlPath> {
        let destination = self.redirects.get(&(kind, slug.to_string()))?;
        if let Some(own) = own_path
            && paths_equal(destination.as_str(), own)
        {
            return None;
        }
        Some(destination)
    }

    /// Resolve a request, giving every router a turn.
    ///
    /// Segments are normalized into the canonical trailing-slash path
    /// first; a path whose slugified form differs short-circuits into a
    /// permanent redirect before any router runs.
    pub fn handle(
        &self,
        segments: &[&str],
        graph: &ResourceGraph,
    ) -> Result<Resolution, RouteError> {
        let path = UrlPath::from_request(&segments.join("/"));

        let decoded: Vec<&str> = path.segments().collect();
        if let Some(slugged) = slugify_segments(&decoded) {
            let destination = UrlPath::from_page(&slugged.join("/"));
            debug!("router"; "canonicalizing {} -> {}", path, destination);
            return Ok(Resolution::Redirect(Redirect::permanent(destination)));
        }

        let mut slots = Vec::with_capacity(self.routers.len());
        for router in &self.routers {
            slots.push(self.try_router(router, &path, graph));
        }
        Ok(Resolution::Matches(slots))
    }

    fn try_router(
        &self,
        router: &Router,
        path: &UrlPath,
        graph: &ResourceGraph,
    ) -> Option<RoutingContext> {
        match router {
            Router::Admin => self.match_admin(path),
            Router::StaticRoute(r) => self.match_static_route(r, path, graph),
            Router::Collection(r) => self.match_collection(r, path, graph),
            Router::Taxonomy(r) => self.match_taxonomy(r, path, graph),
            Router::StaticPages => self.match_static_pages(path, graph),
        }
    }

    // ------------------------------------------------------------------------
    // Per-router matching
    // ------------------------------------------------------------------------

    fn match_admin(&self, path: &UrlPath) -> Option<RoutingContext> {
        paths_equal(path.as_str(), "/admin").then(|| RoutingContext::Internal {
            request: RequestInfo::new(path.clone()),
        })
    }

    fn match_static_route(
        &self,
        router: &StaticRouteRouter,
        path: &UrlPath,
        graph: &ResourceGraph,
    ) -> Option<RoutingContext> {
        let def = &router.def;

        if paths_equal(path.as_str(), &def.path) {
            if let Some(channel) = &def.controller {
                return Some(self.channel_context(
                    def,
                    RequestInfo::new(path.clone()),
                    channel,
                    1,
                    graph,
                ));
            }
            // Even a custom route defers to a dominant router claiming one
            // of its bound resources.
            for binding in &def.data {
                if let Some(destination) =
                    self.redirect_owner(binding.kind, &binding.slug, Some(&def.path))
                {
                    return Some(RoutingContext::Redirect {
                        redirect: Redirect::permanent(destination.clone()),
                        request: RequestInfo::new(path.clone()),
                    });
                }
            }
            return Some(RoutingContext::Custom {
                templates: def.templates.clone(),
                request: RequestInfo::new(path.clone()),
                bindings: def.data.clone(),
            });
        }

        // Channels additionally answer their pagination suffix.
        if let Some(channel) = &def.controller
            && let Some((base, page)) = split_page(path.as_str())
            && paths_equal(base, &def.path)
        {
            let request = RequestInfo::with_params(path.clone(), [("page", page.to_string())]);
            return Some(self.channel_context(def, request, channel, page, graph));
        }

        None
    }

    fn channel_context(
        &self,
        def: &RouteDef,
        request: RequestInfo,
        channel: &ChannelDef,
        page: usize,
        graph: &ResourceGraph,
    ) -> RoutingContext {
        let post_ids: Vec<ResourceId> = graph
            .posts()
            .filter(|post| match &channel.filter {
                Some(expression) => post.satisfies_filter(expression),
                None => true,
            })
            .map(Resource::id)
            .collect();

        RoutingContext::Channel {
            name: def.path.clone(),
            templates: def.templates.clone(),
            request,
            bindings: def.data.clone(),
            filter: channel.filter.clone(),
            limit: channel.page_size(),
            order: channel.order.clone(),
            page,
            post_ids,
        }
    }

    fn match_collection(
        &self,
        router: &CollectionRouter,
        path: &UrlPath,
        graph: &ResourceGraph,
    ) -> Option<RoutingContext> {
        let def = &router.def;

        // Collection root -> index view, page 1.
        if paths_equal(path.as_str(), &def.path) {
            return Some(self.collection_context(router, RequestInfo::new(path.clone()), 1, graph));
        }

        // Pagination suffix off the root.
        if let Some((base, page)) = split_page(path.as_str())
            && paths_equal(base, &def.path)
        {
            let request = RequestInfo::with_params(path.clone(), [("page", page.to_string())]);
            return Some(self.collection_context(router, request, page, graph));
        }

        // Permalink pattern -> single-post read, for posts this collection
        // owns (ownership was pre-computed by collect).
        let params = router.matcher.match_path(path.as_str())?;
        let post = graph.by_url(path.as_str()).filter(|r| r.is_post())?;
        if !router.owns(post) {
            return None;
        }

        let slug = post.slug()?.to_string();
        let request = RequestInfo::with_params(path.clone(), params);
        if let Some(destination) = self.redirect_owner(ResourceKind::Post, &slug, None) {
            return Some(RoutingContext::Redirect {
                redirect: Redirect::permanent(destination.clone()),
                request,
            });
        }

        Some(RoutingContext::Entry {
            kind: ResourceKind::Post,
            id: post.id(),
            slug,
            templates: def.templates.clone(),
            request,
        })
    }

    fn collection_context(
        &self,
        router: &CollectionRouter,
        request: RequestInfo,
        page: usize,
        graph: &ResourceGraph,
    ) -> RoutingContext {
        let post_ids: Vec<ResourceId> = router
            .members(graph)
            .into_iter()
            .filter(|post| router.owns(post))
            .map(Resource::id)
            .collect();

        RoutingContext::Collection {
            templates: router.def.templates.clone(),
            request,
            filter: router.def.filter.clone(),
            limit: router.def.page_size(),
            order: router.def.order.clone(),
            page,
            post_ids,
        }
    }

    fn match_taxonomy(
        &self,
        router: &TaxonomyRouter,
        path: &UrlPath,
        graph: &ResourceGraph,
    ) -> Option<RoutingContext> {
        let kind = router.def.kind;

        // Term page, or term pagination suffix.
        let (params, page) = match router.matcher.match_path(path.as_str()) {
            Some(params) => (params, 1),
            None => {
                let (base, page) = split_page(path.as_str())?;
                let params = router.matcher.match_path(base)?;
                (params, page)
            }
        };

        let slug = params
            .iter()
            .find(|(name, _)| *name == "slug")
            .map(|(_, value)| value.clone())?;
        // No such term: not a match (the caller's not-found condition).
        graph.by_slug(kind.term_kind(), &slug)?;

        let mut request = RequestInfo::with_params(path.clone(), params);
        if page > 1 {
            request.params.insert("page".to_string(), page.to_string());
        }

        if let Some(destination) = self.redirect_owner(kind.term_kind(), &slug, None) {
            return Some(RoutingContext::Redirect {
                redirect: Redirect::permanent(destination.clone()),
                request,
            });
        }

        let filter = router.def.filter_for(&slug);
        let post_ids: Vec<ResourceId> = router
            .members(graph, &slug)
            .into_iter()
            .map(Resource::id)
            .collect();

        Some(RoutingContext::Channel {
            name: kind.as_str().to_string(),
            templates: vec![kind.as_str().to_string()],
            request,
            bindings: Vec::new(),
            filter: Some(filter),
            limit: router.def.page_size(),
            order: None,
            page,
            post_ids,
        })
    }

    fn match_static_pages(&self, path: &UrlPath, graph: &ResourceGraph) -> Option<RoutingContext> {
        let mut segments = path.segments();
        let slug = segments.next()?;
        if segments.next().is_some() {
            return None;
        }

        let page = graph.by_slug(ResourceKind::Page, slug)?;
        let slug = slug.to_string();
        let request = RequestInfo::with_params(path.clone(), [("slug", slug.clone())]);

        if let Some(destination) = self.redirect_owner(ResourceKind::Page, &slug, None) {
            return Some(RoutingContext::Redirect {
                redirect: Redirect::permanent(destination.clone()),
                request,
            });
        }

        Some(RoutingContext::Entry {
            kind: ResourceKind::Page,
            id: page.id(),
            slug,
            templates: vec!["page".to_string()],
            request,
        })
    }
}
