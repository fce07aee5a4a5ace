//! Routing contexts - the semantic result of resolving a request path.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::config::DataBinding;
use crate::core::UrlPath;
use crate::resource::{ResourceId, ResourceKind};

// ============================================================================
// Request & Redirect
// ============================================================================

/// The originating request, echoed into every context.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    /// Canonical (trailing-slash) request path.
    pub path: UrlPath,
    /// Params extracted from the matched pattern (slug, year, page, ...).
    pub params: FxHashMap<String, String>,
}

impl RequestInfo {
    pub fn new(path: UrlPath) -> Self {
        Self {
            path,
            params: FxHashMap::default(),
        }
    }

    pub fn with_params(
        path: UrlPath,
        params: impl IntoIterator<Item = (&'static str, String)>,
    ) -> Self {
        Self {
            path,
            params: params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// A redirect decision. Computed per request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Redirect {
    pub destination: UrlPath,
    pub permanent: bool,
}

impl Redirect {
    /// Permanent redirect (canonical-URL statements).
    pub fn permanent(destination: UrlPath) -> Self {
        Self {
            destination,
            permanent: true,
        }
    }

    /// Temporary redirect.
    pub fn temporary(destination: UrlPath) -> Self {
        Self {
            destination,
            permanent: false,
        }
    }
}

// ============================================================================
// RoutingContext
// ============================================================================

/// The semantic context a request path resolved to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "context", rename_all = "lowercase")]
pub enum RoutingContext {
    /// A collection's paginated index view.
    Collection {
        templates: Vec<String>,
        request: RequestInfo,
        filter: Option<String>,
        limit: usize,
        order: Option<String>,
        /// 1-based pagination page.
        page: usize,
        /// Matching posts, in graph order.
        post_ids: Vec<ResourceId>,
    },

    /// A filterable browse view: a named channel route or a taxonomy term.
    Channel {
        /// Channel name: the route path for named channels, the taxonomy
        /// kind for term channels.
        name: String,
        templates: Vec<String>,
        request: RequestInfo,
        /// Data bindings of the owning route (empty for taxonomy terms).
        bindings: Vec<DataBinding>,
        filter: Option<String>,
        limit: usize,
        order: Option<String>,
        page: usize,
        post_ids: Vec<ResourceId>,
    },

    /// A single entry read (post or page).
    Entry {
        kind: ResourceKind,
        id: ResourceId,
        slug: String,
        templates: Vec<String>,
        request: RequestInfo,
    },

    /// A custom named route, with its data bindings.
    Custom {
        templates: Vec<String>,
        request: RequestInfo,
        bindings: Vec<DataBinding>,
    },

    /// Redirect to the canonical URL (dominant router or slug form).
    Redirect {
        redirect: Redirect,
        request: RequestInfo,
    },

    /// An internal route (admin).
    Internal { request: RequestInfo },
}

impl RoutingContext {
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// The single resource this context reads, for entry contexts.
    pub const fn entry_id(&self) -> Option<ResourceId> {
        match self {
            Self::Entry { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// The request this context was materialized for.
    pub const fn request(&self) -> &RequestInfo {
        match self {
            Self::Collection { request, .. }
            | Self::Channel { request, .. }
            | Self::Entry { request, .. }
            | Self::Custom { request, .. }
            | Self::Redirect { request, .. }
            | Self::Internal { request } => request,
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Outcome of running the full router chain over a request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    /// Slug canonicalization short-circuited the chain.
    Redirect(Redirect),

    /// One slot per router, aligned to chain order: `None` where a router
    /// did not match. All-`None` is the not-found condition.
    Matches(Vec<Option<RoutingContext>>),
}

impl Resolution {
    /// First actionable context in chain order, if any.
    pub fn first(&self) -> Option<&RoutingContext> {
        match self {
            Self::Redirect(_) => None,
            Self::Matches(slots) => slots.iter().flatten().next(),
        }
    }

    /// Whether the request should surface as a 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Redirect(_) => false,
            Self::Matches(slots) => slots.iter().all(Option::is_none),
        }
    }

    /// The canonicalization redirect, when the chain short-circuited.
    pub const fn as_redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Redirect(redirect) => Some(redirect),
            Self::Matches(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_first_skips_non_matches() {
        let request = RequestInfo::new(UrlPath::from_page("/about/"));
        let entry = RoutingContext::Entry {
            kind: ResourceKind::Page,
            id: 7,
            slug: "about".to_string(),
            templates: vec!["page".to_string()],
            request,
        };
        let resolution = Resolution::Matches(vec![None, None, Some(entry), None]);

        assert!(!resolution.is_not_found());
        assert_eq!(resolution.first().unwrap().entry_id(), Some(7));
    }

    #[test]
    fn test_resolution_not_found() {
        let resolution = Resolution::Matches(vec![None, None]);
        assert!(resolution.is_not_found());
        assert!(resolution.first().is_none());
    }

    #[test]
    fn test_redirect_resolution() {
        let resolution =
            Resolution::Redirect(Redirect::permanent(UrlPath::from_page("/category-2/pedro/")));
        assert!(!resolution.is_not_found());
        assert!(resolution.first().is_none());
        let redirect = resolution.as_redirect().unwrap();
        assert!(redirect.permanent);
        assert_eq!(redirect.destination, "/category-2/pedro/");
    }
}
