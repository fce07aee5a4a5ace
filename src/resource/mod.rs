//! The typed resource graph - normalized content with derived locator fields.
//!
//! # Module Structure
//!
//! - [`node`]: raw content-store inputs ([`ContentNode`])
//! - [`permalink`]: permalink templates (compile + reverse match)
//! - [`graph`]: the in-memory graph with its indexes and atomic publish
//! - [`collect`]: the graph builder (fetch fan-out, derivation, ownership)
//!
//! A [`Resource`] is built once per collect pass and never mutated after:
//! recomputation always rebuilds the whole record. Its `id` is a pure
//! function of the node's relative path, so re-collecting the same content
//! is idempotent by construction.

mod collect;
mod graph;
pub mod node;
pub mod permalink;

pub use collect::{ContentSource, collect};
pub use graph::{ResourceGraph, SharedGraph};
pub use node::{ConfigNode, ContentNode, EntryNode, NodeLocation, TermNode, TermRef};
pub use permalink::Permalink;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use smallvec::SmallVec;

use crate::core::UrlPath;

/// Stable numeric resource identity (FxHash of the relative path).
pub type ResourceId = u64;

// ============================================================================
// Resource kinds
// ============================================================================

/// Discriminant of the resource union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Config,
    Post,
    Page,
    Author,
    Tag,
}

impl ResourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Post => "post",
            Self::Page => "page",
            Self::Author => "author",
            Self::Tag => "tag",
        }
    }

    /// Locator resources carry a sluggable URL; config does not.
    pub const fn is_locator(self) -> bool {
        !matches!(self, Self::Config)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Resource records
// ============================================================================

/// Fields shared by every resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCore {
    /// FxHash of `relative_path`. Two nodes at the same relative path
    /// collide by design (idempotent re-collection).
    pub id: ResourceId,
    pub filename: String,
    pub filepath: String,
    pub relative_path: String,
}

/// Derived URL-locating fields of a sluggable resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locator {
    pub slug: String,
    /// Date parts from the node's date field, or "now" when absent.
    pub year: String,
    pub month: String,
    pub day: String,
    /// Slug of the first related tag, or the sentinel `"all"`.
    pub primary_tag: String,
    /// Slug of the first related author, or the sentinel `"all"`.
    pub primary_author: String,
    /// Computed permalink; `None` until assigned.
    pub url_pathname: Option<UrlPath>,
    /// Configured filter expressions this resource currently satisfies.
    /// Recomputed every collect pass, never authoritative storage.
    #[serde(default)]
    pub filters: Vec<String>,
}

/// The config singleton resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResource {
    pub core: ResourceCore,
}

/// A post or page resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryResource {
    pub core: ResourceCore,
    pub locator: Locator,
    /// Related resource ids, tags first then authors.
    pub relationships: SmallVec<[ResourceId; 4]>,
    /// Display name of the entry (post/page title).
    #[serde(default)]
    pub title: Option<String>,
}

/// A tag or author resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermResource {
    pub core: ResourceCore,
    pub locator: Locator,
    #[serde(default)]
    pub name: Option<String>,
}

/// A normalized content resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "resourceType", rename_all = "lowercase")]
pub enum Resource {
    Config(ConfigResource),
    Post(EntryResource),
    Page(EntryResource),
    Author(TermResource),
    Tag(TermResource),
}

impl Resource {
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Config(_) => ResourceKind::Config,
            Self::Post(_) => ResourceKind::Post,
            Self::Page(_) => ResourceKind::Page,
            Self::Author(_) => ResourceKind::Author,
            Self::Tag(_) => ResourceKind::Tag,
        }
    }

    pub const fn core(&self) -> &ResourceCore {
        match self {
            Self::Config(r) => &r.core,
            Self::Post(r) | Self::Page(r) => &r.core,
            Self::Author(r) | Self::Tag(r) => &r.core,
        }
    }

    #[inline]
    pub const fn id(&self) -> ResourceId {
        self.core().id
    }

    /// Locator fields, absent for config.
    pub const fn locator(&self) -> Option<&Locator> {
        match self {
            Self::Config(_) => None,
            Self::Post(r) | Self::Page(r) => Some(&r.locator),
            Self::Author(r) | Self::Tag(r) => Some(&r.locator),
        }
    }

    pub fn slug(&self) -> Option<&str> {
        self.locator().map(|l| l.slug.as_str())
    }

    pub fn url_pathname(&self) -> Option<&UrlPath> {
        self.locator().and_then(|l| l.url_pathname.as_ref())
    }

    /// Related resource ids (tags then authors), for posts and pages.
    pub fn relationships(&self) -> Option<&[ResourceId]> {
        match self {
            Self::Post(r) | Self::Page(r) => Some(&r.relationships),
            _ => None,
        }
    }

    /// Check whether this resource's recomputed filter set contains the
    /// given expression (channel/collection/taxonomy membership test).
    pub fn satisfies_filter(&self, filter: &str) -> bool {
        self.locator()
            .is_some_and(|l| l.filters.iter().any(|f| f == filter))
    }

    pub const fn is_post(&self) -> bool {
        matches!(self, Self::Post(_))
    }

    pub const fn is_page(&self) -> bool {
        matches!(self, Self::Page(_))
    }
}

// ============================================================================
// Denormalized views
// ============================================================================

/// Build the denormalized JSON view of an entry node, the shape the filter
/// engine evaluates against: nested tag/author objects, primary terms as
/// objects (omitted entirely when the entry has none).
pub(crate) fn entry_view(node: &EntryNode) -> JsonValue {
    let term = |t: &TermRef| json!({ "slug": t.slug, "name": t.name });

    let mut view = json!({
        "slug": node.slug,
        "title": node.title,
        "date": node.date,
        "tags": node.tags.iter().map(term).collect::<Vec<_>>(),
        "authors": node.authors.iter().map(term).collect::<Vec<_>>(),
    });

    let map = view.as_object_mut().expect("entry view is an object");
    if let Some(first) = node.tags.first() {
        map.insert("primary_tag".to_string(), term(first));
    }
    if let Some(first) = node.authors.first() {
        map.insert("primary_author".to_string(), term(first));
    }

    view
}

/// Denormalized JSON view of a term node.
pub(crate) fn term_view(node: &TermNode) -> JsonValue {
    json!({ "slug": node.slug, "name": node.name })
}
