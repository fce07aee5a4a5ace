//! Vane - declarative content routing for static sites.
//!
//! Given a routing configuration (named routes, collections, taxonomies) and
//! a graph of content resources (posts, pages, authors, tags), vane answers
//! two questions that must always agree:
//!
//! - **Resolution**: which semantic context does a request path belong to?
//!   (collection view, taxonomy channel, single entry, custom page, redirect,
//!   or internal route)
//! - **Enumeration**: which canonical paths does the site serve at all?
//!   (the exhaustive list handed to a static pre-renderer)
//!
//! ```ignore
//! let config = RoutesConfig::default();
//! let store = MemoryStore::new();
//! let graph = SharedGraph::new();
//!
//! collect(&source, &store, &graph, &config)?;
//!
//! let chain = RouterChain::build(&config)?;
//! let paths = resolve_paths(&chain, &graph.load());
//! let outcome = chain.handle(&["tag", "tag-1"], &graph.load())?;
//! ```
//!
//! Out of scope by design: fetching content (see [`ContentSource`]),
//! persistent cache backends (see [`ResourceStore`]), template selection,
//! rendering, and HTTP transport.

pub mod config;
pub mod core;
pub mod enumerate;
pub mod filter;
pub mod logger;
pub mod resource;
pub mod router;
pub mod store;
pub mod utils;

pub use config::{
    ChannelDef, CollectionDef, DataBinding, RouteDef, RoutesConfig, TaxonomyDef, TaxonomyKind,
};
pub use core::{RouteError, UrlPath};
pub use enumerate::resolve_paths;
pub use filter::Filter;
pub use resource::{
    ContentNode, ContentSource, Resource, ResourceGraph, ResourceId, ResourceKind, SharedGraph,
    collect,
};
pub use router::{Redirect, Resolution, RouterChain, RoutingContext};
pub use store::{MemoryStore, ResourceStore};
