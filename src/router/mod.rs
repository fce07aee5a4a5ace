//! Request resolution - the ordered router chain.
//!
//! # Module Structure
//!
//! - [`chain`]: the compiled chain, per-kind matching, dominant redirects
//! - [`context`]: routing contexts, requests, redirects, the resolution
//! - [`pattern`]: path comparison and pagination-suffix handling

pub mod chain;
pub mod context;
pub mod pattern;

pub use chain::{CollectionRouter, Router, RouterChain, StaticRouteRouter, TaxonomyRouter};
pub use context::{Redirect, RequestInfo, Resolution, RoutingContext};
