//! Core types - pure abstractions shared across the codebase.

mod error;
mod url;

pub use error::RouteError;
pub use url::UrlPath;
