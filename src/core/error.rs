//! Routing error taxonomy.
//!
//! Expected control flow (`NotFound`) travels as a value through
//! [`crate::router::Resolution`]; everything here is a *failure* the caller
//! is expected to branch on.

use thiserror::Error;

/// Errors produced by collect / handle / resolve_paths
#[derive(Debug, Error)]
pub enum RouteError {
    /// A mandatory lookup matched nothing (e.g. a `data` binding pointing at
    /// a slug that no resource carries).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed filter expression, permalink template, or config shape.
    #[error("validation error: {0}")]
    Validation(String),

    /// Schema coercion failure on a content node.
    #[error("parse error on `{node}`: {message}")]
    Parse {
        /// Relative path of the offending node
        node: String,
        message: String,
    },

    /// Wrapped I/O or third-party failure (content fetch, cache write).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RouteError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check whether this error is the non-fatal `NotFound` kind.
    ///
    /// Callers commonly treat `NotFound` as "try the next candidate" and
    /// everything else as fatal.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RouteError::validation("permalink `/:bogus/` references unknown variable");
        assert!(format!("{err}").contains("validation error"));

        let err = RouteError::Parse {
            node: "content/posts/broken.md".to_string(),
            message: "missing slug".to_string(),
        };
        assert!(format!("{err}").contains("content/posts/broken.md"));
    }

    #[test]
    fn test_not_found_is_non_fatal() {
        assert!(RouteError::NotFound("page.home".to_string()).is_not_found());
        assert!(!RouteError::validation("bad").is_not_found());
    }

    #[test]
    fn test_wraps_anyhow() {
        let err: RouteError = anyhow::anyhow!("fetch failed").into();
        assert!(matches!(err, RouteError::Other(_)));
    }
}
