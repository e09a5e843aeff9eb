//! Route registration errors.

use thiserror::Error;

/// Errors raised while registering a route.
///
/// These are programmer errors in the route table and are reported at
/// startup, before any request is served.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A wildcard appears before the last path segment.
    #[error("illegal wildcard position in '{path}': `*` must be the last segment")]
    WildcardNotLast {
        /// The offending path.
        path: String,
    },

    /// A segment mixes `*` with other characters.
    #[error("illegal wildcard segment '{segment}' in '{path}': use a bare `*`")]
    InvalidWildcard {
        /// The offending path.
        path: String,
        /// The offending segment.
        segment: String,
    },
}

impl RouteError {
    /// Creates a wildcard position error.
    pub fn wildcard_not_last(path: impl Into<String>) -> Self {
        Self::WildcardNotLast { path: path.into() }
    }

    /// Creates an invalid wildcard segment error.
    pub fn invalid_wildcard(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::InvalidWildcard {
            path: path.into(),
            segment: segment.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_not_last_message() {
        let err = RouteError::wildcard_not_last("/user/*/list");
        assert!(err.to_string().contains("/user/*/list"));
    }

    #[test]
    fn test_invalid_wildcard_message() {
        let err = RouteError::invalid_wildcard("/user/a*", "a*");
        assert!(err.to_string().contains("a*"));
    }
}
