//! Request identifiers.
//!
//! UUID v7 is used because it is time-ordered, so IDs sort by arrival in
//! log search.

use std::fmt;

use uuid::Uuid;

/// The header carrying the request ID on responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Unique identifier of one request.
///
/// Stored in the [`Context`](switchyard_core::Context) extensions by the
/// [`Instrumentation`](super::Instrumentation) stage, where later handlers
/// can read it for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new time-ordered ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_ids_are_v7() {
        assert_eq!(RequestId::new().as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_display_is_hyphenated() {
        let id = RequestId::new();
        assert_eq!(id.to_string().len(), 36);
    }
}
