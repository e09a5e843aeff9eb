//! Body encoding and decoding errors.

use thiserror::Error;

/// Errors raised by the JSON and query helpers on [`Context`](crate::Context).
#[derive(Error, Debug)]
pub enum BodyError {
    /// The request carried no body.
    #[error("request body is empty")]
    Empty,

    /// The body is not valid JSON for the target type.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// The query string could not be decoded into the target type.
    #[error("invalid query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message() {
        assert_eq!(BodyError::Empty.to_string(), "request body is empty");
    }

    #[test]
    fn test_json_error_converts() {
        let err: BodyError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid JSON body"));
    }
}
