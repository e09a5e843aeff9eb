//! Segment prefix-tree router for Switchyard.
//!
//! This crate maps `(method, path)` pairs to ordered handler chains. Paths
//! are split on `/` and every segment is one level of the tree, so lookups
//! cost O(k) where k is the number of segments.
//!
//! # Features
//!
//! - **Literal Matching**: exact segments, binary-searched per level
//! - **Trailing Wildcard**: a final `*` segment matches any single segment
//! - **Literal Precedence**: a literal child always beats the wildcard
//! - **Generic Chains**: the tree stores any handler type `H`
//!
//! # Example
//!
//! ```rust
//! use switchyard_router::{Registration, RouteTree};
//! use http::Method;
//!
//! let mut tree = RouteTree::new();
//!
//! tree.register(Method::GET, "/user/list", vec!["list"]).unwrap();
//! tree.register(Method::GET, "/user/*", vec!["any"]).unwrap();
//! tree.register(Method::POST, "/user/signup", vec!["signup"]).unwrap();
//!
//! // Literal beats wildcard
//! assert_eq!(tree.lookup(&Method::GET, "/user/list"), Some(&["list"][..]));
//! assert_eq!(tree.lookup(&Method::GET, "/user/42"), Some(&["any"][..]));
//!
//! // First registration wins
//! let again = tree.register(Method::GET, "/user/list", vec!["other"]).unwrap();
//! assert_eq!(again, Registration::Ignored);
//! ```
//!
//! # Architecture
//!
//! ```text
//!              (root)
//!                │
//!             "user"
//!                │
//!      ┌─────────┼──────────┐
//!      │         │          │
//!    "list"  "signup"      "*"
//!    [GET]    [POST]      [GET]
//! ```

mod error;
mod node;
mod router;

pub use error::RouteError;
pub use node::{Node, SegmentKind, WILDCARD};
pub use router::RouteTree;

/// Outcome of registering a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The chain was attached to a new terminal node.
    Added,
    /// The path was already registered; the existing chain is kept.
    Ignored,
}
