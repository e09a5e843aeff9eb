//! High-level route tree API.
//!
//! This module provides the [`RouteTree`] struct which is the primary
//! interface for registering and resolving handler chains.

use http::Method;

use crate::error::RouteError;
use crate::node::Node;
use crate::Registration;

/// A prefix tree mapping `(method, path)` to an ordered handler chain.
///
/// The tree is built once at startup and only read afterwards. It holds no
/// interior mutability, so a finished tree can be shared between request
/// workers without locking.
///
/// # Example
///
/// ```rust
/// use switchyard_router::RouteTree;
/// use http::Method;
///
/// let mut tree = RouteTree::new();
/// tree.register(Method::GET, "/user/list", vec!["list"]).unwrap();
/// tree.register(Method::GET, "/user/*", vec!["any"]).unwrap();
///
/// assert_eq!(tree.lookup(&Method::GET, "/user/list"), Some(&["list"][..]));
/// assert_eq!(tree.lookup(&Method::GET, "/user/7"), Some(&["any"][..]));
/// ```
///
/// # Route Priority
///
/// At every level an exact literal segment beats the wildcard. There is no
/// backtracking: once a literal child is chosen, a miss further down is a
/// miss for the whole lookup.
#[derive(Debug, Clone)]
pub struct RouteTree<H> {
    /// Root node of the tree
    root: Node<H>,
    /// Number of routes registered
    route_count: usize,
}

impl<H> Default for RouteTree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTree<H> {
    /// Creates a new empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers a handler chain for `method` and `path`.
    ///
    /// A path that is already registered keeps its original chain and the
    /// call returns [`Registration::Ignored`].
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if the path places a wildcard anywhere but the
    /// last segment.
    pub fn register(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<H>,
    ) -> Result<Registration, RouteError> {
        let outcome = self.root.insert(method, path, handlers)?;
        if outcome == Registration::Added {
            self.route_count += 1;
        }
        Ok(outcome)
    }

    /// Resolves the handler chain for a request.
    ///
    /// Returns `None` when the path does not resolve to a terminal node or
    /// the node belongs to another method.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&[H]> {
        self.root.lookup(method, path)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
