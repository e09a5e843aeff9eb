//! Prefix tree node implementation.
//!
//! Each node owns one path segment. Literal children are kept sorted for
//! binary search; a node has at most one wildcard child, stored apart from
//! the literals so that literal matches are always tried first.

use http::Method;

use crate::error::RouteError;
use crate::Registration;

/// Label of the wildcard segment.
pub const WILDCARD: &str = "*";

/// Type of path segment in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal path segment (e.g., "user", "list")
    Literal,
    /// Trailing single-level wildcard (`*`)
    Wildcard,
}

/// A node in the route tree.
///
/// A node becomes terminal once a method is recorded on it; only terminal
/// nodes carry a handler chain.
#[derive(Debug, Clone)]
pub struct Node<H> {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (literal or wildcard)
    pub kind: SegmentKind,

    /// Method owning this node, set on terminal nodes only
    pub method: Option<Method>,

    /// Handler chain, in registration order
    pub handlers: Vec<H>,

    /// Literal children, sorted by segment for binary search
    pub literal_children: Vec<Node<H>>,

    /// Wildcard child (at most one per node)
    pub wildcard_child: Option<Box<Node<H>>>,
}

impl<H> Node<H> {
    /// Creates a new literal node.
    #[must_use]
    pub fn new_literal(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            kind: SegmentKind::Literal,
            method: None,
            handlers: Vec::new(),
            literal_children: Vec::new(),
            wildcard_child: None,
        }
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard() -> Self {
        Self {
            segment: WILDCARD.to_string(),
            kind: SegmentKind::Wildcard,
            ..Self::new_literal("")
        }
    }

    /// Creates the root node of a tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_literal("/")
    }

    /// Returns true if a method and handler chain were recorded here.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.method.is_some()
    }

    /// Splits a path into segments.
    ///
    /// Leading and trailing slashes are trimmed before splitting, so `/`
    /// yields a single empty segment and `/user/` equals `/user`.
    pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
        path.trim_matches('/').split('/')
    }

    /// Splits a registration path and checks wildcard placement.
    fn parse_path(path: &str) -> Result<Vec<&str>, RouteError> {
        let segments: Vec<&str> = Self::segments(path).collect();
        let last = segments.len() - 1;

        for (idx, segment) in segments.iter().enumerate() {
            if !segment.contains('*') {
                continue;
            }
            if *segment != WILDCARD {
                return Err(RouteError::invalid_wildcard(path, *segment));
            }
            if idx != last {
                return Err(RouteError::wildcard_not_last(path));
            }
        }

        Ok(segments)
    }

    /// Inserts a route into the tree.
    ///
    /// Existing nodes along the path are reused and missing ones are
    /// created. If the final node is already terminal the registration is
    /// ignored: the first registration for a path wins.
    pub fn insert(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<H>,
    ) -> Result<Registration, RouteError> {
        let segments = Self::parse_path(path)?;

        let mut cur = self;
        for segment in segments {
            cur = cur.child_or_insert(segment);
        }

        if cur.is_terminal() {
            return Ok(Registration::Ignored);
        }

        cur.method = Some(method);
        cur.handlers = handlers;
        Ok(Registration::Added)
    }

    /// Returns the child for `segment`, creating it when missing.
    fn child_or_insert(&mut self, segment: &str) -> &mut Node<H> {
        if segment == WILDCARD {
            return &mut **self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new_wildcard()));
        }

        let idx = match self
            .literal_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.literal_children.insert(idx, Node::new_literal(segment));
                idx
            }
        };
        &mut self.literal_children[idx]
    }

    /// Matches a path against the tree.
    ///
    /// Returns the handler chain only when the final node was registered
    /// for exactly `method`.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&[H]> {
        let mut cur = self;
        for segment in Self::segments(path) {
            cur = cur.match_child(segment)?;
        }

        match &cur.method {
            Some(owner) if owner == method => Some(&cur.handlers),
            _ => None,
        }
    }

    /// Picks the next node for one request segment.
    ///
    /// An exact literal always beats the wildcard. The wildcard consumes
    /// one segment only.
    fn match_child(&self, segment: &str) -> Option<&Node<H>> {
        self.find_literal_child(segment)
            .or(self.wildcard_child.as_deref())
    }

    /// Finds a literal child by segment using binary search.
    fn find_literal_child(&self, segment: &str) -> Option<&Node<H>> {
        self.literal_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.literal_children[i])
    }
}
