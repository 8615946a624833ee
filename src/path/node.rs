//! Typed path-node vocabulary.
//!
//! # Responsibilities
//! - Define the nine node types a path segment can classify into
//! - Define the five wildcard kinds usable in route patterns
//! - Provide `ParsedPath`, the immutable result of parsing a path string
//!
//! # Design Decisions
//! - Exhaustive enums, no open-ended type strings
//! - `NodeType` is a fieldless mirror of `NodeKind` for cheap comparisons
//! - `ParsedPath` re-renders to the source text via `join` for logging
//!   and for match-result values

use std::fmt;

/// Discriminant-only view of a node's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Collection,
    Method,
    Id,
    SlugId,
    Property,
    LinkProperty,
    Offset,
    Range,
    Wildcard,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Collection => "collection",
            NodeType::Method => "method",
            NodeType::Id => "id",
            NodeType::SlugId => "slugId",
            NodeType::Property => "property",
            NodeType::LinkProperty => "linkProperty",
            NodeType::Offset => "offset",
            NodeType::Range => "range",
            NodeType::Wildcard => "wildcard",
        };
        f.write_str(name)
    }
}

/// Wildcard kinds, only produced when parsing in pattern mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `*` — matches any single node.
    Any,
    /// `...` — matches the remaining sub-path; terminal only.
    AnySubPath,
    /// `[id]` — matches a canonical 24-hex id node.
    AnyId,
    /// `[document]` — matches an id or slug-id node.
    AnyDocument,
    /// `[collection]` — matches a collection node.
    AnyCollection,
}

/// Classified content of a single path segment.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Collection { name: String },
    Method { name: String },
    Id,
    SlugId,
    Property { name: String },
    LinkProperty { name: String },
    Offset { value: u64 },
    Range { min: u64, max: u64 },
    Wildcard(WildcardKind),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Collection { .. } => NodeType::Collection,
            NodeKind::Method { .. } => NodeType::Method,
            NodeKind::Id => NodeType::Id,
            NodeKind::SlugId => NodeType::SlugId,
            NodeKind::Property { .. } => NodeType::Property,
            NodeKind::LinkProperty { .. } => NodeType::LinkProperty,
            NodeKind::Offset { .. } => NodeType::Offset,
            NodeKind::Range { .. } => NodeType::Range,
            NodeKind::Wildcard(_) => NodeType::Wildcard,
        }
    }
}

/// One slash-delimited segment of a resource path, classified.
#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    /// Source text of the segment. Merged property runs keep their `/`
    /// separators so a joined path reproduces the input.
    pub raw: String,
    pub kind: NodeKind,
}

impl PathNode {
    pub fn new(raw: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Identifier used for literal pattern comparison: the parsed name for
    /// named kinds, the source text otherwise.
    pub fn identifier(&self) -> &str {
        match &self.kind {
            NodeKind::Collection { name }
            | NodeKind::Method { name }
            | NodeKind::Property { name }
            | NodeKind::LinkProperty { name } => name,
            _ => &self.raw,
        }
    }

    pub fn wildcard_kind(&self) -> Option<WildcardKind> {
        match self.kind {
            NodeKind::Wildcard(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, NodeKind::Collection { .. })
    }

    /// Property and link-property nodes merge when adjacent.
    pub fn is_property_like(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Property { .. } | NodeKind::LinkProperty { .. }
        )
    }
}

/// Ordered, immutable sequence of classified nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPath {
    nodes: Vec<PathNode>,
}

impl ParsedPath {
    pub fn new(nodes: Vec<PathNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PathNode> {
        self.nodes.get(index)
    }

    pub fn last(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    /// Collection names along the path, root first. This is the chain the
    /// access schema is resolved against.
    pub fn collection_chain(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Collection { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Re-render the whole path with a leading slash.
    pub fn join(&self) -> String {
        self.join_range(0, self.nodes.len())
    }

    /// Re-render nodes `0..=index`.
    pub fn join_through(&self, index: usize) -> String {
        self.join_range(0, index + 1)
    }

    /// Re-render nodes `index..`. An empty tail renders as `/`.
    pub fn join_from(&self, index: usize) -> String {
        self.join_range(index.min(self.nodes.len()), self.nodes.len())
    }

    fn join_range(&self, start: usize, end: usize) -> String {
        let mut out = String::from("/");
        for (i, node) in self.nodes[start..end].iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            out.push_str(&node.raw);
        }
        out
    }
}

impl fmt::Display for ParsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}
