//! Pattern-against-path matching.
//!
//! # Responsibilities
//! - Match a parsed route pattern against a parsed request path
//! - Extract the matched node, closest collection ancestor, and open tail
//! - Never raise: any trouble (including parse failure of string inputs)
//!   is an explicit no-match, so dispatch can try the next candidate
//!
//! # Design Decisions
//! - Single linear pass, O(pattern length); length fast-reject up front
//! - A terminal `...` stops the scan and captures the remaining tail
//! - Empty paths never match; patterns need at least one node anchoring
//!   a `...` wildcard

use crate::path::node::{NodeKind, NodeType, ParsedPath, WildcardKind};
use crate::path::parser::parse;

/// The node a wildcard position selected, reported alongside its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedChild {
    pub node_type: NodeType,
    pub node: String,
}

/// Reference to a node within the matched path.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
    pub node_type: NodeType,
    /// Joined path text this reference covers.
    pub value: String,
    /// Source text of the referenced node itself.
    pub node: String,
    pub selected_child: Option<SelectedChild>,
}

/// Successful match: the resolved target, its closest collection ancestor,
/// and — for open-ended patterns — the unmatched tail.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub path: NodeRef,
    /// Closest collection ancestor visited before the scan ended. `None`
    /// only for paths containing no collection node at all.
    pub collection_path: Option<NodeRef>,
    /// Populated only when the pattern ends in `...`.
    pub sub_path: Option<NodeRef>,
}

/// Match with string inputs. A parse failure on either side is a no-match,
/// never an error.
pub fn match_str(pattern: &str, path: &str) -> Option<MatchResult> {
    let pattern = parse(pattern, true).ok()?;
    let path = parse(path, false).ok()?;
    match_paths(&pattern, &path)
}

/// Match a parsed pattern against a parsed path.
pub fn match_paths(pattern: &ParsedPath, path: &ParsedPath) -> Option<MatchResult> {
    if path.is_empty() {
        return None;
    }
    let ends_open = matches!(
        pattern.last()?.kind,
        NodeKind::Wildcard(WildcardKind::AnySubPath)
    );

    // Length fast-reject. An open-ended pattern tolerates any tail length,
    // including an empty one (the wildcard position itself may be vacant).
    if ends_open {
        if path.len() + 1 < pattern.len() {
            return None;
        }
    } else if path.len() != pattern.len() {
        return None;
    }

    let mut last_seen = 0usize;
    let mut last_collection: Option<usize> = None;
    let mut path_ref: Option<NodeRef> = None;
    let mut sub_path: Option<NodeRef> = None;

    for (i, pattern_node) in pattern.nodes().iter().enumerate() {
        if pattern_node.wildcard_kind() == Some(WildcardKind::AnySubPath) {
            // Open tail: the node at `i` (when present) is the selected
            // child of the anchor at `i - 1`; everything past it is the
            // sub-path. Stops the scan; `last_collection` is frozen.
            if i == 0 {
                return None;
            }
            let anchor = path.get(i - 1)?;
            let selected_child = path.get(i).map(|n| SelectedChild {
                node_type: n.node_type(),
                node: n.raw.clone(),
            });
            path_ref = Some(NodeRef {
                node_type: anchor.node_type(),
                value: path.join_through(i - 1),
                node: anchor.raw.clone(),
                selected_child,
            });
            let tail_node = path.last()?;
            sub_path = Some(NodeRef {
                node_type: tail_node.node_type(),
                value: path.join_from(i + 1),
                node: tail_node.raw.clone(),
                selected_child: None,
            });
            break;
        }

        let node = path.get(i)?;
        let matched = match pattern_node.wildcard_kind() {
            Some(WildcardKind::Any) => true,
            Some(WildcardKind::AnyId) => node.node_type() == NodeType::Id,
            Some(WildcardKind::AnyDocument) => {
                matches!(node.node_type(), NodeType::Id | NodeType::SlugId)
            }
            Some(WildcardKind::AnyCollection) => node.node_type() == NodeType::Collection,
            Some(WildcardKind::AnySubPath) => unreachable!("handled above"),
            None => {
                node.node_type() == pattern_node.node_type()
                    && node.identifier() == pattern_node.identifier()
            }
        };
        if !matched {
            return None;
        }

        last_seen = i;
        if node.is_collection() {
            last_collection = Some(i);
        }
    }

    let path_ref = match path_ref {
        Some(r) => r,
        None => {
            let node = path.get(last_seen)?;
            NodeRef {
                node_type: node.node_type(),
                value: path.join(),
                node: node.raw.clone(),
                selected_child: None,
            }
        }
    };

    let collection_path = last_collection.and_then(|i| {
        let node = path.get(i)?;
        Some(NodeRef {
            node_type: node.node_type(),
            value: path.join_through(i),
            node: node.raw.clone(),
            selected_child: None,
        })
    });

    Some(MatchResult {
        path: path_ref,
        collection_path,
        sub_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "507f1f77bcf86cd799439011";

    #[test]
    fn test_length_fast_reject() {
        // No terminal `...`: lengths must be equal.
        assert!(match_str("/Users/*", "/Users").is_none());
        assert!(match_str("/Users/*", &format!("/Users/{ID}/.email")).is_none());
    }

    #[test]
    fn test_literal_match_requires_type_and_identifier() {
        assert!(match_str("/Users", "/Users").is_some());
        assert!(match_str("/Users", "/Groups").is_none());
        // `users` is a slug, not a collection; identifiers coincide but
        // types differ.
        assert!(match_str("/Users", "/users").is_none());
    }

    #[test]
    fn test_any_wildcard_with_collection_path() {
        let result = match_str("/Users/*", &format!("/Users/{ID}")).unwrap();
        assert_eq!(result.path.node_type, NodeType::Id);
        assert_eq!(result.path.value, format!("/Users/{ID}"));
        let collection = result.collection_path.unwrap();
        assert_eq!(collection.value, "/Users");
        assert_eq!(collection.node, "Users");
        assert!(result.sub_path.is_none());
    }

    #[test]
    fn test_any_sub_path_captures_tail() {
        let result = match_str("/Users/...", &format!("/Users/{ID}/.email")).unwrap();

        let sub = result.sub_path.unwrap();
        assert_eq!(sub.value, "/.email");
        assert_eq!(sub.node_type, NodeType::Property);

        assert_eq!(result.path.node_type, NodeType::Collection);
        assert_eq!(result.path.value, "/Users");
        let child = result.path.selected_child.unwrap();
        assert_eq!(child.node_type, NodeType::Id);
        assert_eq!(child.node, ID);

        assert_eq!(result.collection_path.unwrap().value, "/Users");
    }

    #[test]
    fn test_any_sub_path_tolerates_missing_tail() {
        // Path may be one node shorter than the pattern.
        let result = match_str("/Users/...", "/Users").unwrap();
        assert!(result.path.selected_child.is_none());
        assert_eq!(result.sub_path.unwrap().value, "/");

        let result = match_str("/Users/...", &format!("/Users/{ID}")).unwrap();
        assert_eq!(result.path.selected_child.unwrap().node, ID);
        assert_eq!(result.sub_path.unwrap().value, "/");
    }

    #[test]
    fn test_unanchored_sub_path_pattern_never_matches() {
        assert!(match_str("/...", "/Users").is_none());
    }

    #[test]
    fn test_typed_wildcards() {
        assert!(match_str("/Users/[id]", &format!("/Users/{ID}")).is_some());
        assert!(match_str("/Users/[id]", "/Users/my-slug").is_none());

        assert!(match_str("/Users/[document]", &format!("/Users/{ID}")).is_some());
        assert!(match_str("/Users/[document]", "/Users/my-slug").is_some());
        assert!(match_str("/Users/[document]", "/Users/.name").is_none());

        assert!(match_str("/[collection]", "/Users").is_some());
        assert!(match_str("/[collection]", &format!("/{ID}")).is_none());
    }

    #[test]
    fn test_parse_failure_is_no_match_not_error() {
        assert!(match_str("/Users/*", "/Users/bad_segment").is_none());
        assert!(match_str("/bad_pattern_%", "/Users").is_none());
    }

    #[test]
    fn test_empty_path_never_matches() {
        assert!(match_str("/Users", "/").is_none());
        assert!(match_str("/...", "/").is_none());
    }

    #[test]
    fn test_collection_path_tracks_deepest_collection() {
        let path = format!("/Users/{ID}/Posts/my-post");
        let result = match_str("/Users/[id]/Posts/[document]", &path).unwrap();
        let collection = result.collection_path.unwrap();
        assert_eq!(collection.value, format!("/Users/{ID}/Posts"));
        assert_eq!(collection.node, "Posts");
        assert_eq!(result.path.value, path);
        assert_eq!(result.path.node_type, NodeType::SlugId);
    }

    #[test]
    fn test_collection_path_frozen_once_tail_fires() {
        // The collection inside the open tail is not visited.
        let result = match_str("/Users/...", &format!("/Users/{ID}/Posts/my-post")).unwrap();
        assert_eq!(result.collection_path.unwrap().value, "/Users");
        assert_eq!(result.sub_path.unwrap().value, "/Posts/my-post");
    }

    #[test]
    fn test_match_parsed_inputs_directly() {
        let pattern = parse("/Users/[document]", true).unwrap();
        let path = parse("/Users/my-slug", false).unwrap();
        assert!(match_paths(&pattern, &path).is_some());
    }
}
