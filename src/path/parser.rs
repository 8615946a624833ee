//! Path grammar: segment classification and path parsing.
//!
//! # Responsibilities
//! - Split a raw path on `/` and classify every segment into a typed node
//! - Merge adjacent property / link-property nodes into one dotted node
//! - Reject malformed segments with a structured error
//!
//! # Design Decisions
//! - Ordered predicate chain, first match wins. Two rules can accept the
//!   same string (`"42"` is both a valid offset and a valid slug-id), so
//!   rule order is observable behavior and must not be reordered.
//! - No regex: hand-rolled char predicates keep classification O(n) with
//!   no compiled-automaton state.
//! - Wildcard literals are only recognized in pattern mode so that a
//!   request path can never smuggle a wildcard past the matcher.

use thiserror::Error;

use crate::path::node::{NodeKind, ParsedPath, PathNode, WildcardKind};

/// Segment length bounds; keeps classification cost bounded.
pub const MAX_NODE_LEN: usize = 72;

/// Parse failures. `InvalidNode` is raised by direct segment parsing;
/// `BadPath` wraps it with the full path for whole-path parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid node `{segment}`")]
    InvalidNode { segment: String },

    #[error("bad path `{path}`: invalid node `{segment}`")]
    BadPath { path: String, segment: String },
}

/// Parse a slash-delimited path into typed nodes.
///
/// Empty segments are skipped, so `"/Users//.name"` and `"/Users/.name"`
/// parse identically. Adjacent property / link-property nodes merge into a
/// single node with a dot-joined identifier; the merged node takes the
/// *later* node's kind.
pub fn parse(path: &str, is_pattern: bool) -> Result<ParsedPath, PathError> {
    let mut nodes: Vec<PathNode> = Vec::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let node = parse_node(segment, is_pattern).map_err(|_| PathError::BadPath {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;

        if let Some(prev) = nodes.last_mut() {
            if prev.is_property_like() && node.is_property_like() {
                merge_property(prev, node);
                continue;
            }
        }
        nodes.push(node);
    }

    Ok(ParsedPath::new(nodes))
}

/// Classify a single segment.
pub fn parse_node(segment: &str, is_pattern: bool) -> Result<PathNode, PathError> {
    if segment.is_empty() || segment.len() > MAX_NODE_LEN {
        return Err(PathError::InvalidNode {
            segment: segment.to_string(),
        });
    }
    match classify(segment, is_pattern) {
        Some(kind) => Ok(PathNode::new(segment, kind)),
        None => Err(PathError::InvalidNode {
            segment: segment.to_string(),
        }),
    }
}

/// Merge `next` into `prev`: identifiers dot-joined, raws slash-joined so
/// a re-rendered path reproduces the source text, kind taken from `next`.
fn merge_property(prev: &mut PathNode, next: PathNode) {
    let merged_name = format!("{}.{}", prev.identifier(), next.identifier());
    prev.raw = format!("{}/{}", prev.raw, next.raw);
    prev.kind = match next.kind {
        NodeKind::LinkProperty { .. } => NodeKind::LinkProperty { name: merged_name },
        _ => NodeKind::Property { name: merged_name },
    };
}

/// The ordered rule chain. Returns the first kind whose rule accepts the
/// segment, or `None` when no rule matches.
fn classify(segment: &str, is_pattern: bool) -> Option<NodeKind> {
    // Rule 1: pattern-only wildcard literals.
    if is_pattern {
        let wildcard = match segment {
            "*" => Some(WildcardKind::Any),
            "..." => Some(WildcardKind::AnySubPath),
            "[id]" => Some(WildcardKind::AnyId),
            "[document]" => Some(WildcardKind::AnyDocument),
            "[collection]" => Some(WildcardKind::AnyCollection),
            _ => None,
        };
        if let Some(kind) = wildcard {
            return Some(NodeKind::Wildcard(kind));
        }
    }

    let first = segment.as_bytes()[0];

    // Rule 2: uppercase-led segments are collections or methods.
    if first.is_ascii_uppercase() {
        return classify_uppercase(segment);
    }

    // Rule 3: canonical document id, 24 lowercase hex chars.
    if is_object_id(segment) {
        return Some(NodeKind::Id);
    }

    // Rule 4: `.`-led property reference, dots retained as separators.
    if first == b'.' {
        return classify_property(segment);
    }

    // Rule 5: `~`-led link-property reference.
    if first == b'~' {
        return classify_link_property(segment);
    }

    // Rule 6: digit-led offset (`42`) or range (`42-100`).
    if first.is_ascii_digit() {
        if let Some(kind) = classify_offset_or_range(segment) {
            return Some(kind);
        }
        // Falls through: a digit-led segment that is not a plain offset
        // or range may still be a valid slug-id (e.g. `42abc`).
    }

    // Rule 7: lowercase slug-id.
    if (first.is_ascii_lowercase() || first.is_ascii_digit()) && is_slug(segment) {
        return Some(NodeKind::SlugId);
    }

    None
}

fn classify_uppercase(segment: &str) -> Option<NodeKind> {
    if segment.len() == 1 {
        return Some(NodeKind::Collection {
            name: segment.to_ascii_lowercase(),
        });
    }

    let is_collection_shaped = segment
        .bytes()
        .skip(1)
        .all(|b| b.is_ascii_alphanumeric());

    // `Users` — second char lowercase, alphanumeric tail.
    if segment.as_bytes()[1].is_ascii_lowercase() && is_collection_shaped {
        return Some(NodeKind::Collection {
            name: decapitalize(segment),
        });
    }

    // `CREATE-TOKEN` — uppercase/digit/hyphen tail, camel-cased identifier.
    if segment
        .bytes()
        .skip(1)
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-')
    {
        return Some(NodeKind::Method {
            name: camel_case(segment),
        });
    }

    // `A1b` — neither of the above but still collection-shaped.
    if is_collection_shaped {
        return Some(NodeKind::Collection {
            name: decapitalize(segment),
        });
    }

    None
}

fn classify_property(segment: &str) -> Option<NodeKind> {
    if property_groups_valid(&segment[1..]) {
        Some(NodeKind::Property {
            name: segment[1..].to_string(),
        })
    } else {
        None
    }
}

fn classify_link_property(segment: &str) -> Option<NodeKind> {
    if property_groups_valid(&segment[1..]) {
        Some(NodeKind::LinkProperty {
            name: segment[1..].to_string(),
        })
    } else {
        None
    }
}

/// Dot-separated groups of `[a-zA-Z0-9_-]+`, no empty group.
fn property_groups_valid(rest: &str) -> bool {
    !rest.is_empty()
        && rest.split('.').all(|group| {
            !group.is_empty()
                && group
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        })
}

fn classify_offset_or_range(segment: &str) -> Option<NodeKind> {
    match segment.split_once('-') {
        None => segment
            .parse::<u64>()
            .ok()
            .map(|value| NodeKind::Offset { value }),
        Some((min, max)) => {
            if min.is_empty() || max.is_empty() || max.contains('-') {
                return None;
            }
            let min = min.parse::<u64>().ok()?;
            let max = max.parse::<u64>().ok()?;
            Some(NodeKind::Range { min, max })
        }
    }
}

fn is_object_id(segment: &str) -> bool {
    segment.len() == 24
        && segment
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn is_slug(segment: &str) -> bool {
    segment
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn decapitalize(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_lowercase());
    }
    out.push_str(chars.as_str());
    out
}

/// `CREATE-TOKEN` → `createToken`.
fn camel_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for (i, word) in segment.split('-').filter(|w| !w.is_empty()).enumerate() {
        let lowered = word.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&lowered);
        } else {
            let mut chars = lowered.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::node::NodeType;

    fn kind(segment: &str) -> NodeKind {
        parse_node(segment, false).unwrap().kind
    }

    fn pattern_kind(segment: &str) -> NodeKind {
        parse_node(segment, true).unwrap().kind
    }

    #[test]
    fn test_collection_classification() {
        assert_eq!(
            kind("Users"),
            NodeKind::Collection {
                name: "users".into()
            }
        );
        assert_eq!(kind("A"), NodeKind::Collection { name: "a".into() });
        // Second char non-lowercase but still collection-shaped.
        assert_eq!(
            kind("A1b"),
            NodeKind::Collection { name: "a1b".into() }
        );
    }

    #[test]
    fn test_method_classification() {
        assert_eq!(
            kind("CREATE-TOKEN"),
            NodeKind::Method {
                name: "createToken".into()
            }
        );
        assert_eq!(
            kind("ABC"),
            NodeKind::Method { name: "abc".into() }
        );
        assert_eq!(
            kind("A1B"),
            NodeKind::Method { name: "a1b".into() }
        );
    }

    #[test]
    fn test_id_classification() {
        assert_eq!(kind("507f1f77bcf86cd799439011"), NodeKind::Id);
        // Uppercase hex is not an id; 24 chars of [a-z0-9-] is a slug.
        assert_eq!(kind("507f1f77bcf86cd79943901a"), NodeKind::Id);
        assert_eq!(kind("507f1f77bcf86cd79943901z"), NodeKind::SlugId);
        // 23 hex chars fall through to slug.
        assert_eq!(kind("507f1f77bcf86cd79943901"), NodeKind::SlugId);
    }

    #[test]
    fn test_property_classification() {
        assert_eq!(
            kind(".name"),
            NodeKind::Property {
                name: "name".into()
            }
        );
        assert_eq!(
            kind(".profile.name"),
            NodeKind::Property {
                name: "profile.name".into()
            }
        );
        assert!(parse_node("..name", false).is_err());
        assert!(parse_node(".", false).is_err());
    }

    #[test]
    fn test_link_property_classification() {
        assert_eq!(
            kind("~author"),
            NodeKind::LinkProperty {
                name: "author".into()
            }
        );
        assert!(parse_node("~", false).is_err());
    }

    #[test]
    fn test_offset_and_range() {
        assert_eq!(kind("42"), NodeKind::Offset { value: 42 });
        assert_eq!(kind("42-100"), NodeKind::Range { min: 42, max: 100 });
        // Digit-led but not numeric: slug.
        assert_eq!(kind("42abc"), NodeKind::SlugId);
        assert_eq!(kind("42-"), NodeKind::SlugId);
        assert_eq!(kind("1-2-3"), NodeKind::SlugId);
    }

    #[test]
    fn test_slug_classification() {
        assert_eq!(kind("my-first-post"), NodeKind::SlugId);
        assert!(parse_node("my_post", false).is_err());
        assert!(parse_node("héllo", false).is_err());
    }

    #[test]
    fn test_wildcards_only_in_pattern_mode() {
        assert_eq!(
            pattern_kind("*"),
            NodeKind::Wildcard(WildcardKind::Any)
        );
        assert_eq!(
            pattern_kind("..."),
            NodeKind::Wildcard(WildcardKind::AnySubPath)
        );
        assert_eq!(
            pattern_kind("[id]"),
            NodeKind::Wildcard(WildcardKind::AnyId)
        );
        assert_eq!(
            pattern_kind("[document]"),
            NodeKind::Wildcard(WildcardKind::AnyDocument)
        );
        assert_eq!(
            pattern_kind("[collection]"),
            NodeKind::Wildcard(WildcardKind::AnyCollection)
        );
        assert!(parse_node("*", false).is_err());
        assert!(parse_node("[id]", false).is_err());
    }

    #[test]
    fn test_length_bounds() {
        assert!(parse_node("", false).is_err());
        let long = "a".repeat(MAX_NODE_LEN);
        assert!(parse_node(&long, false).is_ok());
        let too_long = "a".repeat(MAX_NODE_LEN + 1);
        assert!(parse_node(&too_long, false).is_err());
    }

    #[test]
    fn test_parse_splits_and_skips_empty_segments() {
        let path = parse("/Users/507f1f77bcf86cd799439011", false).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.nodes()[0].node_type(), NodeType::Collection);
        assert_eq!(path.nodes()[1].node_type(), NodeType::Id);

        let doubled = parse("//Users///507f1f77bcf86cd799439011/", false).unwrap();
        assert_eq!(doubled.len(), 2);

        assert!(parse("/", false).unwrap().is_empty());
    }

    #[test]
    fn test_parse_reports_bad_path() {
        let err = parse("/Users/bad_segment", false).unwrap_err();
        assert_eq!(
            err,
            PathError::BadPath {
                path: "/Users/bad_segment".into(),
                segment: "bad_segment".into()
            }
        );
    }

    #[test]
    fn test_adjacent_properties_merge() {
        let path = parse("/Users/.profile/.name", false).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(
            path.nodes()[1].kind,
            NodeKind::Property {
                name: "profile.name".into()
            }
        );
        assert_eq!(path.nodes()[1].raw, ".profile/.name");
    }

    #[test]
    fn test_property_link_merge_is_asymmetric() {
        // property + linkProperty -> linkProperty with dotted identifier
        let path = parse("/Users/.profile/~avatar", false).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(
            path.nodes()[1].kind,
            NodeKind::LinkProperty {
                name: "profile.avatar".into()
            }
        );

        // linkProperty + property -> property (later node's kind wins)
        let path = parse("/Users/~avatar/.url", false).unwrap();
        assert_eq!(
            path.nodes()[1].kind,
            NodeKind::Property {
                name: "avatar.url".into()
            }
        );
    }

    #[test]
    fn test_parse_round_trip_is_stable() {
        for input in [
            "/Users/507f1f77bcf86cd799439011/.email",
            "/Users/.profile/.name",
            "/Blog/my-first-post/Comments/0-10",
            "/Users/CREATE-TOKEN",
        ] {
            let once = parse(input, false).unwrap();
            let twice = parse(&once.join(), false).unwrap();
            assert_eq!(once, twice);
        }
    }
}
