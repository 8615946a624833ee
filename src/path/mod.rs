//! Path grammar subsystem.
//!
//! # Data Flow
//! ```text
//! Raw path string
//!     → parser.rs (split, classify, merge property runs)
//!     → ParsedPath (ordered typed nodes)
//!     → matcher.rs (evaluate against a route pattern)
//!     → Return: MatchResult or explicit no-match
//! ```
//!
//! # Design Decisions
//! - Classification is an ordered predicate chain; precedence is part of
//!   the wire format, not an implementation detail
//! - Parsing a request path raises on malformed input; matching never does
//! - Patterns are ordinary paths parsed in pattern mode, so wildcards can
//!   never appear in a request path

pub mod matcher;
pub mod node;
pub mod parser;

pub use matcher::{match_paths, match_str, MatchResult, NodeRef, SelectedChild};
pub use node::{NodeKind, NodeType, ParsedPath, PathNode, WildcardKind};
pub use parser::{parse, parse_node, PathError, MAX_NODE_LEN};
