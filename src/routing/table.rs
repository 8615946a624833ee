//! Route table: compiled pattern lookup.
//!
//! # Responsibilities
//! - Compile configured route patterns at startup
//! - Look up the first matching route for a parsed request path
//! - Return matched route plus extracted node references, or explicit
//!   no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - A pattern that fails to parse is a startup error, never a runtime one
//! - O(n) scan in declaration order, first match wins; a non-matching
//!   candidate never raises, so lookup always reaches the next candidate

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::{match_paths, parse, MatchResult, ParsedPath, PathError};

/// Route definition as written in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Pattern string, e.g. `/[collection]/[document]/...`.
    pub pattern: String,
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub pattern: ParsedPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route `{name}`: bad pattern `{pattern}`: {source}")]
    BadPattern {
        name: String,
        pattern: String,
        #[source]
        source: PathError,
    },
}

/// Immutable table of compiled routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile every configured pattern. Any parse failure is fatal: a
    /// registered pattern the matcher can never try is a configuration
    /// bug, not a request-time condition.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut routes = Vec::with_capacity(configs.len());
        for config in configs {
            let pattern =
                parse(&config.pattern, true).map_err(|source| RouteError::BadPattern {
                    name: config.name.clone(),
                    pattern: config.pattern.clone(),
                    source,
                })?;
            routes.push(Route {
                name: config.name.clone(),
                pattern,
            });
        }
        Ok(Self { routes })
    }

    /// First matching route in declaration order.
    pub fn lookup(&self, path: &ParsedPath) -> Option<(&Route, MatchResult)> {
        self.routes
            .iter()
            .find_map(|route| match_paths(&route.pattern, path).map(|m| (route, m)))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Routes installed when the configuration declares none: generic
/// collection, document, and sub-path dispatch.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "collection".into(),
            pattern: "/[collection]".into(),
        },
        RouteConfig {
            name: "document".into(),
            pattern: "/[collection]/[document]".into(),
        },
        RouteConfig {
            name: "method".into(),
            pattern: "/[collection]/*".into(),
        },
        RouteConfig {
            name: "sub-path".into(),
            pattern: "/[collection]/[document]/...".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "507f1f77bcf86cd799439011";

    fn table(patterns: &[(&str, &str)]) -> RouteTable {
        let configs: Vec<RouteConfig> = patterns
            .iter()
            .map(|(name, pattern)| RouteConfig {
                name: name.to_string(),
                pattern: pattern.to_string(),
            })
            .collect();
        RouteTable::from_config(&configs).unwrap()
    }

    #[test]
    fn test_bad_pattern_is_startup_error() {
        let err = RouteTable::from_config(&[RouteConfig {
            name: "broken".into(),
            pattern: "/Users/%%".into(),
        }])
        .unwrap_err();
        assert!(matches!(err, RouteError::BadPattern { name, .. } if name == "broken"));
    }

    #[test]
    fn test_first_match_wins() {
        let table = table(&[
            ("users-doc", "/Users/[document]"),
            ("any-doc", "/[collection]/[document]"),
        ]);
        let path = parse(&format!("/Users/{ID}"), false).unwrap();
        let (route, _) = table.lookup(&path).unwrap();
        assert_eq!(route.name, "users-doc");

        let path = parse(&format!("/Groups/{ID}"), false).unwrap();
        let (route, _) = table.lookup(&path).unwrap();
        assert_eq!(route.name, "any-doc");
    }

    #[test]
    fn test_non_matching_candidates_are_skipped() {
        let table = table(&[
            ("methods", "/Users/CREATE-TOKEN"),
            ("fallback", "/[collection]/..."),
        ]);
        let path = parse(&format!("/Users/{ID}/.email"), false).unwrap();
        let (route, result) = table.lookup(&path).unwrap();
        assert_eq!(route.name, "fallback");
        assert_eq!(result.sub_path.unwrap().value, "/.email");
    }

    #[test]
    fn test_explicit_no_match() {
        let table = table(&[("users", "/Users")]);
        let path = parse("/Groups", false).unwrap();
        assert!(table.lookup(&path).is_none());
    }

    #[test]
    fn test_default_routes_compile_and_cover_basic_shapes() {
        let table = RouteTable::from_config(&default_routes()).unwrap();
        for path in [
            "/Users".to_string(),
            format!("/Users/{ID}"),
            "/Users/my-slug".to_string(),
            "/Users/CREATE-TOKEN".to_string(),
            format!("/Users/{ID}/.profile/.name"),
        ] {
            let parsed = parse(&path, false).unwrap();
            assert!(table.lookup(&parsed).is_some(), "no route for {path}");
        }
    }
}
