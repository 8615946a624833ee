//! Access-schema validation and normalization.
//!
//! # Responsibilities
//! - Validate the declarative access configuration at load time
//! - Normalize shorthand (bare booleans, lists) into canonical
//!   access-detail form
//! - Freeze the result into an immutable tree shared across requests
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation runs once at startup; a malformed schema is fatal
//! - After `from_config` succeeds the schema is never mutated, so it is
//!   safe for unsynchronized concurrent reads behind an `Arc`

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::access::config::{AccessConfig, AccessSpec, InheritanceConfig};

/// Default access-detail list granted where a descriptor is silent.
pub const DEFAULT_DETAIL: [&str; 2] = ["id", "content"];

/// Default inheritance reach, in tree levels.
pub const DEFAULT_INHERITANCE_DEPTH: u32 = 1;

/// One semantic problem in the access configuration, located by a
/// dotted path into the nested descriptor tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{location}: empty field class in access-detail list")]
    EmptyFieldClass { location: String },

    #[error("{location}: field class `{field}` contains invalid characters")]
    InvalidFieldClass { location: String, field: String },

    #[error("{location}: collection key `{key}` is not a valid collection name")]
    InvalidCollectionKey { location: String, key: String },

    #[error("{location}: inheritance depth must be at least 1")]
    ZeroInheritanceDepth { location: String },
}

/// All problems found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport(pub Vec<ValidationError>);

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("access schema validation failed: {0}")]
    Validation(ValidationReport),
}

/// Normalized inheritance block. Fields carry the values that propagate;
/// `None` means the action does not propagate at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Inheritance {
    pub depth: u32,
    pub traverse: Option<bool>,
    pub overwrite: Option<bool>,
    pub delete: Option<bool>,
    pub query: Option<bool>,
    pub create: Option<bool>,
    pub read: Option<Vec<String>>,
    pub write: Option<Vec<String>>,
    pub exec: Option<Vec<String>>,
}

impl Default for Inheritance {
    fn default() -> Self {
        Self {
            depth: DEFAULT_INHERITANCE_DEPTH,
            traverse: None,
            overwrite: None,
            delete: None,
            query: None,
            create: None,
            read: None,
            write: None,
            exec: None,
        }
    }
}

/// Normalized descriptor for one tree node. Explicit settings stay
/// `Option` so resolution can distinguish "set here" from "defaulted".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessNode {
    pub traverse: Option<bool>,
    pub overwrite: Option<bool>,
    pub delete: Option<bool>,
    pub query: Option<bool>,
    pub create: Option<bool>,
    pub read: Option<Vec<String>>,
    pub write: Option<Vec<String>>,
    pub exec: Option<Vec<String>>,
    pub collections: HashMap<String, AccessNode>,
    pub inheritance: Inheritance,
}

/// Immutable access-descriptor tree, built once at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessSchema {
    root: AccessNode,
}

impl AccessSchema {
    /// Validate and normalize a configuration. Collects every problem
    /// before failing.
    pub fn from_config(config: &AccessConfig) -> Result<Self, SchemaError> {
        let mut errors = Vec::new();
        validate_node(config, "access", &mut errors);
        if !errors.is_empty() {
            return Err(SchemaError::Validation(ValidationReport(errors)));
        }
        Ok(Self {
            root: normalize_node(config),
        })
    }

    pub fn root(&self) -> &AccessNode {
        &self.root
    }

    /// Descriptor chain for a root-to-target collection path. The root
    /// descriptor is always first; a `None` entry marks a collection with
    /// no descriptor of its own (level defaults apply there).
    pub fn chain<'a>(&'a self, collections: &[&str]) -> Vec<Option<&'a AccessNode>> {
        let mut chain = Vec::with_capacity(collections.len() + 1);
        chain.push(Some(&self.root));
        let mut cursor = Some(&self.root);
        for name in collections {
            cursor = cursor.and_then(|node| node.collections.get(*name));
            chain.push(cursor);
        }
        chain
    }
}

/// Canonical form of one access-detail shorthand: `true` grants the
/// default field classes, `false` grants nothing, a list stands as-is.
pub fn to_access_detail(spec: &AccessSpec) -> Vec<String> {
    match spec {
        AccessSpec::Flag(true) => DEFAULT_DETAIL.iter().map(|s| s.to_string()).collect(),
        AccessSpec::Flag(false) => Vec::new(),
        AccessSpec::Fields(fields) => fields.clone(),
    }
}

/// Normalize a node-level optional access spec.
pub fn to_access(spec: Option<&AccessSpec>) -> Option<Vec<String>> {
    spec.map(to_access_detail)
}

/// Normalize a collection-level optional access spec. Collection
/// descriptors share the canonical form; the level difference is in the
/// defaults applied during resolution, not in the stored shape.
pub fn to_collection_access(spec: Option<&AccessSpec>) -> Option<Vec<String>> {
    spec.map(to_access_detail)
}

fn normalize_node(config: &AccessConfig) -> AccessNode {
    AccessNode {
        traverse: config.traverse,
        overwrite: config.overwrite,
        delete: config.delete,
        query: config.query,
        create: config.create,
        read: to_access(config.read.as_ref()),
        write: to_access(config.write.as_ref()),
        exec: to_access(config.exec.as_ref()),
        collections: config
            .collections
            .iter()
            .map(|(name, child)| (name.clone(), normalize_collection(child)))
            .collect(),
        inheritance: normalize_inheritance(config.inheritance.as_ref()),
    }
}

fn normalize_collection(config: &AccessConfig) -> AccessNode {
    AccessNode {
        read: to_collection_access(config.read.as_ref()),
        write: to_collection_access(config.write.as_ref()),
        exec: to_collection_access(config.exec.as_ref()),
        ..normalize_node(config)
    }
}

fn normalize_inheritance(config: Option<&InheritanceConfig>) -> Inheritance {
    match config {
        None => Inheritance::default(),
        Some(inh) => Inheritance {
            depth: inh.depth.unwrap_or(DEFAULT_INHERITANCE_DEPTH),
            traverse: inh.traverse,
            overwrite: inh.overwrite,
            delete: inh.delete,
            query: inh.query,
            create: inh.create,
            read: to_access(inh.read.as_ref()),
            write: to_access(inh.write.as_ref()),
            exec: to_access(inh.exec.as_ref()),
        },
    }
}

fn validate_node(config: &AccessConfig, location: &str, errors: &mut Vec<ValidationError>) {
    for (name, spec) in [
        ("read", &config.read),
        ("write", &config.write),
        ("exec", &config.exec),
    ] {
        if let Some(AccessSpec::Fields(fields)) = spec {
            validate_fields(fields, &format!("{location}.{name}"), errors);
        }
    }

    if let Some(inh) = &config.inheritance {
        if inh.depth == Some(0) {
            errors.push(ValidationError::ZeroInheritanceDepth {
                location: format!("{location}.inheritance"),
            });
        }
        for (name, spec) in [("read", &inh.read), ("write", &inh.write), ("exec", &inh.exec)] {
            if let Some(AccessSpec::Fields(fields)) = spec {
                validate_fields(fields, &format!("{location}.inheritance.{name}"), errors);
            }
        }
    }

    for (key, child) in &config.collections {
        let child_location = format!("{location}.collections.{key}");
        if !is_collection_key(key) {
            errors.push(ValidationError::InvalidCollectionKey {
                location: format!("{location}.collections"),
                key: key.clone(),
            });
        }
        validate_node(child, &child_location, errors);
    }
}

fn validate_fields(fields: &[String], location: &str, errors: &mut Vec<ValidationError>) {
    for field in fields {
        if field.is_empty() {
            errors.push(ValidationError::EmptyFieldClass {
                location: location.to_string(),
            });
        } else if !field
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            errors.push(ValidationError::InvalidFieldClass {
                location: location.to_string(),
                field: field.clone(),
            });
        }
    }
}

/// Collection keys use the parsed (decapitalized) collection name.
fn is_collection_key(key: &str) -> bool {
    let mut bytes = key.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_lowercase() => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> AccessConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_shorthand_normalization() {
        assert_eq!(
            to_access_detail(&AccessSpec::Flag(true)),
            vec!["id".to_string(), "content".to_string()]
        );
        assert!(to_access_detail(&AccessSpec::Flag(false)).is_empty());
        assert_eq!(
            to_access_detail(&AccessSpec::Fields(vec!["owner".into()])),
            vec!["owner".to_string()]
        );
        assert_eq!(to_access(None), None);
    }

    #[test]
    fn test_from_config_builds_nested_tree() {
        let schema = AccessSchema::from_config(&config(
            r#"{
                "traverse": true,
                "collections": {
                    "users": {
                        "read": ["id"],
                        "collections": { "posts": { "query": false } }
                    }
                }
            }"#,
        ))
        .unwrap();

        let users = &schema.root().collections["users"];
        assert_eq!(users.read, Some(vec!["id".to_string()]));
        assert_eq!(users.collections["posts"].query, Some(false));
    }

    #[test]
    fn test_chain_reports_missing_descriptors() {
        let schema = AccessSchema::from_config(&config(
            r#"{ "collections": { "users": {} } }"#,
        ))
        .unwrap();

        let chain = schema.chain(&["users", "posts"]);
        assert_eq!(chain.len(), 3);
        assert!(chain[0].is_some());
        assert!(chain[1].is_some());
        assert!(chain[2].is_none());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let err = AccessSchema::from_config(&config(
            r#"{
                "read": ["", "bad field"],
                "inheritance": { "depth": 0 },
                "collections": { "Bad-Key": {} }
            }"#,
        ))
        .unwrap_err();

        let SchemaError::Validation(ValidationReport(errors)) = err;
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_inheritance_defaults() {
        let schema = AccessSchema::from_config(&config("{}")).unwrap();
        assert_eq!(schema.root().inheritance.depth, DEFAULT_INHERITANCE_DEPTH);
        assert!(schema.root().inheritance.read.is_none());
    }
}
