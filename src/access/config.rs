//! Access-control configuration shapes.
//!
//! These types mirror the configuration file exactly, shorthand included.
//! Serde handles the syntactic layer; semantic validation and shorthand
//! normalization happen in `schema.rs` at load time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Shorthand for an access-detail list: a bare boolean or an explicit list
/// of field classes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AccessSpec {
    Flag(bool),
    Fields(Vec<String>),
}

/// One node's access descriptor, as written in configuration. Every field
/// is optional; absence means "use the level default or inherit".
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    pub traverse: Option<bool>,
    pub overwrite: Option<bool>,
    pub delete: Option<bool>,
    pub query: Option<bool>,
    pub create: Option<bool>,

    pub read: Option<AccessSpec>,
    pub write: Option<AccessSpec>,
    pub exec: Option<AccessSpec>,

    /// Per-child-collection overrides, keyed by collection name.
    pub collections: BTreeMap<String, AccessConfig>,

    pub inheritance: Option<InheritanceConfig>,
}

/// Controls propagation of this node's settings to descendants. An action
/// absent from the block does not propagate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InheritanceConfig {
    /// Maximum distance, in tree levels, the block reaches. Default 1.
    pub depth: Option<u32>,

    pub traverse: Option<bool>,
    pub overwrite: Option<bool>,
    pub delete: Option<bool>,
    pub query: Option<bool>,
    pub create: Option<bool>,

    pub read: Option<AccessSpec>,
    pub write: Option<AccessSpec>,
    pub exec: Option<AccessSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_forms_deserialize() {
        let config: AccessConfig = serde_json::from_str(
            r#"{
                "traverse": true,
                "read": ["id", "content"],
                "write": false,
                "collections": {
                    "users": { "read": true }
                },
                "inheritance": { "depth": 2, "query": true }
            }"#,
        )
        .unwrap();

        assert_eq!(config.traverse, Some(true));
        assert_eq!(
            config.read,
            Some(AccessSpec::Fields(vec!["id".into(), "content".into()]))
        );
        assert_eq!(config.write, Some(AccessSpec::Flag(false)));
        assert_eq!(
            config.collections["users"].read,
            Some(AccessSpec::Flag(true))
        );
        let inheritance = config.inheritance.unwrap();
        assert_eq!(inheritance.depth, Some(2));
        assert_eq!(inheritance.query, Some(true));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<AccessConfig, _> =
            serde_json::from_str(r#"{ "reed": ["id"] }"#);
        assert!(result.is_err());
    }
}
