//! Effective-permission resolution.
//!
//! # Responsibilities
//! - Combine a root-to-target descriptor chain into one effective
//!   descriptor for the target
//! - Honor the inheritance contract: a target's explicit setting always
//!   wins; an ancestor's setting reaches the target only through its
//!   inheritance block, only within that block's depth
//!
//! # Design Decisions
//! - Fail closed: anything not granted explicitly, by inheritance, or by
//!   the level defaults is denied
//! - The schema root resolves with node-level defaults (implicit read);
//!   every descriptor reached through a `collections` map resolves with
//!   collection-level defaults (no implicit read)

use crate::access::schema::{AccessNode, AccessSchema, Inheritance, DEFAULT_DETAIL};

/// Fully resolved permissions for one target node.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveAccess {
    pub traverse: bool,
    pub overwrite: bool,
    pub delete: bool,
    pub query: bool,
    pub create: bool,
    pub read: Vec<String>,
    pub write: Vec<String>,
    pub exec: Vec<String>,
}

fn default_detail() -> Vec<String> {
    DEFAULT_DETAIL.iter().map(|s| s.to_string()).collect()
}

/// Resolve effective permissions for the target named by a root-to-target
/// collection chain. An empty chain resolves the schema root itself.
pub fn resolve(schema: &AccessSchema, collections: &[&str]) -> EffectiveAccess {
    let chain = schema.chain(collections);

    // Collection-level defaults apply when a collection override
    // descriptor was actually written: declaring one withdraws the
    // implicit read grant. A collection with no descriptor keeps the
    // node-level defaults.
    let collection_level = !collections.is_empty() && matches!(chain.last(), Some(Some(_)));

    let read_default = if collection_level {
        Vec::new()
    } else {
        default_detail()
    };

    EffectiveAccess {
        traverse: resolve_flag(&chain, |n| n.traverse, |i| i.traverse, true),
        overwrite: resolve_flag(&chain, |n| n.overwrite, |i| i.overwrite, false),
        delete: resolve_flag(&chain, |n| n.delete, |i| i.delete, false),
        query: resolve_flag(&chain, |n| n.query, |i| i.query, true),
        create: resolve_flag(&chain, |n| n.create, |i| i.create, true),
        read: resolve_detail(&chain, |n| n.read.clone(), |i| i.read.clone(), read_default),
        write: resolve_detail(&chain, |n| n.write.clone(), |i| i.write.clone(), Vec::new()),
        exec: resolve_detail(&chain, |n| n.exec.clone(), |i| i.exec.clone(), default_detail()),
    }
}

/// Nearest explicit setting on the target, else the nearest ancestor whose
/// inheritance block sets the action within its depth, else the default.
fn resolve_flag(
    chain: &[Option<&AccessNode>],
    explicit: impl Fn(&AccessNode) -> Option<bool>,
    inherited: impl Fn(&Inheritance) -> Option<bool>,
    default: bool,
) -> bool {
    if let Some(Some(target)) = chain.last() {
        if let Some(value) = explicit(target) {
            return value;
        }
    }
    inherited_value(chain, |node| inherited(&node.inheritance)).unwrap_or(default)
}

fn resolve_detail(
    chain: &[Option<&AccessNode>],
    explicit: impl Fn(&AccessNode) -> Option<Vec<String>>,
    inherited: impl Fn(&Inheritance) -> Option<Vec<String>>,
    default: Vec<String>,
) -> Vec<String> {
    if let Some(Some(target)) = chain.last() {
        if let Some(value) = explicit(target) {
            return value;
        }
    }
    inherited_value(chain, |node| inherited(&node.inheritance)).unwrap_or(default)
}

/// Walk ancestors nearest-first; an ancestor contributes only while the
/// target lies within its inheritance depth.
fn inherited_value<T>(
    chain: &[Option<&AccessNode>],
    pick: impl Fn(&AccessNode) -> Option<T>,
) -> Option<T> {
    let target_index = chain.len().checked_sub(1)?;
    for ancestor_index in (0..target_index).rev() {
        let Some(ancestor) = chain[ancestor_index] else {
            continue;
        };
        let distance = (target_index - ancestor_index) as u32;
        if distance > ancestor.inheritance.depth {
            continue;
        }
        if let Some(value) = pick(ancestor) {
            return Some(value);
        }
    }
    None
}
