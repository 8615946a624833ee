//! Request and hook contexts.
//!
//! # Responsibilities
//! - Carry the ambient per-request state hooks observe and mutate
//! - Carry the stage-specific snapshot built fresh per lifecycle
//!   transition
//! - Provide the cooperative `end()` signal for early pipeline exit
//!
//! # Design Decisions
//! - One explicit context handle threaded through the pipeline; no
//!   ambient globals
//! - The hook scratch is reset in place between runs, never reallocated,
//!   so its identity is stable for the lifetime of the request
//! - `end()` is advisory: it only takes effect because the pipeline
//!   checks `done` after every hook

use std::sync::Arc;

use serde_json::Value;

use crate::path::PathNode;

/// Lifecycle transitions at which hook pipelines run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    BeforeCollection,
    AfterCollection,
    BeforeObject,
    AfterObject,
}

/// Resolves link-property references against documents. Supplied by the
/// host; this core never dereferences links itself.
pub trait Linker: Send + Sync {
    fn resolve(&self, property: &str, document: &Value) -> Option<Value>;
}

/// Stage-tagged snapshot for one lifecycle transition. Built fresh per
/// transition and reset in place before the next pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookContext {
    pub stage: Option<HookStage>,
    pub collection_node: Option<PathNode>,
    pub parent_object_node: Option<PathNode>,
    pub object_node: Option<PathNode>,
    /// Document submitted with the request, not yet persisted.
    pub incoming_document: Option<Value>,
    /// Persisted result, populated for after stages.
    pub document: Option<Value>,
}

impl HookContext {
    pub fn before_collection(
        collection_node: PathNode,
        parent_object_node: Option<PathNode>,
        incoming_document: Option<Value>,
    ) -> Self {
        Self {
            stage: Some(HookStage::BeforeCollection),
            collection_node: Some(collection_node),
            parent_object_node,
            incoming_document,
            ..Self::default()
        }
    }

    pub fn after_collection(
        collection_node: PathNode,
        parent_object_node: Option<PathNode>,
        document: Option<Value>,
        object_node: Option<PathNode>,
    ) -> Self {
        Self {
            stage: Some(HookStage::AfterCollection),
            collection_node: Some(collection_node),
            parent_object_node,
            document,
            object_node,
            ..Self::default()
        }
    }

    pub fn before_object(object_node: PathNode, incoming_document: Option<Value>) -> Self {
        Self {
            stage: Some(HookStage::BeforeObject),
            object_node: Some(object_node),
            incoming_document,
            ..Self::default()
        }
    }

    pub fn after_object(object_node: PathNode, document: Option<Value>) -> Self {
        Self {
            stage: Some(HookStage::AfterObject),
            object_node: Some(object_node),
            document,
            ..Self::default()
        }
    }

    /// Clear every field in place. The record itself is never replaced, so
    /// anything holding the request context sees the same scratch storage
    /// across pipeline runs.
    pub fn reset(&mut self) {
        self.stage = None;
        self.collection_node = None;
        self.parent_object_node = None;
        self.object_node = None;
        self.incoming_document = None;
        self.document = None;
    }
}

/// Ambient state for one in-flight request, shared by every hook stage.
#[derive(Clone, Default)]
pub struct RequestContext {
    /// Parsed request body.
    pub input: Value,
    /// Response under construction.
    pub output: Value,
    /// Alter descriptor: response-shaping directives accumulated by hooks.
    pub alter: Option<Value>,
    /// Marks this request as part of a batch.
    pub batch: bool,
    /// Link-property resolver supplied by the host.
    pub linker: Option<Arc<dyn Linker>>,
    /// Stage scratch for the currently running pipeline.
    pub hook: HookContext,
    /// Set by `end()`; checked by the pipeline after every hook.
    pub done: bool,
}

impl RequestContext {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            ..Self::default()
        }
    }

    /// Cooperative early-exit signal: request pipeline termination and
    /// response finalization from current state.
    pub fn end(&mut self) {
        self.done = true;
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("alter", &self.alter)
            .field("batch", &self.batch)
            .field("linker", &self.linker.as_ref().map(|_| "<linker>"))
            .field("hook", &self.hook)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_node;

    #[test]
    fn test_stage_constructors_tag_the_stage() {
        let users = parse_node("Users", false).unwrap();
        let ctx = HookContext::before_collection(users.clone(), None, None);
        assert_eq!(ctx.stage, Some(HookStage::BeforeCollection));
        assert_eq!(ctx.collection_node, Some(users.clone()));
        assert!(ctx.document.is_none());

        let ctx = HookContext::after_collection(
            users,
            None,
            Some(serde_json::json!({"id": 1})),
            None,
        );
        assert_eq!(ctx.stage, Some(HookStage::AfterCollection));
        assert!(ctx.document.is_some());
    }

    #[test]
    fn test_reset_clears_every_field() {
        let node = parse_node("Users", false).unwrap();
        let mut ctx = HookContext::after_collection(
            node.clone(),
            Some(node),
            Some(Value::Null),
            None,
        );
        ctx.reset();
        assert_eq!(ctx, HookContext::default());
    }

    #[test]
    fn test_end_sets_done() {
        let mut ctx = RequestContext::new(Value::Null);
        assert!(!ctx.done);
        ctx.end();
        assert!(ctx.done);
    }
}
