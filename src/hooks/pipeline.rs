//! Sequential hook execution.
//!
//! # Responsibilities
//! - Run an ordered list of hooks over one shared request context
//! - Install or reset the stage scratch before the first hook
//! - Honor the cooperative `done` signal after every hook
//! - `run`: propagate the first failure (pre-commit gate)
//! - `run_after`: report failures to the log sink and swallow them
//!
//! # Design Decisions
//! - Strictly sequential: one hook at a time, suspension at each await,
//!   no fan-out within a pipeline invocation
//! - An after-phase failure must never turn an already-committed success
//!   into an error response

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::hooks::context::{HookContext, HookStage, RequestContext};

/// Failure raised by a hook. Before-phase failures abort the operation;
/// after-phase failures are logged and swallowed by `run_after`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type HookFuture<'a> = BoxFuture<'a, Result<(), HookError>>;

type HookFn = Box<dyn for<'a> Fn(&'a mut RequestContext) -> HookFuture<'a> + Send + Sync>;

/// A named hook callable. The name only serves logging and failure
/// reports.
pub struct Hook {
    name: String,
    func: HookFn,
}

impl Hook {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext) -> HookFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, ctx: &mut RequestContext) -> Result<(), HookError> {
        (self.func)(ctx).await
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish()
    }
}

/// Ordered hook lists per lifecycle stage. Populated by the host at
/// startup; the pipeline only sequences, it never discovers hooks.
#[derive(Debug, Default)]
pub struct HookRegistry {
    before_collection: Vec<Hook>,
    after_collection: Vec<Hook>,
    before_object: Vec<Hook>,
    after_object: Vec<Hook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, stage: HookStage, hook: Hook) {
        self.stage_mut(stage).push(hook);
    }

    pub fn hooks(&self, stage: HookStage) -> &[Hook] {
        match stage {
            HookStage::BeforeCollection => &self.before_collection,
            HookStage::AfterCollection => &self.after_collection,
            HookStage::BeforeObject => &self.before_object,
            HookStage::AfterObject => &self.after_object,
        }
    }

    fn stage_mut(&mut self, stage: HookStage) -> &mut Vec<Hook> {
        match stage {
            HookStage::BeforeCollection => &mut self.before_collection,
            HookStage::AfterCollection => &mut self.after_collection,
            HookStage::BeforeObject => &mut self.before_object,
            HookStage::AfterObject => &mut self.after_object,
        }
    }
}

/// Install the stage scratch: an explicit context replaces the current
/// one; otherwise the existing scratch is cleared in place.
fn install_scratch(ctx: &mut RequestContext, hook_ctx: Option<HookContext>) {
    match hook_ctx {
        Some(hc) => ctx.hook = hc,
        None => ctx.hook.reset(),
    }
}

/// Run hooks before an operation commits. The first failure aborts the
/// pipeline and propagates: the caller must block the operation.
pub async fn run(
    hooks: &[Hook],
    ctx: &mut RequestContext,
    hook_ctx: Option<HookContext>,
) -> Result<(), HookError> {
    install_scratch(ctx, hook_ctx);
    for hook in hooks {
        if let Err(err) = hook.call(ctx).await {
            tracing::warn!(hook = %hook.name, error = %err, "before-hook failed, aborting pipeline");
            return Err(err);
        }
        if ctx.done {
            tracing::debug!(hook = %hook.name, "pipeline ended early");
            break;
        }
    }
    Ok(())
}

/// Run hooks after an operation has committed. A failure is reported to
/// the log sink and swallowed; remaining hooks are skipped but the call
/// always resolves normally.
pub async fn run_after(hooks: &[Hook], ctx: &mut RequestContext, hook_ctx: Option<HookContext>) {
    install_scratch(ctx, hook_ctx);
    for hook in hooks {
        if let Err(err) = hook.call(ctx).await {
            tracing::error!(
                hook = %hook.name,
                error = %err,
                "after-hook failed; response is already committed"
            );
            return;
        }
        if ctx.done {
            tracing::debug!(hook = %hook.name, "pipeline ended early");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn recording_hook(name: &str, log: Arc<std::sync::Mutex<Vec<String>>>) -> Hook {
        let tag = name.to_string();
        Hook::new(name, move |_ctx| {
            let log = log.clone();
            let tag = tag.clone();
            Box::pin(async move {
                log.lock().unwrap().push(tag);
                Ok(())
            })
        })
    }

    fn failing_hook(name: &str) -> Hook {
        Hook::new(name, |_ctx| {
            Box::pin(async { Err(HookError::new("boom")) })
        })
    }

    #[tokio::test]
    async fn test_hooks_run_in_registration_order() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let hooks = vec![
            recording_hook("h1", log.clone()),
            recording_hook("h2", log.clone()),
            recording_hook("h3", log.clone()),
        ];
        let mut ctx = RequestContext::default();
        run(&hooks, &mut ctx, None).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["h1", "h2", "h3"]);
    }

    #[tokio::test]
    async fn test_end_skips_remaining_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c1 = calls.clone();
        let c3 = calls.clone();
        let hooks = vec![
            Hook::new("h1", move |_| {
                let c = c1.clone();
                Box::pin(async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            }),
            Hook::new("h2", |ctx| {
                Box::pin(async move {
                    ctx.end();
                    Ok(())
                })
            }),
            Hook::new("h3", move |_| {
                let c = c3.clone();
                Box::pin(async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            }),
        ];
        let mut ctx = RequestContext::default();
        run(&hooks, &mut ctx, None).await.unwrap();
        assert!(ctx.done);
        assert_eq!(calls.load(Ordering::SeqCst), 1); // h3 never ran
    }

    #[tokio::test]
    async fn test_run_propagates_failure() {
        let hooks = vec![failing_hook("bad")];
        let mut ctx = RequestContext::default();
        let err = run(&hooks, &mut ctx, None).await.unwrap_err();
        assert_eq!(err.message, "boom");
    }

    #[tokio::test]
    async fn test_run_after_swallows_failure_and_leaves_context_usable() {
        let hooks = vec![failing_hook("bad")];
        let mut ctx = RequestContext::default();
        ctx.output = json!({"committed": true});
        run_after(&hooks, &mut ctx, None).await;
        // The committed output is untouched and the context stays usable.
        assert_eq!(ctx.output, json!({"committed": true}));
        ctx.end();
        assert!(ctx.done);
    }

    #[tokio::test]
    async fn test_run_after_failure_skips_remaining_hooks() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let hooks = vec![
            recording_hook("h1", log.clone()),
            failing_hook("bad"),
            recording_hook("h3", log.clone()),
        ];
        let mut ctx = RequestContext::default();
        run_after(&hooks, &mut ctx, None).await;
        assert_eq!(*log.lock().unwrap(), vec!["h1"]);
    }

    #[tokio::test]
    async fn test_scratch_replaced_or_reset() {
        let users = crate::path::parse_node("Users", false).unwrap();
        let mut ctx = RequestContext::default();

        let hc = HookContext::before_collection(users, None, Some(Value::Null));
        run(&[], &mut ctx, Some(hc.clone())).await.unwrap();
        assert_eq!(ctx.hook, hc);

        // No explicit scratch: the existing one is cleared in place.
        run(&[], &mut ctx, None).await.unwrap();
        assert_eq!(ctx.hook, HookContext::default());
    }

    #[tokio::test]
    async fn test_hooks_mutate_shared_output() {
        let hooks = vec![
            Hook::new("set", |ctx| {
                Box::pin(async move {
                    ctx.output = json!({"touched": 1});
                    Ok(())
                })
            }),
            Hook::new("extend", |ctx| {
                Box::pin(async move {
                    if let Value::Object(map) = &mut ctx.output {
                        map.insert("touched".into(), json!(2));
                    }
                    Ok(())
                })
            }),
        ];
        let mut ctx = RequestContext::default();
        run(&hooks, &mut ctx, None).await.unwrap();
        assert_eq!(ctx.output, json!({"touched": 2}));
    }
}
