//! Hook subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     host registers ordered hooks per lifecycle stage → HookRegistry
//!
//! Per lifecycle transition:
//!     build HookContext (stage-tagged snapshot)
//!     → pipeline.rs run / run_after over the shared RequestContext
//!     → hooks observe, mutate output, or end() the pipeline
//! ```
//!
//! # Design Decisions
//! - Cooperative, single-threaded per request; one hook at a time
//! - Before-phase failures block the operation; after-phase failures are
//!   logged and swallowed
//! - Hook duration is unbounded here; the host's request timeout governs it

pub mod context;
pub mod pipeline;

pub use context::{HookContext, HookStage, Linker, RequestContext};
pub use pipeline::{run, run_after, Hook, HookError, HookFuture, HookRegistry};
