//! Access-control subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration (nested descriptor record)
//!     → config.rs (serde shapes, shorthand preserved)
//!     → schema.rs (validate all-at-once, normalize, freeze)
//!     → AccessSchema (immutable, Arc-shared)
//!
//! Per request:
//!     resolved collection chain
//!     → resolve.rs (explicit > inherited-within-depth > level default)
//!     → EffectiveAccess (consumed by the request handler)
//! ```
//!
//! # Design Decisions
//! - Declarative and validated once at load time, never executed per
//!   request
//! - Fail closed on anything not granted
//! - The full permission-evaluation policy lives in the request handler;
//!   this subsystem only supplies effective descriptors

pub mod config;
pub mod resolve;
pub mod schema;

pub use config::{AccessConfig, AccessSpec, InheritanceConfig};
pub use resolve::{resolve, EffectiveAccess};
pub use schema::{
    to_access, to_access_detail, to_collection_access, AccessNode, AccessSchema, Inheritance,
    SchemaError, ValidationError, ValidationReport, DEFAULT_DETAIL, DEFAULT_INHERITANCE_DEPTH,
};
