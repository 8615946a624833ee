//! Hierarchical REST resource-tree server.
//!
//! The core is three interlocking pieces: the path grammar (`path`),
//! the inheritable access-control model (`access`), and the lifecycle
//! hook pipeline (`hooks`). A resolved path yields a node-type chain,
//! the chain drives access resolution, and lifecycle transitions on it
//! invoke hooks. `routing`, `config`, `storage`, `http`, and `lifecycle`
//! host that core behind an Axum server.

pub mod access;
pub mod config;
pub mod hooks;
pub mod http;
pub mod lifecycle;
pub mod path;
pub mod routing;
pub mod storage;

pub use access::{resolve, AccessSchema, EffectiveAccess};
pub use config::ServerConfig;
pub use hooks::{Hook, HookContext, HookRegistry, HookStage, RequestContext};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use path::{match_paths, match_str, parse, parse_node, MatchResult, ParsedPath};
pub use routing::RouteTable;
pub use storage::{MemoryStore, Storage};
