//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → parse each pattern in pattern mode (failure = fatal)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (parsed path):
//!     → table.rs (scan in declaration order)
//!     → Return: matched Route + MatchResult, or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod table;

pub use table::{default_routes, Route, RouteConfig, RouteError, RouteTable};
