//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Compile routes + access schema → Listen
//!
//! Shutdown (shutdown.rs):
//!     SIGINT received → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shutdown is broadcast so every long-running task can observe it

pub mod shutdown;

pub use shutdown::Shutdown;
