//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → resource handler: parse path → match route → resolve access
//!       → before-hooks → storage → after-hooks
//!     → JSON response from the request context's output
//! ```

pub mod request;
pub mod server;

pub use request::{request_id_layers, RequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, StartupError};
