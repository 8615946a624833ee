//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Propagate the ID to the response for correlation
//!
//! # Design Decisions
//! - Standard `x-request-id` header, set only when the client sent none
//! - ID generation must never fail a request; an unrepresentable ID is
//!   simply skipped

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// UUID v4 request-id source for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// The set/propagate layer pair installed around the handler.
pub fn request_id_layers() -> (SetRequestIdLayer<RequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(RequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_request_id_is_unique_and_header_safe() {
        let req = Request::builder().body(()).unwrap();
        let a = RequestUuid.make_request_id(&req).unwrap();
        let b = RequestUuid.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
