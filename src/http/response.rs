//! Response assembly for the streaming path.
//!
//! # Responsibilities
//! - Carry the origin status and allow-listed headers to the client
//! - Hand the relay session to hyper as a streaming body
//!
//! # Design Decisions
//! - The body is never buffered; hyper pulls one chunk at a time
//! - A forwarded `content-length` makes a mid-stream failure visible to the
//!   client as a short read; no trailer or error frame is added

use axum::body::Body;
use axum::response::{IntoResponse, Response};

use crate::proxy::UpstreamResponse;

/// Turn an origin response into the client response.
pub fn relay_response(upstream: UpstreamResponse) -> Response {
    let UpstreamResponse {
        status,
        headers,
        body,
    } = upstream;
    (status, headers, Body::from_stream(body)).into_response()
}
