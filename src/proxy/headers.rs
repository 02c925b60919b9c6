//! Header allow-lists for both directions of the proxy.
//!
//! # Responsibilities
//! - Keep only conditional/range headers on the way to the origin
//! - Keep only representation metadata on the way back to the client
//!
//! # Design Decisions
//! - Allow-list, never deny-list: cookies and credentials cannot leak to an
//!   arbitrary origin because nothing outside the list is ever copied
//! - Missing headers are omitted, never defaulted
//! - Empty values count as missing

use axum::http::header::{
    HeaderMap, HeaderName, ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, ETAG, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE,
    IF_UNMODIFIED_SINCE, LAST_MODIFIED, RANGE,
};

/// Headers forwarded from the client to the origin (RFC 7232/7233 semantics).
pub static REQUEST_HEADERS: [HeaderName; 6] = [
    RANGE,
    IF_RANGE,
    IF_MATCH,
    IF_NONE_MATCH,
    IF_MODIFIED_SINCE,
    IF_UNMODIFIED_SINCE,
];

/// Headers relayed from the origin to the client on the streaming path.
pub static RESPONSE_HEADERS: [HeaderName; 7] = [
    CONTENT_TYPE,
    CONTENT_LENGTH,
    CONTENT_RANGE,
    ACCEPT_RANGES,
    ETAG,
    LAST_MODIFIED,
    CACHE_CONTROL,
];

/// Headers relayed from the origin to the client on the image path.
pub static IMAGE_RESPONSE_HEADERS: [HeaderName; 4] =
    [CONTENT_TYPE, CACHE_CONTROL, ETAG, LAST_MODIFIED];

/// Which boundary a header map is about to cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client request headers travelling to the origin.
    Upstream,
    /// Origin response headers travelling to the client (streaming path).
    Downstream,
    /// Origin response headers travelling to the client (image path).
    Image,
}

impl Direction {
    /// The allow-list that applies in this direction.
    pub fn allow_list(self) -> &'static [HeaderName] {
        match self {
            Direction::Upstream => &REQUEST_HEADERS,
            Direction::Downstream => &RESPONSE_HEADERS,
            Direction::Image => &IMAGE_RESPONSE_HEADERS,
        }
    }
}

/// Return only the headers allowed to cross in `direction`.
pub fn filter_headers(headers: &HeaderMap, direction: Direction) -> HeaderMap {
    filter_with(headers, direction.allow_list())
}

/// Copy every non-empty value of each allowed header, preserving value order.
pub fn filter_with(headers: &HeaderMap, allowed: &[HeaderName]) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for name in allowed {
        for value in headers.get_all(name) {
            if value.is_empty() {
                continue;
            }
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}
