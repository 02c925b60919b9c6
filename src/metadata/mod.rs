//! Podcast metadata subsystem.
//!
//! # Data Flow
//! ```text
//! http/podcasts.rs (query validation)
//!     → client.rs (signed GET to PodcastIndex)
//!     → raw JSON passed back to the web client
//! ```
//!
//! # Design Decisions
//! - Thin pass-through: no retry, backoff, or caching
//! - Rate limiting (429) is reported distinctly so the UI can say so

pub mod client;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::proxy::error::error_response;

pub use client::PodcastIndexClient;

/// Failures talking to the metadata API.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Rate limited by PodcastIndex. Try again shortly.")]
    RateLimited,

    #[error("PodcastIndex returned {0}")]
    Status(StatusCode),

    #[error("PodcastIndex request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("PodcastIndex returned invalid JSON: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("PodcastIndex credentials are not valid header values")]
    Credentials,
}

impl MetadataError {
    /// Status returned to the client for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            MetadataError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            MetadataError::Credentials => StatusCode::INTERNAL_SERVER_ERROR,
            MetadataError::Status(_) | MetadataError::Transport(_) | MetadataError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for MetadataError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_429() {
        let response = MetadataError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn upstream_status_maps_to_bad_gateway() {
        assert_eq!(
            MetadataError::Status(StatusCode::INTERNAL_SERVER_ERROR).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
