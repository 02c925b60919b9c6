//! Buffered fetch path for small resources such as artwork.
//!
//! Unlike the streaming path, the whole transfer (connect, headers and body)
//! sits under one deadline, the body is buffered, and the connection is
//! released before `fetch` returns.

use std::time::Duration;

use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::config::{ImageConfig, UpstreamConfig};
use crate::net::ConnectionTracker;
use crate::proxy::error::ProxyError;
use crate::proxy::headers::{filter_headers, Direction};
use crate::proxy::upstream::{build_client, parse_origin_url};

/// A fully buffered origin response.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub body: Bytes,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl IntoResponse for FetchedImage {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Fetches small resources with a bounded total timeout.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    tracker: ConnectionTracker,
    timeout: Duration,
    default_cache_control: HeaderValue,
}

impl ImageFetcher {
    /// Build an image fetcher. Redirect and user-agent settings come from the
    /// upstream section; the deadline and cache policy from the image section.
    pub fn new(
        upstream: &UpstreamConfig,
        config: &ImageConfig,
        tracker: ConnectionTracker,
    ) -> Result<Self, ProxyError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = build_client(upstream, timeout)
            .timeout(timeout)
            .build()
            .map_err(ProxyError::Client)?;
        let default_cache_control = HeaderValue::from_str(&config.default_cache_control)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CACHE_CONTROL));

        Ok(Self {
            client,
            tracker,
            timeout,
            default_cache_control,
        })
    }

    /// Fetch and buffer `url`.
    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, ProxyError> {
        let url = parse_origin_url(url)?;
        let _connection = self.tracker.track();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProxyError::from_send(e, self.timeout))?;

        let status = response.status();
        let mut headers = filter_headers(response.headers(), Direction::Image);
        if !headers.contains_key(CACHE_CONTROL) {
            headers.insert(CACHE_CONTROL, self.default_cache_control.clone());
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ProxyError::Timeout(self.timeout)
            } else {
                ProxyError::Body(e)
            }
        })?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Image fetched");
        Ok(FetchedImage {
            body,
            status,
            headers,
        })
    }
}

/// Cache directive attached when the origin sends none.
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=86400";
