//! Anonymous media proxy endpoints.

use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::http::request::RequestIdExt;
use crate::http::response::relay_response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::ProxyError;

/// `?url=` query shared by both proxy routes.
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

impl ProxyQuery {
    fn target(self) -> Result<String, ProxyError> {
        match self.url {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(ProxyError::InvalidUrl("missing 'url' query parameter".into())),
        }
    }
}

/// `GET /proxy/audio?url=`: stream an origin body with range support.
pub async fn proxy_audio(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = headers.request_id();

    let result = match query.target() {
        Ok(url) => state.fetcher.fetch(&url, &headers).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(upstream) => {
            tracing::info!(
                request_id = %request_id,
                status = upstream.status.as_u16(),
                content_length = ?upstream.headers.get(axum::http::header::CONTENT_LENGTH),
                "Relaying origin body"
            );
            metrics::record_request("audio", upstream.status.as_u16(), start);
            relay_response(upstream)
        }
        Err(e) => failure("audio", request_id, e, start),
    }
}

/// `GET /proxy/image?url=`: fetch and buffer a small origin resource.
pub async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = headers.request_id();

    let result = match query.target() {
        Ok(url) => state.images.fetch(&url).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(image) => {
            tracing::debug!(
                request_id = %request_id,
                status = image.status.as_u16(),
                bytes = image.body.len(),
                "Serving image"
            );
            metrics::record_request("image", image.status.as_u16(), start);
            image.into_response()
        }
        Err(e) => failure("image", request_id, e, start),
    }
}

fn failure(route: &'static str, request_id: &str, err: ProxyError, start: Instant) -> Response {
    tracing::warn!(
        request_id = %request_id,
        route = route,
        error = %err,
        "Proxy request failed"
    );
    metrics::record_upstream_failure(err.kind());
    metrics::record_request(route, err.status_code().as_u16(), start);
    err.into_response()
}
