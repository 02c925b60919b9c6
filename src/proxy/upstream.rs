//! Origin fetching for the streaming path.
//!
//! # Responsibilities
//! - Validate the client-supplied origin URL
//! - Issue a GET with the filtered conditional/range headers
//! - Bound the connect + header phase, never the body
//! - Hand the still-open body to a relay session
//!
//! # Design Decisions
//! - The HTTP client keeps no idle connections: each request owns its socket,
//!   and dropping the body closes it
//! - No transparent decompression, so `content-length` stays truthful
//! - Origin status codes are passed through; only transport failures are errors

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use reqwest::redirect::Policy;
use url::Url;

use crate::config::UpstreamConfig;
use crate::net::ConnectionTracker;
use crate::proxy::error::ProxyError;
use crate::proxy::headers::{filter_headers, Direction};
use crate::proxy::relay::RelaySession;

/// Response headers from the origin plus the live body.
#[derive(Debug)]
pub struct UpstreamResponse {
    /// Origin status, passed through verbatim.
    pub status: StatusCode,
    /// Origin headers after the downstream allow-list.
    pub headers: HeaderMap,
    /// The not-yet-drained body.
    pub body: RelaySession,
}

/// Opens streaming GETs against arbitrary origins.
#[derive(Debug, Clone)]
pub struct UpstreamFetcher {
    client: reqwest::Client,
    tracker: ConnectionTracker,
    header_timeout: Duration,
    chunk_size: usize,
}

impl UpstreamFetcher {
    /// Build a fetcher from configuration.
    pub fn new(config: &UpstreamConfig, tracker: ConnectionTracker) -> Result<Self, ProxyError> {
        let header_timeout = Duration::from_secs(config.connect_timeout_secs);
        let client = build_client(config, header_timeout)
            .build()
            .map_err(ProxyError::Client)?;

        Ok(Self {
            client,
            tracker,
            header_timeout,
            chunk_size: config.chunk_size,
        })
    }

    /// Fetch `url`, forwarding only the allow-listed request headers.
    ///
    /// On failure the connection is released before the error is returned.
    pub async fn fetch(
        &self,
        url: &str,
        client_headers: &HeaderMap,
    ) -> Result<UpstreamResponse, ProxyError> {
        let url = parse_origin_url(url)?;
        let forwarded = filter_headers(client_headers, Direction::Upstream);

        let connection = self.tracker.track();
        tracing::debug!(
            connection_id = %connection.id(),
            origin = %url.host_str().unwrap_or_default(),
            forwarded_headers = forwarded.len(),
            "Opening upstream request"
        );

        // Dropping the send future on timeout aborts the connect/handshake.
        let send = self.client.get(url).headers(forwarded).send();
        let response = match tokio::time::timeout(self.header_timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                drop(connection);
                return Err(ProxyError::from_send(err, self.header_timeout));
            }
            Err(_) => {
                drop(connection);
                return Err(ProxyError::Timeout(self.header_timeout));
            }
        };

        let status = response.status();
        let headers = filter_headers(response.headers(), Direction::Downstream);
        tracing::debug!(
            connection_id = %connection.id(),
            status = status.as_u16(),
            final_url = %response.url(),
            "Upstream responded"
        );

        let body = RelaySession::new(response.bytes_stream(), connection, self.chunk_size);
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    /// Tracker shared by every connection this fetcher opens.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }
}

/// Client settings shared by the streaming and image paths.
pub(crate) fn build_client(
    config: &UpstreamConfig,
    connect_timeout: Duration,
) -> reqwest::ClientBuilder {
    let builder = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .redirect(Policy::limited(config.max_redirects))
        .pool_max_idle_per_host(0)
        .user_agent(config.user_agent.clone());

    if config.use_system_proxy {
        builder
    } else {
        builder.no_proxy()
    }
}

/// Accept only absolute http(s) URLs with a host.
pub fn parse_origin_url(raw: &str) -> Result<Url, ProxyError> {
    let url = Url::parse(raw).map_err(|e| ProxyError::InvalidUrl(format!("{raw} ({e})")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ProxyError::InvalidUrl(raw.to_string())),
    }
}
