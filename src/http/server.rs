//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the upstream clients once and share them through `AppState`
//! - Create the Axum router with every endpoint under the API prefix
//! - Wire up middleware (request ID, tracing, CORS, header-phase timeout)
//! - Serve until shutdown, then drain upstream connections

use std::future::IntoFuture;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    routing::get,
    Json, Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{CorsConfig, RelayConfig};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::{media, podcasts};
use crate::lifecycle::shutdown;
use crate::metadata::{MetadataError, PodcastIndexClient};
use crate::net::ConnectionTracker;
use crate::proxy::{ImageFetcher, ProxyError, UpstreamFetcher};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: UpstreamFetcher,
    pub images: ImageFetcher,
    pub podcasts: PodcastIndexClient,
}

/// Failures while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let tracker = ConnectionTracker::new();

        let state = AppState {
            fetcher: UpstreamFetcher::new(&config.upstream, tracker.clone())?,
            images: ImageFetcher::new(&config.upstream, &config.image, tracker.clone())?,
            podcasts: PodcastIndexClient::new(&config.podcast_index)?,
        };

        if config.podcast_index.api_key.is_empty() {
            tracing::warn!("PodcastIndex API key not configured");
        }

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            tracker,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/health", get(health))
            .route("/proxy/audio", get(media::proxy_audio))
            .route("/proxy/image", get(media::proxy_image))
            .route("/podcasts/search", get(podcasts::search))
            .route("/podcasts/{podcast_id}", get(podcasts::get_podcast))
            .route("/podcasts/{podcast_id}/episodes", get(podcasts::get_episodes))
            .route("/episodes/{episode_id}", get(podcasts::get_episode))
            .with_state(state);

        let app = match config.listener.api_prefix.as_str() {
            "" => api,
            prefix => Router::new().nest(prefix, api),
        };

        // Last layer added runs first: the request ID must exist before tracing.
        app.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors_layer(&config.cors))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request.headers().request_id(),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires.
    ///
    /// In-flight streams get `timeouts.shutdown_grace_secs` to finish, then
    /// another grace period for their upstream connections to be released.
    /// Returns once both have elapsed even if streams are still open; they
    /// are released when the runtime shuts down.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        tracing::info!(
            address = %addr,
            api_prefix = %self.config.listener.api_prefix,
            "HTTP server starting"
        );

        let deadline = shutdown.resubscribe();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .into_future();

        tokio::select! {
            result = serve => result?,
            _ = async {
                shutdown::wait(deadline).await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "Grace period elapsed with streams still open"
                );
            }
        }

        if !self.tracker.wait_until_idle(grace).await {
            tracing::warn!(
                open_connections = self.tracker.active_count(),
                "Upstream connections still open at shutdown"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Tracker of upstream connections opened by this server.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// `GET /health`
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
