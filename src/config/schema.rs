//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, route prefix).
    pub listener: ListenerConfig,

    /// Streaming origin fetches.
    pub upstream: UpstreamConfig,

    /// Buffered image fetches.
    pub image: ImageConfig,

    /// Server-side timeouts.
    pub timeouts: TimeoutConfig,

    /// Cross-origin settings for the web client.
    pub cors: CorsConfig,

    /// PodcastIndex metadata API.
    pub podcast_index: PodcastIndexConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Prefix every route is nested under.
    pub api_prefix: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            api_prefix: "/api".to_string(),
        }
    }
}

/// Origin fetch settings for the streaming path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Bound on connect + response headers, in seconds. The body is unbounded.
    pub connect_timeout_secs: u64,

    /// Relay chunk size in bytes.
    pub chunk_size: usize,

    /// Redirect hops followed before giving up.
    pub max_redirects: usize,

    /// User-Agent sent to origins.
    pub user_agent: String,

    /// Honor `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` for outbound fetches.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            chunk_size: 64 * 1024,
            max_redirects: 10,
            user_agent: "Relay/1.0".to_string(),
            use_system_proxy: true,
        }
    }
}

/// Image fetch settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Bound on the whole transfer, in seconds.
    pub timeout_secs: u64,

    /// Cache-Control attached when the origin sends none.
    pub default_cache_control: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            default_cache_control: "public, max-age=86400".to_string(),
        }
    }
}

/// Timeout configuration for the server side.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for a handler to produce response headers, in seconds.
    /// Streaming bodies are not bounded by this.
    pub request_secs: u64,

    /// How long shutdown waits for upstream connections to drain, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API with credentials.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

/// PodcastIndex API credentials and endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PodcastIndexConfig {
    /// API base URL.
    pub base_url: String,

    /// API key (`PODCAST_INDEX_KEY` overrides).
    pub api_key: String,

    /// API secret (`PODCAST_INDEX_SECRET` overrides).
    pub api_secret: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Honor proxy environment variables for API calls.
    pub use_system_proxy: bool,
}

impl Default for PodcastIndexConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.podcastindex.org/api/1.0".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            timeout_secs: 15,
            use_system_proxy: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
