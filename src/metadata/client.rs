//! PodcastIndex API client.
//!
//! # Responsibilities
//! - Sign every request with the key/secret/timestamp scheme the API expects
//! - Expose the four lookups the web client needs, returning raw JSON
//! - Surface rate limiting distinctly from other failures
//!
//! # Design Decisions
//! - Single attempt, no retry or caching
//! - Responses are passed through as `serde_json::Value`; the web client owns
//!   the schema

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::config::PodcastIndexConfig;
use crate::metadata::MetadataError;

const CLIENT_USER_AGENT: &str = "Relay/1.0";

/// Authenticated PodcastIndex client.
#[derive(Debug, Clone)]
pub struct PodcastIndexClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl PodcastIndexClient {
    /// Build a client from configuration.
    pub fn new(config: &PodcastIndexConfig) -> Result<Self, MetadataError> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(MetadataError::Transport)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Search podcasts by term.
    pub async fn search(&self, query: &str) -> Result<Value, MetadataError> {
        self.get("/search/byterm", &[("q", query.to_string())]).await
    }

    /// Look up a podcast by feed id.
    pub async fn get_podcast(&self, podcast_id: i64) -> Result<Value, MetadataError> {
        self.get("/podcasts/byfeedid", &[("id", podcast_id.to_string())])
            .await
    }

    /// List up to `max_results` episodes of a feed.
    pub async fn get_episodes(
        &self,
        podcast_id: i64,
        max_results: u32,
    ) -> Result<Value, MetadataError> {
        self.get(
            "/episodes/byfeedid",
            &[("id", podcast_id.to_string()), ("max", max_results.to_string())],
        )
        .await
    }

    /// Look up a single episode.
    pub async fn get_episode(&self, episode_id: i64) -> Result<Value, MetadataError> {
        self.get("/episodes/byid", &[("id", episode_id.to_string())])
            .await
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(params)
            .headers(self.auth_headers(unix_now())?)
            .send()
            .await
            .map_err(MetadataError::Transport)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(path = %path, "PodcastIndex rate limit hit");
            return Err(MetadataError::RateLimited);
        }
        if !status.is_success() {
            tracing::warn!(path = %path, status = status.as_u16(), "PodcastIndex request failed");
            return Err(MetadataError::Status(status));
        }

        response.json().await.map_err(MetadataError::Decode)
    }

    /// Headers for a request issued at `timestamp` (unix seconds).
    pub fn auth_headers(&self, timestamp: u64) -> Result<HeaderMap, MetadataError> {
        let timestamp = timestamp.to_string();
        let mut hasher = Sha1::new();
        hasher.update(self.api_key.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hasher.update(timestamp.as_bytes());
        let signature = hex::encode(hasher.finalize());

        let mut headers = HeaderMap::new();
        headers.insert("x-auth-date", header_value(&timestamp)?);
        headers.insert("x-auth-key", header_value(&self.api_key)?);
        headers.insert(AUTHORIZATION, header_value(&signature)?);
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, MetadataError> {
    HeaderValue::from_str(value).map_err(|_| MetadataError::Credentials)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
