//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, chunk size bounded)
//! - Validate values that end up in headers or URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// Largest accepted relay chunk.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Most redirect hops an origin fetch may follow.
pub const MAX_REDIRECTS: usize = 32;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic rule, collecting all violations.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let prefix = &config.listener.api_prefix;
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        errors.push(ValidationError::new(
            "listener.api_prefix",
            "must be empty or start with '/' and not end with '/'",
        ));
    }

    if config.upstream.chunk_size == 0 || config.upstream.chunk_size > MAX_CHUNK_SIZE {
        errors.push(ValidationError::new(
            "upstream.chunk_size",
            format!("must be between 1 and {MAX_CHUNK_SIZE} bytes"),
        ));
    }

    if config.upstream.max_redirects > MAX_REDIRECTS {
        errors.push(ValidationError::new(
            "upstream.max_redirects",
            format!("must be at most {MAX_REDIRECTS}"),
        ));
    }

    if HeaderValue::from_str(&config.upstream.user_agent).is_err() {
        errors.push(ValidationError::new(
            "upstream.user_agent",
            "not a valid header value",
        ));
    }

    let timeouts = [
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs),
        ("image.timeout_secs", config.image.timeout_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("podcast_index.timeout_secs", config.podcast_index.timeout_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    // The request timeout answers 408 on its own; the inner bounds must fire first.
    let inner = [
        config.upstream.connect_timeout_secs,
        config.image.timeout_secs,
        config.podcast_index.timeout_secs,
    ];
    if let Some(longest) = inner.into_iter().max() {
        if config.timeouts.request_secs < longest {
            errors.push(ValidationError::new(
                "timeouts.request_secs",
                format!("must be at least {longest}, the longest upstream timeout"),
            ));
        }
    }

    if HeaderValue::from_str(&config.image.default_cache_control).is_err() {
        errors.push(ValidationError::new(
            "image.default_cache_control",
            "not a valid header value",
        ));
    }

    if url::Url::parse(&config.podcast_index.base_url).is_err() {
        errors.push(ValidationError::new(
            "podcast_index.base_url",
            format!("'{}' is not a URL", config.podcast_index.base_url),
        ));
    }

    for origin in &config.cors.allowed_origins {
        if origin == "*" {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                "'*' cannot be combined with credentials; list origins explicitly",
            ));
        } else if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("'{origin}' is not a valid origin"),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
