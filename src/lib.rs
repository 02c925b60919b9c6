//! Media streaming relay library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod metadata;
pub mod net;
pub mod observability;
pub mod proxy;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
