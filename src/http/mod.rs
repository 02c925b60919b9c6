//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, API prefix)
//!     → request.rs (request ID assigned and echoed)
//!     → media.rs (audio/image proxy) | podcasts.rs (metadata lookups)
//!     → response.rs (origin status + filtered headers + streamed body)
//!     → Send to client
//! ```

pub mod media;
pub mod podcasts;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
