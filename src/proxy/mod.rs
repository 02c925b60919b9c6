//! Media proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Streaming (audio):
//!     client headers
//!     → headers.rs (request allow-list)
//!     → upstream.rs (GET, bounded header phase, redirects followed)
//!     → headers.rs (response allow-list)
//!     → relay.rs (fixed-size chunks, released exactly once)
//!     → client
//!
//! Buffered (image):
//!     → image.rs (GET under one deadline, body buffered)
//!     → headers.rs (image allow-list) + default cache-control
//!     → client
//! ```
//!
//! # Design Decisions
//! - Stateless across requests; each request owns its origin connection
//! - Origin status codes pass through untouched
//! - No caching, transcoding, or resumption

pub mod error;
pub mod headers;
pub mod image;
pub mod relay;
pub mod upstream;

pub use error::{ProxyError, RelayError};
pub use headers::{filter_headers, Direction};
pub use image::{FetchedImage, ImageFetcher};
pub use relay::RelaySession;
pub use upstream::{UpstreamFetcher, UpstreamResponse};
