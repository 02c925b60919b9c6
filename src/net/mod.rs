//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream fetch
//!     → connection.rs (guard taken before the origin is contacted)
//!     → guard moves into the relay session (streaming) or stays scoped (image)
//!     → guard dropped exactly once when the connection is released
//! ```
//!
//! # Design Decisions
//! - Each request owns its origin connection; nothing is pooled
//! - Every open connection is counted so shutdown can drain them

pub mod connection;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
