//! Chunked relay of an upstream body to the client.
//!
//! # Responsibilities
//! - Re-chunk the origin body into fixed-size chunks, in order
//! - Pull from the origin only when the consumer asks for more
//! - Release the body and its connection exactly once, on every exit path
//!
//! # Design Decisions
//! - The session owns both the body stream and the connection guard; release
//!   takes them out of their `Option`s, so a second release is a no-op
//! - `Drop` runs the same release path, which covers client disconnects and
//!   task cancellation (hyper drops the body when the peer goes away)
//! - Bytes buffered before a mid-stream failure are flushed before the error

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};

use crate::net::ConnectionGuard;
use crate::observability::metrics;
use crate::proxy::error::{BoxError, RelayError};

/// Default relay chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Upstream body as seen by the relay.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// How a session ended, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Failed,
    Cancelled,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Failed => "failed",
            Outcome::Cancelled => "cancelled",
        }
    }
}

/// A live relay from one origin body to one client.
pub struct RelaySession {
    body: Option<BodyStream>,
    connection: Option<ConnectionGuard>,
    buffer: BytesMut,
    chunk_size: usize,
    failure: Option<RelayError>,
    bytes_relayed: u64,
    started: Instant,
}

impl RelaySession {
    /// Wrap an upstream body and the guard of the connection it reads from.
    ///
    /// A `chunk_size` of zero is treated as one byte.
    pub fn new<S, E>(body: S, connection: ConnectionGuard, chunk_size: usize) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let body: BodyStream = Box::pin(body.map(|item| item.map_err(Into::into)));
        metrics::relay_opened();
        Self {
            body: Some(body),
            connection: Some(connection),
            buffer: BytesMut::new(),
            chunk_size: chunk_size.max(1),
            failure: None,
            bytes_relayed: 0,
            started: Instant::now(),
        }
    }

    /// Release the upstream body and connection.
    ///
    /// Returns `true` only for the call that actually performed the release.
    pub fn close(&mut self) -> bool {
        self.release(Outcome::Cancelled)
    }

    /// Whether the upstream resources have been released.
    pub fn is_closed(&self) -> bool {
        self.body.is_none() && self.connection.is_none()
    }

    /// Bytes handed to the consumer so far.
    pub fn bytes_relayed(&self) -> u64 {
        self.bytes_relayed
    }

    fn release(&mut self, outcome: Outcome) -> bool {
        let body = self.body.take();
        let connection = self.connection.take();
        if body.is_none() && connection.is_none() {
            return false;
        }

        // Body first: dropping it closes the socket the guard accounts for.
        drop(body);
        let connection_id = connection.as_ref().map(|c| c.id());
        drop(connection);

        metrics::relay_closed();
        tracing::debug!(
            connection_id = ?connection_id,
            bytes = self.bytes_relayed,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            outcome = outcome.as_str(),
            "Relay session released"
        );
        true
    }

    fn emit(&mut self, chunk: Bytes) -> Poll<Option<Result<Bytes, RelayError>>> {
        self.bytes_relayed += chunk.len() as u64;
        metrics::relay_bytes(chunk.len());
        Poll::Ready(Some(Ok(chunk)))
    }
}

impl Stream for RelaySession {
    type Item = Result<Bytes, RelayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.buffer.len() >= this.chunk_size {
                let chunk = this.buffer.split_to(this.chunk_size).freeze();
                return this.emit(chunk);
            }

            let Some(body) = this.body.as_mut() else {
                if !this.buffer.is_empty() {
                    let rest = this.buffer.split().freeze();
                    return this.emit(rest);
                }
                return Poll::Ready(this.failure.take().map(Err));
            };

            match body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(err))) => {
                    tracing::warn!(
                        bytes = this.bytes_relayed,
                        error = %err,
                        "Upstream body failed mid-stream"
                    );
                    this.failure = Some(RelayError::MidStream(err));
                    this.release(Outcome::Failed);
                }
                Poll::Ready(None) => {
                    this.release(Outcome::Completed);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for RelaySession {
    fn drop(&mut self) {
        self.release(Outcome::Cancelled);
    }
}

impl std::fmt::Debug for RelaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySession")
            .field("chunk_size", &self.chunk_size)
            .field("buffered", &self.buffer.len())
            .field("bytes_relayed", &self.bytes_relayed)
            .field("closed", &self.is_closed())
            .finish()
    }
}
