//! Shared mock origins and relay harness for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use relay::config::RelayConfig;
use relay::lifecycle::Shutdown;
use relay::net::ConnectionTracker;
use relay::HttpServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Canned response for a programmable origin.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// Request heads seen by a mock origin, lowercased.
pub type Recorded = Arc<Mutex<Vec<String>>>;

/// Read until the end of the request head.
async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).to_lowercase()
}

fn response_head(status: u16, headers: &[(&'static str, String)], content_length: usize) -> String {
    let mut head = format!("HTTP/1.1 {} Mock\r\nConnection: close\r\n", status);
    if !headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-length"))
    {
        head.push_str(&format!("Content-Length: {}\r\n", content_length));
    }
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");
    head
}

/// Start an origin that answers every request with `f(request_head)`.
pub async fn start_programmable_origin<F>(f: F) -> (SocketAddr, Recorded)
where
    F: Fn(&str) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let seen = recorded.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                let response = f(&head);
                seen.lock().unwrap().push(head);

                let length = response.body.len();
                let head = response_head(response.status, &response.headers, length);
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&response.body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, recorded)
}

/// Origin that streams a large body slowly and reports when a reader hangs up.
pub struct StreamingOrigin {
    pub addr: SocketAddr,
    /// Connections currently being written to.
    pub open: Arc<AtomicUsize>,
    /// Notified each time a connection ends.
    pub closed: Arc<Notify>,
}

impl StreamingOrigin {
    /// Wait until no connection is open, or `timeout` elapses.
    pub async fn wait_all_closed(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.closed.notified();
                if self.open.load(Ordering::SeqCst) == 0 {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

/// Start an origin that advertises `total` bytes and writes `frame` bytes
/// every `interval`.
///
/// If `truncate_at` is set, the connection is closed after that many bytes
/// even though `total` was advertised.
pub async fn start_streaming_origin(
    total: usize,
    frame: usize,
    interval: Duration,
    truncate_at: Option<usize>,
) -> StreamingOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let open = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(Notify::new());

    let (open_task, closed_task) = (open.clone(), closed.clone());
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let open = open_task.clone();
            let closed = closed_task.clone();
            open.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let _ = read_head(&mut socket).await;
                let headers = [("Content-Type", "audio/mpeg".to_string())];
                let head = response_head(200, &headers, total);

                if socket.write_all(head.as_bytes()).await.is_ok() {
                    let limit = truncate_at.unwrap_or(total).min(total);
                    let payload = vec![0xAB_u8; frame.max(1)];
                    let mut sent = 0;
                    while sent < limit {
                        let n = payload.len().min(limit - sent);
                        if socket.write_all(&payload[..n]).await.is_err() {
                            break;
                        }
                        sent += n;
                        tokio::time::sleep(interval).await;
                    }
                }

                drop(socket);
                open.fetch_sub(1, Ordering::SeqCst);
                closed.notify_waiters();
            });
        }
    });

    StreamingOrigin { addr, open, closed }
}

/// Origin that accepts connections, never answers, and counts hang-ups.
pub struct BlackHoleOrigin {
    pub addr: SocketAddr,
    /// Connections accepted so far.
    pub accepted: Arc<AtomicUsize>,
    /// Connections the peer has closed.
    pub closed_count: Arc<AtomicUsize>,
    closed: Arc<Notify>,
}

impl BlackHoleOrigin {
    /// Wait until at least `n` connections were closed by the peer.
    pub async fn wait_closed(&self, n: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.closed.notified();
                if self.closed_count.load(Ordering::SeqCst) >= n {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

/// Start an origin that accepts connections and never answers.
///
/// Each connection is read until EOF so the close is observed.
pub async fn start_black_hole_origin() -> BlackHoleOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let closed_count = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(Notify::new());

    let (accepted_task, count_task, closed_task) =
        (accepted.clone(), closed_count.clone(), closed.clone());
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            accepted_task.fetch_add(1, Ordering::SeqCst);
            let count = count_task.clone();
            let closed = closed_task.clone();
            tokio::spawn(async move {
                let mut sink = [0u8; 1024];
                loop {
                    match socket.read(&mut sink).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                count.fetch_add(1, Ordering::SeqCst);
                closed.notify_waiters();
            });
        }
    });

    BlackHoleOrigin {
        addr,
        accepted,
        closed_count,
        closed,
    }
}

/// A relay running on an ephemeral port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub tracker: ConnectionTracker,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api{}", self.addr, path)
    }
}

/// Defaults with outbound proxies disabled so loopback origins are reachable.
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.upstream.use_system_proxy = false;
    config.podcast_index.use_system_proxy = false;
    config
}

/// Start the relay with `config`, binding to 127.0.0.1:0.
pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let tracker = server.tracker();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    RunningRelay {
        addr,
        tracker,
        shutdown,
        handle,
    }
}

/// Test client that never reuses connections or consults proxy env vars.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
