//! Failure injection tests: slow, silent, truncating, and abandoned transfers.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn silent_origin_times_out_with_504() {
    let origin = common::start_black_hole_origin().await;

    let mut config = common::test_config();
    config.upstream.connect_timeout_secs = 1;
    let relay = common::start_relay(config).await;

    let start = Instant::now();
    let res = common::client()
        .get(relay.url("/proxy/audio"))
        .query(&[("url", format!("http://{}/ep.mp3", origin.addr))])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(start.elapsed() < Duration::from_secs(5));
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(json["detail"].as_str().unwrap().contains("1s"));
    assert_eq!(relay.tracker.active_count(), 0);

    assert_eq!(origin.accepted.load(Ordering::SeqCst), 1);
    assert!(
        origin.wait_closed(1, Duration::from_secs(2)).await,
        "origin socket stayed open after the header timeout"
    );
}

#[tokio::test]
async fn unreachable_origin_is_bad_gateway() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let relay = common::start_relay(common::test_config()).await;
    let res = common::client()
        .get(relay.url("/proxy/audio"))
        .query(&[("url", format!("http://{}/ep.mp3", addr))])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(relay.tracker.active_count(), 0);
}

#[tokio::test]
async fn slow_body_is_not_cut_by_header_timeout() {
    // 8 frames 300ms apart outlast the 1s header bound.
    let origin =
        common::start_streaming_origin(8 * 1024, 1024, Duration::from_millis(300), None).await;

    let mut config = common::test_config();
    config.upstream.connect_timeout_secs = 1;
    let relay = common::start_relay(config).await;

    let res = common::client()
        .get(relay.url("/proxy/audio"))
        .query(&[("url", format!("http://{}/slow.mp3", origin.addr))])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().len(), 8 * 1024);
}

#[tokio::test]
async fn client_disconnect_releases_origin_connection() {
    let origin = common::start_streaming_origin(
        100 * 1024 * 1024,
        16 * 1024,
        Duration::from_millis(5),
        None,
    )
    .await;
    let relay = common::start_relay(common::test_config()).await;

    let res = common::client()
        .get(relay.url("/proxy/audio"))
        .query(&[("url", format!("http://{}/endless.mp3", origin.addr))])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let mut body = res.bytes_stream();
    let mut received = 0;
    while received < 128 * 1024 {
        received += body.next().await.unwrap().unwrap().len();
    }
    assert_eq!(relay.tracker.active_count(), 1);

    drop(body);

    assert!(
        relay.tracker.wait_until_idle(Duration::from_secs(5)).await,
        "relay kept the upstream connection after the client left"
    );
    assert!(
        origin.wait_all_closed(Duration::from_secs(5)).await,
        "origin never saw the connection close"
    );
}

#[tokio::test]
async fn truncated_origin_body_is_visible_to_client() {
    let origin = common::start_streaming_origin(
        200 * 1024,
        16 * 1024,
        Duration::from_millis(1),
        Some(64 * 1024),
    )
    .await;
    let relay = common::start_relay(common::test_config()).await;

    let res = common::client()
        .get(relay.url("/proxy/audio"))
        .query(&[("url", format!("http://{}/cut.mp3", origin.addr))])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-length"], (200 * 1024).to_string().as_str());
    assert!(res.bytes().await.is_err());
    assert!(relay.tracker.wait_until_idle(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn shutdown_is_bounded_with_open_streams() {
    let origin =
        common::start_streaming_origin(100 * 1024 * 1024, 1024, Duration::from_millis(50), None)
            .await;

    let mut config = common::test_config();
    config.timeouts.shutdown_grace_secs = 1;
    let relay = common::start_relay(config).await;

    let res = common::client()
        .get(relay.url("/proxy/audio"))
        .query(&[("url", format!("http://{}/endless.mp3", origin.addr))])
        .send()
        .await
        .unwrap();
    let mut body = res.bytes_stream();
    body.next().await.unwrap().unwrap();

    relay.shutdown.trigger();
    let finished = tokio::time::timeout(Duration::from_secs(5), relay.handle).await;
    assert!(finished.is_ok(), "server did not stop within its grace periods");
}

#[tokio::test]
async fn idle_server_stops_promptly() {
    let relay = common::start_relay(common::test_config()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    relay.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(2), relay.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
