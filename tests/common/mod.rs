//! Shared helpers for bus-level integration tests.
//!
//! ZeroMQ subscriptions propagate asynchronously, so a freshly connected
//! subscriber misses whatever is published before its subscription lands. The
//! helpers here publish one-byte probe frames until both the test consumer and the
//! proxy's capture tap have seen traffic. Probes are shorter than a CSP header, so
//! the tap discards them and they never reach the capture log.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use csp_zmqproxy::config::ProxyConfig;
use csp_zmqproxy::service::proxy::{Proxy, ProxyHandle};
use csp_zmqproxy::transport::bus;
use tokio::time::{sleep, timeout, Instant};
use zeromq::{PubSocket, SocketRecv, SubSocket};

pub const EPHEMERAL: &str = "tcp://127.0.0.1:0";

const PROBE_INTERVAL: Duration = Duration::from_millis(20);
const WARMUP_DEADLINE: Duration = Duration::from_secs(5);

pub fn test_config(log_file: Option<PathBuf>) -> ProxyConfig {
    ProxyConfig::default_with_overrides(|config| {
        config.bus.ingress = EPHEMERAL.to_string();
        config.bus.egress = EPHEMERAL.to_string();
        config.capture.log_file = log_file;
    })
}

pub async fn start_proxy(log_file: Option<PathBuf>) -> ProxyHandle {
    Proxy::start(&test_config(log_file))
        .await
        .expect("proxy should start")
}

pub async fn producer(handle: &ProxyHandle) -> PubSocket {
    bus::connect_publisher(handle.ingress_endpoint())
        .await
        .expect("producer should connect")
}

pub async fn consumer(handle: &ProxyHandle) -> SubSocket {
    bus::connect_subscriber(handle.egress_endpoint())
        .await
        .expect("consumer should connect")
}

pub fn is_probe(frame: &Bytes) -> bool {
    frame.len() == 1
}

/// Publish `probe` through `producer` until `consumer` receives it and the tap has
/// discarded at least one probe, then let the remaining probes settle.
pub async fn warm_up(
    handle: &ProxyHandle,
    producer: &mut PubSocket,
    consumer: &mut SubSocket,
    probe: u8,
) {
    let deadline = Instant::now() + WARMUP_DEADLINE;
    let mut consumer_ready = false;

    loop {
        if Instant::now() > deadline {
            panic!("bus did not start flowing within {WARMUP_DEADLINE:?}");
        }

        bus::publish_frame(producer, vec![probe]).await.unwrap();

        if let Ok(Ok(message)) = timeout(PROBE_INTERVAL, consumer.recv()).await {
            if message.get(0).map(|f| f[..] == [probe]).unwrap_or(false) {
                consumer_ready = true;
            }
        }

        let tap_ready = handle.tap_metrics().snapshot().runt_frames > 0;
        if consumer_ready && tap_ready {
            break;
        }
    }

    settle(consumer).await;
}

/// Swallow anything still in flight for `consumer`.
pub async fn settle(consumer: &mut SubSocket) {
    while let Ok(Ok(_)) = timeout(Duration::from_millis(150), consumer.recv()).await {}
}

/// Collect `count` non-probe frames from `consumer`.
pub async fn collect(consumer: &mut SubSocket, count: usize, within: Duration) -> Vec<Bytes> {
    let deadline = Instant::now() + within;
    let mut frames = Vec::with_capacity(count);

    while frames.len() < count {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let message = match timeout(remaining, consumer.recv()).await {
            Ok(received) => received.expect("consumer receive failed"),
            Err(_) => panic!("only {} of {count} frames arrived", frames.len()),
        };
        frames.extend(message.into_vec().into_iter().filter(|f| !is_probe(f)));
    }

    frames
}

/// Poll `condition` until it holds or `within` runs out.
pub async fn eventually<F>(within: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    condition()
}
