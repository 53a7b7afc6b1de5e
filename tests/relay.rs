//! End-to-end relay behaviour over real ZeroMQ sockets

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::time::Duration;

use bytes::Bytes;
use common::*;
use csp_zmqproxy::transport::bus;
use csp_zmqproxy::utils::capture_log::DELIMITER;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn frames_pass_through_unchanged() {
    let handle = start_proxy(None).await;
    let mut producer = producer(&handle).await;
    let mut consumer = consumer(&handle).await;
    warm_up(&handle, &mut producer, &mut consumer, b'?').await;

    let sent: Vec<Bytes> = vec![
        Bytes::from_static(&[0x52, 0x34, 0x2A, 0xF0, 0x7C, 0x85]),
        Bytes::from((0..=255u8).collect::<Vec<_>>()),
        Bytes::from(vec![0xEE; 1024]),
        // Larger than the tap accepts; the relay forwards it anyway.
        Bytes::from(vec![0x11; 4096]),
        // Short frames are the tap's problem, never the relay's.
        Bytes::from_static(&[1, 2, 3]),
    ];
    for frame in &sent {
        bus::publish_frame(&mut producer, frame.clone()).await.unwrap();
    }

    let received = collect(&mut consumer, sent.len(), Duration::from_secs(2)).await;
    assert_eq!(received, sent);

    handle.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_producers_fan_in_with_per_producer_order() {
    let handle = start_proxy(None).await;
    let mut consumer = consumer(&handle).await;
    let mut first = producer(&handle).await;
    let mut second = producer(&handle).await;
    warm_up(&handle, &mut first, &mut consumer, b'a').await;
    warm_up(&handle, &mut second, &mut consumer, b'b').await;

    const PER_PRODUCER: u16 = 50;
    let frame = |origin: u8, seq: u16| {
        let [hi, lo] = seq.to_be_bytes();
        Bytes::from(vec![origin, hi, lo, 0, 0, 0, 0, 0])
    };

    let send_first = async {
        for seq in 0..PER_PRODUCER {
            bus::publish_frame(&mut first, frame(1, seq)).await.unwrap();
        }
    };
    let send_second = async {
        for seq in 0..PER_PRODUCER {
            bus::publish_frame(&mut second, frame(2, seq)).await.unwrap();
        }
    };
    tokio::join!(send_first, send_second);

    let received = collect(
        &mut consumer,
        usize::from(PER_PRODUCER) * 2,
        Duration::from_secs(5),
    )
    .await;

    for origin in [1u8, 2] {
        let sequence: Vec<u16> = received
            .iter()
            .filter(|f| f[0] == origin)
            .map(|f| u16::from_be_bytes([f[1], f[2]]))
            .collect();
        assert_eq!(sequence, (0..PER_PRODUCER).collect::<Vec<_>>());
    }

    handle.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ten_byte_frame_is_relayed_decoded_and_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.log");
    let handle = start_proxy(Some(path.clone())).await;
    let mut producer = producer(&handle).await;
    let mut consumer = consumer(&handle).await;
    warm_up(&handle, &mut producer, &mut consumer, b'?').await;

    let before = std::fs::metadata(&path).unwrap().len();
    let frame = Bytes::from_static(&[0x40, 0x01, 0x00, 0x08, 0x28, 0x80, 1, 2, 3, 4]);
    bus::publish_frame(&mut producer, frame.clone()).await.unwrap();

    let received = collect(&mut consumer, 1, Duration::from_secs(1)).await;
    assert_eq!(received, vec![frame]);

    let tap = handle.tap_metrics();
    assert!(eventually(Duration::from_secs(2), || tap.snapshot().records_written == 1).await);
    assert_eq!(tap.snapshot().frames_decoded, 1);

    let after = std::fs::metadata(&path).unwrap().len();
    assert_eq!(after - before, (DELIMITER.len() + 10) as u64);

    handle.shutdown().await.unwrap();
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unwritable_log_does_not_disturb_relay() {
    // Opens fine, every write fails with ENOSPC.
    let handle = start_proxy(Some("/dev/full".into())).await;
    let mut producer = producer(&handle).await;
    let mut consumer = consumer(&handle).await;
    warm_up(&handle, &mut producer, &mut consumer, b'?').await;

    let sent: Vec<Bytes> = (0..30u8).map(|i| Bytes::from(vec![i; 12])).collect();
    for frame in &sent {
        bus::publish_frame(&mut producer, frame.clone()).await.unwrap();
    }

    let received = collect(&mut consumer, sent.len(), Duration::from_secs(3)).await;
    assert_eq!(received, sent);

    let tap = handle.tap_metrics();
    assert!(eventually(Duration::from_secs(2), || tap.snapshot().write_errors > 0).await);
    assert_eq!(tap.snapshot().records_written, 0);
    assert_eq!(handle.relay_metrics().snapshot().send_errors, 0);

    handle.shutdown().await.unwrap();
}
