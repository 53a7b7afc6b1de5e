//! Observability and Metrics
//!
//! Counter blocks for the relay and the capture tap.
//!
//! Each unit owns its own block behind an `Arc`; observers only read. The relay and
//! the tap never touch each other's counters, so there is no coupling between them
//! beyond the bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for the pass-through relay
#[derive(Debug)]
pub struct RelayMetrics {
    /// Messages received on ingress
    pub messages_received: AtomicU64,
    /// Messages handed to the egress socket
    pub messages_forwarded: AtomicU64,
    /// Payload bytes forwarded
    pub bytes_forwarded: AtomicU64,
    /// Failed ingress receives
    pub recv_errors: AtomicU64,
    /// Failed egress sends
    pub send_errors: AtomicU64,
    start_time: Instant,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_forwarded: AtomicU64::new(0),
            bytes_forwarded: AtomicU64::new(0),
            recv_errors: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_forwarded(&self, byte_count: u64) {
        self.messages_forwarded.fetch_add(1, Ordering::Relaxed);
        self.bytes_forwarded.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn recv_error(&self) {
        self.recv_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelaySnapshot {
        RelaySnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_forwarded: self.messages_forwarded.load(Ordering::Relaxed),
            bytes_forwarded: self.bytes_forwarded.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            messages_received = snapshot.messages_received,
            messages_forwarded = snapshot.messages_forwarded,
            bytes_forwarded = snapshot.bytes_forwarded,
            recv_errors = snapshot.recv_errors,
            send_errors = snapshot.send_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Relay metrics snapshot"
        );
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySnapshot {
    pub messages_received: u64,
    pub messages_forwarded: u64,
    pub bytes_forwarded: u64,
    pub recv_errors: u64,
    pub send_errors: u64,
    pub uptime_seconds: u64,
}

/// Counters for the capture tap
#[derive(Debug)]
pub struct TapMetrics {
    /// Frames taken off the bus (every message part counts)
    pub frames_received: AtomicU64,
    /// Bytes taken off the bus
    pub bytes_received: AtomicU64,
    /// Frames whose header was decoded and printed
    pub frames_decoded: AtomicU64,
    /// Frames below the minimum length
    pub runt_frames: AtomicU64,
    /// Frames above the configured maximum
    pub oversized_frames: AtomicU64,
    /// Frames the codec refused
    pub decode_errors: AtomicU64,
    /// Backlog frames dropped after a runt
    pub frames_drained: AtomicU64,
    /// Records appended to the capture log
    pub records_written: AtomicU64,
    /// Failed capture log appends
    pub write_errors: AtomicU64,
    /// Failed bus receives
    pub recv_errors: AtomicU64,
    start_time: Instant,
}

impl TapMetrics {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            frames_decoded: AtomicU64::new(0),
            runt_frames: AtomicU64::new(0),
            oversized_frames: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            frames_drained: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            recv_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn frame_received(&self, byte_count: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn frame_decoded(&self) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn runt_frame(&self) {
        self.runt_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn oversized_frame(&self) {
        self.oversized_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_drained(&self, count: u64) {
        self.frames_drained.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn recv_error(&self) {
        self.recv_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TapSnapshot {
        TapSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            runt_frames: self.runt_frames.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            frames_drained: self.frames_drained.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            frames_received = snapshot.frames_received,
            bytes_received = snapshot.bytes_received,
            frames_decoded = snapshot.frames_decoded,
            runt_frames = snapshot.runt_frames,
            oversized_frames = snapshot.oversized_frames,
            decode_errors = snapshot.decode_errors,
            frames_drained = snapshot.frames_drained,
            records_written = snapshot.records_written,
            write_errors = snapshot.write_errors,
            recv_errors = snapshot.recv_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Capture metrics snapshot"
        );
    }
}

impl Default for TapMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapSnapshot {
    pub frames_received: u64,
    pub bytes_received: u64,
    pub frames_decoded: u64,
    pub runt_frames: u64,
    pub oversized_frames: u64,
    pub decode_errors: u64,
    pub frames_drained: u64,
    pub records_written: u64,
    pub write_errors: u64,
    pub recv_errors: u64,
    pub uptime_seconds: u64,
}
