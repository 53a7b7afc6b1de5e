//! # Capture Tap
//!
//! A passive subscriber on the egress side of the bus. It decodes the CSP header of
//! every frame it sees, prints it, and optionally appends the raw frame to the
//! capture log.
//!
//! The tap shares nothing with the relay. If it falls behind (a slow disk, a burst
//! of traffic) the egress PUB socket drops messages for it; the relay keeps
//! forwarding at full speed.
//!
//! ```text
//! AwaitingFrame ──recv──▶ runt / oversized ──▶ discard (drain backlog on runt) ─┐
//!       ▲                 └──▶ decode ──▶ print ──▶ append to log ───────────────┤
//!       └────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::IsTerminal;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use zeromq::{SocketRecv, SubSocket};

use crate::config::CaptureConfig;
use crate::core::frame::Frame;
use crate::core::header::{CspHeader, HeaderCodec};
use crate::error::constants::{
    ERR_FRAME_TOO_LONG, ERR_FRAME_TOO_SHORT, ERR_HEADER_DECODE, ERR_LOG_WRITE, ERR_RECV_FAILED,
};
use crate::error::Result;
use crate::service::relay::RECV_RETRY_DELAY;
use crate::transport::bus;
use crate::utils::capture_log::CaptureLog;
use crate::utils::metrics::TapMetrics;

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// The stdout line for a decoded header, green when `colour` is set.
pub fn header_line(header: &CspHeader, colour: bool) -> String {
    if colour {
        format!("{GREEN}{header}{RESET}")
    } else {
        header.to_string()
    }
}

/// What happened to a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Shorter than the minimum header size; discarded
    Runt,
    /// Longer than the configured maximum; discarded
    Oversized,
    /// Header decoded and printed
    Decoded(CspHeader),
    /// Long enough, but the codec refused it
    Undecodable,
}

/// Per-frame work of the tap: length guard, decode, print, log.
///
/// Kept apart from the socket so it can be driven directly.
pub struct FrameHandler {
    codec: Box<dyn HeaderCodec>,
    log: Option<CaptureLog>,
    max_frame_size: usize,
    debug: bool,
    colour: bool,
    metrics: Arc<TapMetrics>,
}

impl FrameHandler {
    pub fn new(
        config: &CaptureConfig,
        codec: Box<dyn HeaderCodec>,
        log: Option<CaptureLog>,
    ) -> Self {
        Self {
            codec,
            log,
            max_frame_size: config.max_frame_size,
            debug: config.debug,
            colour: std::io::stdout().is_terminal(),
            metrics: Arc::new(TapMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<TapMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn log(&self) -> Option<&CaptureLog> {
        self.log.as_ref()
    }

    pub async fn handle(&mut self, frame: Frame) -> TapOutcome {
        let datalen = frame.len();
        self.metrics.frame_received(datalen as u64);

        if frame.is_runt() {
            self.metrics.runt_frame();
            warn!(datalen, "{ERR_FRAME_TOO_SHORT}");
            return TapOutcome::Runt;
        }

        if frame.exceeds(self.max_frame_size) {
            self.metrics.oversized_frame();
            warn!(datalen, max = self.max_frame_size, "{ERR_FRAME_TOO_LONG}");
            return TapOutcome::Oversized;
        }

        let outcome = match self.codec.decode(frame.as_bytes()) {
            Ok(header) => {
                self.metrics.frame_decoded();
                println!("{}", header_line(&header, self.colour));
                if self.debug {
                    debug!(datalen, "Frame contents\n{}", frame.hex_dump());
                }
                TapOutcome::Decoded(header)
            }
            Err(e) => {
                self.metrics.decode_error();
                warn!(
                    error = %e,
                    datalen,
                    version = self.codec.version().tag(),
                    "{ERR_HEADER_DECODE}"
                );
                TapOutcome::Undecodable
            }
        };

        if let Some(log) = self.log.as_mut() {
            match log.append(frame.as_bytes()).await {
                Ok(()) => self.metrics.record_written(),
                Err(e) => {
                    self.metrics.write_error();
                    error!(error = %e, path = %log.path().display(), "{ERR_LOG_WRITE}");
                }
            }
        }

        outcome
    }
}

pub struct CaptureTap {
    socket: SubSocket,
    endpoint: String,
    handler: FrameHandler,
}

impl CaptureTap {
    /// Subscribe to everything published on `endpoint`.
    pub async fn connect(endpoint: &str, handler: FrameHandler) -> Result<Self> {
        let socket = bus::connect_subscriber(endpoint).await?;
        info!(endpoint = %endpoint, "Capture/logging task listening");

        Ok(Self {
            socket,
            endpoint: endpoint.to_string(),
            handler,
        })
    }

    pub fn metrics(&self) -> Arc<TapMetrics> {
        self.handler.metrics()
    }

    /// Receive, inspect and log frames until `shutdown` is cancelled.
    ///
    /// Receive failures are logged and retried; nothing short of cancellation ends
    /// the loop.
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        let metrics = self.handler.metrics();

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.socket.recv() => received,
            };

            let message = match received {
                Ok(message) => message,
                Err(e) => {
                    metrics.recv_error();
                    error!(error = %e, "{ERR_RECV_FAILED}");
                    tokio::time::sleep(RECV_RETRY_DELAY).await;
                    continue;
                }
            };

            let mut saw_runt = false;
            for frame in bus::message_frames(message) {
                if self.handler.handle(frame).await == TapOutcome::Runt {
                    saw_runt = true;
                }
            }

            if saw_runt {
                let drained = self.drain_backlog();
                if drained > 0 {
                    metrics.frames_drained(drained);
                    debug!(drained, "Discarded backlog after short frame");
                }
            }
        }

        info!("Capture tap stopped");
        metrics.log_metrics();
        Ok(())
    }

    /// Throw away whatever is already queued, without waiting for more.
    fn drain_backlog(&mut self) -> u64 {
        let mut drained = 0;
        while let Some(Ok(message)) = self.socket.recv().now_or_never() {
            drained += message.len() as u64;
        }
        drained
    }
}
