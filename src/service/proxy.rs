//! # Proxy Service
//!
//! Startup and supervision of the relay and the capture tap.
//!
//! Startup is all-or-nothing: if a socket cannot be bound or connected, or the
//! requested capture log cannot be opened, [`Proxy::start`] fails and nothing keeps
//! running. Once started, the two units run as separate tasks. They share a
//! cancellation token and nothing else.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::ProxyConfig;
use crate::core::header::{codec_for, HeaderCodec};
use crate::error::constants::ERR_TASK_JOIN;
use crate::error::{ProxyError, Result};
use crate::service::relay::Relay;
use crate::service::tap::{CaptureTap, FrameHandler};
use crate::utils::capture_log::CaptureLog;
use crate::utils::metrics::{RelayMetrics, TapMetrics};

pub struct Proxy;

impl Proxy {
    /// Start the relay and the tap with the built-in codec for the configured version.
    pub async fn start(config: &ProxyConfig) -> Result<ProxyHandle> {
        let codec = codec_for(config.capture.version)?;
        Self::start_with_codec(config, codec).await
    }

    /// Start with a caller-supplied header codec.
    #[instrument(skip_all)]
    pub async fn start_with_codec(
        config: &ProxyConfig,
        codec: Box<dyn HeaderCodec>,
    ) -> Result<ProxyHandle> {
        config.validate_strict()?;

        let relay = Relay::bind(&config.bus).await?;

        let log = match config.capture.log_file {
            Some(ref path) => Some(CaptureLog::open(path).await?),
            None => None,
        };

        let handler = FrameHandler::new(&config.capture, codec, log);
        let tap = CaptureTap::connect(relay.egress_endpoint(), handler).await?;

        let shutdown = CancellationToken::new();
        let handle = ProxyHandle {
            ingress_endpoint: relay.ingress_endpoint().to_string(),
            egress_endpoint: relay.egress_endpoint().to_string(),
            relay_metrics: relay.metrics(),
            tap_metrics: tap.metrics(),
            relay_task: tokio::spawn(relay.run(shutdown.clone())),
            tap_task: tokio::spawn(tap.run(shutdown.clone())),
            shutdown,
        };

        info!(
            ingress = %handle.ingress_endpoint,
            egress = %handle.egress_endpoint,
            csp_version = config.capture.version,
            "Proxy running"
        );
        Ok(handle)
    }
}

/// Running proxy: endpoints, counters, and the means to stop it
pub struct ProxyHandle {
    ingress_endpoint: String,
    egress_endpoint: String,
    relay_metrics: Arc<RelayMetrics>,
    tap_metrics: Arc<TapMetrics>,
    shutdown: CancellationToken,
    relay_task: JoinHandle<Result<()>>,
    tap_task: JoinHandle<Result<()>>,
}

impl ProxyHandle {
    pub fn ingress_endpoint(&self) -> &str {
        &self.ingress_endpoint
    }

    pub fn egress_endpoint(&self) -> &str {
        &self.egress_endpoint
    }

    pub fn relay_metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.relay_metrics)
    }

    pub fn tap_metrics(&self) -> Arc<TapMetrics> {
        Arc::clone(&self.tap_metrics)
    }

    /// Token that stops both units when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop both units and wait for them to finish.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        self.wait().await
    }

    /// Wait until both units have stopped. Without a cancel this waits forever.
    ///
    /// A unit that panics or is aborted cancels the token, so its sibling stops too.
    pub async fn wait(self) -> Result<()> {
        let relay = join(self.relay_task, "relay", &self.shutdown).await;
        let tap = join(self.tap_task, "capture tap", &self.shutdown).await;
        relay.and(tap)
    }
}

async fn join(
    task: JoinHandle<Result<()>>,
    unit: &'static str,
    shutdown: &CancellationToken,
) -> Result<()> {
    match task.await {
        Ok(result) => result,
        Err(e) => {
            error!(unit, error = %e, "{ERR_TASK_JOIN}");
            shutdown.cancel();
            Err(ProxyError::TaskFailed(format!("{unit}: {e}")))
        }
    }
}

/// Run until Ctrl+C, then shut both units down.
pub async fn run_until_ctrl_c(config: &ProxyConfig) -> Result<()> {
    let handle = Proxy::start(config).await?;

    tokio::spawn(cancel_on_signal(
        tokio::signal::ctrl_c(),
        handle.shutdown_token(),
    ));

    handle.wait().await
}

/// Cancel `token` once `signal` fires. Returns whether it did.
async fn cancel_on_signal<F>(signal: F, token: CancellationToken) -> bool
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Received CTRL+C signal, shutting down");
            token.cancel();
            true
        }
        Err(e) => {
            error!(error = %e, "Unable to listen for CTRL+C");
            false
        }
    }
}
