//! # Bus Relay
//!
//! Verbatim pass-through between the ingress and egress sides of the bus.
//!
//! Producers publish into the ingress SUB socket, consumers subscribe to the egress
//! PUB socket. Every message is forwarded untouched and in receipt order. The relay
//! never looks inside a frame, never validates it, and never waits on a consumer:
//! a slow subscriber is dealt with by the PUB socket's queueing, not by the relay.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, trace, warn};
use zeromq::{PubSocket, SocketRecv, SocketSend, SubSocket};

use crate::config::BusConfig;
use crate::error::constants::{ERR_RECV_FAILED, ERR_SEND_FAILED};
use crate::error::Result;
use crate::transport::bus;
use crate::utils::metrics::RelayMetrics;

/// Pause after a failed receive so a broken socket does not spin the loop
pub const RECV_RETRY_DELAY: Duration = Duration::from_millis(10);

pub struct Relay {
    ingress: SubSocket,
    egress: PubSocket,
    ingress_endpoint: String,
    egress_endpoint: String,
    metrics: Arc<RelayMetrics>,
}

impl Relay {
    /// Bind both sides of the bus. Any failure here is fatal to the caller.
    #[instrument(skip_all, fields(ingress = %config.ingress, egress = %config.egress))]
    pub async fn bind(config: &BusConfig) -> Result<Self> {
        let (ingress, ingress_endpoint) = bus::bind_subscriber(&config.ingress).await?;
        info!(endpoint = %ingress_endpoint, "Subscriber task listening");

        let (egress, egress_endpoint) = bus::bind_publisher(&config.egress).await?;
        info!(endpoint = %egress_endpoint, "Publisher task listening");

        Ok(Self {
            ingress,
            egress,
            ingress_endpoint,
            egress_endpoint,
            metrics: Arc::new(RelayMetrics::new()),
        })
    }

    /// Endpoint producers should connect to
    pub fn ingress_endpoint(&self) -> &str {
        &self.ingress_endpoint
    }

    /// Endpoint consumers should connect to
    pub fn egress_endpoint(&self) -> &str {
        &self.egress_endpoint
    }

    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Forward ingress to egress until `shutdown` is cancelled.
    #[instrument(skip_all, fields(ingress = %self.ingress_endpoint, egress = %self.egress_endpoint))]
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.ingress.recv() => received,
            };

            let message = match received {
                Ok(message) => message,
                Err(e) => {
                    self.metrics.recv_error();
                    error!(error = %e, "{ERR_RECV_FAILED}");
                    tokio::time::sleep(RECV_RETRY_DELAY).await;
                    continue;
                }
            };

            self.metrics.message_received();
            let byte_count: u64 = message.iter().map(|part| part.len() as u64).sum();
            trace!(parts = message.len(), bytes = byte_count, "Forwarding");

            match self.egress.send(message).await {
                Ok(()) => self.metrics.message_forwarded(byte_count),
                Err(e) => {
                    self.metrics.send_error();
                    warn!(error = %e, "{ERR_SEND_FAILED}");
                }
            }
        }

        info!("Relay stopped");
        self.metrics.log_metrics();
        Ok(())
    }
}
