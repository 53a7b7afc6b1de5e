use bytes::Bytes;
use tracing::{debug, error, info, instrument};
use zeromq::{PubSocket, Socket, SocketSend, SubSocket, ZmqMessage};

use crate::core::frame::Frame;
use crate::error::constants::{ERR_BIND_FAILED, ERR_CONNECT_FAILED};
use crate::error::{ProxyError, Result};

/// Subscribe to every topic.
const ALL_TOPICS: &str = "";

/// Bind a SUB socket that receives everything published into `endpoint`.
///
/// Returns the socket and the endpoint it ended up bound to.
#[instrument(skip_all, fields(endpoint = %endpoint))]
pub async fn bind_subscriber(endpoint: &str) -> Result<(SubSocket, String)> {
    let mut socket = SubSocket::new();
    let bound = socket
        .bind(endpoint)
        .await
        .map_err(|source| {
            error!(error = %source, "{ERR_BIND_FAILED}");
            ProxyError::Bind {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;
    socket.subscribe(ALL_TOPICS).await?;

    let bound = bound.to_string();
    debug!(bound = %bound, "Subscriber bound");
    Ok((socket, bound))
}

/// Bind a PUB socket that consumers connect to.
#[instrument(skip_all, fields(endpoint = %endpoint))]
pub async fn bind_publisher(endpoint: &str) -> Result<(PubSocket, String)> {
    let mut socket = PubSocket::new();
    let bound = socket
        .bind(endpoint)
        .await
        .map_err(|source| {
            error!(error = %source, "{ERR_BIND_FAILED}");
            ProxyError::Bind {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;

    let bound = bound.to_string();
    debug!(bound = %bound, "Publisher bound");
    Ok((socket, bound))
}

/// Connect a SUB socket to a publisher and subscribe to all traffic.
#[instrument(skip_all, fields(endpoint = %endpoint))]
pub async fn connect_subscriber(endpoint: &str) -> Result<SubSocket> {
    let mut socket = SubSocket::new();
    socket
        .connect(endpoint)
        .await
        .map_err(|source| {
            error!(error = %source, "{ERR_CONNECT_FAILED}");
            ProxyError::Connect {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;
    socket.subscribe(ALL_TOPICS).await?;
    info!("Subscribed to all traffic");
    Ok(socket)
}

/// Connect a PUB socket, the way a CSP node attaches to the ingress side.
#[instrument(skip_all, fields(endpoint = %endpoint))]
pub async fn connect_publisher(endpoint: &str) -> Result<PubSocket> {
    let mut socket = PubSocket::new();
    socket
        .connect(endpoint)
        .await
        .map_err(|source| {
            error!(error = %source, "{ERR_CONNECT_FAILED}");
            ProxyError::Connect {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;
    Ok(socket)
}

/// Publish one frame as a single-part message.
pub async fn publish_frame(socket: &mut PubSocket, frame: impl Into<Bytes>) -> Result<()> {
    socket.send(ZmqMessage::from(frame.into())).await?;
    Ok(())
}

/// Split a received message into frames, one per message part.
pub fn message_frames(message: ZmqMessage) -> impl Iterator<Item = Frame> {
    message.into_vec().into_iter().map(Frame::from)
}
