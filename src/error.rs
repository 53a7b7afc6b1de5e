//! # Error Types
//!
//! Error handling for the relay, the capture tap and the capture log.
//!
//! ## Error Categories
//! - **Startup Errors**: socket bind/connect failures, capture log open failures,
//!   invalid configuration. These are fatal: the process cannot do its job without them.
//! - **Transport Errors**: a single failed receive or send on the bus. The running
//!   loops log these and carry on.
//! - **Frame Errors**: frames that are too short (or otherwise unfit) for header decoding.
//!
//! All errors implement `std::error::Error` for interoperability.
//!
//! ## Example Usage
//! ```rust
//! use csp_zmqproxy::error::{ProxyError, Result};
//! use tracing::error;
//!
//! fn check_version(tag: u8) -> Result<()> {
//!     match tag {
//!         1 | 2 => Ok(()),
//!         other => Err(ProxyError::UnsupportedVersion(other)),
//!     }
//! }
//!
//! if let Err(e) = check_version(7) {
//!     error!(error = %e, "Rejected version tag");
//! }
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Static error messages shared by log lines and error variants.
pub mod constants {
    /// Transport errors
    pub const ERR_BIND_FAILED: &str = "Failed to bind bus endpoint";
    pub const ERR_CONNECT_FAILED: &str = "Failed to connect to bus endpoint";
    pub const ERR_RECV_FAILED: &str = "Bus receive failed";
    pub const ERR_SEND_FAILED: &str = "Bus send failed";

    /// Frame validation
    pub const ERR_FRAME_TOO_SHORT: &str = "Too short datalen";
    pub const ERR_FRAME_TOO_LONG: &str = "Frame exceeds maximum frame size";
    pub const ERR_HEADER_DECODE: &str = "Unable to decode CSP header";

    /// Capture log
    pub const ERR_LOG_OPEN: &str = "Unable to open logfile";
    pub const ERR_LOG_WRITE: &str = "Failed to append capture record";

    /// Task supervision
    pub const ERR_TASK_JOIN: &str = "Proxy task terminated abnormally";
}

/// Primary error type for relay, tap and capture log operations
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zeromq::ZmqError),

    #[error("Failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: zeromq::ZmqError,
    },

    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: zeromq::ZmqError,
    },

    #[error("Unable to open logfile {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Frame too short for CSP header: {0} bytes")]
    FrameTooShort(usize),

    #[error("Unsupported CSP version: {0}")]
    UnsupportedVersion(u8),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// Type alias for Results using ProxyError
pub type Result<T> = std::result::Result<T, ProxyError>;
