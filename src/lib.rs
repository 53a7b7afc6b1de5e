//! # csp-zmqproxy
//!
//! A ZeroMQ publish/subscribe relay for CubeSat Space Protocol (CSP) frames, with a
//! capture tap that decodes headers and can keep a raw frame log.
//!
//! ```text
//!  producers (PUB) ──▶ ingress SUB ──▶ Relay ──▶ egress PUB ──▶ consumers (SUB)
//!                                                     │
//!                                                     └──▶ Capture Tap ──▶ stdout
//!                                                                   └──▶ capture log
//! ```
//!
//! The relay and the tap are independent tasks whose only link is the bus. A tap
//! that stalls on disk I/O never slows the relay down.
//!
//! ## Modules
//! - [`config`]: immutable startup configuration (TOML, environment, defaults)
//! - [`core`]: frames and the CSP header codec
//! - [`transport`]: ZeroMQ socket helpers
//! - [`service`]: relay, capture tap, and the proxy that runs both
//! - [`utils`]: capture log, logging setup, metrics
//! - [`error`]: error type and `Result` alias
//!
//! ## Example
//! ```rust,no_run
//! use csp_zmqproxy::config::ProxyConfig;
//! use csp_zmqproxy::service::proxy::Proxy;
//!
//! # async fn run() -> csp_zmqproxy::error::Result<()> {
//! let config = ProxyConfig::default();
//! let handle = Proxy::start(&config).await?;
//! println!("producers connect to {}", handle.ingress_endpoint());
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::config::ProxyConfig;
pub use crate::core::frame::Frame;
pub use crate::core::header::{CspCodec, CspHeader, CspVersion, HeaderCodec};
pub use crate::error::{ProxyError, Result};
pub use crate::service::proxy::{Proxy, ProxyHandle};
