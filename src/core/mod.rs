//! # Core Frame Components
//!
//! Bus frames and the CSP header codec used by the capture tap.
//!
//! ## Components
//! - **Frame**: opaque bytes of one CSP packet as carried on the bus
//! - **Header**: CSP v1/v2 header decoding behind the [`header::HeaderCodec`] trait
//!
//! ## Wire Format
//! Frames carry no length prefix; the ZeroMQ message boundary delimits them.
//! ```text
//! v1: [Header(4)] [Payload(N)]
//! v2: [Header(6)] [Payload(N)]
//! ```

pub mod frame;
pub mod header;
